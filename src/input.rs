// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input.rs - 模型输出输入
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use crate::segment::SegmentInfo;

/// 全景分割模型的原始输出
#[derive(Debug, Clone)]
pub struct RawPanopticResult {
  pub segments_info: Vec<SegmentInfo>,
  /// 以 24 位 RGB 编码片段 id 的无损图像数据
  pub png_string: Vec<u8>,
}

/// 一张待评估图像
#[derive(Debug, Clone)]
pub struct PanopticSample {
  pub result: RawPanopticResult,
  pub file_name: String,
  pub image_id: serde_json::Value,
}

#[cfg(feature = "manifest_input")]
mod manifest_input;
#[cfg(feature = "manifest_input")]
pub use self::manifest_input::{ManifestEntry, ManifestInput, ManifestInputError};
