// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 输出定义
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

use image::RgbImage;

use crate::codec::ChannelOrder;

/// 全景预测图的写入端，写入结果必须无损
pub trait ArtifactWriter {
  type Error;

  /// 写入端期望的通道顺序，调用方负责按此顺序排列像素
  fn channel_order(&self) -> ChannelOrder {
    ChannelOrder::Rgb
  }

  fn write_artifact(&self, file_name: &str, image: &RgbImage) -> Result<(), Self::Error>;
}

#[cfg(feature = "png_artifact")]
mod png_artifact;
#[cfg(feature = "png_artifact")]
pub use self::png_artifact::{PngArtifactWriter, PngArtifactWriterError};
