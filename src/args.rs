// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use shanan_panoptic::label::{DEFAULT_IGNORE_LABEL, DEFAULT_LABEL_DIVISOR};

/// 全景分割 PQ 评估参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型输出清单
  /// 格式: manifest:///path/to/results.json
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 预测输出目录
  /// 格式: folder:///path/to/output[?foreground]
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 真值标注文件
  #[arg(long, value_name = "FILE")]
  pub gt_json: PathBuf,

  /// 真值全景图目录
  #[arg(long, value_name = "DIR")]
  pub gt_folder: PathBuf,

  /// 评分程序
  /// 格式: command:///path/to/program[?arg=...]
  #[arg(long, value_name = "SCORER")]
  pub scorer: Url,

  /// thing 类别 id，逗号分隔
  #[arg(long, required = true, value_delimiter = ',', value_name = "IDS")]
  pub thing_ids: Vec<u32>,

  /// 全景 id 的类别除数
  #[arg(long, default_value_t = DEFAULT_LABEL_DIVISOR, value_name = "DIVISOR")]
  pub label_divisor: u32,

  /// 未匹配像素使用的类别
  #[arg(long, default_value_t = DEFAULT_IGNORE_LABEL, value_name = "CATEGORY")]
  pub ignore_label: u32,

  /// 校验片段面积与像素数一致
  #[arg(long)]
  pub strict_area: bool,

  /// 跳过处理失败的图像，而不是终止
  #[arg(long)]
  pub keep_going: bool,
}
