// 该文件是 Shanan （山南西风） 项目的一部分。
// src/scoring.rs - 全景质量评分
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

/// 一次评分所需的全部路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRequest {
  pub gt_json: PathBuf,
  pub gt_folder: PathBuf,
  pub pred_json: PathBuf,
  pub pred_folder: PathBuf,
  /// 仅评估 thing 类别
  pub foreground: bool,
}

/// PQ 评分器，指标的计算完全交给实现方
pub trait Scorer {
  type Output;
  type Error;

  fn score(&self, request: &ScoreRequest) -> Result<Self::Output, Self::Error>;
}

impl<F, O, E> Scorer for F
where
  F: Fn(&ScoreRequest) -> Result<O, E>,
{
  type Output = O;
  type Error = E;

  fn score(&self, request: &ScoreRequest) -> Result<O, E> {
    self(request)
  }
}

#[cfg(feature = "command_scorer")]
mod command_scorer;
#[cfg(feature = "command_scorer")]
pub use self::command_scorer::{CommandScorer, CommandScorerError};
