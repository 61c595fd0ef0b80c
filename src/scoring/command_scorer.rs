// 该文件是 Shanan （山南西风） 项目的一部分。
// src/scoring/command_scorer.rs - 调用外部程序评分
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

use std::process::Command;

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  scoring::{ScoreRequest, Scorer},
};

#[derive(Error, Debug)]
pub enum CommandScorerError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("无法启动评分程序 {0}: {1}")]
  SpawnError(String, std::io::Error),
  #[error("评分程序退出异常 ({status}): {stderr}")]
  ExitError { status: String, stderr: String },
  #[error("评分结果解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
}

/// 调用外部 PQ 评分程序，程序须将指标以 JSON 输出到标准输出
///
/// 以 `command:///usr/local/bin/pq-compute?arg=--workers&arg=8` 的形式配置，
/// `arg` 参数按顺序排在评分参数之前。
#[derive(Debug, Clone)]
pub struct CommandScorer {
  program: String,
  args: Vec<String>,
}

impl FromUrlWithScheme for CommandScorer {
  const SCHEME: &'static str = "command";
}

impl FromUrl for CommandScorer {
  type Error = CommandScorerError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(CommandScorerError::SchemeMismatch(format!(
        "期望评分方式 '{}', 实际评分方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let args = url
      .query_pairs()
      .filter(|(k, _)| k == "arg")
      .map(|(_, v)| v.into_owned())
      .collect();

    Ok(CommandScorer {
      program: url.path().to_string(),
      args,
    })
  }
}

impl CommandScorer {
  pub fn new<S: Into<String>>(program: S) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
    self.args.push(arg.into());
    self
  }

  fn command(&self, request: &ScoreRequest) -> Command {
    let mut command = Command::new(&self.program);
    command
      .args(&self.args)
      .arg("--gt-json")
      .arg(&request.gt_json)
      .arg("--gt-folder")
      .arg(&request.gt_folder)
      .arg("--pred-json")
      .arg(&request.pred_json)
      .arg("--pred-folder")
      .arg(&request.pred_folder);
    if request.foreground {
      command.arg("--foreground");
    }
    command
  }
}

impl Scorer for CommandScorer {
  type Output = serde_json::Value;
  type Error = CommandScorerError;

  fn score(&self, request: &ScoreRequest) -> Result<Self::Output, Self::Error> {
    let mut command = self.command(request);
    info!("调用评分程序: {:?}", command);
    let output = command
      .output()
      .map_err(|e| CommandScorerError::SpawnError(self.program.clone(), e))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
      error!("评分程序退出异常: {}", output.status);
      return Err(CommandScorerError::ExitError {
        status: output.status.to_string(),
        stderr,
      });
    }

    debug!("评分程序输出 {} 字节", output.stdout.len());
    Ok(serde_json::from_slice(&output.stdout)?)
  }
}
