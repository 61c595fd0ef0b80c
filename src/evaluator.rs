// 该文件是 Shanan （山南西风） 项目的一部分。
// src/evaluator.rs - 全景质量评估的预测汇总
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

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  codec::{self, CodecError},
  input::RawPanopticResult,
  label::{LabelError, PanopticLabelEncoder},
  output::ArtifactWriter,
  scoring::{ScoreRequest, Scorer},
  segment::{PredictionRecord, Predictions},
};

pub const PREDICTIONS_FILE: &str = "predictions.json";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum EvaluatorError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("缺少配置项: {0}")]
  MissingConfig(&'static str),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("编解码错误: {0}")]
  CodecError(#[from] CodecError),
  #[error("标签重编码错误: {0}")]
  LabelError(#[from] LabelError),
  #[error("预测结果序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("预测图写入错误: {0}")]
  ArtifactError(#[source] BoxError),
  #[error("评分错误: {0}")]
  ScoringError(#[source] BoxError),
}

/// 预测图文件名：将名称中的 `.jpg` 全部替换为 `.png`
///
/// 这是字面子串替换，不只作用于后缀，`a.jpg.d/b.jpg` 会变成 `a.png.d/b.png`。
pub fn png_file_name(file_name: &str) -> String {
  file_name.replace(".jpg", ".png")
}

pub struct PanopticEvaluatorBuilder {
  output_dir: PathBuf,
  foreground: bool,
  gt_json: Option<PathBuf>,
  gt_folder: Option<PathBuf>,
  encoder: PanopticLabelEncoder,
}

impl FromUrlWithScheme for PanopticEvaluatorBuilder {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for PanopticEvaluatorBuilder {
  type Error = EvaluatorError;

  /// `folder:///path/to/output[?foreground]`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(EvaluatorError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let foreground = url.query_pairs().any(|(k, _)| k == "foreground");
    Ok(Self::new(url.path()).foreground(foreground))
  }
}

impl PanopticEvaluatorBuilder {
  pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
    Self {
      output_dir: output_dir.into(),
      foreground: false,
      gt_json: None,
      gt_folder: None,
      encoder: PanopticLabelEncoder::default(),
    }
  }

  pub fn foreground(mut self, foreground: bool) -> Self {
    self.foreground = foreground;
    self
  }

  pub fn ground_truth<P: Into<PathBuf>, Q: Into<PathBuf>>(mut self, gt_json: P, gt_folder: Q) -> Self {
    self.gt_json = Some(gt_json.into());
    self.gt_folder = Some(gt_folder.into());
    self
  }

  pub fn encoder(mut self, encoder: PanopticLabelEncoder) -> Self {
    self.encoder = encoder;
    self
  }

  pub fn build_with<W, S>(self, writer: W, scorer: S) -> Result<PanopticEvaluator<W, S>, EvaluatorError> {
    let gt_json = self.gt_json.ok_or(EvaluatorError::MissingConfig("gt_json"))?;
    let gt_folder = self
      .gt_folder
      .ok_or(EvaluatorError::MissingConfig("gt_folder"))?;

    if !self.output_dir.exists() {
      info!("创建输出目录: {}", self.output_dir.display());
      std::fs::create_dir_all(&self.output_dir)?;
    }

    Ok(PanopticEvaluator {
      gt_json,
      gt_folder,
      output_dir: self.output_dir,
      foreground: self.foreground,
      encoder: self.encoder,
      writer,
      scorer,
      predictions: Vec::new(),
    })
  }

  /// 使用 PNG 写入端，预测图与预测结果文件放在同一输出目录
  #[cfg(feature = "png_artifact")]
  pub fn build<S>(
    self,
    scorer: S,
  ) -> Result<PanopticEvaluator<crate::output::PngArtifactWriter, S>, EvaluatorError> {
    let writer = crate::output::PngArtifactWriter::new(self.output_dir.clone());
    self.build_with(writer, scorer)
  }
}

/// 逐张重编码模型输出，汇总预测记录，最后交给评分器
///
/// [`finalize`](Self::finalize) 会消耗评估器，预测集合只会被评分一次。
pub struct PanopticEvaluator<W, S> {
  gt_json: PathBuf,
  gt_folder: PathBuf,
  output_dir: PathBuf,
  foreground: bool,
  encoder: PanopticLabelEncoder,
  writer: W,
  scorer: S,
  predictions: Vec<PredictionRecord>,
}

impl<W, S> PanopticEvaluator<W, S> {
  pub fn output_dir(&self) -> &Path {
    &self.output_dir
  }

  pub fn predictions(&self) -> &[PredictionRecord] {
    &self.predictions
  }

  pub fn len(&self) -> usize {
    self.predictions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.predictions.is_empty()
  }
}

impl<W, S> PanopticEvaluator<W, S>
where
  W: ArtifactWriter,
  W::Error: std::error::Error + Send + Sync + 'static,
{
  /// 处理一张图像：重编码、保存预测图、追加预测记录
  ///
  /// 出错时不会写入记录。
  pub fn process<I: Into<serde_json::Value>>(
    &mut self,
    result: &RawPanopticResult,
    file_name: &str,
    image_id: I,
  ) -> Result<(), EvaluatorError> {
    let image_id = image_id.into();
    debug!(
      "处理图像 {} ({}), 片段数 {}",
      image_id,
      file_name,
      result.segments_info.len()
    );

    let panoptic = codec::rgb_to_id(&codec::decode_payload(&result.png_string)?);
    let encoded = self
      .encoder
      .encode_2d(panoptic.view(), &result.segments_info)
      .inspect_err(|e| error!("图像 {} 重编码失败: {}", file_name, e))?;

    let image = codec::id_to_rgb(encoded.label.view())?;
    let image = self.writer.channel_order().arrange(image);
    let file_name = png_file_name(file_name);
    self
      .writer
      .write_artifact(&file_name, &image)
      .map_err(|e| EvaluatorError::ArtifactError(Box::new(e)))?;

    self.predictions.push(PredictionRecord {
      image_id,
      file_name,
      segments_info: encoded.segments_info,
    });
    Ok(())
  }
}

impl<W, S> PanopticEvaluator<W, S>
where
  S: Scorer,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  /// 写出预测结果文件并调用评分器，返回评分器的结果
  pub fn finalize(self) -> Result<S::Output, EvaluatorError> {
    if self.predictions.is_empty() {
      warn!("没有任何预测记录");
    }

    let pred_json = self.output_dir.join(PREDICTIONS_FILE);
    let predictions = Predictions {
      annotations: self.predictions,
    };
    {
      let mut writer = BufWriter::new(File::create(&pred_json)?);
      serde_json::to_writer(&mut writer, &predictions)?;
      // drop 时的 flush 错误会被忽略
      writer.flush()?;
    }
    info!(
      "写入 {} 条预测记录到: {}",
      predictions.annotations.len(),
      pred_json.display()
    );

    let request = ScoreRequest {
      gt_json: self.gt_json,
      gt_folder: self.gt_folder,
      pred_json,
      pred_folder: self.output_dir,
      foreground: self.foreground,
    };
    info!("开始评分 (仅前景: {})", request.foreground);
    self
      .scorer
      .score(&request)
      .map_err(|e| EvaluatorError::ScoringError(Box::new(e)))
  }
}
