// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/manifest_input.rs - 清单文件输入
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

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{PanopticSample, RawPanopticResult},
  segment::SegmentInfo,
};

#[derive(Error, Debug)]
pub enum ManifestInputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误 ({0}): {1}")]
  IoError(PathBuf, std::io::Error),
  #[error("清单解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
}

/// 清单中的一项，`png_file` 相对于清单所在目录
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
  pub image_id: serde_json::Value,
  pub file_name: String,
  pub png_file: PathBuf,
  pub segments_info: Vec<SegmentInfo>,
}

/// 从 JSON 清单逐张读取模型输出
///
/// 清单为 `[{"image_id", "file_name", "png_file", "segments_info"}, ...]`。
pub struct ManifestInput {
  base: PathBuf,
  entries: std::vec::IntoIter<ManifestEntry>,
}

impl FromUrlWithScheme for ManifestInput {
  const SCHEME: &'static str = "manifest";
}

impl FromUrl for ManifestInput {
  type Error = ManifestInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ManifestInputError::SchemeMismatch(url.scheme().to_string()));
    }

    Self::open(url.path())
  }
}

impl ManifestInput {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ManifestInputError> {
    let path = path.as_ref();
    info!("读取清单文件: {}", path.display());
    let data =
      std::fs::read(path).map_err(|e| ManifestInputError::IoError(path.to_path_buf(), e))?;
    let entries: Vec<ManifestEntry> = serde_json::from_slice(&data)?;
    info!("清单共 {} 张图像", entries.len());

    let base = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_default();
    Ok(Self::with_entries(base, entries))
  }

  pub fn with_entries(base: PathBuf, entries: Vec<ManifestEntry>) -> Self {
    Self {
      base,
      entries: entries.into_iter(),
    }
  }

  fn load(&self, entry: ManifestEntry) -> Result<PanopticSample, ManifestInputError> {
    let png_path = self.base.join(&entry.png_file);
    debug!("读取分割图: {}", png_path.display());
    let png_string =
      std::fs::read(&png_path).map_err(|e| ManifestInputError::IoError(png_path, e))?;

    Ok(PanopticSample {
      result: RawPanopticResult {
        segments_info: entry.segments_info,
        png_string,
      },
      file_name: entry.file_name,
      image_id: entry.image_id,
    })
  }
}

impl Iterator for ManifestInput {
  type Item = Result<PanopticSample, ManifestInputError>;

  fn next(&mut self) -> Option<Self::Item> {
    let entry = self.entries.next()?;
    Some(self.load(entry))
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.entries.size_hint()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_entries_relative_to_manifest() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path();
    std::fs::write(dir.join("a.png"), b"payload").unwrap();
    std::fs::write(
      dir.join("manifest.json"),
      r#"[{"image_id": 42, "file_name": "a.jpg", "png_file": "a.png",
           "segments_info": [{"id": 1, "isthing": false, "category_id": 2, "area": 3}]}]"#,
    )
    .unwrap();

    let url = Url::from_file_path(dir.join("manifest.json")).unwrap();
    let url = Url::parse(&url.as_str().replacen("file:", "manifest:", 1)).unwrap();
    let samples: Vec<_> = ManifestInput::from_url(&url)
      .unwrap()
      .collect::<Result<_, _>>()
      .unwrap();

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].image_id, serde_json::json!(42));
    assert_eq!(samples[0].file_name, "a.jpg");
    assert_eq!(samples[0].result.png_string, b"payload");
    assert_eq!(samples[0].result.segments_info[0].category_id, 2);
  }

  #[test]
  fn missing_payload_is_reported_per_entry() {
    let dir = tempfile::tempdir().unwrap();
    let entries = vec![ManifestEntry {
      image_id: serde_json::json!("b"),
      file_name: "b.jpg".to_string(),
      png_file: PathBuf::from("absent.png"),
      segments_info: vec![],
    }];
    let mut input = ManifestInput::with_entries(dir.path().to_path_buf(), entries);
    assert!(matches!(
      input.next(),
      Some(Err(ManifestInputError::IoError(_, _)))
    ));
    assert!(input.next().is_none());
  }

  #[test]
  fn rejects_other_schemes() {
    let url = Url::parse("folder:///tmp/manifest.json").unwrap();
    assert!(matches!(
      ManifestInput::from_url(&url),
      Err(ManifestInputError::SchemeMismatch(_))
    ));
  }
}
