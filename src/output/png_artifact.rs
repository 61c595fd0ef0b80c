// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/png_artifact.rs - 保存 PNG 预测图
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

use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::info;

use crate::output::ArtifactWriter;

#[derive(Error, Debug)]
pub enum PngArtifactWriterError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
}

/// 将预测图以 PNG 保存到目录下
pub struct PngArtifactWriter {
  directory: PathBuf,
}

impl PngArtifactWriter {
  pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
    Self {
      directory: directory.into(),
    }
  }
}

impl ArtifactWriter for PngArtifactWriter {
  type Error = PngArtifactWriterError;

  fn write_artifact(&self, file_name: &str, image: &RgbImage) -> Result<(), Self::Error> {
    let path = self.directory.join(file_name);
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    // 按文件名后缀推断格式会把 `.jpg` 存成有损图像
    image.save_with_format(&path, ImageFormat::Png)?;
    info!("保存预测图到文件: {}", path.display());

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn writes_lossless_png_into_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let writer = PngArtifactWriter::new(dir.path());

    let mut image = RgbImage::new(3, 2);
    image.put_pixel(2, 1, Rgb([1, 9, 255]));
    writer.write_artifact("val/0001.png", &image).unwrap();

    let loaded = image::open(dir.path().join("val/0001.png"))
      .unwrap()
      .into_rgb8();
    assert_eq!(loaded, image);
  }
}
