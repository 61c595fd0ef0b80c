// 该文件是 Shanan （山南西风） 项目的一部分。
// src/codec.rs - 24 位 RGB 与片段 id 互转
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

use image::{Rgb, RgbImage};
use ndarray::{Array2, ArrayView2};
use thiserror::Error;

const RGB_ID_LIMIT: i32 = 1 << 24;

#[derive(Error, Debug)]
pub enum CodecError {
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("全景 id {0} 无法用 24 位 RGB 表示")]
  IdOutOfRange(i32),
}

/// 图像写入端期望的通道顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
  #[default]
  Rgb,
  Bgr,
}

impl ChannelOrder {
  /// 将 RGB 图像排列为该通道顺序
  pub fn arrange(self, image: RgbImage) -> RgbImage {
    match self {
      ChannelOrder::Rgb => image,
      ChannelOrder::Bgr => reverse_channels(image),
    }
  }
}

pub fn reverse_channels(mut image: RgbImage) -> RgbImage {
  for pixel in image.pixels_mut() {
    let Rgb([r, g, b]) = *pixel;
    *pixel = Rgb([b, g, r]);
  }
  image
}

/// 解码模型输出中内嵌的图像数据
pub fn decode_payload(payload: &[u8]) -> Result<RgbImage, CodecError> {
  let image = image::load_from_memory(payload)?;
  Ok(image.into_rgb8())
}

/// `id = R + G * 256 + B * 256^2`
pub fn rgb_to_id(image: &RgbImage) -> Array2<u32> {
  let (width, height) = image.dimensions();
  Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
    let Rgb([r, g, b]) = *image.get_pixel(x as u32, y as u32);
    u32::from(r) + (u32::from(g) << 8) + (u32::from(b) << 16)
  })
}

/// [`rgb_to_id`] 的逆变换，id 必须落在 `[0, 2^24)` 内
pub fn id_to_rgb(label: ArrayView2<i32>) -> Result<RgbImage, CodecError> {
  if let Some(&id) = label.iter().find(|&&id| !(0..RGB_ID_LIMIT).contains(&id)) {
    return Err(CodecError::IdOutOfRange(id));
  }

  let (height, width) = label.dim();
  Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
    let id = label[[y as usize, x as usize]] as u32;
    Rgb([id as u8, (id >> 8) as u8, (id >> 16) as u8])
  }))
}
