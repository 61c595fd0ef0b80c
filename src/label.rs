// 该文件是 Shanan （山南西风） 项目的一部分。
// src/label.rs - 全景标签重编码
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

use std::collections::{HashMap, HashSet};

use ndarray::{Array2, ArrayView2, ArrayViewD, Ix2, Zip};
use thiserror::Error;
use tracing::{debug, error};

use crate::segment::SegmentInfo;

pub const DEFAULT_LABEL_DIVISOR: u32 = 256;
pub const DEFAULT_IGNORE_LABEL: u32 = 0;

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("全景分割图应为二维, 实际维度为 {ndim}")]
  NotTwoDimensional { ndim: usize },
  #[error("标签除数无效: {0}")]
  InvalidDivisor(u32),
  #[error("类别 {category_id} 在该图像中的实例过多 (除数 {divisor})")]
  TooManyInstances { category_id: u32, divisor: u32 },
  #[error("片段 {id} 期望 {expected} 个像素, 实际 {actual} 个")]
  AreaMismatch { id: u32, expected: u64, actual: u64 },
  #[error("类别 {category_id} 的全景 id 超出 i32 范围")]
  IdOverflow { category_id: u32 },
  #[error("形状错误: {0}")]
  ShapeError(#[from] ndarray::ShapeError),
}

/// 重编码结果
#[derive(Debug, Clone)]
pub struct PanopticLabel {
  /// 每个像素为 `category_id * divisor + instance_index`
  pub label: Array2<i32>,
  /// 与输入顺序一致，`id` 已替换为全景 id
  pub segments_info: Vec<SegmentInfo>,
}

/// 将模型输出的片段 id 重编码为 `category_id * divisor + instance_index`
///
/// 片段按输入顺序处理，同一类别的 thing 片段依次获得从 1 开始的实例序号；
/// stuff 片段的实例序号恒为 0。实例计数只在一次 [`encode`](Self::encode) 内有效。
#[derive(Debug, Clone)]
pub struct PanopticLabelEncoder {
  thing_ids: HashSet<u32>,
  label_divisor: u32,
  ignore_label: u32,
  check_area: bool,
}

impl Default for PanopticLabelEncoder {
  fn default() -> Self {
    Self::new(Vec::new())
  }
}

impl PanopticLabelEncoder {
  pub fn new<I: IntoIterator<Item = u32>>(thing_ids: I) -> Self {
    Self {
      thing_ids: thing_ids.into_iter().collect(),
      label_divisor: DEFAULT_LABEL_DIVISOR,
      ignore_label: DEFAULT_IGNORE_LABEL,
      check_area: false,
    }
  }

  pub fn label_divisor(mut self, label_divisor: u32) -> Self {
    self.label_divisor = label_divisor;
    self
  }

  pub fn ignore_label(mut self, ignore_label: u32) -> Self {
    self.ignore_label = ignore_label;
    self
  }

  /// 启用后，片段的 `area` 必须与重新统计的像素数一致
  pub fn check_area(mut self, check_area: bool) -> Self {
    self.check_area = check_area;
    self
  }

  pub fn is_thing(&self, category_id: u32) -> bool {
    self.thing_ids.contains(&category_id)
  }

  /// 接受任意维度的输入，非二维时拒绝
  pub fn encode(
    &self,
    panoptic: ArrayViewD<u32>,
    segments_info: &[SegmentInfo],
  ) -> Result<PanopticLabel, LabelError> {
    let ndim = panoptic.ndim();
    let panoptic = panoptic.into_dimensionality::<Ix2>().map_err(|_| {
      error!("全景分割图维度错误: {}", ndim);
      LabelError::NotTwoDimensional { ndim }
    })?;
    self.encode_2d(panoptic, segments_info)
  }

  pub fn encode_2d(
    &self,
    panoptic: ArrayView2<u32>,
    segments_info: &[SegmentInfo],
  ) -> Result<PanopticLabel, LabelError> {
    let divisor = self.label_divisor;
    if divisor == 0 {
      return Err(LabelError::InvalidDivisor(divisor));
    }
    canonical_id(self.ignore_label, 0, divisor)?;

    let mut semantic = Array2::from_elem(panoptic.raw_dim(), self.ignore_label);
    let mut instance = Array2::<u32>::zeros(panoptic.raw_dim());
    let mut instance_count: HashMap<u32, u32> = HashMap::new();
    let mut encoded = Vec::with_capacity(segments_info.len());

    for segment in segments_info {
      let category_id = segment.category_id;

      let mut pixel_area = 0u64;
      Zip::from(&mut semantic)
        .and(&panoptic)
        .for_each(|semantic, &raw| {
          if raw == segment.id {
            *semantic = category_id;
            pixel_area += 1;
          }
        });

      if self.check_area && pixel_area != segment.area {
        return Err(LabelError::AreaMismatch {
          id: segment.id,
          expected: segment.area,
          actual: pixel_area,
        });
      }

      let instance_index = if self.is_thing(category_id) {
        let count = instance_count.entry(category_id).or_insert(0);
        *count += 1;
        if *count >= divisor {
          error!("类别 {} 的实例数达到除数 {}", category_id, divisor);
          return Err(LabelError::TooManyInstances {
            category_id,
            divisor,
          });
        }
        let index = *count;
        Zip::from(&mut instance)
          .and(&panoptic)
          .for_each(|instance, &raw| {
            if raw == segment.id {
              *instance = index;
            }
          });
        index
      } else {
        0
      };

      let new_id = canonical_id(category_id, instance_index, divisor)?;
      debug!(
        "片段 {} -> {} (类别 {}, 实例 {}, 像素 {})",
        segment.id, new_id, category_id, instance_index, pixel_area
      );
      encoded.push(segment.with_id(new_id as u32));
    }

    let known: HashSet<u32> = segments_info.iter().map(|segment| segment.id).collect();
    let unmatched = panoptic.iter().filter(|&raw| !known.contains(raw)).count();
    if unmatched > 0 {
      debug!("{} 个像素没有对应的片段, 记为类别 {}", unmatched, self.ignore_label);
    }

    let values = semantic
      .iter()
      .zip(instance.iter())
      .map(|(&category_id, &instance_index)| canonical_id(category_id, instance_index, divisor))
      .collect::<Result<Vec<_>, _>>()?;
    let label = Array2::from_shape_vec(semantic.raw_dim(), values)?;

    Ok(PanopticLabel {
      label,
      segments_info: encoded,
    })
  }
}

fn canonical_id(category_id: u32, instance_index: u32, divisor: u32) -> Result<i32, LabelError> {
  let id = i64::from(category_id) * i64::from(divisor) + i64::from(instance_index);
  i32::try_from(id).map_err(|_| LabelError::IdOverflow { category_id })
}
