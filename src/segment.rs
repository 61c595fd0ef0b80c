// 该文件是 Shanan （山南西风） 项目的一部分。
// src/segment.rs - 全景分割片段与预测记录
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

use serde::{Deserialize, Serialize};

/// 单个片段的描述信息
///
/// 重编码前 `id` 为模型输出的原始 id，重编码后为
/// `category_id * divisor + instance_index`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentInfo {
  pub id: u32,
  #[serde(rename = "isthing")]
  pub is_thing: bool,
  pub category_id: u32,
  pub area: u64,
}

impl SegmentInfo {
  pub fn with_id(&self, id: u32) -> Self {
    Self { id, ..self.clone() }
  }
}

/// 单张图像的预测记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
  pub image_id: serde_json::Value,
  pub file_name: String,
  pub segments_info: Vec<SegmentInfo>,
}

/// 预测结果文件，`{"annotations": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
  pub annotations: Vec<PredictionRecord>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn segment_info_uses_isthing_key() {
    let info = SegmentInfo {
      id: 769,
      is_thing: true,
      category_id: 3,
      area: 2,
    };
    let value = serde_json::to_value(&info).unwrap();
    assert_eq!(
      value,
      json!({"id": 769, "isthing": true, "category_id": 3, "area": 2})
    );
  }

  #[test]
  fn predictions_file_layout() {
    let predictions = Predictions {
      annotations: vec![PredictionRecord {
        image_id: json!(139),
        file_name: "000000000139.png".to_string(),
        segments_info: vec![],
      }],
    };
    let value = serde_json::to_value(&predictions).unwrap();
    assert_eq!(
      value,
      json!({"annotations": [
        {"image_id": 139, "file_name": "000000000139.png", "segments_info": []}
      ]})
    );
  }
}
