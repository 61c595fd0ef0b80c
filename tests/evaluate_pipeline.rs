// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/evaluate_pipeline.rs - 评估流程集成测试
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

use std::io::Cursor;
use std::path::PathBuf;

use image::{ImageFormat, Rgb, RgbImage};
use ndarray::array;
use serde_json::{Value, json};
use shanan_panoptic::{
  codec,
  evaluator::{PREDICTIONS_FILE, PanopticEvaluatorBuilder},
  input::{ManifestEntry, ManifestInput, RawPanopticResult},
  label::PanopticLabelEncoder,
  scoring::ScoreRequest,
  segment::{Predictions, SegmentInfo},
};

fn encode_png(image: &RgbImage) -> Vec<u8> {
  let mut bytes = Vec::new();
  image
    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
    .expect("png encoding should succeed");
  bytes
}

fn segment(id: u32, is_thing: bool, category_id: u32, area: u64) -> SegmentInfo {
  SegmentInfo {
    id,
    is_thing,
    category_id,
    area,
  }
}

#[test]
fn manifest_to_predictions_file() {
  let temp = tempfile::tempdir().unwrap();
  let dir = temp.path();
  let input_dir = dir.join("input");
  let output_dir = dir.join("output");
  std::fs::create_dir_all(&input_dir).unwrap();

  // 5 = (5, 0, 0), 7 = (7, 0, 0), 300 = (44, 1, 0)
  let mut first = RgbImage::new(2, 2);
  first.put_pixel(0, 0, Rgb([5, 0, 0]));
  first.put_pixel(1, 0, Rgb([5, 0, 0]));
  first.put_pixel(0, 1, Rgb([7, 0, 0]));
  std::fs::write(input_dir.join("first.png"), encode_png(&first)).unwrap();

  let mut second = RgbImage::new(3, 1);
  second.put_pixel(0, 0, Rgb([44, 1, 0]));
  second.put_pixel(1, 0, Rgb([5, 0, 0]));
  second.put_pixel(2, 0, Rgb([44, 1, 0]));
  std::fs::write(input_dir.join("second.png"), encode_png(&second)).unwrap();

  let manifest = json!([
    {
      "image_id": 139,
      "file_name": "000000000139.jpg",
      "png_file": "first.png",
      "segments_info": [
        {"id": 5, "isthing": true, "category_id": 3, "area": 2},
        {"id": 7, "isthing": false, "category_id": 9, "area": 1}
      ]
    },
    {
      "image_id": 285,
      "file_name": "000000000285.jpg",
      "png_file": "second.png",
      "segments_info": [
        {"id": 5, "isthing": true, "category_id": 3, "area": 1},
        {"id": 300, "isthing": true, "category_id": 3, "area": 2}
      ]
    }
  ]);
  std::fs::write(
    input_dir.join("manifest.json"),
    serde_json::to_vec(&manifest).unwrap(),
  )
  .unwrap();

  let scorer = |request: &ScoreRequest| -> Result<Value, std::io::Error> {
    let data = std::fs::read(&request.pred_json)?;
    let predictions: Predictions = serde_json::from_slice(&data)?;
    Ok(json!({
      "images": predictions.annotations.len(),
      "foreground": request.foreground,
    }))
  };

  let mut evaluator = PanopticEvaluatorBuilder::new(&output_dir)
    .ground_truth(dir.join("gt.json"), dir.join("gt"))
    .encoder(PanopticLabelEncoder::new([3]))
    .build(scorer)
    .unwrap();

  for sample in ManifestInput::open(input_dir.join("manifest.json")).unwrap() {
    let sample = sample.unwrap();
    evaluator
      .process(&sample.result, &sample.file_name, sample.image_id)
      .unwrap();
  }

  let metrics = evaluator.finalize().unwrap();
  assert_eq!(metrics, json!({"images": 2, "foreground": false}));

  let first_out = image::open(output_dir.join("000000000139.png"))
    .unwrap()
    .into_rgb8();
  assert_eq!(codec::rgb_to_id(&first_out), array![[769, 769], [2304, 0]]);
  let second_out = image::open(output_dir.join("000000000285.png"))
    .unwrap()
    .into_rgb8();
  assert_eq!(codec::rgb_to_id(&second_out), array![[770, 769, 770]]);

  let data = std::fs::read(output_dir.join(PREDICTIONS_FILE)).unwrap();
  let predictions: Predictions = serde_json::from_slice(&data).unwrap();
  assert_eq!(predictions.annotations[0].image_id, json!(139));
  assert_eq!(predictions.annotations[1].file_name, "000000000285.png");
  assert_eq!(
    predictions.annotations[1].segments_info,
    vec![segment(769, true, 3, 1), segment(770, true, 3, 2)]
  );
}

#[test]
fn payload_in_memory() {
  let dir = tempfile::tempdir().unwrap();
  let label = codec::id_to_rgb(array![[12, 12, 0]].view()).unwrap();
  let result = RawPanopticResult {
    segments_info: vec![segment(12, false, 40, 2)],
    png_string: encode_png(&label),
  };

  let mut evaluator = PanopticEvaluatorBuilder::new(dir.path())
    .foreground(true)
    .ground_truth("gt.json", "gt")
    .build(|request: &ScoreRequest| -> Result<bool, std::io::Error> { Ok(request.foreground) })
    .unwrap();
  evaluator.process(&result, "frame.jpg", "frame").unwrap();
  assert_eq!(evaluator.predictions()[0].segments_info[0].id, 40 * 256);
  assert!(evaluator.finalize().unwrap());

  let entries = vec![ManifestEntry {
    image_id: json!(1),
    file_name: "x.jpg".to_string(),
    png_file: PathBuf::from("missing.png"),
    segments_info: vec![],
  }];
  let mut input = ManifestInput::with_entries(dir.path().to_path_buf(), entries);
  assert!(matches!(input.next(), Some(Err(_))));
}
