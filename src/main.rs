// 该文件是 Shanan （山南西风） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use shanan_panoptic::{
  FromUrl,
  evaluator::PanopticEvaluatorBuilder,
  input::ManifestInput,
  label::PanopticLabelEncoder,
  scoring::CommandScorer,
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型输出清单: {}", args.input);
  info!("预测输出目录: {}", args.output);
  info!("真值标注文件: {}", args.gt_json.display());
  info!("真值全景图目录: {}", args.gt_folder.display());
  info!("thing 类别: {:?}", args.thing_ids);

  let encoder = PanopticLabelEncoder::new(args.thing_ids.iter().copied())
    .label_divisor(args.label_divisor)
    .ignore_label(args.ignore_label)
    .check_area(args.strict_area);
  let scorer = CommandScorer::from_url(&args.scorer)?;
  let mut evaluator = PanopticEvaluatorBuilder::from_url(&args.output)?
    .ground_truth(&args.gt_json, &args.gt_folder)
    .encoder(encoder)
    .build(scorer)?;
  let input = ManifestInput::from_url(&args.input)?;

  info!("开始处理...");
  let now = std::time::Instant::now();
  let mut skipped = 0usize;
  for sample in input {
    let sample = sample?;
    match evaluator.process(&sample.result, &sample.file_name, sample.image_id) {
      Ok(()) => {}
      Err(e) if args.keep_going => {
        warn!("跳过图像 {}: {}", sample.file_name, e);
        skipped += 1;
      }
      Err(e) => return Err(e.into()),
    }
  }
  info!(
    "处理完成: {} 张, 跳过 {} 张, 耗时: {:.2?}",
    evaluator.len(),
    skipped,
    now.elapsed()
  );

  let metrics = evaluator.finalize()?;
  println!("{}", serde_json::to_string_pretty(&metrics)?);

  Ok(())
}
