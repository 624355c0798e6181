// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fine-tunes the text classifier with AdamW and cross-entropy.
//
//   - generic over any AutodiffBackend (Wgpu in production,
//     NdArray in tests)
//   - batches come from Burn's DataLoader: fixed batch size,
//     shuffled with a fixed seed, loaded on the calling thread
//   - after every epoch: checkpoint `text_epoch_<n>` and one
//     row in metrics.csv
//   - after the last epoch: checkpoint `text_baseline`
//
// Every run starts from the base weights: a record given with
// --base-checkpoint, or a fresh initialisation. There is no
// resumption from earlier epochs.
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::time::Instant;

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::TextBatcher, dataset::TextDataset};
use crate::infra::{
    checkpoint::{self, CheckpointManager, BASELINE},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::{TextClassifier, TextClassifierConfig};

pub fn train<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    model_cfg:    &TextClassifierConfig,
    dataset:      TextDataset,
    ckpt_manager: &CheckpointManager,
    device:       &B::Device,
) -> Result<Vec<EpochMetrics>> {
    if cfg.batch_size == 0 {
        bail!("batch size must be at least 1");
    }

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: TextClassifier<B> = model_cfg.init(device);
    if let Some(base) = &cfg.base_checkpoint {
        model = checkpoint::load_model_from(model, base, device)?;
    }
    tracing::info!(
        "Model ready: {} layers, d_model={}, {} labels",
        model_cfg.num_layers, model_cfg.d_model, model_cfg.num_labels
    );

    // ── AdamW ─────────────────────────────────────────────────────────────────
    let mut optim = AdamWConfig::new()
        .with_weight_decay(cfg.weight_decay)
        .init();

    // ── Data loader ───────────────────────────────────────────────────────────
    let batcher = TextBatcher::<B>::new(device.clone());
    let loader  = DataLoaderBuilder::new(batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .build(dataset);

    let metrics_log = MetricsLogger::new(ckpt_manager.dir())?;
    let mut history = Vec::with_capacity(cfg.epochs);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let started      = Instant::now();
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in loader.iter() {
            let (loss, _) = model.forward_loss(batch.input_ids, batch.attention_mask, batch.labels);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val;
            batches  += 1;
            tracing::debug!("epoch {} batch {} loss={:.4}", epoch, batches, loss_val);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
        println!(
            "Epoch {:>3}/{} | avg_loss={:.4} | batches={} | {:.1}s",
            epoch, cfg.epochs, avg_loss, batches, started.elapsed().as_secs_f64(),
        );

        let m = EpochMetrics::new(epoch, avg_loss, batches);
        metrics_log.log(&m)?;
        history.push(m);

        ckpt_manager.save_model(&model, &checkpoint::epoch_name(epoch))?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    ckpt_manager.save_model(&model, BASELINE)?;
    tracing::info!("Final model saved as '{}'", BASELINE);
    Ok(history)
}
