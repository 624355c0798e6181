// ============================================================
// Layer 5 — Batch Prediction for Evaluation
// ============================================================
// Runs a trained classifier over a text dataset in order
// (no shuffle) and collects the true and predicted class ids
// side by side. Scoring lives in infra::metrics.
//
// Reference: Burn Book §4 (DataLoader)

use anyhow::{bail, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};

use crate::data::{batcher::TextBatcher, dataset::TextDataset};
use crate::ml::model::{predict_classes, TextClassifier};

/// True and predicted class ids, paired by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predictions {
    pub y_true: Vec<usize>,
    pub y_pred: Vec<usize>,
}

pub fn predict_dataset<B: Backend>(
    model:      &TextClassifier<B>,
    dataset:    TextDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Result<Predictions> {
    if batch_size == 0 {
        bail!("batch size must be at least 1");
    }

    let loader = DataLoaderBuilder::new(TextBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .build(dataset);

    let mut out = Predictions::default();
    for batch in loader.iter() {
        let logits = model.forward(batch.input_ids, batch.attention_mask);
        out.y_pred.extend(predict_classes(logits));
        out.y_true.extend(batch.labels.into_data().iter::<i64>().map(|c| c as usize));
    }

    tracing::info!("Predicted {} samples", out.y_pred.len());
    Ok(out)
}
