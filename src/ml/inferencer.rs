// ============================================================
// Layer 5 — Predictor
// ============================================================
// Single-text inference: encode with the training policy,
// forward pass, arg-max class id.
//
// Built once from a checkpoint directory:
//   model_config.json → architecture
//   tokenizer.json    → vocabulary
//   train_config.json → max_length used in training
//   <name>.mpk        → weights
use anyhow::Result;
use burn::prelude::*;

use crate::domain::sample::TextEncoding;
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{TextEncoder, TokenizerStore},
};
use crate::ml::model::{predict_classes, TextClassifier};

pub struct Predictor<B: Backend> {
    model:   TextClassifier<B>,
    encoder: TextEncoder,
    device:  B::Device,
}

impl<B: Backend> Predictor<B> {
    pub fn new(model: TextClassifier<B>, encoder: TextEncoder, device: B::Device) -> Self {
        Self { model, encoder, device }
    }

    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, name: &str, device: B::Device) -> Result<Self> {
        let model_cfg = ckpt_manager.load_model_config()?.with_dropout(0.0);
        let train_cfg = ckpt_manager.load_config()?;
        let tokenizer = TokenizerStore::new(ckpt_manager.dir()).load()?;
        let encoder   = TextEncoder::new(tokenizer, train_cfg.max_length)?;

        let model = ckpt_manager.load_model(model_cfg.init(&device), name, &device)?;
        tracing::info!(
            "Predictor ready: checkpoint '{}', {} labels, max_length={}",
            name, model_cfg.num_labels, train_cfg.max_length
        );
        Ok(Self::new(model, encoder, device))
    }

    pub fn num_labels(&self) -> usize {
        self.model.classifier.weight.dims()[1]
    }

    /// Class id for one raw text.
    pub fn predict(&self, text: &str) -> Result<usize> {
        let encoding = self.encoder.encode(text)?;
        let (ids, mask) = self.to_tensors(&encoding);
        let logits = self.model.forward(ids, mask);
        let class  = predict_classes(logits).first().copied().unwrap_or(0);
        tracing::debug!("Predicted class {} for {} real tokens", class, encoding.real_tokens());
        Ok(class)
    }

    fn to_tensors(&self, enc: &TextEncoding) -> (Tensor<B, 2, Int>, Tensor<B, 2, Int>) {
        let ids: Vec<i32>  = enc.input_ids.iter().map(|&x| x as i32).collect();
        let mask: Vec<i32> = enc.attention_mask.iter().map(|&x| x as i32).collect();
        (
            Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device).unsqueeze::<2>(),
            Tensor::<B, 1, Int>::from_ints(mask.as_slice(), &self.device).unsqueeze::<2>(),
        )
    }
}
