// ============================================================
// Layer 4 — Text Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<TextSample>
// into tensors on the target device.
//
//   Input:  N TextSamples, each already padded to length L
//   Output: TextBatch with ids and mask [N, L], labels [N]
//
// Token ids are flattened row by row and reshaped:
//   [s1_t1, ..., s1_tL, s2_t1, ..., sN_tL] → [N, L]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TextSample;

// ─── TextBatch ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TextBatch<B: Backend> {
    /// [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// [batch_size, seq_len], 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// [batch_size] class ids
    pub labels: Tensor<B, 1, Int>,
}

// ─── TextBatcher ──────────────────────────────────────────────────────────────
/// Holds the device tensors are created on.
#[derive(Clone, Debug)]
pub struct TextBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TextBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TextSample, TextBatch<B>> for TextBatcher<B> {
    fn batch(&self, items: Vec<TextSample>) -> TextBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map(|s| s.input_ids.len()).unwrap_or(0);

        let ids_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();
        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();
        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(ids_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let attention_mask = Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        TextBatch { input_ids, attention_mask, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let items = vec![
            TextSample { input_ids: vec![5, 6, 0, 0], attention_mask: vec![1, 1, 0, 0], label: 1 },
            TextSample { input_ids: vec![7, 8, 9, 0], attention_mask: vec![1, 1, 1, 0], label: 0 },
        ];
        let batch = TextBatcher::<NdArray>::new(Default::default()).batch(items);

        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.attention_mask.dims(), [2, 4]);
        assert_eq!(batch.labels.dims(), [2]);

        let ids: Vec<i64> = batch.input_ids.into_data().iter::<i64>().collect();
        assert_eq!(ids, vec![5, 6, 0, 0, 7, 8, 9, 0]);
        let labels: Vec<i64> = batch.labels.into_data().iter::<i64>().collect();
        assert_eq!(labels, vec![1, 0]);
    }
}
