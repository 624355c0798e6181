// ============================================================
// Layer 5 — Text Classifier
// ============================================================
// Sequence classifier over fixed-length token ids:
//
//   ids [B, L] ─► token emb + position emb
//              ─► N × EncoderBlock (post-norm, GELU FFN,
//                 padding positions masked out of attention)
//              ─► LayerNorm
//              ─► mean over real tokens [B, d_model]
//              ─► Linear ─► logits [B, num_labels]
//
// Reference: Vaswani et al. (2017), Burn Book §3 (Modules)

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

/// Architecture, saved as model_config.json next to the weights.
/// Config derives its own Clone and serde impls.
#[derive(Config, Debug)]
pub struct TextClassifierConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub num_labels:  usize,
    #[config(default = 256)]
    pub d_model:     usize,
    #[config(default = 8)]
    pub num_heads:   usize,
    #[config(default = 6)]
    pub num_layers:  usize,
    #[config(default = 1024)]
    pub d_ff:        usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl TextClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextClassifier<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let classifier = LinearConfig::new(self.d_model, self.num_labels).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        TextClassifier {
            token_embedding, position_embedding, layers,
            final_norm, classifier, dropout,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `pad_mask`: [batch, seq_len], true where the position is padding.
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// Transformer encoder + masked mean pooling + linear head.
#[derive(Module, Debug)]
pub struct TextClassifier<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub classifier:         Linear<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> TextClassifier<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, num_labels]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let tok_emb = self.token_embedding.forward(input_ids);

        // learned absolute positions 0..L
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let pad_mask = attention_mask.clone().equal_elem(0);
        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]
        let [_, _, d_model] = x.dims();

        // Mean over real tokens only; an all-padding row pools to zeros.
        let mask   = attention_mask.float(); // [batch, seq_len]
        let counts = mask.clone().sum_dim(1).clamp_min(1.0); // [batch, 1]
        let summed = (x * mask.unsqueeze_dim::<3>(2).expand([batch_size, seq_len, d_model]))
            .sum_dim(1)
            .reshape([batch_size, d_model]);
        let pooled = summed / counts.expand([batch_size, d_model]);

        self.classifier.forward(self.dropout.forward(pooled))
    }

    /// Mean cross-entropy over the batch, plus the logits.
    pub fn forward_loss(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        labels:         Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(input_ids, attention_mask);
        let ce     = CrossEntropyLossConfig::new().init(&logits.device());
        let loss   = ce.forward(logits.clone(), labels);
        (loss, logits)
    }
}

/// Arg-max class id per row of `logits` [batch, num_labels].
pub fn predict_classes<B: Backend>(logits: Tensor<B, 2>) -> Vec<usize> {
    logits
        .argmax(1)
        .into_data()
        .iter::<i64>()
        .map(|c| c as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny() -> TextClassifierConfig {
        TextClassifierConfig::new(30, 8, 4)
            .with_d_model(16)
            .with_num_heads(2)
            .with_num_layers(2)
            .with_d_ff(32)
            .with_dropout(0.0)
    }

    fn ids(rows: &[[i32; 8]]) -> Tensor<TestBackend, 2, Int> {
        let flat: Vec<i32> = rows.iter().flatten().copied().collect();
        Tensor::<TestBackend, 1, Int>::from_ints(flat.as_slice(), &Default::default())
            .reshape([rows.len(), 8])
    }

    #[test]
    fn test_defaults() {
        let cfg = TextClassifierConfig::new(100, 128, 16);
        assert_eq!(cfg.d_model, 256);
        assert_eq!(cfg.num_layers, 6);
        assert_eq!(cfg.num_heads, 8);
    }

    #[test]
    fn test_logits_shape() {
        let model: TextClassifier<TestBackend> = tiny().init(&Default::default());
        let input = ids(&[[5, 6, 7, 0, 0, 0, 0, 0], [8, 9, 0, 0, 0, 0, 0, 0], [5; 8]]);
        let mask  = ids(&[[1, 1, 1, 0, 0, 0, 0, 0], [1, 1, 0, 0, 0, 0, 0, 0], [1; 8]]);
        let logits = model.forward(input, mask);
        assert_eq!(logits.dims(), [3, 4]);

        let preds = predict_classes(logits);
        assert_eq!(preds.len(), 3);
        assert!(preds.iter().all(|&p| p < 4));
    }

    #[test]
    fn test_padding_does_not_change_prediction() {
        let model: TextClassifier<TestBackend> = tiny().init(&Default::default());

        // same real tokens, different junk in the padded tail
        let a = model.forward(ids(&[[5, 6, 7, 0, 0, 0, 0, 0]]), ids(&[[1, 1, 1, 0, 0, 0, 0, 0]]));
        let b = model.forward(ids(&[[5, 6, 7, 9, 9, 9, 9, 9]]), ids(&[[1, 1, 1, 0, 0, 0, 0, 0]]));

        let a: Vec<f32> = a.into_data().iter::<f32>().collect();
        let b: Vec<f32> = b.into_data().iter::<f32>().collect();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-4, "{x} vs {y}");
        }
    }

    #[test]
    fn test_loss_is_finite() {
        let model: TextClassifier<TestBackend> = tiny().init(&Default::default());
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([1, 3].as_slice(), &Default::default());
        let (loss, logits) = model.forward_loss(
            ids(&[[5, 6, 0, 0, 0, 0, 0, 0], [7; 8]]),
            ids(&[[1, 1, 0, 0, 0, 0, 0, 0], [1; 8]]),
            labels,
        );
        assert_eq!(logits.dims(), [2, 4]);
        let loss: f32 = loss.into_scalar().elem();
        assert!(loss.is_finite() && loss > 0.0);
    }
}
