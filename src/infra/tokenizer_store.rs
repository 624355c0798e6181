// ============================================================
// Layer 6 — Tokenizer Store and Text Encoder
// ============================================================
// Two pieces:
//
//   TokenizerStore → where tokenizer.json lives next to the
//                    checkpoints. Loads it, copies in a
//                    pretrained one, or builds a word-level
//                    vocabulary from the training texts.
//
//   TextEncoder    → the one tokenisation policy shared by
//                    training, evaluation and serving:
//                    truncate to `max_length`, pad to exactly
//                    `max_length` with [PAD].
//
// The built vocabulary is written as HuggingFace tokenizer JSON
// and parsed back with `Tokenizer::from_str`, which sidesteps
// the trainer/ModelWrapper type mismatch in tokenizers 0.15.
//
// Special tokens take the first ids:
//   [PAD]=0  [UNK]=1  [CLS]=2  [SEP]=3  [MASK]=4
//
// Reference: HuggingFace tokenizers JSON format
//            Rust Book §9 (Error Handling)

use anyhow::{anyhow, Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokenizers::{
    normalizers::bert::BertNormalizer, pre_tokenizers::whitespace::Whitespace, NormalizedString,
    Normalizer, OffsetReferential, OffsetType, PaddingParams, PaddingStrategy, PreTokenizedString,
    PreTokenizer, Tokenizer, TruncationParams,
};

use crate::domain::sample::TextEncoding;

pub const PAD_TOKEN: &str = "[PAD]";
pub const SPECIAL_TOKENS: [&str; 5] = [PAD_TOKEN, "[UNK]", "[CLS]", "[SEP]", "[MASK]"];

const TOKENIZER_FILE: &str = "tokenizer.json";

// ─── TokenizerStore ───────────────────────────────────────────────────────────
pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Pick the tokenizer for a training run, in order:
    ///   1. `pretrained` file, if given (copied into the store)
    ///   2. an existing tokenizer.json in the store
    ///   3. a new vocabulary built from `texts`
    pub fn load_or_build(
        &self,
        pretrained: Option<&Path>,
        texts:      &[String],
        vocab_size: usize,
    ) -> Result<Tokenizer> {
        if let Some(path) = pretrained {
            tracing::info!("Using pretrained tokenizer '{}'", path.display());
            let tokenizer = load_file(path)?;
            self.save(&tokenizer)?;
            return Ok(tokenizer);
        }
        if self.path().exists() {
            tracing::info!("Loading existing tokenizer from '{}'", self.path().display());
            return self.load();
        }

        tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
        let tokenizer = build(texts, vocab_size)?;
        self.save(&tokenizer)?;
        Ok(tokenizer)
    }

    pub fn load(&self) -> Result<Tokenizer> {
        load_file(&self.path()).context("Have you run 'train' first?")
    }

    pub fn save(&self, tokenizer: &Tokenizer) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();
        tokenizer
            .save(&path, true)
            .map_err(|e| anyhow!("Cannot write tokenizer to '{}': {e}", path.display()))?;
        tracing::debug!("Saved tokenizer to '{}'", path.display());
        Ok(())
    }
}

fn load_file(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {e}", path.display()))
}

/// Normalizer written into the tokenizer JSON below.
fn bert_normalizer() -> BertNormalizer {
    BertNormalizer::new(true, true, None, true)
}

/// Words exactly as the built tokenizer will see them: normalised,
/// then split on `\w+|[^\w\s]+`.
fn pre_tokenize(text: &str) -> Result<Vec<String>> {
    let mut normalized = NormalizedString::from(text);
    bert_normalizer()
        .normalize(&mut normalized)
        .map_err(|e| anyhow!("Normalisation error: {e}"))?;

    let mut pre = PreTokenizedString::from(normalized);
    Whitespace::default()
        .pre_tokenize(&mut pre)
        .map_err(|e| anyhow!("Pre-tokenisation error: {e}"))?;

    Ok(pre
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(word, _, _)| word.to_string())
        .collect())
}

/// Word-level vocabulary of the `vocab_size - 5` most frequent
/// words in `texts`. Ties are broken alphabetically.
pub fn build(texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for word in pre_tokenize(text)? {
            *freq.entry(word).or_insert(0) += 1;
        }
    }

    let mut words: Vec<(String, usize)> = freq.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS.len()));

    let mut vocab = serde_json::Map::new();
    for (id, tok) in SPECIAL_TOKENS.iter().enumerate() {
        vocab.insert(tok.to_string(), id.into());
    }
    for (word, _) in words {
        if !vocab.contains_key(&word) {
            let id = vocab.len();
            vocab.insert(word, id.into());
        }
    }

    let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
        .iter()
        .enumerate()
        .map(|(id, tok)| {
            serde_json::json!({
                "id": id, "content": tok, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            })
        })
        .collect();

    let json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added_tokens,
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": true
        },
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
    });

    let tokenizer = Tokenizer::from_str(&json.to_string())
        .map_err(|e| anyhow!("Cannot build tokenizer: {e}"))?;
    tracing::info!("Tokenizer built with {} entries", tokenizer.get_vocab_size(true));
    Ok(tokenizer)
}

// ─── TextEncoder ──────────────────────────────────────────────────────────────
/// Tokenizer configured for fixed-length output.
pub struct TextEncoder {
    tokenizer: Tokenizer,
}

impl TextEncoder {
    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        let pad_id = tokenizer.token_to_id(PAD_TOKEN).unwrap_or(0);
        tokenizer
            .with_truncation(Some(TruncationParams { max_length, ..Default::default() }))
            .map_err(|e| anyhow!("Invalid truncation settings: {e}"))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy:  PaddingStrategy::Fixed(max_length),
            pad_id,
            pad_token: PAD_TOKEN.to_string(),
            ..Default::default()
        }));
        Ok(Self { tokenizer })
    }

    /// Ids and mask, both exactly `max_length` long.
    pub fn encode(&self, text: &str) -> Result<TextEncoding> {
        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
        Ok(TextEncoding {
            input_ids:      enc.get_ids().to_vec(),
            attention_mask: enc.get_attention_mask().to_vec(),
        })
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "I feel great today".to_string(),
            "I feel anxious, I can't sleep".to_string(),
            "today is fine".to_string(),
        ]
    }

    #[test]
    fn test_special_ids_come_first() {
        let tok = build(&corpus(), 100).unwrap();
        assert_eq!(tok.token_to_id("[PAD]"), Some(0));
        assert_eq!(tok.token_to_id("[UNK]"), Some(1));
        assert_eq!(tok.token_to_id("[MASK]"), Some(4));
        // most frequent word gets the first free id
        assert_eq!(tok.token_to_id("i"), Some(5));
    }

    #[test]
    fn test_vocab_size_is_capped() {
        let tok = build(&corpus(), 7).unwrap();
        assert_eq!(tok.get_vocab_size(false), 7);
    }

    #[test]
    fn test_fixed_length_encoding() {
        let enc = TextEncoder::new(build(&corpus(), 100).unwrap(), 128).unwrap();

        let short = enc.encode("I feel great today").unwrap();
        assert_eq!(short.input_ids.len(), 128);
        assert_eq!(short.attention_mask.len(), 128);
        assert_eq!(short.real_tokens(), 4);
        assert_eq!(short.input_ids[127], 0);

        let long_text = "today ".repeat(500);
        let long = enc.encode(&long_text).unwrap();
        assert_eq!(long.len(), 128);
        assert_eq!(long.real_tokens(), 128);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let enc = TextEncoder::new(build(&corpus(), 100).unwrap(), 8).unwrap();
        let out = enc.encode("zebra").unwrap();
        assert_eq!(out.input_ids[0], 1);
    }

    #[test]
    fn test_vocab_follows_pre_tokenizer_splits() {
        let tok = build(&corpus(), 100).unwrap();
        assert!(tok.token_to_id("can't").is_none());
        for piece in ["can", "'", "t", "anxious", ","] {
            assert!(tok.token_to_id(piece).is_some(), "missing {piece}");
        }

        let enc = TextEncoder::new(tok, 8).unwrap();
        let out = enc.encode("I can't sleep").unwrap();
        assert_eq!(out.real_tokens(), 5);
        // no [UNK] among the real tokens
        assert!(out.input_ids[..5].iter().all(|&id| id != 1));
    }

    #[test]
    fn test_normalisation_matches_encoding() {
        assert_eq!(pre_tokenize("Café, OK!").unwrap(), vec!["cafe", ",", "ok", "!"]);
    }

    #[test]
    fn test_store_reuses_saved_tokenizer() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let first = store.load_or_build(None, &corpus(), 100).unwrap();
        assert!(store.path().exists());

        // different texts, but the saved file wins
        let second = store
            .load_or_build(None, &["completely new words".to_string()], 100)
            .unwrap();
        assert_eq!(first.get_vocab(true), second.get_vocab(true));
    }

    #[test]
    fn test_missing_tokenizer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TokenizerStore::new(dir.path().join("none")).load().is_err());
    }
}
