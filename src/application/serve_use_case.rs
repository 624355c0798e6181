// ============================================================
// Layer 2 — ServeUseCase
// ============================================================
// Restores the predictor once, then hands it to the HTTP
// service on a multi-threaded tokio runtime. The CLI stays
// synchronous; only this use case owns a runtime.
//
// Reference: tokio Runtime documentation, axum 0.7 (serve)

use anyhow::{bail, Context, Result};
use burn::prelude::Backend;
use std::{net::SocketAddr, path::PathBuf};

use crate::infra::checkpoint::{CheckpointManager, BASELINE};
use crate::ml::{default_device, inferencer::Predictor, InferBackend};
use crate::server::{self, ServerConfig, ServiceContext};

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub checkpoint_dir: PathBuf,
    pub checkpoint:     String,
    pub address:        SocketAddr,
    pub cors_origin:    String,
    /// Reported by `GET /`
    pub model_name:     String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        let server = ServerConfig::default();
        Self {
            checkpoint_dir: PathBuf::from("checkpoints"),
            checkpoint:     BASELINE.to_string(),
            address:        server.address,
            cors_origin:    server.cors_origin,
            model_name:     "Multimodal Text Classifier".to_string(),
        }
    }
}

pub struct ServeUseCase {
    config: ServeConfig,
}

impl ServeUseCase {
    pub fn new(config: ServeConfig) -> Self {
        Self { config }
    }

    /// Blocks until the server stops.
    pub fn execute(self) -> Result<()> {
        let ctx = self.context::<InferBackend>(default_device())?;
        let cfg = self.config;
        let server_cfg = ServerConfig { address: cfg.address, cors_origin: cfg.cors_origin };

        let runtime = tokio::runtime::Runtime::new().context("Cannot start tokio runtime")?;
        runtime.block_on(server::serve(server_cfg, ctx))
    }

    /// Restore the predictor from the checkpoint directory.
    pub fn context<B: Backend>(&self, device: B::Device) -> Result<ServiceContext<B>> {
        let cfg  = &self.config;
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        if !ckpt.has_model(&cfg.checkpoint) {
            bail!(
                "No checkpoint '{}' in '{}'. Have you run 'train' first?",
                cfg.checkpoint,
                cfg.checkpoint_dir.display()
            );
        }

        let predictor = Predictor::<B>::from_checkpoint(&ckpt, &cfg.checkpoint, device)?;
        Ok(ServiceContext::new(predictor, cfg.model_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::tests::train_tiny_checkpoint;
    use burn::backend::NdArray;

    #[test]
    fn test_defaults_match_server() {
        let cfg = ServeConfig::default();
        assert_eq!(cfg.address.port(), 8000);
        assert_eq!(cfg.cors_origin, "http://localhost:3000");
        assert_eq!(cfg.checkpoint, "text_baseline");
    }

    #[test]
    fn test_missing_checkpoint_fails_before_binding() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = ServeConfig { checkpoint_dir: tmp.path().to_path_buf(), ..ServeConfig::default() };
        let err = ServeUseCase::new(cfg).execute().unwrap_err();
        assert!(err.to_string().contains("train"));
    }

    #[test]
    fn test_context_loads_a_trained_checkpoint() {
        let tmp   = tempfile::tempdir().unwrap();
        let train = train_tiny_checkpoint(tmp.path());
        let cfg   = ServeConfig { checkpoint_dir: train.checkpoint_dir, ..ServeConfig::default() };

        let ctx = ServeUseCase::new(cfg).context::<NdArray>(Default::default()).unwrap();
        assert_eq!(ctx.model_name(), "Multimodal Text Classifier");
        assert!(ctx.predict("tense night").unwrap() < 3);
    }
}
