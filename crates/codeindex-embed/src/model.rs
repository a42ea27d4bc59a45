use anyhow::{anyhow, ensure, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use codeindex_core::{Embedder, Error};

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::encode_batch;

pub const BGE_M3_DIM: usize = 1024;
const MAX_TOKENS: usize = 256;

/// BGE-M3 sentence embeddings: XLM-RoBERTa hidden states, masked mean pooled
/// and L2-normalized.
pub struct BgeM3Embedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl BgeM3Embedder {
    /// Loads `tokenizer.json`, `config.json` and `pytorch_model.bin` from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading BGE-M3 model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let weights: HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        info!("BGE-M3 model loaded");
        Ok(Self { model, tokenizer, device })
    }

    /// One forward pass and one pooling step for the whole batch.
    fn forward(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let batch = encode_batch(&self.tokenizer, texts, MAX_TOKENS, &self.device)?;
        let token_type_ids = batch.input_ids.zeros_like()?;
        let hidden = self.model.forward(&batch.input_ids, &batch.attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        ensure!(vectors.len() == texts.len(), "expected {} embeddings, model produced {}", texts.len(), vectors.len());
        ensure!(
            vectors.iter().all(|v| v.len() == BGE_M3_DIM),
            "expected {} dimensions per embedding",
            BGE_M3_DIM
        );

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if elapsed_ms > 100 * texts.len() as u64 {
            warn!(elapsed_ms, batch = texts.len(), "slow embedding batch");
        } else {
            debug!(elapsed_ms, batch = texts.len(), "embedded batch");
        }
        Ok(vectors)
    }
}

impl Embedder for BgeM3Embedder {
    fn dim(&self) -> usize {
        BGE_M3_DIM
    }

    fn embed(&self, text: &str) -> codeindex_core::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::Embedding("model returned no embedding".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> codeindex_core::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.forward(texts).map_err(|e| Error::Embedding(format!("{e:#}")))
    }
}
