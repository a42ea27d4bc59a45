use anyhow::{anyhow, ensure, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// `<pad>` in the XLM-RoBERTa vocabulary.
const PAD_ID: u32 = 1;

/// Token ids and attention mask for a batch, both `[B, T]`.
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
}

/// Encodes `texts` into one padded batch. `T` is the longest encoding in the
/// batch, capped at `max_len`; longer inputs are truncated.
pub fn encode_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<EncodedBatch> {
    ensure!(!texts.is_empty(), "cannot encode an empty batch");
    ensure!(max_len > 0, "max_len must be greater than zero");

    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let len = enc.get_ids().len().min(max_len);
        rows.push((enc.get_ids()[..len].to_vec(), enc.get_attention_mask()[..len].to_vec()));
    }
    let seq_len = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);

    let mut ids = Vec::with_capacity(texts.len() * seq_len);
    let mut mask = Vec::with_capacity(texts.len() * seq_len);
    for (mut row_ids, mut row_mask) in rows {
        row_ids.resize(seq_len, PAD_ID);
        row_mask.resize(seq_len, 0);
        ids.extend(row_ids);
        mask.extend(row_mask);
    }
    Ok(EncodedBatch {
        input_ids: Tensor::from_vec(ids, (texts.len(), seq_len), device)?,
        attention_mask: Tensor::from_vec(mask, (texts.len(), seq_len), device)?,
    })
}
