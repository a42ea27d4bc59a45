use anyhow::{ensure, Result};
use candle_core::Tensor;

/// Floor for token counts and norms, so fully padded rows pool to zero instead of NaN.
const EPS: f32 = 1e-6;

/// Masked mean over the token axis, then L2-normalized per row.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]` (any numeric dtype);
/// the result is `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, hidden_dim) = match hidden.dims() {
        &[b, t, h] => (b, t, h),
        other => anyhow::bail!("hidden shape must be [B,T,H], got {:?}", other),
    };
    ensure!(
        attention_mask.dims() == [batch, tokens],
        "attention mask shape {:?} does not match hidden {:?}",
        attention_mask.dims(),
        hidden.dims()
    );

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(EPS, f32::MAX)?;
    let mean = summed.broadcast_div(&counts)?;
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(EPS, f32::MAX)?;
    let pooled = mean.broadcast_div(&norm)?;
    ensure!(pooled.dims() == [batch, hidden_dim], "pooled shape mismatch: {:?}", pooled.dims());
    Ok(pooled)
}
