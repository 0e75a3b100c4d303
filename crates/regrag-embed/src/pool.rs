use anyhow::{anyhow, ensure, Result};
use candle_core::{DType, Tensor};

/// Mean over unmasked tokens followed by L2 normalization: `[B,T,H]` -> `[B,H]`.
///
/// Rows whose mask is all zeros pool to a zero vector.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _, width) = hidden.dims3().map_err(|e| anyhow!("hidden states must be [B,T,H]: {e}"))?;
    let dtype = hidden.dtype();

    // [B,T] -> [B,T,1] so it broadcasts across the hidden width
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(dtype)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.maximum(1f64)?;
    let mean = summed.broadcast_div(&counts)?;

    let eps = if dtype == DType::F16 { 1e-6 } else { 1e-12 };
    let norms = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    let pooled = mean.broadcast_div(&norms)?;
    ensure!(pooled.dims() == [batch, width], "pooled shape mismatch: {:?}", pooled.dims());
    Ok(pooled)
}
