use anyhow::{Result, anyhow};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Pad id used by XLM-RoBERTa tokenizers.
const PAD_ID: u32 = 1;

/// Encode `text` into fixed-length `[1, max_len]` id and mask tensors (truncated or padded).
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); }
    if ids.len() < max_len { let pad = max_len - ids.len(); ids.extend(std::iter::repeat(PAD_ID).take(pad)); mask.extend(std::iter::repeat(0).take(pad)); }
    let input_ids = Tensor::from_iter(ids, device)?.reshape((1, max_len))?;
    let attention_mask = Tensor::from_iter(mask, device)?.reshape((1, max_len))?;
    Ok((input_ids, attention_mask))
}

/// Encode a (query, passage) pair for a cross-encoder: ids, token type ids and mask, each `[1, T]`.
/// Sequences longer than `max_len` are cut from the end.
pub fn tokenize_pair_on_device(tokenizer: &Tokenizer, query: &str, passage: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor, Tensor)> {
    let enc = tokenizer.encode((query, passage), true).map_err(|e| anyhow!("Pair tokenization failed: {}", e))?;
    let len = enc.get_ids().len().min(max_len);
    let ids = &enc.get_ids()[..len];
    let type_ids = &enc.get_type_ids()[..len];
    let mask = &enc.get_attention_mask()[..len];
    let input_ids = Tensor::new(ids, device)?.unsqueeze(0)?;
    let token_type_ids = Tensor::new(type_ids, device)?.unsqueeze(0)?;
    let attention_mask = Tensor::new(mask, device)?.unsqueeze(0)?;
    Ok((input_ids, token_type_ids, attention_mask))
}
