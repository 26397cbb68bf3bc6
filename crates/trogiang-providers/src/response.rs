//! Response-shape negotiation for embedding and chat replies.
//!
//! OpenAI-compatible servers disagree on small details of the reply body;
//! these helpers accept every shape we have seen and normalise it.

use serde_json::Value;
use trogiang_core::error::{Result, TroGiangError};
use trogiang_core::traits::Embedding;

fn as_vector(value: &Value) -> Option<Embedding> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32).filter(|f| f.is_finite()))
        .collect()
}

/// Extract embeddings from a reply body, in input order.
///
/// Accepted shapes:
/// - `{"data": [{"embedding": [..], "index": n}]}` (OpenAI; re-ordered by index)
/// - `{"embeddings": [{"values": [..]}]}` (Gemini native)
/// - `{"embeddings": [[..], ..]}` (Ollama native)
/// - `{"embedding": {"values": [..]}}` or `{"embedding": [..]}` (single input)
pub fn parse_embeddings(json: &Value) -> Result<Vec<Embedding>> {
    if let Some(data) = json["data"].as_array() {
        let mut rows = data
            .iter()
            .enumerate()
            .map(|(pos, item)| {
                let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(pos);
                as_vector(&item["embedding"])
                    .map(|v| (index, v))
                    .ok_or_else(|| malformed("data[].embedding"))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.sort_by_key(|(index, _)| *index);
        return Ok(rows.into_iter().map(|(_, v)| v).collect());
    }

    if let Some(items) = json["embeddings"].as_array() {
        return items
            .iter()
            .map(|item| {
                as_vector(&item["values"])
                    .or_else(|| as_vector(item))
                    .ok_or_else(|| malformed("embeddings[]"))
            })
            .collect();
    }

    let single = &json["embedding"];
    if !single.is_null() {
        let vector = as_vector(&single["values"])
            .or_else(|| as_vector(single))
            .ok_or_else(|| malformed("embedding"))?;
        return Ok(vec![vector]);
    }

    Err(malformed("body"))
}

/// Extract the answer text from a chat reply, if any.
///
/// Reads `choices[0].message.content`, then falls back to joining
/// `candidates[].content.parts[].text`.
pub fn parse_answer(json: &Value) -> Option<String> {
    if let Some(content) = json["choices"][0]["message"]["content"].as_str() {
        let content = content.trim();
        if !content.is_empty() {
            return Some(content.to_string());
        }
    }

    let parts: Vec<&str> = json["candidates"]
        .as_array()?
        .iter()
        .filter_map(|c| c["content"]["parts"].as_array())
        .flatten()
        .filter_map(|p| p["text"].as_str())
        .collect();
    let joined = parts.join("\n");
    let joined = joined.trim();
    if joined.is_empty() {
        None
    } else {
        Some(joined.to_string())
    }
}

fn malformed(what: &str) -> TroGiangError {
    TroGiangError::Provider(format!("unexpected embedding response shape at {what}"))
}
