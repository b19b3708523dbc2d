//! Parsing of the JSON envelopes returned by the device firmware.

use crate::notification::Outcome;
use log::debug;
use serde_json::{Map, Value};
use thiserror::Error;

/// Stand-in reply handed to [`parse_mutation_outcome`] when the POST itself
/// failed and no body exists.
pub const TRANSPORT_ERROR_SENTINEL: &str = "urlerr";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

/// Extract `response[0]` from a GET reply.
pub fn parse_get_envelope(raw: &str) -> Result<Value, EnvelopeError> {
    let mut envelope: Value = serde_json::from_str(raw)?;

    let Some(response) = envelope.get_mut("response") else {
        return Err(EnvelopeError::Shape("missing \"response\"".to_string()));
    };

    match response {
        Value::Array(items) if !items.is_empty() => Ok(items.swap_remove(0)),
        Value::Array(_) => Err(EnvelopeError::Shape("empty \"response\"".to_string())),
        other => Err(EnvelopeError::Shape(format!(
            "\"response\" is not an array: {other}"
        ))),
    }
}

/// Classify a mutation reply as [`Outcome::Ok`] or [`Outcome::Err`].
///
/// Every entry of the top-level container is visited in browser enumeration
/// order and the `result` of the last one decides. Anything but the string
/// `"ok"` there, including a missing `result` or an empty container, is a
/// failure.
pub fn parse_mutation_outcome(raw: &str) -> Result<Outcome, EnvelopeError> {
    if raw == TRANSPORT_ERROR_SENTINEL {
        return Ok(Outcome::Err);
    }

    let reply: Value = serde_json::from_str(raw)?;

    let entries: Vec<(String, &Value)> = match &reply {
        Value::Object(map) => enumeration_order(map),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (i.to_string(), item))
            .collect(),
        other => {
            return Err(EnvelopeError::Shape(format!(
                "mutation reply is not a container: {other}"
            )));
        }
    };

    let mut result = None;
    for (key, value) in entries {
        let Some(first) = value.get(0) else {
            return Err(EnvelopeError::Shape(format!(
                "entry {key:?} has no first element"
            )));
        };
        result = first.get("result");
    }

    debug!("mutation result: {result:?}");

    Ok(match result {
        Some(Value::String(s)) if s == "ok" => Outcome::Ok,
        _ => Outcome::Err,
    })
}

/// Keys of `map` in the order a browser enumerates object properties:
/// array-index keys ascending, then every other key in document order.
fn enumeration_order(map: &Map<String, Value>) -> Vec<(String, &Value)> {
    let mut indices = Vec::new();
    let mut names = Vec::new();

    for (key, value) in map {
        match array_index(key) {
            Some(i) => indices.push((i, key.clone(), value)),
            None => names.push((key.clone(), value)),
        }
    }

    indices.sort_by_key(|(i, _, _)| *i);
    indices
        .into_iter()
        .map(|(_, key, value)| (key, value))
        .chain(names)
        .collect()
}

/// Canonical array index: decimal without leading zeros, below 2^32 - 1.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|i| *i != u32::MAX)
}
