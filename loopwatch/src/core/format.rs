//! Artifact format detection.

use serde_json::Value;

use crate::core::types::OutputFormat;

/// Detected artifact payload. JSON documents carry their parsed value so the
/// normalizer does not parse twice.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Json(Value),
    Text,
}

impl Classified {
    pub fn format(&self) -> OutputFormat {
        match self {
            Classified::Json(_) => OutputFormat::Json,
            Classified::Text => OutputFormat::Text,
        }
    }
}

/// Classify raw artifact bytes.
///
/// Only payloads whose first non-whitespace byte is `{` or `[` are parsed, and
/// any parse failure falls back to text. Never errors.
pub fn classify(content: &[u8]) -> Classified {
    let first = content.iter().find(|byte| !byte.is_ascii_whitespace());
    if !matches!(first, Some(b'{') | Some(b'[')) {
        return Classified::Text;
    }
    match serde_json::from_slice::<Value>(content) {
        Ok(value) => Classified::Json(value),
        Err(_) => Classified::Text,
    }
}

pub fn detect_format(content: &[u8]) -> OutputFormat {
    classify(content).format()
}
