//! Normalization of structured agent responses.
//!
//! Three JSON shapes are accepted and mapped into one [`NormalizedResponse`]:
//!
//! - **Flat**: top-level `status`, `exit_signal`, `work_type`, `files_modified`,
//!   `error_count`, `summary`, `session_id`, `loop_number`, `confidence`.
//! - **Object**: `result` text plus a nested `metadata` object
//!   (`completion_status`, `files_changed`, `has_errors`, `session_id`,
//!   `loop_number`, `progress_indicators`). The `result` text may embed a
//!   status block.
//! - **Array**: a stream of typed records; the last `type == "result"` record
//!   is authoritative and the `system`/`init` record supplies a fallback
//!   session id.

use serde_json::{Map, Value};

use crate::core::status_block;
use crate::core::types::{NormalizedResponse, Thresholds, WorkStatus, truncate_chars};

const RESULT_BONUS: i64 = 20;
const PROGRESS_INDICATOR_BONUS: i64 = 5;
const CERTAIN_CONFIDENCE: i64 = 100;
const TEST_ONLY_WORK_TYPE: &str = "TEST_ONLY";

/// Structural classification of a parsed JSON document.
#[derive(Debug, Clone, Copy)]
pub enum JsonShape<'a> {
    Flat(&'a Map<String, Value>),
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
}

impl<'a> JsonShape<'a> {
    /// Probe the document structure. Scalars have no shape.
    pub fn probe(value: &'a Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(JsonShape::Array(items)),
            Value::Object(map) if map.contains_key("result") || map.contains_key("metadata") => {
                Some(JsonShape::Object(map))
            }
            Value::Object(map) => Some(JsonShape::Flat(map)),
            _ => None,
        }
    }
}

/// Normalize any supported document. Unsupported shapes yield defaults.
pub fn normalize(value: &Value, thresholds: &Thresholds) -> NormalizedResponse {
    let draft = match JsonShape::probe(value) {
        Some(JsonShape::Flat(map)) => flat_draft(map),
        Some(JsonShape::Object(map)) => object_draft(map, thresholds),
        Some(JsonShape::Array(items)) => array_draft(items, thresholds),
        None => Draft::default(),
    };
    draft.finish(thresholds)
}

/// Intermediate accumulator; resolution rules are applied once in `finish`.
#[derive(Debug, Clone, Default)]
struct Draft {
    status: WorkStatus,
    exit_signal: bool,
    work_type: String,
    files_modified: u32,
    error_count: Option<u32>,
    has_errors: bool,
    summary: Option<String>,
    session_id: Option<String>,
    loop_number: u32,
    confidence: i64,
}

impl Draft {
    fn finish(self, thresholds: &Thresholds) -> NormalizedResponse {
        let error_count = match self.error_count {
            Some(count) => count,
            None if self.has_errors => 1,
            None => 0,
        };
        // Bonuses accumulated above are discarded when exit is certain.
        let confidence = if self.exit_signal {
            CERTAIN_CONFIDENCE
        } else {
            self.confidence
        };
        let summary = self
            .summary
            .map(|summary| truncate_chars(summary.trim(), thresholds.summary_max_chars))
            .unwrap_or_default();

        NormalizedResponse {
            status: self.status,
            exit_signal: self.exit_signal,
            is_test_only: self.work_type == TEST_ONLY_WORK_TYPE,
            work_type: self.work_type,
            files_modified: self.files_modified,
            error_count,
            summary,
            session_id: self.session_id,
            loop_number: self.loop_number,
            confidence,
            has_completion_signal: self.status == WorkStatus::Complete || self.exit_signal,
            is_stuck: error_count > thresholds.stuck_error_count,
        }
    }
}

fn flat_draft(map: &Map<String, Value>) -> Draft {
    Draft {
        status: str_field(map, "status")
            .map(WorkStatus::parse)
            .unwrap_or_default(),
        exit_signal: bool_field(map, "exit_signal").unwrap_or(false),
        work_type: str_field(map, "work_type").unwrap_or_default().to_string(),
        files_modified: u32_field(map, "files_modified").unwrap_or(0),
        error_count: u32_field(map, "error_count"),
        has_errors: false,
        summary: str_field(map, "summary").map(str::to_string),
        session_id: session_field(map, &["session_id"]),
        loop_number: u32_field(map, "loop_number").unwrap_or(0),
        confidence: i64_field(map, "confidence").unwrap_or(0),
    }
}

fn object_draft(map: &Map<String, Value>, thresholds: &Thresholds) -> Draft {
    let mut draft = flat_draft(map);
    if let Some(id) = session_field(map, &["sessionId", "session_id"]) {
        draft.session_id = Some(id);
    }

    if let Some(metadata) = map.get("metadata").and_then(Value::as_object) {
        apply_metadata(&mut draft, metadata);
    }

    if let Some(result) = map.get("result") {
        draft.confidence = draft.confidence.saturating_add(RESULT_BONUS);
        if let Some(text) = result.as_str() {
            if let Some(block) = status_block::decode(text) {
                if block.resolved_exit() {
                    draft.exit_signal = true;
                }
                if draft.status == WorkStatus::Unknown {
                    draft.status = block.status.unwrap_or_default();
                }
            }
            if draft.summary.is_none() && !text.trim().is_empty() {
                draft.summary = Some(truncate_chars(text.trim(), thresholds.summary_max_chars));
            }
        }
    }

    if bool_field(map, "is_error") == Some(true) {
        draft.has_errors = true;
    }
    draft
}

fn apply_metadata(draft: &mut Draft, metadata: &Map<String, Value>) {
    if let Some(status) = str_field(metadata, "completion_status") {
        let parsed = WorkStatus::parse(status);
        if parsed != WorkStatus::Unknown {
            draft.status = parsed;
        }
    }
    if let Some(files) = u32_field(metadata, "files_changed") {
        draft.files_modified = files;
    }
    if bool_field(metadata, "has_errors") == Some(true) {
        draft.has_errors = true;
    }
    if draft.session_id.is_none() {
        draft.session_id = session_field(metadata, &["session_id"]);
    }
    if let Some(loop_number) = u32_field(metadata, "loop_number") {
        draft.loop_number = loop_number;
    }
    if let Some(exit) = bool_field(metadata, "exit_signal") {
        draft.exit_signal |= exit;
    }
    if let Some(indicators) = metadata.get("progress_indicators").and_then(Value::as_array) {
        let bonus = PROGRESS_INDICATOR_BONUS.saturating_mul(indicators.len() as i64);
        draft.confidence = draft.confidence.saturating_add(bonus);
    }
}

fn array_draft(items: &[Value], thresholds: &Thresholds) -> Draft {
    let init_session = items
        .iter()
        .filter_map(Value::as_object)
        .filter(|record| {
            str_field(record, "type") == Some("system") && str_field(record, "subtype") == Some("init")
        })
        .find_map(|record| session_field(record, &["session_id", "sessionId"]));

    let result = items
        .iter()
        .rev()
        .filter_map(Value::as_object)
        .find(|record| str_field(record, "type") == Some("result"));

    let mut draft = match result {
        Some(record) => object_draft(record, thresholds),
        None => Draft::default(),
    };
    if draft.session_id.is_none() {
        draft.session_id = init_session;
    }
    draft
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn session_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| str_field(map, key))
        .map(str::trim)
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

fn bool_field(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(flag) => Some(*flag),
        Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn i64_field(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

fn u32_field(map: &Map<String, Value>, key: &str) -> Option<u32> {
    i64_field(map, key).map(|value| value.clamp(0, u32::MAX as i64) as u32)
}
