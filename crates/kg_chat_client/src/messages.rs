//! Backend message types. Client → backend JSON and the normalized views the
//! display layer renders from backend payloads.

use serde::Serialize;
use serde_json::{Map, Value};

/// Flat-variant keys, highest priority first.
pub const ANSWER_KEYS: &[&str] = &["answer", "output", "response", "message", "text", "result"];

/// Key used when a 2xx body is not JSON.
pub const RAW_TEXT_KEY: &str = "raw_text";

/// Client → backend: question body, `{"text": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub text: &'a str,
}

impl<'a> QueryRequest<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }
}

/// Backend → client: successful answer payload.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    /// Full payload, including `meta.took_ms` for structured responses.
    pub payload: Value,
    /// Measured round trip in milliseconds.
    pub took_ms: u64,
    /// The body was not JSON and was wrapped as `{"raw_text": ...}`.
    pub degraded: bool,
}

impl QueryResponse {
    /// Build from a 2xx body. Non-JSON bodies degrade to `{"raw_text": body}`.
    pub fn from_body(body: &str, took_ms: u64) -> Self {
        let (mut payload, degraded) = match serde_json::from_str::<Value>(body) {
            Ok(value) => (value, false),
            Err(_) => {
                let mut map = Map::new();
                map.insert(RAW_TEXT_KEY.into(), Value::String(body.to_string()));
                (Value::Object(map), true)
            }
        };
        if is_structured(&payload) {
            stamp_took_ms(&mut payload, took_ms);
        }
        Self {
            payload,
            took_ms,
            degraded,
        }
    }

    pub fn view(&self) -> ResponseView {
        normalize(&self.payload)
    }
}

fn is_structured(payload: &Value) -> bool {
    payload.get("cypher").is_some() || rows_of(payload).is_some()
}

fn rows_of(payload: &Value) -> Option<&Vec<Value>> {
    payload.get("answer")?.get("rows")?.as_array()
}

/// Insert `meta.took_ms` unless the backend already reported one.
fn stamp_took_ms(payload: &mut Value, took_ms: u64) {
    let Some(obj) = payload.as_object_mut() else {
        return;
    };
    let meta = obj
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(meta) = meta.as_object_mut() {
        meta.entry("took_ms").or_insert_with(|| Value::from(took_ms));
    }
}

/// Tabular rows from `answer.rows`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names in first-seen order across all records.
    pub columns: Vec<String>,
    /// One cell per column; `None` where a record lacks the column.
    pub rows: Vec<Vec<Option<Value>>>,
}

impl Table {
    pub fn from_records(records: &[Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            match record {
                Value::Object(map) => {
                    for key in map.keys() {
                        if !columns.iter().any(|c| c == key) {
                            columns.push(key.clone());
                        }
                    }
                }
                _ => {
                    if !columns.iter().any(|c| c == "value") {
                        columns.push("value".into());
                    }
                }
            }
        }
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|col| match record {
                        Value::Object(map) => map.get(col).cloned(),
                        other if col == "value" => Some(other.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All cells of `column`, in row order.
    pub fn column(&self, column: &str) -> Option<Vec<Option<&Value>>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.rows.iter().map(|row| row[idx].as_ref()).collect())
    }
}

/// Display-ready shape of a backend payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseView {
    /// Payload carries an `error` field; normal rendering is suppressed.
    BackendError { message: String, payload: Value },
    /// `cypher` / `answer.rows` variant.
    Structured {
        /// Natural-language `answer` when it is not the `{rows: [...]}` object.
        answer: Option<Value>,
        cypher: Option<String>,
        table: Table,
        took_ms: Option<u64>,
        payload: Value,
    },
    /// Flat variant: the first matching answer key.
    Answer {
        key: &'static str,
        value: Value,
        payload: Value,
    },
    /// Nothing recognized; show the payload verbatim.
    Raw { payload: Value },
}

impl ResponseView {
    /// The full payload, whatever the variant.
    pub fn payload(&self) -> &Value {
        match self {
            ResponseView::BackendError { payload, .. }
            | ResponseView::Structured { payload, .. }
            | ResponseView::Answer { payload, .. }
            | ResponseView::Raw { payload } => payload,
        }
    }
}

type Extractor = fn(&Value) -> Option<ResponseView>;

/// Tried in order; first match wins.
const EXTRACTORS: &[Extractor] = &[extract_backend_error, extract_structured, extract_answer];

/// Map a payload onto a [`ResponseView`], falling back to [`ResponseView::Raw`].
pub fn normalize(payload: &Value) -> ResponseView {
    EXTRACTORS
        .iter()
        .find_map(|extract| extract(payload))
        .unwrap_or_else(|| ResponseView::Raw {
            payload: payload.clone(),
        })
}

fn extract_backend_error(payload: &Value) -> Option<ResponseView> {
    let error = payload.get("error")?;
    let message = match error {
        Value::Null => return None,
        Value::String(s) if s.trim().is_empty() => return None,
        Value::Bool(false) => return None,
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("message").and_then(Value::as_str) {
            Some(m) => m.to_string(),
            None => error.to_string(),
        },
        other => other.to_string(),
    };
    Some(ResponseView::BackendError {
        message,
        payload: payload.clone(),
    })
}

fn extract_structured(payload: &Value) -> Option<ResponseView> {
    let cypher = payload.get("cypher").and_then(Value::as_str).map(str::to_string);
    let rows = rows_of(payload);
    if cypher.is_none() && rows.is_none() {
        return None;
    }
    let table = rows.map(|r| Table::from_records(r)).unwrap_or_default();
    let answer = match payload.get("answer") {
        Some(value) if rows.is_none() && !is_blank(value) => Some(value.clone()),
        _ => None,
    };
    let took_ms = payload
        .get("meta")
        .and_then(|m| m.get("took_ms"))
        .and_then(Value::as_u64);
    Some(ResponseView::Structured {
        answer,
        cypher,
        table,
        took_ms,
        payload: payload.clone(),
    })
}

fn extract_answer(payload: &Value) -> Option<ResponseView> {
    let map = payload.as_object()?;
    // First present key wins; a blank value there means no answer at all.
    let (key, value) = ANSWER_KEYS
        .iter()
        .find_map(|key| map.get(*key).map(|value| (*key, value)))?;
    if is_blank(value) {
        return None;
    }
    Some(ResponseView::Answer {
        key,
        value: value.clone(),
        payload: payload.clone(),
    })
}

/// Values that would render as nothing.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}
