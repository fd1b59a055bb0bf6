//! Plain-text rendering of outcomes and health for the terminal.

use std::fmt::Write as _;

use serde_json::Value;

use crate::error::ClientError;
use crate::health::HealthStatus;
use crate::messages::{ResponseView, Table, RAW_TEXT_KEY};
use crate::session::Outcome;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Append the full payload after the extracted answer.
    pub show_payload: bool,
}

/// Where a rendered block belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Out,
    Warn,
    Err,
}

/// Rendered text plus the stream it should go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub channel: Channel,
    pub text: String,
}

pub fn render_outcome(outcome: &Outcome, opts: RenderOptions) -> Rendered {
    match outcome {
        Outcome::Warning(e) => Rendered {
            channel: Channel::Warn,
            text: warning_text(e),
        },
        Outcome::Failed(e) => Rendered {
            channel: Channel::Err,
            text: error_text(e),
        },
        Outcome::Answered(response) => {
            let view = response.view();
            let channel = match view {
                ResponseView::BackendError { .. } => Channel::Err,
                _ => Channel::Out,
            };
            Rendered {
                channel,
                text: render_view(&view, opts),
            }
        }
    }
}

fn warning_text(e: &ClientError) -> String {
    match e {
        ClientError::NotConfigured => "Set the backend URL first.".into(),
        ClientError::Validation => "Type a question.".into(),
        other => other.to_string(),
    }
}

fn error_text(e: &ClientError) -> String {
    match e {
        ClientError::HttpStatus { status, body } => {
            format!("Backend HTTP {}\n{}", status, body)
        }
        other => other.to_string(),
    }
}

pub fn render_view(view: &ResponseView, opts: RenderOptions) -> String {
    let mut out = String::new();
    match view {
        ResponseView::BackendError { message, payload } => {
            let _ = writeln!(out, "Backend error: {}", message);
            if opts.show_payload {
                push_payload(&mut out, payload);
            }
        }
        ResponseView::Structured {
            answer,
            cypher,
            table,
            took_ms,
            ..
        } => {
            if let Some(answer) = answer {
                let _ = writeln!(out, "Response:");
                let _ = writeln!(out, "{}", display_value(answer));
                out.push('\n');
            }
            if let Some(cypher) = cypher {
                let _ = writeln!(out, "Cypher:");
                for line in cypher.lines() {
                    let _ = writeln!(out, "  {}", line);
                }
                out.push('\n');
            }
            if table.is_empty() {
                let _ = writeln!(out, "No rows returned.");
            } else {
                out.push_str(&render_table(table));
            }
            let rows = table.rows.len();
            match took_ms {
                Some(ms) => {
                    let _ = writeln!(out, "({} row{}, {} ms)", rows, plural(rows), ms);
                }
                None => {
                    let _ = writeln!(out, "({} row{})", rows, plural(rows));
                }
            }
            if opts.show_payload {
                push_payload(&mut out, view.payload());
            }
        }
        ResponseView::Answer { value, payload, .. } => {
            let _ = writeln!(out, "Response:");
            let _ = writeln!(out, "{}", display_value(value));
            if opts.show_payload {
                push_payload(&mut out, payload);
            }
        }
        ResponseView::Raw { payload } => {
            let _ = writeln!(out, "Response (raw payload):");
            match payload.get(RAW_TEXT_KEY).and_then(Value::as_str) {
                Some(text) if payload.as_object().is_some_and(|m| m.len() == 1) => {
                    let _ = writeln!(out, "{}", text);
                }
                _ => {
                    let _ = writeln!(out, "{}", pretty(payload));
                }
            }
        }
    }
    out
}

pub fn render_health(status: &HealthStatus) -> Rendered {
    let (channel, mark) = if status.healthy {
        (Channel::Out, "ok")
    } else {
        (Channel::Warn, "unavailable")
    };
    Rendered {
        channel,
        text: format!("Backend {}: {}", mark, status.detail),
    }
}

/// Column-aligned table with a header rule.
pub fn render_table(table: &Table) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|c| c.as_ref().map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(col.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, table.columns.iter().map(String::as_str), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, rule.iter().map(String::as_str), &widths);
    for row in &cells {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(c, w)| {
            let pad = w.saturating_sub(c.chars().count());
            format!("{}{}", c, " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(out, "{}", line.join(" | ").trim_end());
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.replace('\n', " "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => pretty(other),
    }
}

fn push_payload(out: &mut String, payload: &Value) {
    let _ = writeln!(out, "\nFull payload:\n{}", pretty(payload));
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
