//! Diagnostic payload rendering.
//!
//! A diagnostic block usually carries an `{expected, actual}` comparison; the
//! strategy is picked by value shape, in priority order:
//!
//!   1. shapes differ            → type-mismatch message naming both
//!   2. both structured          → structural leaf-path diff
//!   3. both strings             → character diff with visible whitespace
//!   4. both primitive           → plain "Expected X, but got Y"
//!
//! The alternate `{operator: "error", stack}` shape renders the stack trace
//! (minus its first line) muted. Payloads carrying neither shape render
//! nothing at all.

use serde_yaml::Value;

use crate::style::{pad, style_span, TokenKind};

const DIAG_INDENT: usize = 6;

/// Render a decoded diagnostic payload; empty when the payload carries
/// neither an expected/actual pair nor an error stack.
#[must_use]
pub fn render_diagnostic(payload: &Value, use_color: bool) -> Vec<String> {
    if let (Some(expected), Some(actual)) = (payload.get("expected"), payload.get("actual")) {
        return render_comparison(expected, actual, use_color);
    }
    if payload.get("operator").and_then(Value::as_str) == Some("error") {
        if let Some(stack) = payload.get("stack").and_then(Value::as_str) {
            return render_stack(stack, use_color);
        }
    }
    Vec::new()
}

fn render_comparison(expected: &Value, actual: &Value, use_color: bool) -> Vec<String> {
    let expected_shape = shape_name(expected);
    let actual_shape = shape_name(actual);

    if expected_shape != actual_shape {
        let message = format!(
            "Expected {expected_shape} ({}), but got {actual_shape} ({})",
            display_value(expected),
            display_value(actual)
        );
        return vec![pad(
            &style_span(&message, TokenKind::Mismatch, use_color),
            DIAG_INDENT,
        )];
    }

    match expected_shape {
        "object" => structural_diff(expected, actual)
            .into_iter()
            .map(|line| {
                let kind = match line.kind {
                    DiffLineKind::Same => TokenKind::Muted,
                    DiffLineKind::Added => TokenKind::Pass,
                    DiffLineKind::Removed => TokenKind::Fail,
                };
                pad(&style_span(&line.text, kind, use_color), DIAG_INDENT)
            })
            .collect(),
        "string" => {
            let rendered: String = char_diff(
                expected.as_str().unwrap_or_default(),
                actual.as_str().unwrap_or_default(),
            )
            .iter()
            .map(|span| match span.kind {
                SpanKind::Same => span.text.clone(),
                SpanKind::Added => {
                    style_span(&mark_whitespace(&span.text), TokenKind::DiffAdd, use_color)
                }
                SpanKind::Removed => {
                    style_span(&mark_whitespace(&span.text), TokenKind::DiffDel, use_color)
                }
            })
            .collect();
            vec![pad(&rendered, DIAG_INDENT)]
        }
        _ => {
            let message = format!(
                "Expected {}, but got {}",
                display_value(expected),
                display_value(actual)
            );
            vec![pad(
                &style_span(&message, TokenKind::Mismatch, use_color),
                DIAG_INDENT,
            )]
        }
    }
}

fn render_stack(stack: &str, use_color: bool) -> Vec<String> {
    stack
        .lines()
        .skip(1)
        .map(|line| pad(&style_span(line, TokenKind::Muted, use_color), DIAG_INDENT))
        .collect()
}

/// Runtime shape of a decoded value, in the vocabulary the mismatch message
/// uses. Null stands for the absent/undefined value.
fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "undefined",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => "object",
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "undefined".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| format!("{other:?}")),
    }
}

// ---------------------------------------------------------------------------
// Structural diff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffLineKind {
    Same,
    Added,
    Removed,
}

#[derive(Debug)]
struct DiffLine {
    kind: DiffLineKind,
    text: String,
}

/// Compare two structured values leaf-by-leaf. Paths present in both with
/// equal values render unchanged; differing or one-sided paths render as
/// removed (expected side) and added (actual side) lines.
fn structural_diff(expected: &Value, actual: &Value) -> Vec<DiffLine> {
    let mut left = Vec::new();
    flatten(expected, "", &mut left);
    let mut right = Vec::new();
    flatten(actual, "", &mut right);

    let mut lines = Vec::new();
    for (path, value) in &left {
        match right.iter().find(|(other_path, _)| other_path == path) {
            Some((_, other)) if other == value => lines.push(DiffLine {
                kind: DiffLineKind::Same,
                text: format!("{path}: {}", display_value(value)),
            }),
            Some((_, other)) => {
                lines.push(DiffLine {
                    kind: DiffLineKind::Removed,
                    text: format!("- {path}: {}", display_value(value)),
                });
                lines.push(DiffLine {
                    kind: DiffLineKind::Added,
                    text: format!("+ {path}: {}", display_value(other)),
                });
            }
            None => lines.push(DiffLine {
                kind: DiffLineKind::Removed,
                text: format!("- {path}: {}", display_value(value)),
            }),
        }
    }
    for (path, value) in &right {
        if !left.iter().any(|(other_path, _)| other_path == path) {
            lines.push(DiffLine {
                kind: DiffLineKind::Added,
                text: format!("+ {path}: {}", display_value(value)),
            });
        }
    }
    lines
}

fn flatten(value: &Value, path: &str, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Mapping(map) if !map.is_empty() => {
            for (key, child) in map {
                let key = display_value(key);
                let child_path = if path.is_empty() {
                    key
                } else {
                    format!("{path}.{key}")
                };
                flatten(child, &child_path, out);
            }
        }
        Value::Sequence(seq) if !seq.is_empty() => {
            for (index, child) in seq.iter().enumerate() {
                flatten(child, &format!("{path}[{index}]"), out);
            }
        }
        leaf => out.push((path.to_string(), leaf.clone())),
    }
}

// ---------------------------------------------------------------------------
// Character diff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    Same,
    Added,
    Removed,
}

#[derive(Debug, PartialEq, Eq)]
struct DiffSpan {
    kind: SpanKind,
    text: String,
}

/// Split two strings into same/removed/added spans via their common prefix
/// and suffix. Equal inputs yield a single unchanged span.
fn char_diff(expected: &str, actual: &str) -> Vec<DiffSpan> {
    if expected == actual {
        return vec![DiffSpan {
            kind: SpanKind::Same,
            text: expected.to_string(),
        }];
    }

    let left: Vec<char> = expected.chars().collect();
    let right: Vec<char> = actual.chars().collect();
    let min_len = left.len().min(right.len());

    let mut prefix = 0usize;
    while prefix < min_len && left[prefix] == right[prefix] {
        prefix += 1;
    }

    let mut left_end = left.len();
    let mut right_end = right.len();
    while left_end > prefix && right_end > prefix && left[left_end - 1] == right[right_end - 1] {
        left_end -= 1;
        right_end -= 1;
    }

    let mut spans = Vec::new();
    if prefix > 0 {
        spans.push(DiffSpan {
            kind: SpanKind::Same,
            text: left[..prefix].iter().collect(),
        });
    }
    if left_end > prefix {
        spans.push(DiffSpan {
            kind: SpanKind::Removed,
            text: left[prefix..left_end].iter().collect(),
        });
    }
    if right_end > prefix {
        spans.push(DiffSpan {
            kind: SpanKind::Added,
            text: right[prefix..right_end].iter().collect(),
        });
    }
    if left_end < left.len() {
        spans.push(DiffSpan {
            kind: SpanKind::Same,
            text: left[left_end..].iter().collect(),
        });
    }
    spans
}

/// Make whitespace inside a changed span legible so diff boundaries stay
/// visible even when the only change is invisible characters.
fn mark_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("<newline>"),
            c if c.is_whitespace() => out.push_str("<whitespace>"),
            c => out.push(c),
        }
    }
    out
}
