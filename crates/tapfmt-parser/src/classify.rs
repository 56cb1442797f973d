//! Line classification for the TAP grammar.
//!
//! [`classify`] is a pure dispatch over a fixed, ORDERED rule chain. The
//! rules are not mutually exclusive, so the order is part of the contract:
//! a later rule is reachable only when every earlier one failed to match.
//!
//!   1. version marker       `TAP version <n>`
//!   2. comment              `# <text>` (the `# SUBTEST: <name>` form is a
//!      suppressed subtest-start marker)
//!   3. assertion            `[not ]ok[ <n>][ [- ]<name>[ # SKIP|TODO ...]]`
//!   4. plan                 `<m>..<n>`
//!   5. diagnostic open      indented `---`
//!   6. blank line
//!   7. bail-out             `Bail out!`
//!   8. fallback: extra, carrying the raw line verbatim
//!
//! The diagnostic close marker (indented `...`) is deliberately not part of
//! the chain: it is only meaningful inside an open block, so the stateful
//! parser tests it via [`is_diag_close`] before dispatching here.
//!
//! All matching is prefix / byte scans, no regex.

use crate::event::Assertion;

/// Outcome of classifying one line while in normal (non-diagnostic) state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineToken {
    Version { value: u64 },
    Plan { is_child: bool, start: u64, end: u64 },
    Assertion(Assertion),
    Comment { text: String },
    /// Reserved `# SUBTEST: <name>` comment form. Emits nothing.
    SubtestStart,
    /// Indented `---`. Opens a diagnostic block, emits nothing.
    DiagOpen,
    /// Empty line. Emits nothing.
    Blank,
    /// `Bail out!` marker. Flags the parser as bailing, emits nothing.
    BailOut,
    /// Anything else: passed through verbatim.
    Extra,
}

/// Classify one complete line (no trailing newline).
#[must_use]
pub fn classify(line: &str) -> LineToken {
    if let Some(value) = match_version(line) {
        return LineToken::Version { value };
    }
    if let Some(token) = match_comment(line) {
        return token;
    }
    if let Some(assertion) = match_assertion(line) {
        return LineToken::Assertion(assertion);
    }
    if let Some((is_child, start, end)) = match_plan(line) {
        return LineToken::Plan {
            is_child,
            start,
            end,
        };
    }
    if is_diag_open(line) {
        return LineToken::DiagOpen;
    }
    if line.is_empty() {
        return LineToken::Blank;
    }
    if line.starts_with("Bail out!") {
        return LineToken::BailOut;
    }
    LineToken::Extra
}

/// Diagnostic-block close marker: whitespace-indented `...` and nothing else.
#[must_use]
pub fn is_diag_close(line: &str) -> bool {
    indented_exactly(line, "...")
}

fn is_diag_open(line: &str) -> bool {
    indented_exactly(line, "---")
}

fn indented_exactly(line: &str, marker: &str) -> bool {
    let trimmed = line.trim_start_matches(|c: char| c.is_ascii_whitespace());
    trimmed == marker && trimmed.len() < line.len()
}

/// `TAP version <n>`, case-insensitive, trailing text ignored.
fn match_version(line: &str) -> Option<u64> {
    let rest = strip_prefix_ci(line, "TAP")?;
    let rest = skip_ws1(rest)?;
    let rest = strip_prefix_ci(rest, "version")?;
    let rest = skip_ws1(rest)?;
    let digits = leading_digits(rest);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// `# <text>`. A `#` followed by nothing, or by only whitespace, carries no
/// text and falls through to the later rules (ultimately `Extra`) rather
/// than surfacing a blank heading.
fn match_comment(line: &str) -> Option<LineToken> {
    let rest = line.strip_prefix('#')?;
    let text = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
    if text.is_empty() {
        return None;
    }
    if is_subtest_start(line) {
        return Some(LineToken::SubtestStart);
    }
    Some(LineToken::Comment {
        text: text.to_string(),
    })
}

/// Reserved form: `#`, exactly one whitespace, `SUBTEST:` (case-insensitive),
/// one whitespace, then a non-empty name.
fn is_subtest_start(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('#') else {
        return false;
    };
    let mut chars = rest.chars();
    if !matches!(chars.next(), Some(c) if c.is_ascii_whitespace()) {
        return false;
    }
    let Some(rest) = strip_prefix_ci(chars.as_str(), "SUBTEST:") else {
        return false;
    };
    let mut chars = rest.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_whitespace()) && !chars.as_str().is_empty()
}

/// `[    ][not ]ok[ <number>][ [- ]<name>]` with `# SKIP <reason>` /
/// `# TODO <reason>` directive post-processing on the name.
fn match_assertion(line: &str) -> Option<Assertion> {
    let (is_child, rest) = strip_child_indent(line);
    let (ok, rest) = match rest.strip_prefix("not ") {
        Some(rest) => (false, rest),
        None => (true, rest),
    };
    let mut rest = rest.strip_prefix("ok")?;
    // `ok` must end at a word boundary: `okay` is not an assertion.
    if matches!(rest.chars().next(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    let mut number = None;
    if let Some(after) = skip_ws1(rest) {
        let digits = leading_digits(after);
        if !digits.is_empty() {
            if let Ok(n) = digits.parse() {
                number = Some(n);
                rest = &after[digits.len()..];
            }
        }
    }

    let mut name = None;
    let mut skip_reason = None;
    let mut todo_reason = None;
    if let Some(after) = skip_ws1(rest) {
        // Optional `- ` separator between number and name.
        let raw = match after.strip_prefix('-') {
            Some(tail) => tail.trim_start_matches(|c: char| c.is_ascii_whitespace()),
            None => after,
        };

        // Both directive checks run against the raw name independently, in
        // this order. A name carrying both has the TODO split applied last,
        // so its stem wins while skip_reason keeps the wider suffix. This
        // mirrors the protocol's historical behavior; do not "fix" it.
        let mut stem = raw;
        if let Some((skip_stem, reason)) = split_directive(raw, "SKIP") {
            stem = skip_stem;
            skip_reason = Some(reason.to_string());
        }
        if let Some((todo_stem, reason)) = split_directive(raw, "TODO") {
            stem = todo_stem;
            todo_reason = Some(reason.to_string());
        }
        if !stem.is_empty() {
            name = Some(stem.to_string());
        }
    }

    Some(Assertion {
        is_child,
        ok,
        number,
        name,
        skip_reason,
        todo_reason,
    })
}

/// `[    ]<start>..<end>`, trailing text ignored.
fn match_plan(line: &str) -> Option<(bool, u64, u64)> {
    let (is_child, rest) = strip_child_indent(line);
    let start_digits = leading_digits(rest);
    if start_digits.is_empty() {
        return None;
    }
    let rest = rest[start_digits.len()..].strip_prefix("..")?;
    let end_digits = leading_digits(rest);
    if end_digits.is_empty() {
        return None;
    }
    let start = start_digits.parse().ok()?;
    let end = end_digits.parse().ok()?;
    Some((is_child, start, end))
}

/// Subtest lines are nested by exactly four spaces.
fn strip_child_indent(line: &str) -> (bool, &str) {
    match line.strip_prefix("    ") {
        Some(rest) => (true, rest),
        None => (false, line),
    }
}

/// Split `<stem> # <WORD> <reason>` at the first `#` that introduces the
/// directive word (case-insensitive). Whitespace around the marker is eaten;
/// the stem is trimmed of trailing whitespace.
fn split_directive<'a>(name: &'a str, word: &str) -> Option<(&'a str, &'a str)> {
    for (idx, _) in name.match_indices('#') {
        let after = name[idx + 1..].trim_start_matches(|c: char| c.is_ascii_whitespace());
        if let Some(rest) = strip_prefix_ci(after, word) {
            let stem = name[..idx].trim_end_matches(|c: char| c.is_ascii_whitespace());
            let reason = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
            return Some((stem, reason));
        }
    }
    None
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

/// Skip one-or-more whitespace; `None` when the text does not start with any.
fn skip_ws1(text: &str) -> Option<&str> {
    let trimmed = text.trim_start_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.len() == text.len() {
        None
    } else {
        Some(trimmed)
    }
}

fn leading_digits(text: &str) -> &str {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    &text[..end]
}
