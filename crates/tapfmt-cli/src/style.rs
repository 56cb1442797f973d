//! Rendering style table.
//!
//! Every rendered span maps to exactly one [`TokenKind`]; the kind picks a
//! fixed ANSI SGR sequence. With color off the text passes through untouched,
//! so `--no-color` output is byte-stable for golden comparisons.

/// Symbol shown for a counted passing assertion.
pub const SYMBOL_TICK: &str = "✔";
/// Symbol shown for a counted failing assertion.
pub const SYMBOL_CROSS: &str = "✖";

const SGR_RESET: &str = "\x1b[0m";

/// Semantic token types for rendered TAP output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Passing assertion symbol: green.
    Pass,
    /// Summary passing-count line: bold green.
    PassStrong,
    /// Failing assertion line and structural-diff removals: red.
    Fail,
    /// Summary failing-count line: bold red.
    FailStrong,
    /// Expected/actual mismatch message: underlined red.
    Mismatch,
    /// `[TODO]` marker line: underline.
    Todo,
    /// Comment heading: bold white.
    Heading,
    /// Unclassified passthrough line: blue accent.
    Extra,
    /// Added span in a character diff: inverse green.
    DiffAdd,
    /// Removed span in a character diff: inverse red.
    DiffDel,
    /// Secondary text (assertion names, skip markers, elapsed time): gray.
    Muted,
}

fn sgr(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Pass => "32",
        TokenKind::PassStrong => "1;32",
        TokenKind::Fail => "31",
        TokenKind::FailStrong => "1;31",
        TokenKind::Mismatch => "4;31",
        TokenKind::Todo => "4",
        TokenKind::Heading => "1;37",
        TokenKind::Extra => "34",
        TokenKind::DiffAdd => "7;32",
        TokenKind::DiffDel => "7;31",
        TokenKind::Muted => "90",
    }
}

/// Wrap `text` in the SGR sequence for `kind`, or pass it through unchanged
/// when color is off or the text is empty.
#[must_use]
pub fn style_span(text: &str, kind: TokenKind, use_color: bool) -> String {
    if !use_color || text.is_empty() {
        return text.to_string();
    }
    format!("\x1b[{}m{}{}", sgr(kind), text, SGR_RESET)
}

/// Indent a rendered line by `n` spaces.
#[must_use]
pub fn pad(text: &str, n: usize) -> String {
    format!("{}{}", " ".repeat(n), text)
}
