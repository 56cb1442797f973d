//! Event model for the TAP stream.
//!
//! One [`TapEvent`] is emitted per classified unit of input. `Summary` is the
//! only variant never parsed from input: the formatter synthesizes it when the
//! stream ends.

use std::time::Duration;

use serde_yaml::Value;

/// A single assertion (`ok` / `not ok`) line.
///
/// `is_child` is set when the line carried the 4-space subtest indent.
/// `skip_reason` / `todo_reason` come from the trailing `# SKIP ...` /
/// `# TODO ...` directives and are stripped from `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assertion {
    pub is_child: bool,
    pub ok: bool,
    pub number: Option<u64>,
    pub name: Option<String>,
    pub skip_reason: Option<String>,
    pub todo_reason: Option<String>,
}

/// One classified unit of the ingested protocol stream.
#[derive(Debug, Clone, PartialEq)]
pub enum TapEvent {
    /// `TAP version <n>` marker line.
    Version { value: u64 },

    /// Declared assertion-number range for a scope. `is_child` is set when
    /// the line carried the 4-space subtest indent.
    Plan { is_child: bool, start: u64, end: u64 },

    /// An `ok` / `not ok` line.
    Assertion(Assertion),

    /// `# <text>` line. The reserved `# SUBTEST: <name>` form never reaches
    /// this variant; the parser suppresses it.
    Comment { text: String },

    /// Decoded payload of a `---` / `...` diagnostic block.
    Diagnostic { payload: Value },

    /// Unclassified line, passed through verbatim.
    Extra { text: String },

    /// A diagnostic block whose YAML payload failed to decode.
    /// `line_number` is the 1-based line where the block opened.
    ParseError {
        line_number: usize,
        message: &'static str,
        cause: String,
    },

    /// Final accounting, synthesized by the formatter after the input stream
    /// is exhausted. Never parsed from input.
    Summary {
        counted: u64,
        passed: u64,
        failed: u64,
        elapsed: Duration,
    },
}
