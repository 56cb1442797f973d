//! Incremental TAP parser.
//!
//! [`TapParser`] is streaming-safe: feed it raw text in chunks of any size
//! via [`TapParser::feed`] and it emits zero or more [`TapEvent`]s per chunk,
//! in strict input order. Call [`TapParser::finish`] once at end of stream to
//! flush a final unterminated line.
//!
//! Internal state tracks whether a diagnostic block is currently open so the
//! YAML payload between `---` and `...` is accumulated and decoded as one
//! document. A `Bail out!` line flips a sticky flag: the marker line and
//! everything after it are dropped for the rest of the parser's lifetime.

use serde_yaml::Value;

use crate::assembler::LineAssembler;
use crate::classify::{classify, is_diag_close, LineToken};
use crate::event::TapEvent;

/// Message carried by the `ParseError` event for a bad diagnostic payload.
pub const DIAG_DECODE_ERROR: &str = "failed to parse yaml in diagnostic block";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Normal,
    InDiagnosticBlock,
}

/// Stateful incremental parser over the TAP line grammar.
#[derive(Debug)]
pub struct TapParser {
    assembler: LineAssembler,
    state: ParserState,
    diag_lines: Vec<String>,
    diag_open_line: usize,
    line_number: usize,
    bailing: bool,
}

impl Default for TapParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TapParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            assembler: LineAssembler::new(),
            state: ParserState::Normal,
            diag_lines: Vec::new(),
            diag_open_line: 0,
            line_number: 0,
            bailing: false,
        }
    }

    /// Feed a fragment of raw input. Chunk boundaries need not align with
    /// line boundaries; a trailing partial line is carried to the next call.
    pub fn feed(&mut self, chunk: &str) -> Vec<TapEvent> {
        let mut events = Vec::new();
        for line in self.assembler.push(chunk) {
            self.line_number += 1;
            self.parse_line(&line, &mut events);
        }
        events
    }

    /// End of stream: the retained partial line (if any) is parsed as a
    /// final complete line.
    pub fn finish(&mut self) -> Vec<TapEvent> {
        let mut events = Vec::new();
        if let Some(line) = self.assembler.finish() {
            self.line_number += 1;
            self.parse_line(&line, &mut events);
        }
        events
    }

    fn parse_line(&mut self, line: &str, events: &mut Vec<TapEvent>) {
        if self.bailing {
            return;
        }

        if self.state == ParserState::InDiagnosticBlock {
            if !is_diag_close(line) {
                self.diag_lines.push(line.to_string());
                return;
            }
            self.state = ParserState::Normal;
            events.push(self.close_diag_block());
            return;
        }

        match classify(line) {
            LineToken::Version { value } => events.push(TapEvent::Version { value }),
            LineToken::Plan {
                is_child,
                start,
                end,
            } => events.push(TapEvent::Plan {
                is_child,
                start,
                end,
            }),
            LineToken::Assertion(assertion) => events.push(TapEvent::Assertion(assertion)),
            LineToken::Comment { text } => events.push(TapEvent::Comment { text }),
            LineToken::Extra => events.push(TapEvent::Extra {
                text: line.to_string(),
            }),
            LineToken::DiagOpen => {
                self.state = ParserState::InDiagnosticBlock;
                self.diag_open_line = self.line_number;
            }
            LineToken::BailOut => {
                // Sticky for the parser's lifetime. The marker line itself
                // emits nothing.
                self.bailing = true;
            }
            LineToken::SubtestStart | LineToken::Blank => {}
        }
    }

    fn close_diag_block(&mut self) -> TapEvent {
        // The decoder expects `''` as the escape for a quote inside a
        // single-quoted scalar, while harnesses commonly emit `\'`.
        let text = self.diag_lines.join("\n").replace("\\'", "''");
        self.diag_lines.clear();
        match serde_yaml::from_str::<Value>(&text) {
            Ok(mut payload) => {
                normalize_undefined(&mut payload);
                TapEvent::Diagnostic { payload }
            }
            Err(err) => TapEvent::ParseError {
                line_number: self.diag_open_line,
                message: DIAG_DECODE_ERROR,
                cause: err.to_string(),
            },
        }
    }
}

/// YAML has no way to spell an absent value, so harnesses emit the literal
/// string `undefined` and the decoder hands it back as text, which would make
/// every mismatch message claim a string was found. Rewrite it to null — but
/// only for the two top-level comparison fields, never recursively.
fn normalize_undefined(payload: &mut Value) {
    for key in ["expected", "actual"] {
        if let Some(field) = payload.get_mut(key) {
            if matches!(field, Value::String(s) if s == "undefined") {
                *field = Value::Null;
            }
        }
    }
}
