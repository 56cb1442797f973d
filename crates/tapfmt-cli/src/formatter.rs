//! Event aggregation and rendering.
//!
//! [`Formatter`] consumes the parser's event stream one event at a time,
//! maintains the pass/fail accounting, validates assertion numbers against
//! the declared plan, and renders each event into zero or more output lines.
//! When the stream ends, [`Formatter::finish`] synthesizes the `Summary`
//! event from the final counter values and renders it.
//!
//! Counting semantics diverge from naive event counts on purpose: only
//! top-level assertions that carry neither a skip nor a todo directive touch
//! the counters. Child (subtest) assertions render indented but are excluded
//! from the totals.

use std::time::{Duration, Instant};

use tapfmt_parser::{Assertion, TapEvent};

use crate::diag::render_diagnostic;
use crate::style::{pad, style_span, TokenKind, SYMBOL_CROSS, SYMBOL_TICK};

const INDENT_HEADING: usize = 2;
const INDENT_TOP: usize = 4;
const INDENT_CHILD: usize = 8;

/// Stream-level protocol violation. Unlike per-line noise, this is not
/// recoverable: the producer broke a structural assumption.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("more than one plan found")]
    DuplicatePlan,
}

/// Renders the event stream and keeps the running totals.
#[derive(Debug)]
pub struct Formatter {
    plan: Option<(u64, u64)>,
    sub_plan: Option<(u64, u64)>,
    counted_asserts: u64,
    counted_passes: u64,
    failed_names: Vec<String>,
    started: Instant,
    use_color: bool,
}

impl Formatter {
    #[must_use]
    pub fn new(use_color: bool) -> Self {
        Self {
            plan: None,
            sub_plan: None,
            counted_asserts: 0,
            counted_passes: 0,
            failed_names: Vec::new(),
            started: Instant::now(),
            use_color,
        }
    }

    /// Render one event into zero or more output lines (without trailing
    /// newlines). A duplicate plan for the same scope is the only error.
    pub fn handle(&mut self, event: &TapEvent) -> Result<Vec<String>, FormatError> {
        match event {
            TapEvent::Version { .. } => Ok(Vec::new()),
            TapEvent::Plan {
                is_child,
                start,
                end,
            } => {
                let slot = if *is_child {
                    &mut self.sub_plan
                } else {
                    &mut self.plan
                };
                if slot.is_some() {
                    return Err(FormatError::DuplicatePlan);
                }
                *slot = Some((*start, *end));
                Ok(Vec::new())
            }
            TapEvent::Assertion(assertion) => Ok(self.render_assertion(assertion)),
            TapEvent::Comment { text } => Ok(self.render_comment(text)),
            TapEvent::Diagnostic { payload } => Ok(render_diagnostic(payload, self.use_color)),
            TapEvent::Extra { text } => Ok(vec![pad(
                &style_span(text, TokenKind::Extra, self.use_color),
                INDENT_TOP,
            )]),
            TapEvent::Summary {
                counted,
                passed,
                failed,
                elapsed,
            } => Ok(self.render_summary(*counted, *passed, *failed, *elapsed)),
            // Fallback: dump the event rather than lose it.
            TapEvent::ParseError {
                line_number,
                message,
                cause,
            } => Ok(vec![serde_json::json!({
                "type": "parseError",
                "line": line_number,
                "message": message,
                "reason": cause,
            })
            .to_string()]),
        }
    }

    /// End of stream: synthesize the `Summary` event from the final counters
    /// and elapsed wall-clock time, and render it.
    pub fn finish(&mut self) -> Vec<String> {
        let counted = self.counted_asserts;
        let passed = self.counted_passes;
        let failed = self.failed_names.len() as u64;
        self.render_summary(counted, passed, failed, self.started.elapsed())
    }

    fn render_assertion(&mut self, assertion: &Assertion) -> Vec<String> {
        // Plan-bound validation renders an inline error instead of the
        // normal line and never touches the counters. Unnumbered assertions
        // are exempt.
        if let (Some((start, end)), Some(number)) = (self.plan, assertion.number) {
            if number < start || number > end {
                let message = format!("Bad test number \"{number}\", {start} to {end} expected");
                return vec![pad(
                    &style_span(&message, TokenKind::Fail, self.use_color),
                    INDENT_HEADING,
                )];
            }
        }

        let do_count = assertion.skip_reason.is_none() && assertion.todo_reason.is_none();
        let indent = if assertion.is_child {
            INDENT_CHILD
        } else {
            INDENT_TOP
        };
        let name = assertion.name.as_deref().unwrap_or("");

        if !do_count {
            let line = if assertion.skip_reason.is_some() {
                style_span(&format!("[SKIPPED] {name}"), TokenKind::Muted, self.use_color)
            } else {
                style_span(&format!("[TODO] {name}"), TokenKind::Todo, self.use_color)
            };
            return vec![pad(&line, indent)];
        }

        if !assertion.is_child {
            self.counted_asserts += 1;
        }
        if assertion.ok {
            if !assertion.is_child {
                self.counted_passes += 1;
            }
            let line = format!(
                "{} {}",
                style_span(SYMBOL_TICK, TokenKind::Pass, self.use_color),
                style_span(name, TokenKind::Muted, self.use_color)
            );
            vec![pad(&line, indent)]
        } else {
            if !assertion.is_child {
                self.failed_names.push(name.to_string());
            }
            let line = style_span(
                &format!("{SYMBOL_CROSS} {name}"),
                TokenKind::Fail,
                self.use_color,
            );
            vec![pad(&line, indent)]
        }
    }

    fn render_comment(&self, text: &str) -> Vec<String> {
        if is_final_stats(text) {
            return Vec::new();
        }
        vec![
            String::new(),
            pad(
                &style_span(text, TokenKind::Heading, self.use_color),
                INDENT_HEADING,
            ),
        ]
    }

    fn render_summary(
        &self,
        counted: u64,
        passed: u64,
        failed: u64,
        elapsed: Duration,
    ) -> Vec<String> {
        let mut lines = vec![String::new()];
        if failed > 0 {
            lines.push(style_span(
                &format!("{failed} of {counted} failing"),
                TokenKind::FailStrong,
                self.use_color,
            ));
        }
        lines.push(style_span(
            &format!("{passed} of {counted} passing"),
            TokenKind::PassStrong,
            self.use_color,
        ));
        lines.push(style_span(
            &format!("(in {})", format_elapsed(elapsed)),
            TokenKind::Muted,
            self.use_color,
        ));
        lines
    }
}

/// A comment restating the harness's own final tally would duplicate the
/// synthesized summary, so those headings are suppressed. Prefix match only,
/// mirroring the protocol's loose convention.
fn is_final_stats(text: &str) -> bool {
    ["ok", "tests", "pass", "fail", "skip", "failed"]
        .iter()
        .any(|word| text.starts_with(word))
}

fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 1000 {
        return format!("{ms}ms");
    }
    let secs = elapsed.as_secs();
    if secs < 60 {
        let tenths = format!("{:.1}", elapsed.as_secs_f64());
        let trimmed = tenths.strip_suffix(".0").unwrap_or(&tenths);
        return format!("{trimmed}s");
    }
    format!("{}m {}s", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{format_elapsed, is_final_stats, FormatError, Formatter};
    use tapfmt_parser::{Assertion, TapEvent};

    fn assertion(ok: bool, number: u64, name: &str) -> TapEvent {
        TapEvent::Assertion(Assertion {
            ok,
            number: Some(number),
            name: Some(name.to_string()),
            ..Assertion::default()
        })
    }

    fn handle(formatter: &mut Formatter, event: &TapEvent) -> Vec<String> {
        formatter.handle(event).unwrap_or_default()
    }

    #[test]
    fn counted_asserts_split_into_passes_and_failures() {
        let mut formatter = Formatter::new(false);
        handle(&mut formatter, &assertion(true, 1, "a"));
        handle(&mut formatter, &assertion(false, 2, "b"));
        handle(&mut formatter, &assertion(true, 3, "c"));
        let lines = formatter.finish();
        assert!(lines.contains(&"1 of 3 failing".to_string()));
        assert!(lines.contains(&"2 of 3 passing".to_string()));
    }

    #[test]
    fn pass_and_fail_templates_use_four_space_indent() {
        let mut formatter = Formatter::new(false);
        assert_eq!(handle(&mut formatter, &assertion(true, 1, "a")), vec!["    ✔ a"]);
        assert_eq!(handle(&mut formatter, &assertion(false, 2, "b")), vec!["    ✖ b"]);
    }

    #[test]
    fn child_assertions_render_nested_and_do_not_count() {
        let mut formatter = Formatter::new(false);
        let event = TapEvent::Assertion(Assertion {
            ok: true,
            is_child: true,
            name: Some("nested".to_string()),
            ..Assertion::default()
        });
        assert_eq!(handle(&mut formatter, &event), vec!["        ✔ nested"]);
        let lines = formatter.finish();
        assert!(lines.contains(&"0 of 0 passing".to_string()));
    }

    #[test]
    fn skip_and_todo_never_touch_counters() {
        let mut formatter = Formatter::new(false);
        let skipped = TapEvent::Assertion(Assertion {
            ok: false,
            skip_reason: Some("not ready".to_string()),
            name: Some("s".to_string()),
            ..Assertion::default()
        });
        let todo = TapEvent::Assertion(Assertion {
            ok: true,
            todo_reason: Some("later".to_string()),
            name: Some("t".to_string()),
            ..Assertion::default()
        });
        assert_eq!(handle(&mut formatter, &skipped), vec!["    [SKIPPED] s"]);
        assert_eq!(handle(&mut formatter, &todo), vec!["    [TODO] t"]);
        let lines = formatter.finish();
        assert!(lines.contains(&"0 of 0 passing".to_string()));
        assert!(!lines.iter().any(|line| line.contains("failing")));
    }

    #[test]
    fn duplicate_top_level_plan_is_a_hard_error() {
        let mut formatter = Formatter::new(false);
        let plan = TapEvent::Plan {
            is_child: false,
            start: 1,
            end: 2,
        };
        assert!(formatter.handle(&plan).is_ok());
        assert!(matches!(
            formatter.handle(&plan),
            Err(FormatError::DuplicatePlan)
        ));
    }

    #[test]
    fn child_plan_is_tracked_separately() {
        let mut formatter = Formatter::new(false);
        let top = TapEvent::Plan {
            is_child: false,
            start: 1,
            end: 2,
        };
        let child = TapEvent::Plan {
            is_child: true,
            start: 1,
            end: 1,
        };
        assert!(formatter.handle(&top).is_ok());
        assert!(formatter.handle(&child).is_ok());
        assert!(formatter.handle(&child).is_err());
    }

    #[test]
    fn out_of_plan_number_renders_inline_error_without_counting() {
        let mut formatter = Formatter::new(false);
        handle(
            &mut formatter,
            &TapEvent::Plan {
                is_child: false,
                start: 1,
                end: 2,
            },
        );
        let lines = handle(&mut formatter, &assertion(true, 7, "late"));
        assert_eq!(lines, vec!["  Bad test number \"7\", 1 to 2 expected"]);
        let lines = formatter.finish();
        assert!(lines.contains(&"0 of 0 passing".to_string()));
    }

    #[test]
    fn unnumbered_assertion_is_exempt_from_plan_bounds() {
        let mut formatter = Formatter::new(false);
        handle(
            &mut formatter,
            &TapEvent::Plan {
                is_child: false,
                start: 1,
                end: 1,
            },
        );
        let event = TapEvent::Assertion(Assertion {
            ok: true,
            name: Some("anonymous".to_string()),
            ..Assertion::default()
        });
        assert_eq!(handle(&mut formatter, &event), vec!["    ✔ anonymous"]);
    }

    #[test]
    fn comment_renders_heading_after_blank_line() {
        let mut formatter = Formatter::new(false);
        let lines = handle(
            &mut formatter,
            &TapEvent::Comment {
                text: "suite one".to_string(),
            },
        );
        assert_eq!(lines, vec!["", "  suite one"]);
    }

    #[test]
    fn final_stats_comments_are_suppressed() {
        assert!(is_final_stats("tests 4"));
        assert!(is_final_stats("pass 3"));
        assert!(is_final_stats("ok"));
        assert!(!is_final_stats("suite one"));
        let mut formatter = Formatter::new(false);
        let lines = handle(
            &mut formatter,
            &TapEvent::Comment {
                text: "fail 1".to_string(),
            },
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn extra_renders_verbatim_with_accent_indent() {
        let mut formatter = Formatter::new(false);
        let lines = handle(
            &mut formatter,
            &TapEvent::Extra {
                text: "something odd".to_string(),
            },
        );
        assert_eq!(lines, vec!["    something odd"]);
    }

    #[test]
    fn parse_error_falls_back_to_structured_dump() {
        let mut formatter = Formatter::new(false);
        let lines = handle(
            &mut formatter,
            &TapEvent::ParseError {
                line_number: 3,
                message: "failed to parse yaml in diagnostic block",
                cause: "bad indent".to_string(),
            },
        );
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"parseError\""));
        assert!(lines[0].contains("\"line\":3"));
    }

    #[test]
    fn summary_omits_failing_line_when_nothing_failed() {
        let mut formatter = Formatter::new(false);
        handle(&mut formatter, &assertion(true, 1, "a"));
        let lines = formatter.finish();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "1 of 1 passing");
        assert!(lines[2].starts_with("(in "));
        assert!(!lines.iter().any(|line| line.contains("failing")));
    }

    #[test]
    fn elapsed_formatting_scales_with_magnitude() {
        assert_eq!(format_elapsed(Duration::from_millis(743)), "743ms");
        assert_eq!(format_elapsed(Duration::from_millis(2300)), "2.3s");
        assert_eq!(format_elapsed(Duration::from_secs(2)), "2s");
        assert_eq!(format_elapsed(Duration::from_secs(64)), "1m 4s");
    }
}
