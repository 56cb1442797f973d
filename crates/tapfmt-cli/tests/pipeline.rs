//! End-to-end pipeline tests: raw TAP text in, rendered lines out.

use std::io::Read;

fn render(input: &str) -> Vec<String> {
    let mut reader = input.as_bytes();
    let mut output = Vec::new();
    let result = tapfmt_cli::run_with_color(false, &mut reader, &mut output);
    assert!(result.is_ok(), "run failed: {result:?}");
    String::from_utf8_lossy(&output)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Reader that yields one byte per `read` call, to exercise chunk-boundary
/// handling through the whole pipeline.
struct OneByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Read for OneByteReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pos >= self.data.len() || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.data[self.pos];
        self.pos += 1;
        Ok(1)
    }
}

#[test]
fn basic_stream_renders_progress_and_summary() {
    let lines = render("TAP version 13\n1..2\nok 1 first\nnot ok 2 second\n");
    assert_eq!(lines[0], "    ✔ first");
    assert_eq!(lines[1], "    ✖ second");
    assert_eq!(lines[2], "");
    assert_eq!(lines[3], "1 of 2 failing");
    assert_eq!(lines[4], "1 of 2 passing");
    assert!(lines[5].starts_with("(in "));
    assert!(lines[5].ends_with(')'));
    assert_eq!(lines.len(), 6);
}

#[test]
fn diagnostic_block_renders_mismatch_under_failure() {
    let lines = render("1..1\nnot ok 1 bad math\n  ---\n  expected: 1\n  actual: 2\n  ...\n");
    assert_eq!(lines[0], "    ✖ bad math");
    assert_eq!(lines[1], "      Expected 1, but got 2");
}

#[test]
fn skipped_assertion_renders_marker_and_counts_nothing() {
    let lines = render("1..1\nok 1 skip me # SKIP not ready\n");
    assert_eq!(lines[0], "    [SKIPPED] skip me");
    assert!(lines.contains(&"0 of 0 passing".to_string()));
}

#[test]
fn comments_render_as_headings_and_stats_are_suppressed() {
    let lines = render("# suite one\nok 1 a\n# tests 1\n# pass 1\n");
    assert_eq!(lines[0], "");
    assert_eq!(lines[1], "  suite one");
    assert_eq!(lines[2], "    ✔ a");
    // The stats comments contribute nothing; next line is the summary blank.
    assert_eq!(lines[3], "");
}

#[test]
fn bail_out_drops_the_rest_of_the_stream() {
    let lines = render("ok 1 a\nBail out! on fire\nok 2 b\n# heading\n");
    assert_eq!(lines[0], "    ✔ a");
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], "1 of 1 passing");
}

#[test]
fn duplicate_plan_aborts_with_protocol_error() {
    let mut reader = "1..2\nok 1 a\n1..3\n".as_bytes();
    let mut output = Vec::new();
    let result = tapfmt_cli::run_with_color(false, &mut reader, &mut output);
    assert!(matches!(result, Err(tapfmt_cli::RunError::Protocol(_))));
}

#[test]
fn output_is_invariant_under_chunk_boundaries() {
    let input = "TAP version 13\n1..2\nok 1 first\n  ---\n  expected: a\n  actual: b\n  ...\nnot ok 2 second\n";

    let whole = render(input);

    let mut reader = OneByteReader {
        data: input.as_bytes(),
        pos: 0,
    };
    let mut output = Vec::new();
    let result = tapfmt_cli::run_with_color(false, &mut reader, &mut output);
    assert!(result.is_ok(), "run failed: {result:?}");
    let byte_at_a_time: Vec<String> = String::from_utf8_lossy(&output)
        .lines()
        .map(str::to_string)
        .collect();

    // The elapsed line is wall-clock dependent; compare everything before it.
    assert_eq!(
        whole[..whole.len() - 1],
        byte_at_a_time[..byte_at_a_time.len() - 1]
    );
}

#[test]
fn multibyte_names_survive_byte_at_a_time_reads() {
    let input = "1..2\nok 1 naïve name\nnot ok 2 emoji ✓ name\n";

    let whole = render(input);

    let mut reader = OneByteReader {
        data: input.as_bytes(),
        pos: 0,
    };
    let mut output = Vec::new();
    let result = tapfmt_cli::run_with_color(false, &mut reader, &mut output);
    assert!(result.is_ok(), "run failed: {result:?}");
    let byte_at_a_time: Vec<String> = String::from_utf8_lossy(&output)
        .lines()
        .map(str::to_string)
        .collect();

    assert_eq!(byte_at_a_time[0], "    ✔ naïve name");
    assert_eq!(byte_at_a_time[1], "    ✖ emoji ✓ name");
    assert_eq!(
        whole[..whole.len() - 1],
        byte_at_a_time[..byte_at_a_time.len() - 1]
    );
}

#[test]
fn no_color_output_has_no_escape_sequences() {
    let lines = render("1..1\nnot ok 1 bad\nunknown extension line\n");
    assert!(lines.iter().all(|line| !line.contains('\u{1b}')));
}

#[test]
fn color_output_wraps_status_lines() {
    let mut reader = "1..1\nok 1 fine\n".as_bytes();
    let mut output = Vec::new();
    let result = tapfmt_cli::run_with_color(true, &mut reader, &mut output);
    assert!(result.is_ok(), "run failed: {result:?}");
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("\x1b[32m✔\x1b[0m"));
    assert!(text.contains("\x1b[1;32m1 of 1 passing\x1b[0m"));
}
