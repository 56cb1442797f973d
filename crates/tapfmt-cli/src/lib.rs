//! tapfmt-cli: renders a TAP stream as colorized progress output.
//!
//! The pipeline is strictly one-directional and synchronous: stdin chunks →
//! [`tapfmt_parser::TapParser`] → events → [`Formatter`] → rendered lines →
//! stdout. Closing the input stream is the only termination signal; it
//! triggers the synthesized summary before the output ends.

pub mod diag;
pub mod formatter;
pub mod style;

use std::io::{Read, Write};

use formatter::{FormatError, Formatter};
use tapfmt_parser::TapParser;

const READ_CHUNK_BYTES: usize = 4096;

/// Options for one formatting run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunOptions {
    pub no_color: bool,
}

/// What the command line asked for.
#[derive(Debug, Clone, Copy)]
pub enum Command {
    Run(RunOptions),
    Help,
}

/// A run that could not complete: an I/O failure on either end of the pipe,
/// or a stream-level protocol violation.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Protocol(#[from] FormatError),
}

/// Hand-rolled flag scan; anything unrecognized is an error so typos do not
/// silently read a terminal.
pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut options = RunOptions::default();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--no-color" => options.no_color = true,
            other => return Err(format!("unknown flag: {other}")),
        }
    }
    Ok(Command::Run(options))
}

#[must_use]
pub fn help_text() -> String {
    "\
tapfmt renders a TAP stream from stdin as readable progress output.

Usage:
  <test command> | tapfmt [flags]

Flags:
      --no-color   disable ANSI colors (also honors NO_COLOR)
  -h, --help       help for tapfmt
"
    .to_string()
}

#[must_use]
pub fn colors_enabled(no_color: bool) -> bool {
    if no_color {
        return false;
    }
    std::env::var_os("NO_COLOR").is_none()
}

/// Drive the whole pipeline: read `input` to EOF, write rendered lines to
/// `output`, then append the synthesized summary.
pub fn run(
    options: RunOptions,
    input: &mut dyn Read,
    output: &mut dyn Write,
) -> Result<(), RunError> {
    run_with_color(colors_enabled(options.no_color), input, output)
}

/// Same as [`run`] but with color resolved by the caller; this is the seam
/// the tests drive so they are independent of the environment.
pub fn run_with_color(
    use_color: bool,
    input: &mut dyn Read,
    output: &mut dyn Write,
) -> Result<(), RunError> {
    let mut parser = TapParser::new();
    let mut formatter = Formatter::new(use_color);
    let mut buf = [0u8; READ_CHUNK_BYTES];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&buf[..n]);
        let chunk = drain_complete_utf8(&mut pending);
        if chunk.is_empty() {
            continue;
        }
        for event in parser.feed(&chunk) {
            write_lines(output, &formatter.handle(&event)?)?;
        }
    }
    if !pending.is_empty() {
        // Stream ended mid-sequence; nothing more is coming.
        let chunk = String::from_utf8_lossy(&pending).into_owned();
        for event in parser.feed(&chunk) {
            write_lines(output, &formatter.handle(&event)?)?;
        }
    }
    for event in parser.finish() {
        write_lines(output, &formatter.handle(&event)?)?;
    }
    write_lines(output, &formatter.finish())?;
    Ok(())
}

/// Drain the decodable prefix of `pending` as text. Read boundaries need not
/// align with UTF-8 character boundaries, so a truncated trailing sequence is
/// left buffered for the next read instead of being mangled into U+FFFD;
/// rendered output must not depend on how the input was chunked. Bytes that
/// are invalid outright (not merely truncated) decode lossily.
fn drain_complete_utf8(pending: &mut Vec<u8>) -> String {
    let boundary = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(err) if err.error_len().is_none() => err.valid_up_to(),
        Err(_) => pending.len(),
    };
    let chunk: Vec<u8> = pending.drain(..boundary).collect();
    String::from_utf8_lossy(&chunk).into_owned()
}

fn write_lines(output: &mut dyn Write, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        writeln!(output, "{line}")?;
    }
    Ok(())
}
