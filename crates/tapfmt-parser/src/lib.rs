//! tapfmt-parser: incremental parser for the TAP test protocol.
//!
//! Turns an arbitrarily-chunked text stream into a sequence of typed
//! [`TapEvent`]s. The pipeline is line assembly → line classification →
//! stateful parsing (diagnostic-block accumulation, YAML decode, sticky
//! bail-out). Rendering lives in `tapfmt-cli`; this crate only produces
//! events.

pub mod assembler;
pub mod classify;
pub mod event;
pub mod parser;

pub use assembler::LineAssembler;
pub use event::{Assertion, TapEvent};
pub use parser::{TapParser, DIAG_DECODE_ERROR};
