//! Error taxonomy for the decode pipeline.
//!
//! Every failure on the decode path is one of these variants and passes
//! through the single error policy in [`crate::middleware`]: recovered locally
//! when an `on_error` handler is configured, surfaced to the caller otherwise.

use std::fmt;

/// Error produced while decoding a request body.
#[derive(Debug)]
pub enum BodyError {
  /// The body exceeded the configured byte limit.
  SizeExceeded { limit: u64 },
  /// The payload violated the grammar of the selected decoder.
  Parse(String),
  /// Strict JSON mode rejected a top-level value that is neither an object
  /// nor an array.
  StrictnessViolation,
  /// The multipart tokenizer failed, including aborted request streams.
  Tokenizer(String),
  /// The request stream could not be read.
  Read(String),
}

impl fmt::Display for BodyError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BodyError::SizeExceeded { limit } => {
        write!(f, "request body exceeds the {limit} byte limit")
      }
      BodyError::Parse(msg) => write!(f, "failed to parse request body: {msg}"),
      BodyError::StrictnessViolation => {
        write!(f, "strict JSON mode requires a top-level object or array")
      }
      BodyError::Tokenizer(msg) => write!(f, "multipart parsing failed: {msg}"),
      BodyError::Read(msg) => write!(f, "failed to read request body: {msg}"),
    }
  }
}

impl std::error::Error for BodyError {}
