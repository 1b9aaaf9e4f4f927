//! Byte-size limits for request bodies.
//!
//! Limits are given either as a raw byte count or as a human-readable size
//! string such as `"56kb"` or `"1.5mb"`. Units are binary (1kb = 1024 bytes)
//! and case-insensitive.

use std::fmt;
use std::str::FromStr;

/// A resolved body-size limit in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SizeLimit(u64);

impl SizeLimit {
  /// Default limit for JSON bodies (1mb).
  pub const DEFAULT_JSON: SizeLimit = SizeLimit(1024 * 1024);
  /// Default limit for url-encoded form bodies (56kb).
  pub const DEFAULT_FORM: SizeLimit = SizeLimit(56 * 1024);
  /// Default limit for plain text bodies (56kb).
  pub const DEFAULT_TEXT: SizeLimit = SizeLimit(56 * 1024);

  /// Creates a limit from an exact byte count.
  pub const fn bytes(n: u64) -> Self {
    Self(n)
  }

  pub const fn as_u64(self) -> u64 {
    self.0
  }
}

impl From<u64> for SizeLimit {
  fn from(n: u64) -> Self {
    Self(n)
  }
}

/// Error returned when a size string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSizeError(String);

impl fmt::Display for ParseSizeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "invalid size limit: {:?}", self.0)
  }
}

impl std::error::Error for ParseSizeError {}

impl FromStr for SizeLimit {
  type Err = ParseSizeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    let split = trimmed
      .find(|c: char| !(c.is_ascii_digit() || c == '.'))
      .unwrap_or(trimmed.len());
    let (num, unit) = trimmed.split_at(split);
    let value: f64 = num.parse().map_err(|_| ParseSizeError(s.to_owned()))?;
    if !value.is_finite() || value < 0.0 {
      return Err(ParseSizeError(s.to_owned()));
    }
    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
      "" | "b" => 1,
      "kb" => 1024,
      "mb" => 1024 * 1024,
      "gb" => 1024 * 1024 * 1024,
      "tb" => 1024u64.pow(4),
      _ => return Err(ParseSizeError(s.to_owned())),
    };
    Ok(Self((value * multiplier as f64) as u64))
  }
}

impl fmt::Display for SizeLimit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}b", self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_plain_byte_counts() {
    assert_eq!("1024".parse::<SizeLimit>().unwrap(), SizeLimit::bytes(1024));
    assert_eq!("0".parse::<SizeLimit>().unwrap(), SizeLimit::bytes(0));
  }

  #[test]
  fn parses_unit_suffixes() {
    assert_eq!("56kb".parse::<SizeLimit>().unwrap(), SizeLimit::bytes(56 * 1024));
    assert_eq!("1mb".parse::<SizeLimit>().unwrap(), SizeLimit::bytes(1024 * 1024));
    assert_eq!("2GB".parse::<SizeLimit>().unwrap(), SizeLimit::bytes(2 * 1024 * 1024 * 1024));
    assert_eq!(" 1.5mb ".parse::<SizeLimit>().unwrap(), SizeLimit::bytes(1536 * 1024));
  }

  #[test]
  fn rejects_garbage() {
    assert!("".parse::<SizeLimit>().is_err());
    assert!("mb".parse::<SizeLimit>().is_err());
    assert!("12qb".parse::<SizeLimit>().is_err());
    assert!("-5kb".parse::<SizeLimit>().is_err());
  }

  #[test]
  fn defaults_match_documented_values() {
    assert_eq!(SizeLimit::DEFAULT_JSON, "1mb".parse().unwrap());
    assert_eq!(SizeLimit::DEFAULT_FORM, "56kb".parse().unwrap());
    assert_eq!(SizeLimit::DEFAULT_TEXT, "56kb".parse().unwrap());
  }
}
