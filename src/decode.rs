//! Scalar body decoders.
//!
//! Each decoder reads the request body under a byte limit, decodes it with the
//! configured charset and produces a [`serde_json::Value`]. The grammars
//! themselves are collaborators (`serde_json`, `url::form_urlencoded`); this
//! module owns limit enforcement, charset handling and the mapping of their
//! failures onto [`BodyError`].

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::{Map, Value};

use crate::{body::IngestBody, error::BodyError, limit::SizeLimit};

pub mod json;
pub mod text;
pub mod urlencoded;

/// A decoded request body in its stable downstream shape.
#[derive(Debug, Clone)]
pub enum DecodedBody {
  /// Result of a scalar decoder, or the empty object for skipped requests.
  Value(Value),
  /// Result of the multipart aggregator.
  #[cfg(feature = "multipart")]
  Multipart(crate::multipart::MultipartResult),
}

impl DecodedBody {
  /// The empty object used for skipped and unmatched requests.
  pub fn empty() -> Self {
    DecodedBody::Value(Value::Object(Map::new()))
  }
}

/// Collects the body, rejecting with `SizeExceeded` once it grows past `limit`.
pub(crate) async fn read_limited(body: IngestBody, limit: SizeLimit) -> Result<Bytes, BodyError> {
  match Limited::new(body, limit.as_u64() as usize).collect().await {
    Ok(collected) => Ok(collected.to_bytes()),
    Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
      Err(BodyError::SizeExceeded { limit: limit.as_u64() })
    }
    Err(err) => Err(BodyError::Read(err.to_string())),
  }
}

/// Decodes body bytes with the configured charset.
///
/// Unsupported charsets are rejected here, at decode time, so a bad
/// `encoding` option never fails configuration itself.
pub(crate) fn decode_charset(bytes: &Bytes, encoding: &str) -> Result<String, BodyError> {
  match encoding.to_ascii_lowercase().as_str() {
    "utf-8" | "utf8" | "us-ascii" | "ascii" => std::str::from_utf8(bytes)
      .map(str::to_owned)
      .map_err(|e| BodyError::Parse(e.to_string())),
    other => Err(BodyError::Parse(format!("unsupported charset {other:?}"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn read_limited_passes_small_bodies_through() {
    let body = IngestBody::from("hello");
    let bytes = read_limited(body, SizeLimit::bytes(16)).await.unwrap();
    assert_eq!(&bytes[..], b"hello");
  }

  #[tokio::test]
  async fn read_limited_rejects_oversized_bodies() {
    let body = IngestBody::from("0123456789");
    let err = read_limited(body, SizeLimit::bytes(4)).await.unwrap_err();
    assert!(matches!(err, BodyError::SizeExceeded { limit: 4 }));
  }

  #[test]
  fn charset_decoding_is_lazy_about_unknown_labels() {
    let bytes = Bytes::from_static(b"abc");
    assert_eq!(decode_charset(&bytes, "UTF-8").unwrap(), "abc");
    assert!(matches!(
      decode_charset(&bytes, "koi8-r"),
      Err(BodyError::Parse(_))
    ));
  }

  #[test]
  fn invalid_utf8_is_a_parse_error() {
    let bytes = Bytes::from_static(&[0xff, 0xfe]);
    assert!(matches!(
      decode_charset(&bytes, "utf-8"),
      Err(BodyError::Parse(_))
    ));
  }
}
