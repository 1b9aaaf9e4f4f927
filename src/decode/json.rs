//! JSON body decoding.
//!
//! Strict mode mirrors the usual body-parser behavior: only a top-level object
//! or array is accepted, anything else is a [`BodyError::StrictnessViolation`].
//! An empty body decodes to `{}` rather than failing.

use serde_json::{Map, Value};

use crate::{
  body::IngestBody,
  decode::{decode_charset, read_limited},
  error::BodyError,
  limit::SizeLimit,
};

pub async fn decode(
  body: IngestBody,
  limit: SizeLimit,
  encoding: &str,
  strict: bool,
) -> Result<Value, BodyError> {
  let bytes = read_limited(body, limit).await?;
  let text = decode_charset(&bytes, encoding)?;
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Ok(Value::Object(Map::new()));
  }
  if strict && !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
    return Err(BodyError::StrictnessViolation);
  }
  serde_json::from_str(trimmed).map_err(|e| BodyError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn decodes_objects() {
    let value = decode(IngestBody::from(r#"{"a":1}"#), SizeLimit::bytes(1024), "utf-8", true)
      .await
      .unwrap();
    assert_eq!(value, json!({"a": 1}));
  }

  #[tokio::test]
  async fn strict_mode_rejects_scalars() {
    let err = decode(IngestBody::from("42"), SizeLimit::bytes(1024), "utf-8", true)
      .await
      .unwrap_err();
    assert!(matches!(err, BodyError::StrictnessViolation));
  }

  #[tokio::test]
  async fn lenient_mode_accepts_scalars() {
    let value = decode(IngestBody::from("42"), SizeLimit::bytes(1024), "utf-8", false)
      .await
      .unwrap();
    assert_eq!(value, json!(42));
  }

  #[tokio::test]
  async fn empty_body_decodes_to_empty_object() {
    let value = decode(IngestBody::from(""), SizeLimit::bytes(1024), "utf-8", true)
      .await
      .unwrap();
    assert_eq!(value, json!({}));
  }

  #[tokio::test]
  async fn malformed_json_is_a_parse_error() {
    let err = decode(IngestBody::from("{\"a\":"), SizeLimit::bytes(1024), "utf-8", true)
      .await
      .unwrap_err();
    assert!(matches!(err, BodyError::Parse(_)));
  }

  #[tokio::test]
  async fn oversized_body_is_size_exceeded() {
    let err = decode(IngestBody::from(r#"{"a":"0123456789"}"#), SizeLimit::bytes(8), "utf-8", true)
      .await
      .unwrap_err();
    assert!(matches!(err, BodyError::SizeExceeded { limit: 8 }));
  }
}
