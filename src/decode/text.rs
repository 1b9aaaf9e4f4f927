//! Plain text body decoding.

use serde_json::Value;

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
) -> Result<Value, BodyError> {
  let bytes = read_limited(body, limit).await?;
  let text = decode_charset(&bytes, encoding)?;
  Ok(Value::String(text))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn passes_text_through() {
    let value = decode(IngestBody::from("plain text body"), SizeLimit::bytes(64), "utf-8")
      .await
      .unwrap();
    assert_eq!(value, Value::String("plain text body".to_owned()));
  }

  #[tokio::test]
  async fn oversized_text_is_size_exceeded() {
    let err = decode(IngestBody::from("0123456789"), SizeLimit::bytes(4), "utf-8")
      .await
      .unwrap_err();
    assert!(matches!(err, BodyError::SizeExceeded { limit: 4 }));
  }
}
