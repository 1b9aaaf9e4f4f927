//! `application/x-www-form-urlencoded` body decoding.
//!
//! Pairs are parsed with `url::form_urlencoded`; a repeated key promotes the
//! value to an array in arrival order. A configured [`QueryParser`] replaces
//! the default parse wholesale, pairs and promotion included.

use serde_json::{Map, Value, map::Entry};

use crate::{
  body::IngestBody,
  config::QueryParser,
  decode::{decode_charset, read_limited},
  error::BodyError,
  limit::SizeLimit,
};

pub async fn decode(
  body: IngestBody,
  limit: SizeLimit,
  encoding: &str,
  parser: Option<&QueryParser>,
) -> Result<Value, BodyError> {
  let bytes = read_limited(body, limit).await?;
  let text = decode_charset(&bytes, encoding)?;
  if let Some(parse) = parser {
    return parse(&text);
  }

  let mut map = Map::new();
  for (key, value) in url::form_urlencoded::parse(text.as_bytes()).into_owned() {
    match map.entry(key) {
      Entry::Vacant(slot) => {
        slot.insert(Value::String(value));
      }
      Entry::Occupied(mut slot) => match slot.get_mut() {
        Value::Array(items) => items.push(Value::String(value)),
        existing => {
          let first = existing.take();
          *existing = Value::Array(vec![first, Value::String(value)]);
        }
      },
    }
  }
  Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use serde_json::json;

  use super::*;

  #[tokio::test]
  async fn decodes_simple_pairs() {
    let value = decode(IngestBody::from("a=1&b=two"), SizeLimit::bytes(1024), "utf-8", None)
      .await
      .unwrap();
    assert_eq!(value, json!({"a": "1", "b": "two"}));
  }

  #[tokio::test]
  async fn repeated_keys_promote_to_arrays_in_order() {
    let value = decode(
      IngestBody::from("tag=x&tag=y&tag=z&id=7"),
      SizeLimit::bytes(1024),
      "utf-8",
      None,
    )
    .await
    .unwrap();
    assert_eq!(value, json!({"tag": ["x", "y", "z"], "id": "7"}));
  }

  #[tokio::test]
  async fn percent_encoding_is_resolved() {
    let value = decode(
      IngestBody::from("name=J%C3%A1nos&msg=hello+world"),
      SizeLimit::bytes(1024),
      "utf-8",
      None,
    )
    .await
    .unwrap();
    assert_eq!(value, json!({"name": "János", "msg": "hello world"}));
  }

  #[tokio::test]
  async fn custom_parser_replaces_the_default() {
    let parser: QueryParser = Arc::new(|raw: &str| Ok(json!({ "raw": raw })));
    let value = decode(
      IngestBody::from("a=1&a=2"),
      SizeLimit::bytes(1024),
      "utf-8",
      Some(&parser),
    )
    .await
    .unwrap();
    assert_eq!(value, json!({"raw": "a=1&a=2"}));
  }

  #[tokio::test]
  async fn oversized_form_is_size_exceeded() {
    let err = decode(
      IngestBody::from("a=0123456789"),
      SizeLimit::bytes(4),
      "utf-8",
      None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BodyError::SizeExceeded { limit: 4 }));
  }
}
