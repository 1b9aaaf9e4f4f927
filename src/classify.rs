//! Content-type classification.
//!
//! Maps a request's declared media type to the decoder that should handle it.
//! Matching order is json → urlencoded → text → multipart; the first enabled
//! kind whose media-type test passes wins. A media type that satisfies more
//! than one test always resolves to the earlier-listed kind, and callers rely
//! on that precedence.

use http::{HeaderMap, header::CONTENT_TYPE};
use mime::Mime;

use crate::config::BodyParserConfig;

/// The decoding strategy selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
  Json,
  Urlencoded,
  Text,
  Multipart,
  /// No enabled decoder matches; the decoded value is an empty object.
  None,
}

/// Media-type test for a single body kind.
pub(crate) fn media_type_matches(mime: &Mime, kind: BodyKind) -> bool {
  match kind {
    BodyKind::Json => {
      mime.type_() == mime::APPLICATION
        && (mime.subtype() == mime::JSON || mime.suffix().is_some_and(|s| s == mime::JSON))
    }
    BodyKind::Urlencoded => {
      mime.type_() == mime::APPLICATION && mime.subtype() == mime::WWW_FORM_URLENCODED
    }
    BodyKind::Text => mime.type_() == mime::TEXT,
    BodyKind::Multipart => mime.type_() == mime::MULTIPART,
    BodyKind::None => false,
  }
}

/// Selects the decoder for a request from its headers and the enabled flags.
pub fn classify(headers: &HeaderMap, config: &BodyParserConfig) -> BodyKind {
  let Some(mime) = headers
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .and_then(|ct| ct.parse::<Mime>().ok())
  else {
    return BodyKind::None;
  };

  let candidates = [
    (config.json, BodyKind::Json),
    (config.urlencoded, BodyKind::Urlencoded),
    (config.text, BodyKind::Text),
    (
      config.multipart && cfg!(feature = "multipart"),
      BodyKind::Multipart,
    ),
  ];
  for (enabled, kind) in candidates {
    if enabled && media_type_matches(&mime, kind) {
      return kind;
    }
  }
  BodyKind::None
}
