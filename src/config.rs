//! Middleware configuration and option defaulting.
//!
//! [`BodyParserConfig`] is built once per middleware instantiation and shared
//! read-only across all requests. Every option has a documented default;
//! [`Default`] is the resolver. Malformed option values are not rejected here;
//! the decoders reject them at decode time.
//!
//! # Examples
//!
//! ```rust
//! use bodykit::config::BodyParserConfig;
//!
//! let config = BodyParserConfig::new()
//!   .with_multipart(true)
//!   .with_json_limit("2mb".parse().unwrap());
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::{context::Context, error::BodyError, limit::SizeLimit};

#[cfg(feature = "multipart")]
use crate::multipart::MultipartConfig;

/// Custom decode-error handler. When configured, decode failures are passed
/// here and the request continues downstream with an empty decoded value.
pub type ErrorHandler = Arc<dyn Fn(&BodyError, &mut Context) + Send + Sync>;

/// Replacement query-string parser for the url-encoded decoder.
pub type QueryParser = Arc<dyn Fn(&str) -> Result<Value, BodyError> + Send + Sync>;

/// Configuration for [`BodyParser`](crate::middleware::BodyParser).
#[derive(Clone)]
pub struct BodyParserConfig {
  /// Custom error handler; if absent, decode errors propagate to the caller.
  /// Default `None`.
  pub on_error: Option<ErrorHandler>,
  /// Also attach the decoded result to the raw request's extensions so plain
  /// Hyper handlers downstream can read it. Default `false`.
  pub patch_request: bool,
  /// Attach the decoded result to the [`Context`]. Default `true`.
  pub patch_context: bool,
  /// Decode `multipart/form-data` bodies. Default `false`.
  pub multipart: bool,
  /// Decode `application/x-www-form-urlencoded` bodies. Default `true`.
  pub urlencoded: bool,
  /// Decode JSON bodies. Default `true`.
  pub json: bool,
  /// Decode plain text bodies. Default `true`.
  pub text: bool,
  /// Charset used to decode body bytes. Default `"utf-8"`.
  pub encoding: String,
  /// Maximum JSON body size. Default 1mb.
  pub json_limit: SizeLimit,
  /// Reject JSON whose top-level value is neither object nor array.
  /// Default `true`.
  pub json_strict: bool,
  /// Maximum url-encoded form body size. Default 56kb.
  pub form_limit: SizeLimit,
  /// Maximum text body size. Default 56kb.
  pub text_limit: SizeLimit,
  /// Replacement query-string parser for the form decoder. Default `None`.
  pub query_string: Option<QueryParser>,
  /// Options handed to the multipart tokenizer.
  #[cfg(feature = "multipart")]
  pub multipart_config: MultipartConfig,
  /// When `true`, GET, HEAD and DELETE requests are not decoded at all.
  /// Default `true`.
  pub strict: bool,
}

impl Default for BodyParserConfig {
  fn default() -> Self {
    Self {
      on_error: None,
      patch_request: false,
      patch_context: true,
      multipart: false,
      urlencoded: true,
      json: true,
      text: true,
      encoding: "utf-8".to_owned(),
      json_limit: SizeLimit::DEFAULT_JSON,
      json_strict: true,
      form_limit: SizeLimit::DEFAULT_FORM,
      text_limit: SizeLimit::DEFAULT_TEXT,
      query_string: None,
      #[cfg(feature = "multipart")]
      multipart_config: MultipartConfig::default(),
      strict: true,
    }
  }
}

impl BodyParserConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_on_error(mut self, handler: ErrorHandler) -> Self {
    self.on_error = Some(handler);
    self
  }

  pub fn with_patch_request(mut self, enabled: bool) -> Self {
    self.patch_request = enabled;
    self
  }

  pub fn with_patch_context(mut self, enabled: bool) -> Self {
    self.patch_context = enabled;
    self
  }

  pub fn with_multipart(mut self, enabled: bool) -> Self {
    self.multipart = enabled;
    self
  }

  pub fn with_urlencoded(mut self, enabled: bool) -> Self {
    self.urlencoded = enabled;
    self
  }

  pub fn with_json(mut self, enabled: bool) -> Self {
    self.json = enabled;
    self
  }

  pub fn with_text(mut self, enabled: bool) -> Self {
    self.text = enabled;
    self
  }

  pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
    self.encoding = encoding.into();
    self
  }

  pub fn with_json_limit(mut self, limit: SizeLimit) -> Self {
    self.json_limit = limit;
    self
  }

  pub fn with_json_strict(mut self, enabled: bool) -> Self {
    self.json_strict = enabled;
    self
  }

  pub fn with_form_limit(mut self, limit: SizeLimit) -> Self {
    self.form_limit = limit;
    self
  }

  pub fn with_text_limit(mut self, limit: SizeLimit) -> Self {
    self.text_limit = limit;
    self
  }

  pub fn with_query_string(mut self, parser: QueryParser) -> Self {
    self.query_string = Some(parser);
    self
  }

  #[cfg(feature = "multipart")]
  pub fn with_multipart_config(mut self, config: MultipartConfig) -> Self {
    self.multipart_config = config;
    self
  }

  pub fn with_strict(mut self, enabled: bool) -> Self {
    self.strict = enabled;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_follow_documented_table() {
    let config = BodyParserConfig::default();
    assert!(config.on_error.is_none());
    assert!(!config.patch_request);
    assert!(config.patch_context);
    assert!(!config.multipart);
    assert!(config.urlencoded);
    assert!(config.json);
    assert!(config.text);
    assert_eq!(config.encoding, "utf-8");
    assert_eq!(config.json_limit, SizeLimit::DEFAULT_JSON);
    assert!(config.json_strict);
    assert_eq!(config.form_limit, SizeLimit::DEFAULT_FORM);
    assert_eq!(config.text_limit, SizeLimit::DEFAULT_TEXT);
    assert!(config.query_string.is_none());
    assert!(config.strict);
  }

  #[test]
  fn builders_override_single_fields() {
    let config = BodyParserConfig::new()
      .with_multipart(true)
      .with_strict(false)
      .with_json_limit(SizeLimit::bytes(64));
    assert!(config.multipart);
    assert!(!config.strict);
    assert_eq!(config.json_limit, SizeLimit::bytes(64));
    // untouched options keep their defaults
    assert!(config.urlencoded);
    assert_eq!(config.form_limit, SizeLimit::DEFAULT_FORM);
  }
}
