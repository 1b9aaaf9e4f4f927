//! The body-parsing middleware: dispatch, error policy and patching.
//!
//! Per request the parser runs a two-phase state machine. Phase one selects
//! and runs a decoder: strict-mode GET/HEAD/DELETE requests skip decoding,
//! everything else goes through the classifier to the matching decoder or the
//! multipart aggregator. Phase two applies the error policy: a configured
//! `on_error` handler recovers the request locally (the chain continues with
//! an empty decoded value), otherwise the failure surfaces to the caller and
//! the continuation never runs. The decoded value is patched onto the
//! configured destinations before the continuation is invoked, exactly once.

use std::{future::Future, pin::Pin};

use async_trait::async_trait;
use http::Method;
#[cfg(feature = "multipart")]
use http::header::CONTENT_TYPE;

use crate::{
  BoxError,
  classify::{BodyKind, classify},
  config::BodyParserConfig,
  context::{Context, ParsedBody},
  decode::{self, DecodedBody},
  error::BodyError,
};

#[cfg(feature = "multipart")]
use crate::context::ParsedFiles;

pub type NextFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;

/// The downstream continuation. Consumed on use, so it runs at most once.
pub struct Next<'a> {
  inner: Box<dyn FnOnce() -> NextFuture<'a> + Send + 'a>,
}

impl<'a> Next<'a> {
  pub fn new<F>(f: F) -> Self
  where
    F: FnOnce() -> NextFuture<'a> + Send + 'a,
  {
    Self { inner: Box::new(f) }
  }

  /// Invokes the rest of the chain. The returned future resolves when the
  /// downstream stack has finished with the request.
  pub async fn run(self) -> Result<(), BoxError> {
    (self.inner)().await
  }
}

#[async_trait]
pub trait Middleware: Send + Sync {
  async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), BoxError>;
}

/// Content-negotiating body parser. One instance serves every request; the
/// configuration is resolved once and never mutated afterwards.
pub struct BodyParser {
  config: BodyParserConfig,
}

/// Creates a [`BodyParser`] middleware from a resolved configuration.
pub fn body_parser(config: BodyParserConfig) -> BodyParser {
  BodyParser::new(config)
}

impl BodyParser {
  pub fn new(config: BodyParserConfig) -> Self {
    Self { config }
  }

  async fn decode(&self, kind: BodyKind, ctx: &mut Context) -> Result<DecodedBody, BodyError> {
    let config = &self.config;
    match kind {
      BodyKind::Json => decode::json::decode(
        ctx.take_body(),
        config.json_limit,
        &config.encoding,
        config.json_strict,
      )
      .await
      .map(DecodedBody::Value),
      BodyKind::Urlencoded => decode::urlencoded::decode(
        ctx.take_body(),
        config.form_limit,
        &config.encoding,
        config.query_string.as_ref(),
      )
      .await
      .map(DecodedBody::Value),
      BodyKind::Text => decode::text::decode(ctx.take_body(), config.text_limit, &config.encoding)
        .await
        .map(DecodedBody::Value),
      #[cfg(feature = "multipart")]
      BodyKind::Multipart => {
        let content_type = ctx
          .headers()
          .get(CONTENT_TYPE)
          .and_then(|v| v.to_str().ok())
          .unwrap_or_default()
          .to_owned();
        crate::multipart::parse(ctx.take_body(), &content_type, &config.multipart_config)
          .await
          .map(DecodedBody::Multipart)
      }
      // The classifier never selects multipart without the feature.
      #[cfg(not(feature = "multipart"))]
      BodyKind::Multipart => Ok(DecodedBody::empty()),
      BodyKind::None => Ok(DecodedBody::empty()),
    }
  }

  fn patch(&self, ctx: &mut Context, decoded: DecodedBody) {
    match decoded {
      DecodedBody::Value(value) => {
        if self.config.patch_request {
          ctx
            .request_mut()
            .extensions_mut()
            .insert(ParsedBody(value.clone()));
        }
        if self.config.patch_context {
          ctx.body = Some(value);
        }
      }
      #[cfg(feature = "multipart")]
      DecodedBody::Multipart(result) => {
        // Fields land on the body destination, files on the files
        // destination, always separately.
        let fields = serde_json::to_value(&result.fields).unwrap_or_default();
        if self.config.patch_request {
          ctx
            .request_mut()
            .extensions_mut()
            .insert(ParsedBody(fields.clone()));
          ctx
            .request_mut()
            .extensions_mut()
            .insert(ParsedFiles(result.files.clone()));
        }
        if self.config.patch_context {
          ctx.body = Some(fields);
          ctx.files = Some(result.files);
        }
      }
    }
  }
}

#[async_trait]
impl Middleware for BodyParser {
  async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), BoxError> {
    let config = &self.config;
    let method = ctx.method().clone();
    let skip = config.strict
      && (method == Method::GET || method == Method::HEAD || method == Method::DELETE);

    let decoded = if skip {
      DecodedBody::empty()
    } else {
      let kind = classify(ctx.headers(), config);
      tracing::debug!(?kind, "selected body decoder");
      match self.decode(kind, ctx).await {
        Ok(decoded) => decoded,
        Err(err) => match &config.on_error {
          Some(handler) => {
            tracing::debug!("body decode error recovered by handler: {err}");
            handler(&err, ctx);
            DecodedBody::empty()
          }
          None => return Err(err.into()),
        },
      }
    };

    self.patch(ctx, decoded);
    next.run().await
  }
}
