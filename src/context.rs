//! Per-request context handed through the middleware chain.
//!
//! `Context` owns the incoming `http::Request` and carries the two patch
//! destinations for decoded bodies: its own `body`/`files` fields (read by
//! handlers that work with the context) and, when `patch_request` is enabled,
//! typed extensions on the inner request (read by plain Hyper handlers that
//! only ever see the `http::Request`).

use http::{HeaderMap, Method, Request, header::CONTENT_TYPE};
use hyper::body::Body;
use mime::Mime;
use serde_json::Value;

use crate::{BoxError, body::IngestBody, classify::BodyKind};

#[cfg(feature = "multipart")]
use crate::multipart::Files;

/// Decoded body attached to the raw request's extensions.
#[derive(Debug, Clone)]
pub struct ParsedBody(pub Value);

/// Decoded multipart files attached to the raw request's extensions.
#[cfg(feature = "multipart")]
#[derive(Debug, Clone)]
pub struct ParsedFiles(pub Files);

/// Mutable per-request state owned by one request's middleware chain.
pub struct Context {
  request: Request<IngestBody>,
  /// Decoded request body, set by the body parser when `patch_context` is on.
  pub body: Option<Value>,
  /// Decoded multipart files, set by the body parser when `patch_context` is on.
  #[cfg(feature = "multipart")]
  pub files: Option<Files>,
}

impl Context {
  /// Wraps an incoming request.
  pub fn new<B>(request: Request<B>) -> Self
  where
    B: Body<Data = bytes::Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
  {
    Self {
      request: request.map(IngestBody::new),
      body: None,
      #[cfg(feature = "multipart")]
      files: None,
    }
  }

  pub fn method(&self) -> &Method {
    self.request.method()
  }

  pub fn headers(&self) -> &HeaderMap {
    self.request.headers()
  }

  /// The parsed media type of the request, if one is declared.
  pub fn content_type(&self) -> Option<Mime> {
    self
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .and_then(|ct| ct.parse::<Mime>().ok())
  }

  /// Content-type predicate: does the declared media type match `kind`?
  pub fn is(&self, kind: BodyKind) -> bool {
    self
      .content_type()
      .is_some_and(|mime| crate::classify::media_type_matches(&mime, kind))
  }

  /// Takes the body stream out of the request, leaving an empty one behind.
  pub fn take_body(&mut self) -> IngestBody {
    std::mem::take(self.request.body_mut())
  }

  pub fn request(&self) -> &Request<IngestBody> {
    &self.request
  }

  pub fn request_mut(&mut self) -> &mut Request<IngestBody> {
    &mut self.request
  }

  /// Consumes the context, returning the inner request for the downstream
  /// handler stack.
  pub fn into_request(self) -> Request<IngestBody> {
    self.request
  }
}
