/// This module provides the `IngestBody` struct, a wrapper around a boxed HTTP
/// body. Decoders take the body out of the request context with `mem::take`,
/// leaving an empty body behind, so a request is never decoded twice.
use std::{
  pin::Pin,
  task::{Context, Poll},
};

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Body, Frame, SizeHint};

use crate::{BoxBody, BoxError};

/// A boxed request body consumed by the decoders.
pub struct IngestBody(BoxBody);

impl IngestBody {
  /// Wraps any HTTP body whose error converts into [`BoxError`].
  pub fn new<B>(body: B) -> Self
  where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
  {
    Self(body.map_err(|e| e.into()).boxed_unsync())
  }

  /// Creates an empty `IngestBody`.
  pub fn empty() -> Self {
    Self::new(Empty::new())
  }
}

/// `mem::take` support: a taken body leaves an empty one behind.
impl Default for IngestBody {
  fn default() -> Self {
    Self::empty()
  }
}

impl From<Bytes> for IngestBody {
  fn from(buf: Bytes) -> Self {
    Self::new(Full::from(buf))
  }
}

impl From<String> for IngestBody {
  fn from(buf: String) -> Self {
    Self::new(Full::from(buf))
  }
}

impl From<&'static str> for IngestBody {
  fn from(buf: &'static str) -> Self {
    Self::new(Full::from(buf))
  }
}

impl Body for IngestBody {
  type Data = Bytes;
  type Error = BoxError;

  #[inline]
  fn poll_frame(
    mut self: Pin<&mut Self>,
    cx: &mut Context<'_>,
  ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
    Pin::new(&mut self.0).poll_frame(cx)
  }

  #[inline]
  fn size_hint(&self) -> SizeHint {
    self.0.size_hint()
  }

  #[inline]
  fn is_end_stream(&self) -> bool {
    self.0.is_end_stream()
  }
}
