pub mod body;
pub mod classify;
pub mod config;
pub mod context;
pub mod decode;
pub mod error;
pub mod limit;
pub mod middleware;

#[cfg(feature = "multipart")]
#[cfg_attr(docsrs, doc(cfg(feature = "multipart")))]
pub mod multipart;

pub use body::IngestBody;
pub use config::BodyParserConfig;
pub use context::Context;
pub use error::BodyError;
pub use limit::SizeLimit;
pub use middleware::{BodyParser, Middleware, Next, body_parser};

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;

pub type BoxBody = UnsyncBoxBody<Bytes, BoxError>;
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
