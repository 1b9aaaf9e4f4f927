#![cfg_attr(docsrs, doc(cfg(feature = "multipart")))]
//! Multipart form aggregation.
//!
//! The tokenizer (a `multer`-backed task) segments the body into parts and
//! emits an ordered stream of [`PartEvent`]s; [`aggregate`] folds that stream
//! into a [`MultipartResult`], promoting repeated field and file names from
//! scalars to arrival-ordered sequences. The aggregation settles exactly once:
//! the first terminal event (`End` or `Error`) decides the outcome and nothing
//! emitted afterwards is observed.
//!
//! # Examples
//!
//! ```rust,no_run
//! use bodykit::multipart::{MultipartConfig, parse};
//! use bodykit::body::IngestBody;
//!
//! async fn handle(body: IngestBody, content_type: &str) -> anyhow::Result<()> {
//!     let result = parse(body, content_type, &MultipartConfig::default()).await?;
//!     for (name, value) in &result.fields {
//!         println!("{name}: {value:?}");
//!     }
//!     Ok(())
//! }
//! ```

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  sync::Arc,
};

use futures_util::{Stream, StreamExt};
use http_body_util::BodyExt;
use multer::Multipart;
use serde::Serialize;
use tokio::{fs::File, io::AsyncWriteExt, sync::mpsc};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{body::IngestBody, error::BodyError, limit::SizeLimit};

/// A value that is a scalar until a second occurrence of its key arrives,
/// then an ordered sequence. Promotion is one-directional: once `Many`,
/// always `Many` for the rest of the aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
  One(T),
  Many(Vec<T>),
}

impl<T> OneOrMany<T> {
  /// Appends a value, promoting `One` to a two-element `Many`.
  pub fn push(&mut self, value: T) {
    let current = std::mem::replace(self, OneOrMany::Many(Vec::new()));
    *self = match current {
      OneOrMany::One(first) => OneOrMany::Many(vec![first, value]),
      OneOrMany::Many(mut items) => {
        items.push(value);
        OneOrMany::Many(items)
      }
    };
  }

  pub fn len(&self) -> usize {
    match self {
      OneOrMany::One(_) => 1,
      OneOrMany::Many(items) => items.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Aggregated scalar fields, by field name.
pub type Fields = HashMap<String, OneOrMany<String>>;

/// Aggregated file descriptors, by field name.
pub type Files = HashMap<String, OneOrMany<FilePart>>;

/// A file part written to disk by the tokenizer.
///
/// The aggregator treats this as an opaque value; only the tokenizer fills it
/// in. The file's storage lifetime is the caller's to manage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilePart {
  /// Original file name provided by the client, if any.
  pub file_name: Option<String>,
  /// MIME type of the part, if declared.
  pub content_type: Option<String>,
  /// Path the content was saved to.
  pub path: PathBuf,
  /// Size of the saved content in bytes.
  pub size: u64,
}

/// One tokenizer emission, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum PartEvent {
  /// A scalar form field.
  Field { name: String, value: String },
  /// A file part is about to be read; `file.size` is still zero.
  FileBegin { name: String, file: FilePart },
  /// A file part has been fully written to disk.
  File { name: String, file: FilePart },
  /// The form ended cleanly.
  End,
  /// The tokenizer failed; no further events will be observed.
  Error(String),
}

/// Hook invoked for every file part before its content is read. The
/// descriptor is mutable: rewriting `path` redirects where the content is
/// saved, and the emitted `FileBegin` event carries the post-hook descriptor.
pub type FileBeginHook = Arc<dyn Fn(&str, &mut FilePart) + Send + Sync>;

/// Options handed to the multipart tokenizer.
#[derive(Clone)]
pub struct MultipartConfig {
  /// Directory uploaded files are written to. Defaults to the OS temp dir.
  pub upload_dir: PathBuf,
  /// Per-file size limit enforced by the tokenizer.
  pub max_file_size: Option<SizeLimit>,
  /// Called for each file part before its content is read; may rewrite the
  /// descriptor's `path` to redirect the upload.
  pub on_file_begin: Option<FileBeginHook>,
}

impl Default for MultipartConfig {
  fn default() -> Self {
    Self {
      upload_dir: std::env::temp_dir(),
      max_file_size: None,
      on_file_begin: None,
    }
  }
}

impl MultipartConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.upload_dir = dir.into();
    self
  }

  pub fn with_max_file_size(mut self, limit: SizeLimit) -> Self {
    self.max_file_size = Some(limit);
    self
  }

  pub fn with_on_file_begin(mut self, hook: FileBeginHook) -> Self {
    self.on_file_begin = Some(hook);
    self
  }
}

/// The merged result of one multipart aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct MultipartResult {
  pub fields: Fields,
  pub files: Files,
}

fn insert_or_promote<T>(map: &mut HashMap<String, OneOrMany<T>>, key: String, value: T) {
  use std::collections::hash_map::Entry;
  match map.entry(key) {
    Entry::Vacant(slot) => {
      slot.insert(OneOrMany::One(value));
    }
    Entry::Occupied(mut slot) => slot.get_mut().push(value),
  }
}

/// Folds an ordered event stream into a [`MultipartResult`].
///
/// Settles exactly once: returns on the first `End` or `Error` and stops
/// polling, so later events are never observed. A stream that closes without
/// a terminal event is an aborted request and rejects like an `Error`.
/// A form with zero parts resolves to an empty result. `FileBegin` events
/// are informational and never mutate the result.
pub async fn aggregate<S>(mut events: S) -> Result<MultipartResult, BodyError>
where
  S: Stream<Item = PartEvent> + Unpin,
{
  let mut fields = Fields::new();
  let mut files = Files::new();

  while let Some(event) = events.next().await {
    match event {
      PartEvent::Field { name, value } => insert_or_promote(&mut fields, name, value),
      PartEvent::FileBegin { .. } => {}
      PartEvent::File { name, file } => insert_or_promote(&mut files, name, file),
      PartEvent::End => return Ok(MultipartResult { fields, files }),
      PartEvent::Error(message) => return Err(BodyError::Tokenizer(message)),
    }
  }
  Err(BodyError::Tokenizer(
    "request stream closed before end of form".to_owned(),
  ))
}

/// Parses a multipart body end to end: boundary from the Content-Type header,
/// tokenizer task over the body stream, aggregation of the emitted events.
pub async fn parse(
  body: IngestBody,
  content_type: &str,
  config: &MultipartConfig,
) -> Result<MultipartResult, BodyError> {
  let boundary =
    multer::parse_boundary(content_type).map_err(|e| BodyError::Tokenizer(e.to_string()))?;
  let events = spawn_tokenizer(body, boundary, config.clone());
  aggregate(ReceiverStream::new(events)).await
}

/// Starts the tokenizer task. The channel receiver exists before the task
/// begins consuming the request stream, so no early event can be lost.
fn spawn_tokenizer(
  body: IngestBody,
  boundary: String,
  config: MultipartConfig,
) -> mpsc::Receiver<PartEvent> {
  let (tx, rx) = mpsc::channel(16);

  tokio::spawn(async move {
    let mut constraints = multer::Constraints::new();
    if let Some(limit) = config.max_file_size {
      constraints = constraints.size_limit(multer::SizeLimit::new().per_field(limit.as_u64()));
    }
    let mut multipart =
      Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    loop {
      match multipart.next_field().await {
        Ok(Some(field)) => {
          let name = field.name().unwrap_or_default().to_owned();
          if field.file_name().is_some() {
            let mut file = FilePart {
              file_name: field.file_name().map(str::to_owned),
              content_type: field.content_type().map(|m| m.to_string()),
              path: target_path(&config.upload_dir, field.file_name()),
              size: 0,
            };
            // The hook runs before any content is read and may redirect
            // `path`; the FileBegin event carries the post-hook descriptor.
            if let Some(hook) = &config.on_file_begin {
              hook(&name, &mut file);
            }
            let begin = PartEvent::FileBegin {
              name: name.clone(),
              file: file.clone(),
            };
            if tx.send(begin).await.is_err() {
              return;
            }
            match save_file(field, file).await {
              Ok(file) => {
                if tx.send(PartEvent::File { name, file }).await.is_err() {
                  return;
                }
              }
              Err(err) => {
                let _ = tx.send(PartEvent::Error(err.to_string())).await;
                return;
              }
            }
          } else {
            match field.text().await {
              Ok(value) => {
                if tx.send(PartEvent::Field { name, value }).await.is_err() {
                  return;
                }
              }
              Err(err) => {
                let _ = tx.send(PartEvent::Error(err.to_string())).await;
                return;
              }
            }
          }
        }
        Ok(None) => {
          let _ = tx.send(PartEvent::End).await;
          return;
        }
        Err(err) => {
          let _ = tx.send(PartEvent::Error(err.to_string())).await;
          return;
        }
      }
    }
  });

  rx
}

fn target_path(dir: &Path, original: Option<&str>) -> PathBuf {
  let fname = original
    .map(|f| format!("upload-{}-{}", Uuid::new_v4(), f))
    .unwrap_or_else(|| format!("upload-{}", Uuid::new_v4()));
  dir.join(fname)
}

/// Streams a field's content to disk, returning the descriptor with its
/// final size.
async fn save_file(mut field: multer::Field<'static>, mut file: FilePart) -> anyhow::Result<FilePart> {
  let mut outfile = File::create(&file.path).await?;
  let mut written: u64 = 0;
  while let Some(chunk) = field.chunk().await? {
    outfile.write_all(&chunk).await?;
    written += chunk.len() as u64;
  }
  outfile.flush().await?;
  file.size = written;
  Ok(file)
}
