//! File upload orchestration.
//!
//! Uploads bypass the JSON envelope entirely: the file's raw bytes are the
//! POST body, metadata travels in headers and the query string, and the
//! server's response body is returned un-decoded. This is intentionally
//! asymmetric with `call()`, which always decodes.
//!
//! The destination URL comes from one of three target shapes: a
//! previously-fetched photoset object, a numeric photoset id (resolved with
//! a shallow `LoadPhotoSet` first), or a literal URL.

use std::collections::HashMap;
use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::{debug, info};

use crate::client::ZenfolioClient;
use crate::error::{Result, ZenfolioError};
use crate::transport::{HttpMethod, TransportRequest};

/// Photoset fields the upload pipeline cares about. Further fields of the
/// remote object are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSet {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "UploadUrl", default)]
    pub upload_url: Option<String>,
    #[serde(rename = "VideoUploadUrl", default)]
    pub video_upload_url: Option<String>,
    #[serde(rename = "RawUploadUrl", default)]
    pub raw_upload_url: Option<String>,
}

/// Where an upload should land. Exactly one resolution path is taken per
/// call, chosen by variant.
#[derive(Debug, Clone)]
pub enum UploadTarget {
    /// A photoset object already fetched from the API
    PhotoSet(PhotoSet),
    /// A photoset id; resolved with a shallow `LoadPhotoSet` call first
    PhotoSetId(i64),
    /// A literal destination URL
    Url(String),
}

impl From<PhotoSet> for UploadTarget {
    fn from(photoset: PhotoSet) -> Self {
        UploadTarget::PhotoSet(photoset)
    }
}

impl From<i64> for UploadTarget {
    fn from(id: i64) -> Self {
        UploadTarget::PhotoSetId(id)
    }
}

impl From<&str> for UploadTarget {
    fn from(url: &str) -> Self {
        UploadTarget::Url(url.to_string())
    }
}

/// Which of a photoset's upload URLs to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadKind {
    #[default]
    Photo,
    Video,
    Raw,
}

impl UploadKind {
    fn as_str(self) -> &'static str {
        match self {
            UploadKind::Photo => "photo",
            UploadKind::Video => "video",
            UploadKind::Raw => "raw",
        }
    }
}

/// Options for a single upload.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub kind: UploadKind,
    /// Filename reported to the server; defaults to the file's base name
    pub filename: Option<String>,
    /// Original modification timestamp, sent as the `modified` query parameter
    pub modified: Option<DateTime<Utc>>,
    /// Use PUT instead of POST
    pub use_put: bool,
}

impl ZenfolioClient {
    /// Upload a local file and return the server's raw response body.
    ///
    /// Fails with [`ZenfolioError::InvalidArgument`] before any network
    /// activity if the file does not exist or no session credential is
    /// attached.
    pub async fn upload(
        &self,
        target: impl Into<UploadTarget>,
        path: impl AsRef<Path>,
        options: UploadOptions,
    ) -> Result<String> {
        let path = path.as_ref();

        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(ZenfolioError::InvalidArgument(format!(
                    "upload file does not exist or is not readable: {}",
                    path.display()
                )));
            }
        }

        {
            let session = self.session.read().await;
            if session.auth_token.is_none() && session.keyring.is_none() {
                return Err(ZenfolioError::InvalidArgument(
                    "uploading requires a session token or keyring; log in first".to_string(),
                ));
            }
        }

        let url = self.resolve_upload_url(target.into(), options.kind).await?;
        let data = self.read_upload_body(path).await?;

        let filename = options.filename.clone().unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        // Encoded once here; the transport appends query values verbatim.
        let mut query = vec![(
            "filename".to_string(),
            urlencoding::encode(&filename).into_owned(),
        )];
        if let Some(modified) = options.modified {
            query.push((
                "modified".to_string(),
                urlencoding::encode(&modified.to_rfc3339()).into_owned(),
            ));
        }

        // Content-Length is derived from the body by the transport.
        let mut headers = self.request_headers(false).await;
        headers.push((
            "Content-Type".to_string(),
            guess_content_type(path).to_string(),
        ));

        let request = TransportRequest {
            method: if options.use_put {
                HttpMethod::Put
            } else {
                HttpMethod::Post
            },
            url,
            headers,
            query,
            body: Bytes::from(data),
        };

        debug!(
            file = %path.display(),
            kind = options.kind.as_str(),
            bytes = request.body.len(),
            "uploading file"
        );

        let response = self.transport.send(request).await?;
        self.record_response(&response).await;

        info!(file = %path.display(), status = response.status, "upload complete");

        Ok(String::from_utf8_lossy(&response.body).into_owned())
    }

    async fn resolve_upload_url(&self, target: UploadTarget, kind: UploadKind) -> Result<String> {
        let photoset = match target {
            UploadTarget::Url(url) => return Ok(url),
            UploadTarget::PhotoSet(photoset) => photoset,
            UploadTarget::PhotoSetId(id) => {
                // Shallow load, without the photo list
                let value = self
                    .call("LoadPhotoSet", vec![json!(id), json!("Level1"), json!(false)])
                    .await?;
                serde_json::from_value(value).map_err(|e| ZenfolioError::InvalidEnvelope {
                    method: "LoadPhotoSet".to_string(),
                    detail: format!("unexpected photoset payload: {e}"),
                })?
            }
        };
        select_upload_url(&photoset, kind)
    }

    async fn read_upload_body(&self, path: &Path) -> Result<Vec<u8>> {
        let file = tokio::fs::File::open(path).await?;
        let mut reader = BufReader::with_capacity(self.config.transport.buffer_size, file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        Ok(data)
    }
}

/// Pick the photoset upload URL matching the requested kind.
fn select_upload_url(photoset: &PhotoSet, kind: UploadKind) -> Result<String> {
    let url = match kind {
        UploadKind::Photo => &photoset.upload_url,
        UploadKind::Video => &photoset.video_upload_url,
        UploadKind::Raw => &photoset.raw_upload_url,
    };
    url.clone().ok_or_else(|| {
        ZenfolioError::InvalidArgument(format!(
            "photoset {} has no {} upload URL",
            photoset.id,
            kind.as_str()
        ))
    })
}

/// Guess a media type from the file extension.
fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("json") => "application/json",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}
