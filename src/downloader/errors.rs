//! Download error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to extract archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid query results: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported content type '{content_type}' for {id}")]
    UnsupportedContentType { id: String, content_type: String },

    #[error("Identifier '{0}' does not name a path below the download directory")]
    InvalidId(String),

    #[error("Response for {0} has no Content-Type header")]
    MissingContentType(String),
}
