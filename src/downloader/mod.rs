//! Retrieval of legal documents from remote repositories

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::config::HttpConfig;

pub mod cellar;
pub mod errors;
pub mod normattiva;
pub mod pool;
pub mod report;

pub use cellar::{cellar_ids_from_results, CellarDownloader, SparqlResults};
pub use errors::DownloadError;
pub use normattiva::{NormattivaDownloader, NormattivaRequest};
pub use report::RunReport;

/// What a successful retrieval left on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieved {
    /// Archive extracted into this directory
    Archive(PathBuf),
    /// Single document written to this file
    File(PathBuf),
}

impl Retrieved {
    pub fn path(&self) -> &Path {
        match self {
            Retrieved::Archive(path) | Retrieved::File(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Retrieved::Archive(path) | Retrieved::File(path) => path,
        }
    }
}

/// Build the shared HTTP client. `cookie_store` keeps session cookies
/// between requests of the same client.
pub fn build_client(http: &HttpConfig, cookie_store: bool) -> Result<Client, DownloadError> {
    let client = Client::builder()
        .user_agent(&http.user_agent)
        .timeout(http.timeout())
        .cookie_store(cookie_store)
        .build()?;
    Ok(client)
}

/// File extension for a response `Content-Type`, ignoring parameters.
pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let extension = match mime.as_str() {
        "text/html" | "application/xhtml+xml" => "html",
        "application/json" => "json",
        "application/xml" | "text/xml" => "xml",
        "text/plain" => "txt",
        "application/zip" => "zip",
        "application/akn+xml" => "akn",
        "application/msword" => "doc",
        _ => return None,
    };
    Some(extension)
}

/// Identifiers become relative paths below the download directory. Ids that
/// would leave it (`..`, roots, prefixes) or are empty are rejected.
fn sanitize_id(id: &str) -> Result<&str, DownloadError> {
    let relative = id.trim().trim_start_matches('/');
    let path = Path::new(relative);
    if relative.is_empty() || !path.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(DownloadError::InvalidId(id.to_string()));
    }
    Ok(relative)
}

/// Persists HTTP responses below a download directory
#[derive(Debug, Clone)]
pub struct DocumentDownloader {
    download_dir: PathBuf,
}

impl DocumentDownloader {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }

    /// Check the status of `response` and persist its body under `id`.
    pub async fn handle_response(&self, id: &str, response: Response) -> Result<Retrieved, DownloadError> {
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        self.persist(id, content_type.as_deref(), &body)
    }

    /// Archives (any content type mentioning `zip`) are extracted into
    /// `{download_dir}/{id}/`, anything else with a known content type is
    /// written to `{download_dir}/{id}.{ext}`.
    pub fn persist(&self, id: &str, content_type: Option<&str>, body: &[u8]) -> Result<Retrieved, DownloadError> {
        let id = sanitize_id(id)?;
        let content_type = content_type.ok_or_else(|| DownloadError::MissingContentType(id.to_string()))?;

        if content_type.contains("zip") {
            let mut archive = zip::ZipArchive::new(Cursor::new(body))?;
            let target = self.download_dir.join(id);
            std::fs::create_dir_all(&target)?;
            debug!("Extracting {} entries into {}", archive.len(), target.display());
            archive.extract(&target)?;
            return Ok(Retrieved::Archive(target));
        }

        let extension =
            extension_from_content_type(content_type).ok_or_else(|| DownloadError::UnsupportedContentType {
                id: id.to_string(),
                content_type: content_type.to_string(),
            })?;

        let target = self.download_dir.join(format!("{}.{}", id, extension));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, body)?;
        info!("Saved {} ({} bytes)", target.display(), body.len());

        Ok(Retrieved::File(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_from_content_type("text/html;charset=UTF-8"), Some("html"));
        assert_eq!(extension_from_content_type("application/xhtml+xml"), Some("html"));
        assert_eq!(extension_from_content_type("application/xml;mtype=fmx4"), Some("xml"));
        assert_eq!(extension_from_content_type("text/plain"), Some("txt"));
        assert_eq!(extension_from_content_type("application/akn+xml"), Some("akn"));
        assert_eq!(extension_from_content_type("image/png"), None);
    }

    #[test]
    fn test_persist_single_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let downloader = DocumentDownloader::new(temp.path());

        let retrieved = downloader
            .persist("abc.0006.04/DOC_1", Some("application/xml;mtype=fmx4"), b"<ACT/>")
            .unwrap();

        let expected = temp.path().join("abc.0006.04").join("DOC_1.xml");
        assert_eq!(retrieved, Retrieved::File(expected.clone()));
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "<ACT/>");
    }

    #[test]
    fn test_persist_extracts_archive() {
        let temp = TempDir::new().unwrap();
        let downloader = DocumentDownloader::new(temp.path());
        let body = zip_bytes(&[("L_1.doc.xml", "<DOC/>"), ("L_1.000101.fmx.xml", "<ACT/>")]);

        let retrieved = downloader.persist("abc", Some("application/zip;mtype=fmx4"), &body).unwrap();

        assert_eq!(retrieved, Retrieved::Archive(temp.path().join("abc")));
        assert!(temp.path().join("abc").join("L_1.000101.fmx.xml").exists());
        assert!(temp.path().join("abc").join("L_1.doc.xml").exists());
    }

    #[test]
    fn test_persist_rejects_unknown_and_missing_types() {
        let temp = TempDir::new().unwrap();
        let downloader = DocumentDownloader::new(temp.path());

        assert!(matches!(
            downloader.persist("abc", Some("image/png"), b"png"),
            Err(DownloadError::UnsupportedContentType { .. })
        ));
        assert!(matches!(
            downloader.persist("abc", None, b"?"),
            Err(DownloadError::MissingContentType(_))
        ));
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id(" /abc/DOC_1\n").unwrap(), "abc/DOC_1");
        assert!(matches!(sanitize_id("../escaped"), Err(DownloadError::InvalidId(_))));
        assert!(matches!(sanitize_id("abc/../../x"), Err(DownloadError::InvalidId(_))));
        assert!(sanitize_id("  ").is_err());
    }

    #[test]
    fn test_persist_rejects_ids_leaving_download_dir() {
        let temp = TempDir::new().unwrap();
        let download_dir = temp.path().join("downloads");
        let downloader = DocumentDownloader::new(&download_dir);

        assert!(matches!(
            downloader.persist("../escaped", Some("text/plain"), b"x"),
            Err(DownloadError::InvalidId(_))
        ));
        assert!(!temp.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_corrupt_archive_leaves_no_directory() {
        let temp = TempDir::new().unwrap();
        let downloader = DocumentDownloader::new(temp.path());

        assert!(matches!(
            downloader.persist("broken", Some("application/zip"), b"not a zip"),
            Err(DownloadError::Zip(_))
        ));
        assert!(!temp.path().join("broken").exists());
    }
}
