//! Publications Office Cellar downloader

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HOST};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::pool;
use super::{build_client, DocumentDownloader, DownloadError, Retrieved, RunReport};
use crate::config::Config;
use crate::models::Source;

pub const BASE_URL: &str = "http://publications.europa.eu/resource/cellar/";

pub const ACCEPT_TYPES: &str = "application/zip, application/zip;mtype=fmx4, application/xml;mtype=fmx4, \
application/xhtml+xml, text/html, text/html;type=simplified, application/msword, text/plain, \
application/xml;notice=object";
const ACCEPT_LANGUAGES: &str = "eng";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const CELLAR_HOST: &str = "publications.europa.eu";

/// JSON result of a Cellar SPARQL query
#[derive(Debug, Deserialize)]
pub struct SparqlResults {
    pub results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
pub struct SparqlBindings {
    pub bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Debug, Deserialize)]
pub struct SparqlValue {
    pub value: String,
}

impl SparqlResults {
    pub fn from_json(json: &str) -> Result<Self, DownloadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, DownloadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Cellar ids of the bindings whose `format` equals `format`, taken from the
/// part of `cellarURIs` after `cellar/`.
pub fn cellar_ids_from_results(results: &SparqlResults, format: &str) -> Vec<String> {
    results
        .results
        .bindings
        .iter()
        .filter(|binding| {
            binding
                .get("format")
                .is_some_and(|value| value.value.eq_ignore_ascii_case(format))
        })
        .filter_map(|binding| {
            let uri = &binding.get("cellarURIs")?.value;
            let (_, id) = uri.split_once("cellar/")?;
            Some(id.to_string())
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct CellarDownloader {
    client: Client,
    base_url: String,
    documents: DocumentDownloader,
    log_dir: PathBuf,
}

impl CellarDownloader {
    pub fn new(config: &Config) -> Result<Self, DownloadError> {
        Ok(Self {
            client: build_client(&config.http, false)?,
            base_url: config.endpoints.cellar_base_url.clone(),
            documents: DocumentDownloader::new(&config.download_dir),
            log_dir: config.log_dir.clone(),
        })
    }

    pub fn build_request_url(&self, id: &str) -> String {
        format!("{}{}", self.base_url, id.trim())
    }

    pub async fn fetch_content(&self, id: &str) -> Result<Response, DownloadError> {
        let url = self.build_request_url(id);
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, ACCEPT_TYPES)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGES)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(HOST, CELLAR_HOST)
            .send()
            .await?;
        Ok(response)
    }

    pub async fn download_one(&self, id: &str) -> Result<Retrieved, DownloadError> {
        let response = self.fetch_content(id).await?;
        self.documents.handle_response(id, response).await
    }

    /// Download every id with `workers` concurrent workers, write the run
    /// report and return the paths of the retrieved documents.
    pub async fn download(&self, ids: Vec<String>, workers: usize) -> Result<Vec<PathBuf>, DownloadError> {
        info!("Starting Cellar download of {} documents with {} workers", ids.len(), workers);

        let mut lost = Vec::new();
        let downloader = self.clone();
        let outcomes = pool::run(
            ids,
            workers,
            move |id| {
                let downloader = downloader.clone();
                async move { downloader.download_one(&id).await }
            },
            |id| lost.push(id.to_string()),
        )
        .await;

        let mut report = RunReport::new(Source::Cellar);
        for (id, outcome) in outcomes {
            if let Ok(retrieved) = &outcome {
                info!("✓ Downloaded {}: {}", id, retrieved.path().display());
            }
            report.record(&id, outcome);
        }
        report.failed.extend(lost);
        report.write(&self.log_dir)?;

        Ok(report.into_paths())
    }
}
