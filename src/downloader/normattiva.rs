//! Normattiva (Italian consolidated legislation) Akoma Ntoso downloader

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Response};
use std::path::PathBuf;
use tracing::{debug, info};

use super::{build_client, DocumentDownloader, DownloadError, Retrieved, RunReport};
use crate::config::Config;
use crate::models::Source;

pub const BASE_URL: &str = "https://www.normattiva.it";

/// Identifies one consolidated act. `codice_redaz` is the persisted id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormattivaRequest {
    /// Gazzetta Ufficiale publication date, `YYYYMMDD`
    pub data_gu: String,
    pub codice_redaz: String,
    /// Date of the consolidated version, `YYYYMMDD`
    pub data_vigenza: String,
    /// Act date used by the ELI uri, `YYYY/MM/DD`
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct NormattivaDownloader {
    client: Client,
    base_url: String,
    documents: DocumentDownloader,
    log_dir: PathBuf,
}

impl NormattivaDownloader {
    pub fn new(config: &Config) -> Result<Self, DownloadError> {
        Ok(Self {
            client: build_client(&config.http, true)?,
            base_url: config.endpoints.normattiva_base_url.trim_end_matches('/').to_string(),
            documents: DocumentDownloader::new(&config.download_dir),
            log_dir: config.log_dir.clone(),
        })
    }

    /// ELI uri of the act (session cookies) and the AKN export url.
    pub fn build_request_urls(&self, request: &NormattivaRequest) -> (String, String) {
        let uri = format!(
            "{}/eli/id/{}//{}/CONSOLIDATED",
            self.base_url, request.date, request.codice_redaz
        );
        let url = format!(
            "{}/do/atto/caricaAKN?dataGU={}&codiceRedaz={}&dataVigenza={}",
            self.base_url, request.data_gu, request.codice_redaz, request.data_vigenza
        );
        (uri, url)
    }

    /// The export only answers within a session opened by visiting the act
    /// page; the client's cookie store carries it to the second request.
    pub async fn fetch_content(&self, request: &NormattivaRequest) -> Result<Response, DownloadError> {
        let (uri, url) = self.build_request_urls(request);

        debug!("Opening session at {}", uri);
        let session = self.client.get(&uri).send().await?;
        if !session.status().is_success() {
            return Err(DownloadError::Status {
                status: session.status().as_u16(),
                url: uri,
            });
        }

        debug!("Requesting {}", url);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/xml")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;
        Ok(response)
    }

    pub async fn download_one(&self, request: &NormattivaRequest) -> Result<Retrieved, DownloadError> {
        let response = self.fetch_content(request).await?;
        self.documents.handle_response(&request.codice_redaz, response).await
    }

    pub async fn download(&self, request: &NormattivaRequest) -> Result<Vec<PathBuf>, DownloadError> {
        info!("Starting Normattiva download for {}", request.codice_redaz);

        let mut report = RunReport::new(Source::Normattiva);
        let outcome = self.download_one(request).await;
        if let Ok(retrieved) = &outcome {
            info!("✓ Downloaded {}: {}", request.codice_redaz, retrieved.path().display());
        }
        report.record(&request.codice_redaz, outcome);
        report.write(&self.log_dir)?;

        Ok(report.into_paths())
    }
}
