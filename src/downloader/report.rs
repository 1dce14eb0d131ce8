//! Per-run download summary written to the log directory

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{DownloadError, Retrieved};
use crate::models::Source;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug)]
pub struct RunReport {
    pub source: Source,
    pub archives: usize,
    pub single_files: usize,
    pub failed: Vec<String>,
    paths: Vec<PathBuf>,
}

impl RunReport {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            archives: 0,
            single_files: 0,
            failed: Vec::new(),
            paths: Vec::new(),
        }
    }

    /// Count the outcome of one identifier. Failures are logged and kept.
    pub fn record(&mut self, id: &str, outcome: Result<Retrieved, DownloadError>) {
        match outcome {
            Ok(retrieved) => {
                match retrieved {
                    Retrieved::Archive(_) => self.archives += 1,
                    Retrieved::File(_) => self.single_files += 1,
                }
                self.paths.push(retrieved.into_path());
            }
            Err(e) => {
                warn!("✗ Failed to download {}: {}", id, e);
                self.failed.push(id.to_string());
            }
        }
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }

    pub fn summary(&self) -> String {
        format!(
            "Zip files: {}, Single files: {}, Failed downloads: {}",
            self.archives,
            self.single_files,
            self.failed.len()
        )
    }

    /// Write `{timestamp}.txt` and, when anything failed,
    /// `failed_{timestamp}.txt` into `log_dir`. Returns the summary path.
    pub fn write(&self, log_dir: &Path) -> Result<PathBuf, DownloadError> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.write_with_timestamp(log_dir, &timestamp)
    }

    pub fn write_with_timestamp(&self, log_dir: &Path, timestamp: &str) -> Result<PathBuf, DownloadError> {
        std::fs::create_dir_all(log_dir)?;

        if !self.failed.is_empty() {
            let failed_path = log_dir.join(format!("failed_{}.txt", timestamp));
            let mut content = format!("Failed downloads {}\n", timestamp);
            for id in &self.failed {
                content.push_str(id);
                content.push('\n');
            }
            std::fs::write(&failed_path, content)?;
            info!("Failed ids written to {}", failed_path.display());
        }

        let summary_path = log_dir.join(format!("{}.txt", timestamp));
        std::fs::write(&summary_path, self.summary())?;
        info!("{} run finished. {}", self.source.as_str(), self.summary());

        Ok(summary_path)
    }
}
