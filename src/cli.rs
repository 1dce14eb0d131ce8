use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lexharvest::models::DocumentFormat;

#[derive(Parser)]
#[command(name = "lexharvest")]
#[command(about = "Download legal documents from Cellar and Normattiva and extract their structure")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download documents from a remote repository
    Download {
        #[command(subcommand)]
        source: DownloadSource,
    },

    /// Parse downloaded documents into structured JSON
    Parse {
        /// Document format (formex, akn, html)
        #[arg(short, long)]
        format: String,

        /// Files or directories to parse
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Directory for the JSON output (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum DownloadSource {
    /// Publications Office Cellar, ids taken from SPARQL JSON results
    Cellar {
        /// SPARQL query results (JSON)
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// Document format to keep from the results (fmx4, akn, xhtml)
        #[arg(short, long, default_value = "fmx4")]
        format: String,

        /// Cellar id to download, may be repeated
        #[arg(long = "id")]
        ids: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for run reports
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Number of concurrent workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Normattiva consolidated act in Akoma Ntoso
    Normattiva {
        /// Gazzetta Ufficiale date (YYYYMMDD)
        #[arg(long)]
        data_gu: String,

        /// Act code, also the name of the saved file
        #[arg(long)]
        codice_redaz: String,

        /// Consolidation date (YYYYMMDD)
        #[arg(long)]
        data_vigenza: String,

        /// Act date (YYYY/MM/DD)
        #[arg(long)]
        date: String,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for run reports
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

impl Commands {
    pub fn parse_document_format(format: &str) -> Result<DocumentFormat, anyhow::Error> {
        match format.to_lowercase().as_str() {
            "fmx4" | "fmx" | "formex" => Ok(DocumentFormat::Formex),
            "akn" | "akomantoso" | "akoma-ntoso" => Ok(DocumentFormat::AkomaNtoso),
            "html" | "xhtml" | "htm" => Ok(DocumentFormat::Html),
            other => Err(anyhow::anyhow!(
                "Unsupported document format: {}. Supported formats: formex, akn, html",
                other
            )),
        }
    }
}
