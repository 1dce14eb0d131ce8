use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use lexharvest::batch;
use lexharvest::config::Config;
use lexharvest::downloader::{cellar_ids_from_results, CellarDownloader, NormattivaDownloader, NormattivaRequest, SparqlResults};

mod cli;

use cli::{Cli, Commands, DownloadSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "lexharvest=info");
    }

    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "lexharvest.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download { source } => download(source).await?,

        Commands::Parse { format, paths, output } => {
            let format = Commands::parse_document_format(&format)?;
            let parsed = batch::parse_documents(&paths, format, output.as_deref())?;
            info!("Successfully parsed {} documents", parsed);
        }
    }

    Ok(())
}

fn configure(output: Option<PathBuf>, log_dir: Option<PathBuf>, workers: Option<usize>) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(output) = output {
        config.download_dir = output;
    }
    if let Some(log_dir) = log_dir {
        config.log_dir = log_dir;
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }
    config.validate()?;
    Ok(config)
}

async fn download(source: DownloadSource) -> Result<()> {
    match source {
        DownloadSource::Cellar {
            results,
            format,
            ids,
            output,
            log_dir,
            workers,
        } => {
            let format = Commands::parse_document_format(&format)?;
            let config = configure(output, log_dir, workers)?;

            let mut ids = ids;
            if let Some(results) = results {
                let sparql = SparqlResults::from_path(&results)
                    .with_context(|| format!("Cannot read query results from {}", results.display()))?;
                ids.extend(cellar_ids_from_results(&sparql, format.cellar_format()));
            }
            if ids.is_empty() {
                warn!("No {} documents to download", format.cellar_format());
                return Ok(());
            }

            let downloader = CellarDownloader::new(&config)?;
            let requested = ids.len();
            let paths = downloader.download(ids, config.workers).await?;
            info!("Successfully downloaded {}/{} documents", paths.len(), requested);
        }

        DownloadSource::Normattiva {
            data_gu,
            codice_redaz,
            data_vigenza,
            date,
            output,
            log_dir,
        } => {
            let config = configure(output, log_dir, None)?;
            let request = NormattivaRequest {
                data_gu,
                codice_redaz,
                data_vigenza,
                date,
            };

            let downloader = NormattivaDownloader::new(&config)?;
            let paths = downloader.download(&request).await?;
            for path in &paths {
                info!("Saved {}", path.display());
            }
        }
    }

    Ok(())
}
