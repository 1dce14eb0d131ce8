use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::models::DocumentFormat;
use crate::parsers::{self, ParsedDocument};

/// A document to parse and where its JSON goes below the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDocument {
    pub path: PathBuf,
    /// Path relative to the walked input directory, or the bare file name
    /// for files named explicitly
    pub relative: PathBuf,
}

impl InputDocument {
    fn json_target(&self, output: &Path) -> PathBuf {
        let mut name = self.relative.clone().into_os_string();
        name.push(".json");
        output.join(name)
    }
}

/// Files named explicitly are always taken; directories are walked and
/// filtered by what `format` looks like on disk.
pub fn collect_documents(inputs: &[PathBuf], format: DocumentFormat) -> Vec<InputDocument> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            let relative = input.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("document"));
            files.push(InputDocument {
                path: input.clone(),
                relative,
            });
            continue;
        }
        if !input.exists() {
            warn!("Input path does not exist: {}", input.display());
            continue;
        }

        for entry in walkdir::WalkDir::new(input).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry under {}: {}", input.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && format.matches_path(path) {
                let relative = path.strip_prefix(input).unwrap_or(path).to_path_buf();
                files.push(InputDocument {
                    path: path.to_path_buf(),
                    relative,
                });
            }
        }
    }

    files
}

/// Parse every document found under `inputs`. Each result is written as
/// pretty JSON into `output` when given, mirroring its path below the input
/// directory, otherwise printed to stdout. Documents that fail to parse, or
/// whose JSON would replace one written earlier in the same run, are logged
/// and skipped.
pub fn parse_documents(inputs: &[PathBuf], format: DocumentFormat, output: Option<&Path>) -> Result<usize> {
    let files = collect_documents(inputs, format);
    info!("Parsing {} {} documents", files.len(), format.as_str());

    if let Some(output) = output {
        std::fs::create_dir_all(output)
            .with_context(|| format!("Cannot create output directory: {}", output.display()))?;
    }

    let mut written = HashSet::new();
    let mut parsed_count = 0;
    for file in &files {
        let target = output.map(|dir| file.json_target(dir));
        if let Some(target) = &target {
            if !written.insert(target.clone()) {
                error!(
                    "Skipping {}: {} was already written in this run",
                    file.path.display(),
                    target.display()
                );
                continue;
            }
        }

        match parsers::parse_file(&file.path, format) {
            Ok(document) => {
                emit(&document, target.as_deref())?;
                parsed_count += 1;
            }
            Err(e) => error!("Failed to parse {}: {}", file.path.display(), e),
        }
    }

    info!("Parsing completed. {}/{} documents parsed", parsed_count, files.len());
    Ok(parsed_count)
}

fn emit(document: &ParsedDocument, target: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;

    match target {
        Some(target) => {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Cannot create {}", parent.display()))?;
            }
            std::fs::write(&target, json).with_context(|| format!("Cannot write {}", target.display()))?;
            info!("Wrote {}", target.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
