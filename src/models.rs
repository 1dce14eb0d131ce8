use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    Formex,
    AkomaNtoso,
    Html,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentFormat::Formex => "formex",
            DocumentFormat::AkomaNtoso => "akomantoso",
            DocumentFormat::Html => "html",
        }
    }

    /// Format literal used by Cellar SPARQL results (`?format`)
    pub fn cellar_format(&self) -> &str {
        match self {
            DocumentFormat::Formex => "fmx4",
            DocumentFormat::AkomaNtoso => "akn",
            DocumentFormat::Html => "xhtml",
        }
    }

    /// Whether a file on disk looks like a document of this format.
    ///
    /// Formex archives ship a `*.doc.xml` descriptor next to the acts; it is
    /// not an act and is skipped.
    pub fn matches_path(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match self {
            DocumentFormat::Formex => extension == "xml" && !name.ends_with(".doc.xml"),
            DocumentFormat::AkomaNtoso => matches!(extension.as_str(), "akn" | "xml"),
            DocumentFormat::Html => matches!(extension.as_str(), "html" | "htm" | "xhtml"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Cellar,
    Normattiva,
}

impl Source {
    pub fn as_str(&self) -> &str {
        match self {
            Source::Cellar => "Cellar",
            Source::Normattiva => "Normattiva",
        }
    }
}
