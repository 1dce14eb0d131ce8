pub mod akomantoso;
pub mod document;
pub mod errors;
pub mod formex;
pub mod html;
pub mod text;
pub mod xml;

use std::path::Path;
use tracing::info;

use crate::models::DocumentFormat;

pub use akomantoso::AkomaNtosoParser;
pub use document::{Article, Chapter, Citation, Paragraph, ParsedDocument, Preamble, Recital};
pub use errors::ParseError;
pub use formex::FormexParser;
pub use html::HtmlParser;

/// Common surface of the structural parsers.
///
/// Every `extract_*` operation of a parser is non-destructive except
/// [`Parser::strip_annotations`], which removes footnotes and note markers
/// from the loaded tree. [`Parser::parse`] runs the metadata, preface and
/// preamble extractions first, then strips annotations and extracts the
/// enacting terms.
pub trait Parser {
    fn format(&self) -> DocumentFormat;

    /// Remove annotation nodes, returning how many were removed.
    fn strip_annotations(&mut self) -> usize;

    fn parse(&mut self) -> ParsedDocument;
}

/// Load `path` with the parser for `format`.
pub fn load_parser(format: DocumentFormat, path: &Path) -> Result<Box<dyn Parser>, ParseError> {
    let parser: Box<dyn Parser> = match format {
        DocumentFormat::Formex => Box::new(FormexParser::load(path)?),
        DocumentFormat::AkomaNtoso => Box::new(AkomaNtosoParser::load(path)?),
        DocumentFormat::Html => Box::new(HtmlParser::load(path)?),
    };
    Ok(parser)
}

pub fn parse_file(path: &Path, format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    let mut parser = load_parser(format, path)?;
    let document = parser.parse();
    info!(
        "Parsed {} as {}: {} articles, {} chapters",
        path.display(),
        format.as_str(),
        document.articles.len(),
        document.chapters.len()
    );
    Ok(document)
}
