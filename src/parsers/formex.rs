//! Formex 4 parser for Official Journal acts

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use super::document::{Article, Chapter, Citation, Paragraph, ParsedDocument, Preamble, Recital};
use super::errors::ParseError;
use super::text::{join_normalized, non_empty, normalize_whitespace};
use super::xml::{self, Element, Namespaces};
use super::Parser;
use crate::models::DocumentFormat;

const NOTE: &str = "NOTE";
/// Wrapper of text quoted by an amending provision
const QUOT_STRUCT: &str = "QUOT.STRUCT";

pub struct FormexParser {
    root: Element,
    namespaces: Namespaces,
}

impl FormexParser {
    pub fn new(root: Element, namespaces: Namespaces) -> Self {
        Self { root, namespaces }
    }

    pub fn load(path: &Path) -> Result<Self, ParseError> {
        debug!("Loading Formex document: {}", path.display());
        Ok(Self::new(xml::load(path)?, Namespaces::formex()))
    }

    pub fn from_str(source: &str) -> Result<Self, ParseError> {
        Ok(Self::new(xml::parse_str(source)?, Namespaces::formex()))
    }

    /// Bibliographic data from `BIB.INSTANCE`.
    pub fn extract_metadata(&self) -> BTreeMap<String, String> {
        let ns = &self.namespaces;
        let mut metadata = BTreeMap::new();

        let Some(bib_instance) = self.root.find("BIB.INSTANCE", ns) else {
            return metadata;
        };

        let mut insert = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value);
            }
        };

        if let Some(doc_ref) = bib_instance.find("DOCUMENT.REF", ns) {
            insert("file", doc_ref.attr("FILE").map(str::to_string));
            insert("collection", doc_ref.find_text("COLL", ns));
            insert("oj_number", doc_ref.find_text("NO.OJ", ns));
            insert("year", doc_ref.find_text("YEAR", ns));
            insert("language", doc_ref.find_text("LG.OJ", ns));
            insert("page_first", doc_ref.find_text("PAGE.FIRST", ns));
            insert("page_seq", doc_ref.find_text("PAGE.SEQ", ns));
            insert("volume_ref", doc_ref.find_text("VOLUME.REF", ns));
        }

        insert("document_language", bib_instance.find_text("LG.DOC", ns));
        insert("sequence_number", bib_instance.find_text("NO.SEQ", ns));
        insert("total_pages", bib_instance.find_text("PAGE.TOTAL", ns));

        if let Some(no_doc) = bib_instance.find("NO.DOC", ns) {
            insert("doc_format", no_doc.attr("FORMAT").map(str::to_string));
            insert("doc_type", no_doc.attr("TYPE").map(str::to_string));
            insert("doc_number", no_doc.find_text("NO.CURRENT", ns));
        }

        metadata
    }

    /// The act title: every `P` of the top level `TITLE`.
    pub fn extract_preface(&self) -> Option<String> {
        let title = self.root.find("TITLE", &self.namespaces)?;
        let paragraphs = title.find_all(".//P", &self.namespaces);
        non_empty(join_normalized(paragraphs.iter().map(|p| p.text())))
    }

    pub fn extract_preamble(&self) -> Option<Preamble> {
        let ns = &self.namespaces;
        let preamble = self.root.find("PREAMBLE", ns)?;

        Some(Preamble {
            initial_statement: preamble.find_text("PREAMBLE.INIT", ns),
            citations: self.extract_citations(),
            recitals_intro: preamble.find_text(".//GR.CONSID/GR.CONSID.INIT", ns),
            recitals: self.extract_recitals(),
            final_statement: preamble.find_text("PREAMBLE.FINAL", ns),
        })
    }

    /// `VISA` elements, identified by their position.
    pub fn extract_citations(&self) -> Vec<Citation> {
        let Some(preamble) = self.root.find("PREAMBLE", &self.namespaces) else {
            return Vec::new();
        };

        preamble
            .find_all(".//VISA", &self.namespaces)
            .into_iter()
            .enumerate()
            .map(|(index, visa)| Citation {
                id: index.to_string(),
                text: normalize_whitespace(&visa.text_excluding(is_note)),
                notes: visa
                    .descendants()
                    .filter(|e| is_note(e))
                    .filter_map(|note| non_empty(note.normalized_text()))
                    .collect(),
            })
            .collect()
    }

    /// `CONSID` elements, identified by their `NO.P` number.
    pub fn extract_recitals(&self) -> Vec<Recital> {
        let ns = &self.namespaces;
        let Some(preamble) = self.root.find("PREAMBLE", ns) else {
            return Vec::new();
        };

        preamble
            .find_all(".//CONSID", ns)
            .into_iter()
            .enumerate()
            .map(|(index, consid)| {
                let id = consid
                    .find_text(".//NO.P", ns)
                    .unwrap_or_else(|| format!("consid_{}", index + 1));
                let text = match consid.find(".//TXT", ns) {
                    Some(txt) => txt.text_excluding(is_note),
                    None => consid.text_excluding(|e| is_note(e) || e.name == "NO.P"),
                };
                Recital {
                    id,
                    text: normalize_whitespace(&text),
                }
            })
            .collect()
    }

    fn enacting_terms(&self) -> Option<&Element> {
        let body = self
            .root
            .find(".//fmx:ENACTING.TERMS", &self.namespaces)
            .or_else(|| self.root.find(".//ENACTING.TERMS", &self.namespaces));
        if body.is_none() {
            warn!("No ENACTING.TERMS element found, chapters and articles will be empty");
        }
        body
    }

    /// Division titles carrying both a number and a heading `HT`.
    pub fn extract_chapters(&self) -> Vec<Chapter> {
        let Some(body) = self.enacting_terms() else {
            return Vec::new();
        };

        body.find_all(".//TITLE", &self.namespaces)
            .into_iter()
            .enumerate()
            .filter_map(|(index, title)| {
                let highlights = title.find_all(".//HT", &self.namespaces);
                if highlights.len() < 2 {
                    return None;
                }
                Some(Chapter {
                    id: index.to_string(),
                    number: non_empty(highlights[0].normalized_text()),
                    heading: non_empty(highlights[1].normalized_text()),
                })
            })
            .collect()
    }

    /// Articles of the enacting terms. Articles quoted by an amendment belong
    /// to the amending article and are not listed. Run after
    /// [`Parser::strip_annotations`] to keep footnotes out of the article text.
    pub fn extract_articles(&self) -> Vec<Article> {
        let ns = &self.namespaces;
        let Some(body) = self.enacting_terms() else {
            return Vec::new();
        };

        body.descendants_outside(|e| e.is(None, "ARTICLE"), is_quoted)
            .into_iter()
            .enumerate()
            .map(|(index, article)| {
                let id = article
                    .attr("IDENTIFIER")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{:03}", index + 1));

                let paragraphs = article
                    .descendants_outside(|e| e.is(None, "PARAG"), is_quoted)
                    .into_iter()
                    .enumerate()
                    .map(|(position, parag)| Paragraph {
                        id: parag
                            .attr("IDENTIFIER")
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("{}.{:03}", id, position + 1)),
                        text: alinea_text(parag, ns),
                    })
                    .collect();

                Article {
                    number: article.find_text(".//TI.ART", ns),
                    heading: article.find_text(".//STI.ART", ns),
                    text: alinea_text(article, ns),
                    paragraphs,
                    id,
                }
            })
            .collect()
    }

    pub fn extract_conclusions(&self) -> Option<String> {
        let fin = self.root.find("FINAL", &self.namespaces)?;
        non_empty(fin.normalized_text())
    }
}

fn is_note(element: &Element) -> bool {
    element.name == NOTE
}

fn is_quoted(element: &Element) -> bool {
    element.name == QUOT_STRUCT
}

/// `ALINEA` texts joined with a space, or the whole unit minus its
/// numbering and titles when it has none.
fn alinea_text(unit: &Element, ns: &Namespaces) -> String {
    let alineas = unit.find_all(".//ALINEA", ns);
    if alineas.is_empty() {
        let text = unit.text_excluding(|e| {
            matches!(e.name.as_str(), "TI.ART" | "STI.ART" | "NO.PARAG")
        });
        return normalize_whitespace(&text);
    }
    join_normalized(alineas.iter().map(|alinea| alinea.text()))
}

impl Parser for FormexParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Formex
    }

    fn strip_annotations(&mut self) -> usize {
        let removed = self.root.remove_elements(&is_note);
        debug!("Removed {} NOTE elements", removed);
        removed
    }

    fn parse(&mut self) -> ParsedDocument {
        let mut document = ParsedDocument::new(self.format());
        document.metadata = self.extract_metadata();
        document.preface = self.extract_preface();
        document.preamble = self.extract_preamble();

        self.strip_annotations();

        document.chapters = self.extract_chapters();
        document.articles = self.extract_articles();
        document.conclusions = self.extract_conclusions();
        document
    }
}
