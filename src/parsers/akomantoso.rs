//! Akoma Ntoso 3.0 parser (EU acts converted by the Publications Office,
//! Italian consolidated laws from Normattiva)

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use super::document::{Article, Chapter, Citation, Paragraph, ParsedDocument, Preamble, Recital};
use super::errors::ParseError;
use super::text::{join_normalized, non_empty, normalize_whitespace};
use super::xml::{self, Element, Namespaces};
use super::Parser;
use crate::models::DocumentFormat;

const ROOT: &str = "akomaNtoso";

/// FRBR elements read from each identification block, with the attribute
/// holding their value.
const FRBR_WORK: &[(&str, &str)] = &[
    ("FRBRthis", "value"),
    ("FRBRuri", "value"),
    ("FRBRalias", "value"),
    ("FRBRdate", "date"),
    ("FRBRauthor", "href"),
    ("FRBRcountry", "value"),
    ("FRBRnumber", "value"),
];
const FRBR_EXPRESSION: &[(&str, &str)] = &[
    ("FRBRthis", "value"),
    ("FRBRuri", "value"),
    ("FRBRdate", "date"),
    ("FRBRauthor", "href"),
    ("FRBRlanguage", "language"),
];
const FRBR_MANIFESTATION: &[(&str, &str)] = &[
    ("FRBRthis", "value"),
    ("FRBRuri", "value"),
    ("FRBRdate", "date"),
    ("FRBRauthor", "href"),
];

pub struct AkomaNtosoParser {
    root: Element,
    namespaces: Namespaces,
}

impl AkomaNtosoParser {
    /// Wrap a parsed tree. The root must be `akomaNtoso`.
    pub fn new(root: Element, namespaces: Namespaces) -> Result<Self, ParseError> {
        if root.name != ROOT {
            return Err(ParseError::UnexpectedRoot {
                expected: ROOT.to_string(),
                found: root.name,
            });
        }
        Ok(Self { root, namespaces })
    }

    pub fn load(path: &Path) -> Result<Self, ParseError> {
        debug!("Loading Akoma Ntoso document: {}", path.display());
        Self::new(xml::load(path)?, Namespaces::akoma_ntoso())
    }

    pub fn from_str(source: &str) -> Result<Self, ParseError> {
        Self::new(xml::parse_str(source)?, Namespaces::akoma_ntoso())
    }

    fn akn_namespace(&self) -> Option<&str> {
        self.namespaces.resolve("akn")
    }

    fn is_akn(&self, element: &Element, name: &str) -> bool {
        element.is(self.akn_namespace(), name)
    }

    pub fn extract_metadata(&self) -> BTreeMap<String, String> {
        let ns = &self.namespaces;
        let mut metadata = BTreeMap::new();

        if let Some(identification) = self.root.find(".//akn:meta/akn:identification", ns) {
            for (block, prefix, fields) in [
                ("akn:FRBRWork", "work", FRBR_WORK),
                ("akn:FRBRExpression", "expression", FRBR_EXPRESSION),
                ("akn:FRBRManifestation", "manifestation", FRBR_MANIFESTATION),
            ] {
                let Some(frbr) = identification.find(block, ns) else {
                    continue;
                };
                for (name, attribute) in fields {
                    let value = frbr
                        .find(&format!("akn:{}", name), ns)
                        .and_then(|e| e.attr(attribute));
                    if let Some(value) = value {
                        metadata.insert(format!("{}.{}", prefix, name), value.to_string());
                    }
                }
            }
        }

        if let Some(organization) = self.root.find(".//akn:meta/akn:references/akn:TLCOrganization", ns) {
            for attribute in ["eId", "href", "showAs"] {
                if let Some(value) = organization.attr(attribute) {
                    metadata.insert(format!("references.{}", attribute), value.to_string());
                }
            }
        }

        if let Some(proprietary) = self.root.find(".//akn:meta/akn:proprietary", ns) {
            if let Some(document_ref) = proprietary.find("fmx:DOCUMENT.REF", ns) {
                let values = [
                    ("file", document_ref.attr("FILE").map(str::to_string)),
                    ("coll", document_ref.find_text("fmx:COLL", ns)),
                    ("year", document_ref.find_text("fmx:YEAR", ns)),
                    ("lg_doc", proprietary.find_text("fmx:LG.DOC", ns)),
                    ("no_seq", proprietary.find_text("fmx:NO.SEQ", ns)),
                ];
                for (key, value) in values {
                    if let Some(value) = value {
                        metadata.insert(format!("proprietary.{}", key), value);
                    }
                }
            }
        }

        metadata
    }

    /// Paragraphs of `<preface>`, including those of `longTitle`, joined
    /// with a space.
    pub fn extract_preface(&self) -> Option<String> {
        let preface = self.root.find(".//akn:preface", &self.namespaces)?;
        let paragraphs = preface.find_all(".//akn:p", &self.namespaces);
        non_empty(join_normalized(paragraphs.iter().map(|p| p.text())))
    }

    pub fn extract_preamble(&self) -> Option<Preamble> {
        let ns = &self.namespaces;
        let preamble = self.root.find(".//akn:preamble", ns)?;

        let formulas = preamble.find_all("akn:formula", ns);
        let initial_statement = formulas
            .first()
            .and_then(|formula| non_empty(formula.normalized_text()));
        let final_statement = if formulas.len() > 1 {
            formulas
                .last()
                .and_then(|formula| non_empty(formula.normalized_text()))
        } else {
            None
        };

        Some(Preamble {
            initial_statement,
            citations: self.extract_citations(),
            recitals_intro: preamble.find_text("akn:recitals/akn:intro", ns),
            recitals: self.extract_recitals(),
            final_statement,
        })
    }

    /// Citations with their authorial notes. Notes are read from the tree,
    /// so call this before [`Parser::strip_annotations`].
    pub fn extract_citations(&self) -> Vec<Citation> {
        let ns = &self.namespaces;
        let Some(citations) = self.root.find(".//akn:preamble/akn:citations", ns) else {
            return Vec::new();
        };

        citations
            .find_all("akn:citation", ns)
            .into_iter()
            .enumerate()
            .map(|(index, citation)| Citation {
                id: citation
                    .attr("eId")
                    .map(str::to_string)
                    .unwrap_or_else(|| index.to_string()),
                text: normalize_whitespace(
                    &citation.text_excluding(|e| self.is_akn(e, "authorialNote")),
                ),
                notes: citation
                    .find_all(".//akn:authorialNote", ns)
                    .into_iter()
                    .filter_map(|note| non_empty(note.normalized_text()))
                    .collect(),
            })
            .collect()
    }

    /// The recitals intro followed by every recital, keyed by `eId`.
    pub fn extract_recitals(&self) -> Vec<Recital> {
        let ns = &self.namespaces;
        let Some(section) = self.root.find(".//akn:preamble/akn:recitals", ns) else {
            return Vec::new();
        };

        let mut recitals = Vec::new();

        if let Some(intro) = section.find("akn:intro", ns) {
            recitals.push(Recital {
                id: intro
                    .attr("eId")
                    .map(str::to_string)
                    .unwrap_or_else(|| "intro".to_string()),
                text: intro.normalized_text(),
            });
        }

        for (index, recital) in section.find_all("akn:recital", ns).into_iter().enumerate() {
            let paragraphs = recital.find_all("akn:p", ns);
            let text = if paragraphs.is_empty() {
                recital.text_excluding(|e| self.is_akn(e, "num") || self.is_akn(e, "authorialNote"))
            } else {
                paragraphs
                    .iter()
                    .map(|p| p.text_excluding(|e| self.is_akn(e, "authorialNote")))
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            recitals.push(Recital {
                id: recital
                    .attr("eId")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("rec_{}", index + 1)),
                text: normalize_whitespace(&text),
            });
        }

        recitals
    }

    fn body(&self) -> Option<&Element> {
        let body = self
            .root
            .find(".//akn:body", &self.namespaces)
            .or_else(|| self.root.find(".//body", &self.namespaces));
        if body.is_none() {
            warn!("No body element found, articles will be empty");
        }
        body
    }

    pub fn extract_chapters(&self) -> Vec<Chapter> {
        let ns = &self.namespaces;
        self.root
            .find_all(".//akn:chapter", ns)
            .into_iter()
            .enumerate()
            .map(|(index, chapter)| Chapter {
                id: chapter
                    .attr("eId")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("chp_{}", index + 1)),
                number: chapter.find_text("akn:num", ns),
                heading: chapter.find_text("akn:heading", ns),
            })
            .collect()
    }

    fn is_quoted(&self, element: &Element) -> bool {
        self.is_akn(element, "quotedStructure") || self.is_akn(element, "mod")
    }

    /// Articles of the body, leaving out those quoted inside a `mod`. Run
    /// after [`Parser::strip_annotations`] to keep authorial notes out of the
    /// article text.
    pub fn extract_articles(&self) -> Vec<Article> {
        let ns = &self.namespaces;
        let Some(body) = self.body() else {
            return Vec::new();
        };

        body.descendants_outside(|e| self.is_akn(e, "article"), |e| self.is_quoted(e))
            .into_iter()
            .enumerate()
            .map(|(index, article)| {
                let paragraphs = article
                    .descendants_outside(|e| self.is_akn(e, "paragraph"), |e| self.is_quoted(e))
                    .into_iter()
                    .enumerate()
                    .map(|(position, paragraph)| Paragraph {
                        id: paragraph
                            .attr("eId")
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("para_{}", position + 1)),
                        text: normalize_whitespace(
                            &paragraph.text_excluding(|e| self.is_akn(e, "num")),
                        ),
                    })
                    .collect();

                Article {
                    id: article
                        .attr("eId")
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("art_{}", index + 1)),
                    number: article.find_text("akn:num", ns),
                    heading: article.find_text("akn:heading", ns),
                    text: normalize_whitespace(
                        &article.text_excluding(|e| self.is_akn(e, "num") || self.is_akn(e, "heading")),
                    ),
                    paragraphs,
                }
            })
            .collect()
    }

    pub fn extract_conclusions(&self) -> Option<String> {
        let conclusions = self.root.find(".//akn:conclusions", &self.namespaces)?;
        non_empty(conclusions.normalized_text())
    }
}

impl Parser for AkomaNtosoParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::AkomaNtoso
    }

    fn strip_annotations(&mut self) -> usize {
        let namespace = self.akn_namespace().map(str::to_string);
        let removed = self
            .root
            .remove_elements(&|e: &Element| e.is(namespace.as_deref(), "authorialNote"));
        debug!("Removed {} authorialNote elements", removed);
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
