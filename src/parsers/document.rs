//! Common record shape produced by every format parser

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::DocumentFormat;

/// Structured content of one legal act.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub format: DocumentFormat,
    /// Flat key/value metadata; nested sources use dotted keys (`work.FRBRalias`)
    pub metadata: BTreeMap<String, String>,
    /// Title block of the act
    pub preface: Option<String>,
    pub preamble: Option<Preamble>,
    pub chapters: Vec<Chapter>,
    pub articles: Vec<Article>,
    /// Closing formula, place/date and signatures
    pub conclusions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preamble {
    pub initial_statement: Option<String>,
    pub citations: Vec<Citation>,
    /// "Whereas:" line introducing the recitals
    pub recitals_intro: Option<String>,
    pub recitals: Vec<Recital>,
    pub final_statement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub text: String,
    /// Footnotes attached to the citation (publication references)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recital {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub number: Option<String>,
    pub heading: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub number: Option<String>,
    pub heading: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: String,
    pub text: String,
}

impl ParsedDocument {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            metadata: BTreeMap::new(),
            preface: None,
            preamble: None,
            chapters: Vec::new(),
            articles: Vec::new(),
            conclusions: None,
        }
    }

    /// Every text field of the document, in document order.
    pub fn text_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        fields.extend(self.metadata.values().map(String::as_str));
        fields.extend(self.preface.as_deref());
        if let Some(preamble) = &self.preamble {
            fields.extend(preamble.initial_statement.as_deref());
            for citation in &preamble.citations {
                fields.push(&citation.text);
                fields.extend(citation.notes.iter().map(String::as_str));
            }
            fields.extend(preamble.recitals_intro.as_deref());
            fields.extend(preamble.recitals.iter().map(|r| r.text.as_str()));
            fields.extend(preamble.final_statement.as_deref());
        }
        for chapter in &self.chapters {
            fields.extend(chapter.number.as_deref());
            fields.extend(chapter.heading.as_deref());
        }
        for article in &self.articles {
            fields.extend(article.number.as_deref());
            fields.extend(article.heading.as_deref());
            fields.push(&article.text);
            fields.extend(article.paragraphs.iter().map(|p| p.text.as_str()));
        }
        fields.extend(self.conclusions.as_deref());
        fields
    }
}
