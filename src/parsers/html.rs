//! EUR-Lex ELI (X)HTML parser using scraper

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

use super::document::{Article, Chapter, Citation, Paragraph, ParsedDocument, Preamble, Recital};
use super::errors::ParseError;
use super::text::{join_normalized, non_empty, normalize_whitespace};
use super::Parser;
use crate::models::DocumentFormat;

/// Elements whose boundaries separate words in rendered text
const BLOCK_ELEMENTS: &[&str] = &["p", "div", "td", "th", "tr", "li", "br", "table"];

struct Selectors {
    html: Selector,
    title: Selector,
    meta: Selector,
    main_title: Selector,
    doc_title: Selector,
    preamble: Selector,
    citation: Selector,
    recital: Selector,
    cell: Selector,
    enacting_terms: Selector,
    chapter: Selector,
    chapter_number: Selector,
    chapter_heading: Selector,
    article: Selector,
    article_number: Selector,
    article_heading: Selector,
    identified_div: Selector,
    conclusions: Selector,
    noise: Selector,
}

fn selectors() -> &'static Selectors {
    static INSTANCE: OnceLock<Selectors> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let css = |s: &str| Selector::parse(s).expect("Unable to construct static selector");
        Selectors {
            html: css("html"),
            title: css("head > title"),
            meta: css("meta[name]"),
            main_title: css("div.eli-main-title"),
            doc_title: css("p.oj-doc-ti"),
            preamble: css("div#pbl_1"),
            citation: css(r#"div[id^="cit_"]"#),
            recital: css(r#"div[id^="rct_"]"#),
            cell: css("td"),
            enacting_terms: css("div#enc_1"),
            chapter: css(r#"div[id^="cpt_"]"#),
            chapter_number: css("p.oj-ti-section-1"),
            chapter_heading: css("p.oj-ti-section-2"),
            article: css(r#"div.eli-subdivision[id^="art_"]"#),
            article_number: css("p.oj-ti-art"),
            article_heading: css("p.oj-sti-art"),
            identified_div: css("div[id]"),
            conclusions: css("div.final"),
            noise: css(r#"a[id^="ntc"], .oj-note-tag, p.oj-note, hr.oj-separator"#),
        }
    })
}

/// Paragraph divisions are identified as `NNN.NNN` (article.paragraph).
fn paragraph_id_regex() -> &'static Regex {
    static INSTANCE: OnceLock<Regex> = OnceLock::new();
    INSTANCE.get_or_init(|| Regex::new(r"^\d{3}\.\d{3}$").expect("Unable to construct paragraph id regex"))
}

pub struct HtmlParser {
    html: Html,
}

impl HtmlParser {
    pub fn new(html: Html) -> Self {
        Self { html }
    }

    pub fn load(path: &Path) -> Result<Self, ParseError> {
        debug!("Loading HTML document: {}", path.display());
        let source = std::fs::read_to_string(path)?;
        Ok(Self::from_str(&source))
    }

    pub fn from_str(source: &str) -> Self {
        Self::new(Html::parse_document(source))
    }

    /// `<meta name>` pairs plus the document language and title.
    pub fn extract_metadata(&self) -> BTreeMap<String, String> {
        let s = selectors();
        let mut metadata = BTreeMap::new();

        if let Some(lang) = self.html.select(&s.html).next().and_then(|e| e.value().attr("lang")) {
            metadata.insert("language".to_string(), lang.to_string());
        }
        if let Some(title) = self.html.select(&s.title).next() {
            if let Some(title) = non_empty(element_text(title, &[])) {
                metadata.insert("title".to_string(), title);
            }
        }
        for meta in self.html.select(&s.meta) {
            let value = meta.value();
            if let (Some(name), Some(content)) = (value.attr("name"), value.attr("content")) {
                metadata.insert(name.to_string(), normalize_whitespace(content));
            }
        }

        metadata
    }

    pub fn extract_preface(&self) -> Option<String> {
        let s = selectors();
        if let Some(title) = self.html.select(&s.main_title).next() {
            return non_empty(element_text(title, &[]));
        }
        non_empty(join_normalized(
            self.html.select(&s.doc_title).map(|p| element_text(p, &[])),
        ))
    }

    /// Direct `<p>` children of the preamble carry the formulas: the first is
    /// the acting entity, the last the enacting formula, a middle one the
    /// recitals intro.
    pub fn extract_preamble(&self) -> Option<Preamble> {
        let preamble = self.html.select(&selectors().preamble).next()?;

        let statements: Vec<String> = preamble
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "p")
            .filter_map(|p| non_empty(element_text(p, &[])))
            .collect();

        let initial_statement = statements.first().cloned();
        let final_statement = if statements.len() > 1 { statements.last().cloned() } else { None };
        let recitals_intro = if statements.len() > 2 { statements.get(1).cloned() } else { None };

        Some(Preamble {
            initial_statement,
            citations: self.extract_citations(),
            recitals_intro,
            recitals: self.extract_recitals(),
            final_statement,
        })
    }

    pub fn extract_citations(&self) -> Vec<Citation> {
        let s = selectors();
        let Some(preamble) = self.html.select(&s.preamble).next() else {
            return Vec::new();
        };

        preamble
            .select(&s.citation)
            .filter_map(|citation| {
                Some(Citation {
                    id: citation.value().id()?.to_string(),
                    text: element_text(citation, &[&s.noise]),
                    notes: Vec::new(),
                })
            })
            .collect()
    }

    /// Recitals are laid out as a two cell table (number, text); the text
    /// cell is used when present.
    pub fn extract_recitals(&self) -> Vec<Recital> {
        let s = selectors();
        let Some(preamble) = self.html.select(&s.preamble).next() else {
            return Vec::new();
        };

        preamble
            .select(&s.recital)
            .filter_map(|recital| {
                let text = match recital.select(&s.cell).last() {
                    Some(cell) => element_text(cell, &[&s.noise]),
                    None => element_text(recital, &[&s.noise]),
                };
                Some(Recital {
                    id: recital.value().id()?.to_string(),
                    text,
                })
            })
            .collect()
    }

    fn enacting_terms(&self) -> Option<ElementRef<'_>> {
        let body = self.html.select(&selectors().enacting_terms).next();
        if body.is_none() {
            warn!("No enacting terms found with id 'enc_1', chapters and articles will be empty");
        }
        body
    }

    pub fn extract_chapters(&self) -> Vec<Chapter> {
        let s = selectors();
        let Some(body) = self.enacting_terms() else {
            return Vec::new();
        };

        body.select(&s.chapter)
            .filter_map(|chapter| {
                let id = chapter.value().id()?;
                // sections and titles nested in a chapter carry dotted ids
                if id.contains('.') {
                    return None;
                }
                Some(Chapter {
                    id: id.to_string(),
                    number: chapter
                        .select(&s.chapter_number)
                        .next()
                        .and_then(|p| non_empty(element_text(p, &[]))),
                    heading: chapter
                        .select(&s.chapter_heading)
                        .next()
                        .and_then(|p| non_empty(element_text(p, &[]))),
                })
            })
            .collect()
    }

    /// Articles of `div#enc_1`. Run after [`Parser::strip_annotations`] to
    /// drop footnote markers from the text.
    pub fn extract_articles(&self) -> Vec<Article> {
        let s = selectors();
        let Some(body) = self.enacting_terms() else {
            return Vec::new();
        };

        body.select(&s.article)
            .filter_map(|article| {
                let id = article.value().id()?.to_string();

                let paragraphs = article
                    .select(&s.identified_div)
                    .filter_map(|div| {
                        let paragraph_id = div.value().id()?;
                        if !paragraph_id_regex().is_match(paragraph_id) {
                            return None;
                        }
                        Some(Paragraph {
                            id: paragraph_id.to_string(),
                            text: element_text(div, &[]),
                        })
                    })
                    .collect();

                Some(Article {
                    number: article
                        .select(&s.article_number)
                        .next()
                        .and_then(|p| non_empty(element_text(p, &[]))),
                    heading: article
                        .select(&s.article_heading)
                        .next()
                        .and_then(|p| non_empty(element_text(p, &[]))),
                    text: element_text(article, &[&s.article_number, &s.article_heading]),
                    paragraphs,
                    id,
                })
            })
            .collect()
    }

    pub fn extract_conclusions(&self) -> Option<String> {
        let s = selectors();
        let conclusions = self.html.select(&s.conclusions).next()?;
        non_empty(element_text(conclusions, &[&s.noise]))
    }
}

/// Normalized text of `element`, skipping subtrees matching any of `skip`.
fn element_text(element: ElementRef, skip: &[&Selector]) -> String {
    let mut out = String::new();
    collect_text(element, skip, &mut out);
    normalize_whitespace(&out)
}

fn collect_text(element: ElementRef, skip: &[&Selector], out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if skip.iter().any(|selector| selector.matches(&child)) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&child.value().name());
                if block {
                    out.push(' ');
                }
                collect_text(child, skip, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

impl Parser for HtmlParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Html
    }

    fn strip_annotations(&mut self) -> usize {
        let ids: Vec<_> = self.html.select(&selectors().noise).map(|e| e.id()).collect();
        let mut removed = 0;
        for id in ids {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                node.detach();
                removed += 1;
            }
        }
        debug!("Removed {} footnote nodes", removed);
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

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = r##"<html lang="en"><body>
<div class="eli-subdivision" id="enc_1">
  <div class="eli-subdivision" id="art_1">
    <p class="oj-ti-art">Article 1</p>
    <div class="eli-title" id="art_1.tit_1"><p class="oj-sti-art">Scope</p></div>
    <div id="001.001"><p class="oj-normal">1.   This applies<a id="ntc1-E0001" href="#ntr1-E0001">(<span class="oj-super oj-note-tag">1</span>)</a> widely.</p></div>
    <div id="001.002"><p class="oj-normal">2.   It ends.</p></div>
  </div>
</div>
<hr class="oj-separator"/>
<p class="oj-note" id="ntr1-E0001"><a href="#ntc1-E0001">(1)</a> OJ L 1.</p>
</body></html>"##;

    #[test]
    fn test_articles_and_paragraphs() {
        let mut parser = HtmlParser::from_str(FRAGMENT);
        parser.strip_annotations();
        let articles = parser.extract_articles();

        assert_eq!(articles.len(), 1);
        let article = &articles[0];
        assert_eq!(article.id, "art_1");
        assert_eq!(article.number.as_deref(), Some("Article 1"));
        assert_eq!(article.heading.as_deref(), Some("Scope"));
        assert_eq!(article.text, "1. This applies widely. 2. It ends.");
        assert_eq!(article.paragraphs.len(), 2);
        assert_eq!(article.paragraphs[0].id, "001.001");
    }

    #[test]
    fn test_strip_annotations_removes_markers_and_notes() {
        let mut parser = HtmlParser::from_str(FRAGMENT);
        assert!(parser.strip_annotations() >= 3);
        assert_eq!(parser.html.select(&selectors().noise).count(), 0);
    }

    #[test]
    fn test_missing_enacting_terms() {
        let parser = HtmlParser::from_str("<html><body><p>Nothing</p></body></html>");
        assert!(parser.extract_articles().is_empty());
        assert!(parser.extract_chapters().is_empty());
        assert!(parser.extract_preamble().is_none());
    }

    #[test]
    fn test_block_elements_do_not_glue_words() {
        let html = Html::parse_fragment("<div><p>one</p><p>two</p></div>");
        let div = html.select(&Selector::parse("div").unwrap()).next().unwrap();
        assert_eq!(element_text(div, &[]), "one two");
    }
}
