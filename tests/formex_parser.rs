use std::path::{Path, PathBuf};

use lexharvest::parsers::{self, FormexParser, Parser};
use lexharvest::DocumentFormat;

fn sample() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/L_2011334EN.01002501.xml")
}

fn assert_normalized(fields: Vec<&str>) {
    for field in fields {
        assert_eq!(field.trim(), field, "untrimmed field: {:?}", field);
        assert!(!field.contains("  "), "doubled space in: {:?}", field);
        assert!(!field.contains('\n'), "newline in: {:?}", field);
    }
}

#[test]
fn test_metadata() {
    let parser = FormexParser::load(&sample()).unwrap();
    let metadata = parser.extract_metadata();

    let expected = [
        ("file", "L_2011334EN.01002501.doc.xml"),
        ("collection", "L"),
        ("oj_number", "334"),
        ("year", "2011"),
        ("language", "EN"),
        ("page_first", "25"),
        ("page_seq", "1"),
        ("volume_ref", "01"),
        ("document_language", "EN"),
        ("sequence_number", "0009"),
        ("total_pages", "1"),
        ("doc_format", "NY"),
        ("doc_type", "OJ"),
        ("doc_number", "1319"),
    ];
    for (key, value) in expected {
        assert_eq!(metadata.get(key).map(String::as_str), Some(value), "metadata key {}", key);
    }
    assert_eq!(metadata.len(), expected.len());
}

#[test]
fn test_preface() {
    let parser = FormexParser::load(&sample()).unwrap();
    assert_eq!(
        parser.extract_preface().as_deref(),
        Some(
            "Commission Implementing Regulation (EU) No 1319/2011 of 15 December 2011 fixing representative \
             prices in the poultrymeat and egg sectors and for egg albumin, and amending Regulation (EC) No 1484/95"
        )
    );
}

#[test]
fn test_preamble() {
    let parser = FormexParser::load(&sample()).unwrap();
    let preamble = parser.extract_preamble().unwrap();

    assert_eq!(preamble.initial_statement.as_deref(), Some("THE EUROPEAN COMMISSION,"));
    assert_eq!(preamble.recitals_intro.as_deref(), Some("Whereas:"));
    assert_eq!(preamble.final_statement.as_deref(), Some("HAS ADOPTED THIS REGULATION:"));

    assert_eq!(preamble.citations.len(), 3);
    let citation = &preamble.citations[1];
    assert_eq!(citation.id, "1");
    assert!(citation.text.ends_with("(Single CMO Regulation), and in particular Article 143 in conjunction with Article 4 thereof,"));
    assert!(!citation.text.contains("OJ L 299"));
    assert_eq!(citation.notes, vec!["OJ L 299, 16.11.2007, p. 1."]);

    let ids: Vec<_> = preamble.recitals.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["(1)", "(2)", "(3)", "(4)"]);
    assert!(preamble.recitals[0].text.starts_with("Commission Regulation (EC) No 1484/95 lays down"));
    assert!(!preamble.recitals[0].text.contains("OJ L 145"));
    assert_eq!(preamble.recitals[2].text, "Regulation (EC) No 1484/95 should be amended accordingly.");
}

#[test]
fn test_articles() {
    let mut parser = FormexParser::load(&sample()).unwrap();
    parser.strip_annotations();
    let articles = parser.extract_articles();

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].id, "001");
    assert_eq!(articles[0].number.as_deref(), Some("Article 1"));
    assert_eq!(
        articles[0].text,
        "Annex I to Regulation (EC) No 1484/95 is replaced by the Annex to this Regulation."
    );
    assert_eq!(articles[1].id, "002");
    assert_eq!(articles[1].number.as_deref(), Some("Article 2"));
    assert_eq!(
        articles[1].text,
        "This Regulation shall enter into force on the day of its publication in the Official Journal of the European Union."
    );
    assert!(parser.extract_chapters().is_empty());
}

#[test]
fn test_strip_annotations_removes_every_note() {
    let mut parser = FormexParser::load(&sample()).unwrap();
    assert_eq!(parser.strip_annotations(), 3);
    assert_eq!(parser.strip_annotations(), 0);
}

#[test]
fn test_parse_document() {
    let document = parsers::parse_file(&sample(), DocumentFormat::Formex).unwrap();

    assert_eq!(document.format, DocumentFormat::Formex);
    assert_eq!(document.metadata["doc_number"], "1319");
    assert_eq!(document.articles.len(), 2);
    // notes captured during the preamble pass survive the cleanup
    assert_eq!(document.preamble.as_ref().unwrap().citations[2].notes.len(), 1);
    let conclusions = document.conclusions.as_deref().unwrap();
    assert!(conclusions.starts_with("This Regulation shall be binding in its entirety"));
    assert!(conclusions.contains("Done at Brussels, 15 December 2011."));
}

#[test]
fn test_parse_is_idempotent() {
    let first = parsers::parse_file(&sample(), DocumentFormat::Formex).unwrap();
    let second = parsers::parse_file(&sample(), DocumentFormat::Formex).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_text_is_normalized() {
    let document = parsers::parse_file(&sample(), DocumentFormat::Formex).unwrap();
    assert_normalized(document.text_fields());
}

#[test]
fn test_malformed_document_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xml");
    std::fs::write(&path, "<ACT><PREAMBLE></ACT>").unwrap();

    assert!(parsers::parse_file(&path, DocumentFormat::Formex).is_err());
}
