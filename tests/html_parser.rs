use std::path::{Path, PathBuf};

use lexharvest::parsers::{self, HtmlParser, Parser};
use lexharvest::DocumentFormat;

fn sample() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/32014L0092.html")
}

#[test]
fn test_metadata_and_preface() {
    let parser = HtmlParser::load(&sample()).unwrap();
    let metadata = parser.extract_metadata();

    assert_eq!(metadata["language"], "en");
    assert_eq!(metadata["DC.identifier"], "32014L0092");
    assert_eq!(metadata["title"], "L_2014257EN.01021401.xml");

    let preface = parser.extract_preface().unwrap();
    assert!(preface.starts_with("DIRECTIVE 2014/92/EU OF THE EUROPEAN PARLIAMENT AND OF THE COUNCIL of 23 July 2014"));
    assert!(preface.ends_with("(Text with EEA relevance)"));
}

#[test]
fn test_preamble() {
    let parser = HtmlParser::load(&sample()).unwrap();
    let preamble = parser.extract_preamble().unwrap();

    assert_eq!(
        preamble.initial_statement.as_deref(),
        Some("THE EUROPEAN PARLIAMENT AND THE COUNCIL OF THE EUROPEAN UNION,")
    );
    assert_eq!(preamble.recitals_intro.as_deref(), Some("Whereas:"));
    assert_eq!(preamble.final_statement.as_deref(), Some("HAVE ADOPTED THIS DIRECTIVE:"));

    let citation_ids: Vec<_> = preamble.citations.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(citation_ids, vec!["cit_1", "cit_2"]);
    assert_eq!(
        preamble.citations[1].text,
        "Having regard to the opinion of the European Economic and Social Committee,"
    );

    let recital_ids: Vec<_> = preamble.recitals.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(recital_ids, vec!["rct_1", "rct_2", "rct_3"]);
    assert_eq!(
        preamble.recitals[1].text,
        "Union action in this area has already achieved considerable results, in particular through Directive 2007/64/EC."
    );
}

#[test]
fn test_chapters_and_articles() {
    let document = parsers::parse_file(&sample(), DocumentFormat::Html).unwrap();

    let chapter_ids: Vec<_> = document.chapters.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(chapter_ids, vec!["cpt_I", "cpt_II"]);
    assert_eq!(document.chapters[0].number.as_deref(), Some("CHAPTER I"));
    assert_eq!(
        document.chapters[1].heading.as_deref(),
        Some("COMPARABILITY OF FEES CONNECTED WITH PAYMENT ACCOUNTS")
    );

    let article_ids: Vec<_> = document.articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(article_ids, vec!["art_1", "art_2", "art_3"]);

    let first = &document.articles[0];
    assert_eq!(first.number.as_deref(), Some("Article 1"));
    assert_eq!(first.heading.as_deref(), Some("Subject matter and scope"));
    let paragraph_ids: Vec<_> = first.paragraphs.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(paragraph_ids, vec!["001.001", "001.002"]);
    assert_eq!(
        first.paragraphs[1].text,
        "2. This Directive applies to payment accounts held by consumers."
    );

    let second = &document.articles[1];
    assert!(second.paragraphs.is_empty());
    assert_eq!(
        second.text,
        "For the purposes of this Directive, the definitions in Directive 2007/64/EC apply."
    );

    assert_eq!(
        document.conclusions.as_deref(),
        Some("Done at Brussels, 23 July 2014. For the European Parliament The President")
    );
}

#[test]
fn test_parse_is_idempotent_and_normalized() {
    let first = parsers::parse_file(&sample(), DocumentFormat::Html).unwrap();
    let second = parsers::parse_file(&sample(), DocumentFormat::Html).unwrap();
    assert_eq!(first, second);

    for field in first.text_fields() {
        assert_eq!(field.trim(), field);
        assert!(!field.contains("  "), "doubled space in: {:?}", field);
    }
}

#[test]
fn test_strip_annotations() {
    let mut parser = HtmlParser::load(&sample()).unwrap();
    // three note anchors with their tags, three notes
    assert_eq!(parser.strip_annotations(), 9);
    assert_eq!(parser.strip_annotations(), 0);
}
