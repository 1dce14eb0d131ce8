//! Parser error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Unclosed element <{0}> at end of document")]
    UnclosedElement(String),

    #[error("Document has no root element")]
    EmptyDocument,

    #[error("Expected <{expected}> as root element, found <{found}>")]
    UnexpectedRoot { expected: String, found: String },
}
