pub mod batch;
pub mod config;
pub mod downloader;
pub mod models;
pub mod parsers;

pub use config::Config;
pub use models::{DocumentFormat, Source};
pub use parsers::{ParseError, ParsedDocument, Parser};
