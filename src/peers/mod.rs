//! Public peer list retrieval and parsing

pub mod parser;
pub mod source;

pub use parser::{parse_document, parse_line};
pub use source::{download_archive, fetch_peers, peers_from_archive};
