pub mod block;
pub mod config;
pub mod dataset_url;
pub mod front_matter;
pub mod html;
pub mod parser;

use crate::block::Block;
use crate::parser::ParseError;

/// A parsed narrative file.
#[derive(Debug, Clone)]
pub struct Narrative {
    /// Title-page block followed by one block per section, in reading order.
    pub blocks: Vec<Block>,
    /// Non-fatal problems found while parsing (severity Warning).
    pub warnings: Vec<ParseError>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

/// Parse a narrative file with the default configuration and return its blocks.
pub fn parse_narrative_file(source: &str) -> Result<Vec<Block>, ParseError> {
    parser::Parser::new(source.to_string(), 0)
        .parse()
        .map(|narrative| narrative.blocks)
}
