//! Document storage: the XML spreadsheet format.

mod parser;
mod writer;

pub use parser::{SavedCell, SavedSheet, parse_xml, parse_xml_content, parse_xml_version};
pub use writer::{write_xml, write_xml_content};
