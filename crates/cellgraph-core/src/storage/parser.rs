//! Parser for the XML spreadsheet format

use crate::error::{Result, SheetError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs;
use std::path::Path;

/// One `<cell>` record, in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedCell {
    pub name: String,
    pub contents: String,
}

/// A parsed document: its version tag and cell records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedSheet {
    pub version: String,
    pub cells: Vec<SavedCell>,
}

/// Parse an XML spreadsheet file
pub fn parse_xml(path: &Path) -> Result<SavedSheet> {
    let content = fs::read_to_string(path)?;
    parse_xml_content(&content)
}

/// Where the reader currently is.
enum Scope {
    Outside,
    Sheet,
    Cell {
        name: Option<String>,
        contents: Option<String>,
    },
    Field {
        field: Field,
        name: Option<String>,
        contents: Option<String>,
        text: String,
    },
    Done,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Contents,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Field> {
        match tag {
            b"name" => Some(Field::Name),
            b"contents" => Some(Field::Contents),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Contents => "contents",
        }
    }
}

fn malformed(message: impl Into<String>) -> SheetError {
    SheetError::ReadWrite(message.into())
}

fn read_version(root: &BytesStart<'_>) -> Result<String> {
    let attr = root
        .try_get_attribute("version")
        .map_err(SheetError::read_write)?
        .ok_or_else(|| malformed("<spreadsheet> has no version attribute"))?;
    let value = attr.unescape_value().map_err(SheetError::read_write)?;
    Ok(value.into_owned())
}

fn finish_cell(name: Option<String>, contents: Option<String>) -> Result<SavedCell> {
    let name = name.ok_or_else(|| malformed("<cell> has no <name>"))?;
    let contents = contents.ok_or_else(|| malformed(format!("<cell> {name} has no <contents>")))?;
    Ok(SavedCell { name, contents })
}

fn store_field(
    field: Field,
    text: String,
    name: &mut Option<String>,
    contents: &mut Option<String>,
) -> Result<()> {
    let slot = match field {
        Field::Name => name,
        Field::Contents => contents,
    };
    if slot.is_some() {
        return Err(malformed(format!("<cell> has more than one <{}>", field.tag())));
    }
    *slot = Some(text);
    Ok(())
}

/// Parse XML spreadsheet content from a string.
///
/// The root must be `<spreadsheet version="...">` holding only `<cell>`
/// elements, each with exactly one `<name>` and one `<contents>`. Anything else
/// is a [`SheetError::ReadWrite`].
pub fn parse_xml_content(content: &str) -> Result<SavedSheet> {
    let mut reader = Reader::from_str(content);
    let mut version = String::new();
    let mut cells = Vec::new();
    let mut scope = Scope::Outside;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("XML error at byte {}: {e}", reader.buffer_position())))?;

        scope = match (scope, event) {
            (scope, Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_)) => scope,

            (Scope::Outside, Event::Start(e)) if e.name().as_ref() == b"spreadsheet" => {
                version = read_version(&e)?;
                Scope::Sheet
            }
            (Scope::Outside, Event::Empty(e)) if e.name().as_ref() == b"spreadsheet" => {
                version = read_version(&e)?;
                Scope::Done
            }

            (Scope::Sheet, Event::Start(e)) if e.name().as_ref() == b"cell" => Scope::Cell {
                name: None,
                contents: None,
            },
            (Scope::Sheet, Event::End(_)) => Scope::Done,

            (Scope::Cell { name, contents }, Event::Start(e)) => {
                let field = Field::from_tag(e.name().as_ref()).ok_or_else(|| {
                    malformed(format!(
                        "unexpected <{}> in <cell>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                Scope::Field {
                    field,
                    name,
                    contents,
                    text: String::new(),
                }
            }
            (
                Scope::Cell {
                    mut name,
                    mut contents,
                },
                Event::Empty(e),
            ) => {
                let field = Field::from_tag(e.name().as_ref())
                    .ok_or_else(|| malformed("unexpected empty element in <cell>"))?;
                store_field(field, String::new(), &mut name, &mut contents)?;
                Scope::Cell { name, contents }
            }
            (Scope::Cell { name, contents }, Event::End(_)) => {
                cells.push(finish_cell(name, contents)?);
                Scope::Sheet
            }

            (
                Scope::Field {
                    field,
                    name,
                    contents,
                    mut text,
                },
                Event::Text(t),
            ) => {
                text.push_str(&t.unescape().map_err(SheetError::read_write)?);
                Scope::Field {
                    field,
                    name,
                    contents,
                    text,
                }
            }
            (
                Scope::Field {
                    field,
                    name,
                    contents,
                    mut text,
                },
                Event::CData(t),
            ) => {
                let raw = t.into_inner();
                text.push_str(std::str::from_utf8(&raw).map_err(SheetError::read_write)?);
                Scope::Field {
                    field,
                    name,
                    contents,
                    text,
                }
            }
            (
                Scope::Field {
                    field,
                    mut name,
                    mut contents,
                    text,
                },
                Event::End(_),
            ) => {
                store_field(field, text, &mut name, &mut contents)?;
                Scope::Cell { name, contents }
            }

            // Indentation between elements.
            (scope, Event::Text(t)) => {
                if !t.iter().all(u8::is_ascii_whitespace) {
                    return Err(malformed("unexpected text outside <name> or <contents>"));
                }
                scope
            }

            (Scope::Done, Event::Eof) => break,
            (_, Event::Eof) => return Err(malformed("document ended before </spreadsheet>")),
            (Scope::Outside, _) => return Err(malformed("root element must be <spreadsheet>")),
            (Scope::Done, _) => return Err(malformed("content after </spreadsheet>")),
            (_, Event::Start(e) | Event::Empty(e)) => {
                return Err(malformed(format!(
                    "unexpected <{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            (_, _) => return Err(malformed("unexpected XML content")),
        };
    }

    Ok(SavedSheet { version, cells })
}

/// Read just the version tag of an XML spreadsheet file.
pub fn parse_xml_version(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)?;
    let mut reader = Reader::from_str(&content);
    loop {
        match reader.read_event().map_err(SheetError::read_write)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"spreadsheet" => {
                return read_version(&e);
            }
            Event::Start(_) | Event::Empty(_) => {
                return Err(malformed("root element must be <spreadsheet>"));
            }
            Event::Eof => return Err(malformed("no <spreadsheet> element")),
            _ => {}
        }
    }
}
