//! Writer for the XML spreadsheet format

use crate::error::{Result, SheetError};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Write cell records to an XML file
pub fn write_xml<'a, I>(path: &Path, version: &str, cells: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let content = write_xml_content(version, cells)?;
    fs::write(path, content)?;
    Ok(())
}

/// Write cell records to an XML string.
///
/// Each record is a cell name and the string that reproduces its contents
/// when entered (formulas carry their `=` prefix).
pub fn write_xml_content<'a, I>(version: &str, cells: I) -> Result<String>
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    write_document(version, cells).map_err(SheetError::read_write)
}

fn write_document<'a, I>(version: &str, cells: I) -> std::result::Result<String, quick_xml::Error>
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("spreadsheet");
    root.push_attribute(("version", version));
    writer.write_event(Event::Start(root))?;

    for (name, contents) in cells {
        writer.write_event(Event::Start(BytesStart::new("cell")))?;
        write_text_element(&mut writer, "name", name)?;
        write_text_element(&mut writer, "contents", &contents)?;
        writer.write_event(Event::End(BytesEnd::new("cell")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("spreadsheet")))?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> std::result::Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
