use super::Spreadsheet;
use crate::error::{Result, SheetError};
use crate::storage::{SavedCell, parse_xml, parse_xml_content, parse_xml_version, write_xml, write_xml_content};
use cellgraph_engine::engine::NameRules;
use std::path::{Path, PathBuf};
use tracing::info;

/// Extension given to saved files that have none.
pub const FILE_EXTENSION: &str = "ss";

impl Spreadsheet {
    /// `(name, input string)` for every non-empty cell, in enumeration order.
    fn records(&self) -> impl Iterator<Item = (&str, String)> {
        self.non_empty.iter().filter_map(|name| {
            self.cells
                .get(name)
                .map(|cell| (name.as_str(), cell.contents.to_input_string()))
        })
    }

    /// The document as XML.
    pub fn to_xml(&self) -> Result<String> {
        write_xml_content(&self.version, self.records())
    }

    /// Save to `path`, adding the `.ss` extension if it has none.
    /// Returns the path written.
    pub fn save(&mut self, path: &Path) -> Result<PathBuf> {
        if self.version.trim().is_empty() {
            return Err(SheetError::ReadWrite(
                "cannot save a document with an empty version".to_string(),
            ));
        }

        let path = if path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension(FILE_EXTENSION)
        };

        write_xml(&path, &self.version, self.records())?;
        self.changed = false;
        info!(path = %path.display(), cells = self.non_empty.len(), "saved spreadsheet");
        Ok(path)
    }

    /// Replace this document's cells with those in `xml`.
    ///
    /// Records are replayed through [`Spreadsheet::set_contents`] into a fresh
    /// document with the same rules and version. Any failure leaves `self`
    /// untouched and is reported as [`SheetError::ReadWrite`].
    pub fn load_xml(&mut self, xml: &str) -> Result<()> {
        let saved = parse_xml_content(xml)?;
        *self = replay(self.rules.clone(), self.version.clone(), saved.cells)?;
        Ok(())
    }

    /// Replace this document's cells with those in the file at `path`.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let saved = parse_xml(path)?;
        *self = replay(self.rules.clone(), self.version.clone(), saved.cells)?;
        info!(path = %path.display(), cells = self.non_empty.len(), "loaded spreadsheet");
        Ok(())
    }

    /// Load the file at `path`, which must have been saved with `version`.
    pub fn open(path: &Path, rules: NameRules, version: &str) -> Result<Spreadsheet> {
        let saved = parse_xml(path)?;
        if saved.version != version {
            return Err(SheetError::ReadWrite(format!(
                "version mismatch: {} was saved as version {:?}, expected {:?}",
                path.display(),
                saved.version,
                version
            )));
        }
        let sheet = replay(rules, version.to_string(), saved.cells)?;
        info!(path = %path.display(), cells = sheet.non_empty.len(), "opened spreadsheet");
        Ok(sheet)
    }

    /// The version tag of a saved file, without loading its cells.
    pub fn saved_version(path: &Path) -> Result<String> {
        parse_xml_version(path)
    }
}

fn replay(rules: NameRules, version: String, cells: Vec<SavedCell>) -> Result<Spreadsheet> {
    let mut sheet = Spreadsheet::with_rules(rules, version);
    for cell in cells {
        sheet
            .set_contents(&cell.name, &cell.contents)
            .map_err(|e| SheetError::ReadWrite(format!("cell {}: {e}", cell.name)))?;
    }
    sheet.changed = false;
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgraph_engine::engine::{CellContents, CellValue};

    fn sample() -> Spreadsheet {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("A1", "3").unwrap();
        sheet.set_contents("B1", "=A1*2").unwrap();
        sheet.set_contents("C1", "=B1+A1").unwrap();
        sheet.set_contents("D1", "  <hello> & \"bye\" ").unwrap();
        sheet.set_contents("E1", "2.5").unwrap();
        sheet.set_contents("F1", "=E1/0").unwrap();
        sheet
    }

    fn assert_same_cells(a: &Spreadsheet, b: &Spreadsheet) {
        let names: Vec<&str> = a.non_empty_names().collect();
        assert_eq!(names, b.non_empty_names().collect::<Vec<_>>());
        for name in names {
            assert_eq!(a.get_contents(name).unwrap(), b.get_contents(name).unwrap(), "{name}");
            assert_eq!(a.get_value(name).unwrap(), b.get_value(name).unwrap(), "{name}");
        }
    }

    #[test]
    fn test_xml_round_trip() {
        let sheet = sample();
        let xml = sheet.to_xml().unwrap();
        let mut loaded = Spreadsheet::new();
        loaded.load_xml(&xml).unwrap();
        assert_same_cells(&sheet, &loaded);
        assert!(!loaded.changed());
    }

    #[test]
    fn test_number_like_text_survives_round_trip() {
        let mut sheet = Spreadsheet::new();
        for (name, input) in [("A1", "NaN"), ("A2", "inf"), ("A3", "1e400"), ("A4", "5 apples"), ("A5", "x=1")] {
            sheet.set_contents(name, input).unwrap();
            assert_eq!(sheet.get_contents(name).unwrap(), CellContents::Text(input.into()));
        }
        sheet.set_contents("B1", "-0.25").unwrap();

        let mut loaded = Spreadsheet::new();
        loaded.load_xml(&sheet.to_xml().unwrap()).unwrap();
        assert_same_cells(&sheet, &loaded);
        assert_eq!(loaded.get_contents("B1").unwrap(), CellContents::Number(-0.25));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sample();
        assert!(sheet.changed());

        let written = sheet.save(&dir.path().join("book")).unwrap();
        assert_eq!(written, dir.path().join("book.ss"));
        assert!(!sheet.changed());

        let mut loaded = Spreadsheet::new();
        loaded.load_file(&written).unwrap();
        assert_same_cells(&sheet, &loaded);
    }

    #[test]
    fn test_save_keeps_existing_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = sample();
        let written = sheet.save(&dir.path().join("book.xml")).unwrap();
        assert_eq!(written, dir.path().join("book.xml"));
        assert!(written.exists());
    }

    #[test]
    fn test_save_refuses_empty_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = Spreadsheet::with_rules(NameRules::default(), "");
        sheet.set_contents("A1", "1").unwrap();
        let err = sheet.save(&dir.path().join("x")).unwrap_err();
        assert!(matches!(err, SheetError::ReadWrite(_)));
        assert!(sheet.changed());
    }

    #[test]
    fn test_load_replays_forward_references() {
        let xml = r#"<spreadsheet version="1.0">
  <cell><name>b1</name><contents>=a1*2</contents></cell>
  <cell><name>a1</name><contents>4</contents></cell>
</spreadsheet>"#;
        let mut sheet = Spreadsheet::new();
        sheet.load_xml(xml).unwrap();
        assert_eq!(sheet.get_value("B1").unwrap(), CellValue::Number(8.0));
        assert_eq!(sheet.non_empty_names().collect::<Vec<_>>(), vec!["B1", "A1"]);
    }

    #[test]
    fn test_failed_load_leaves_document_untouched() {
        let mut sheet = sample();
        let bad = [
            "<spreadsheet version=\"1.0\"><cell><name>A1</name></cell></spreadsheet>",
            "<spreadsheet version=\"1.0\"><cell><name>bad</name><contents>1</contents></cell></spreadsheet>",
            "<spreadsheet version=\"1.0\"><cell><name>A1</name><contents>=1+</contents></cell></spreadsheet>",
            "<spreadsheet version=\"1.0\"><cell><name>A1</name><contents>=B1</contents></cell><cell><name>B1</name><contents>=A1</contents></cell></spreadsheet>",
            "not xml at all",
        ];
        for xml in bad {
            let err = sheet.load_xml(xml).unwrap_err();
            assert!(matches!(err, SheetError::ReadWrite(_)), "{xml}: {err:?}");
            assert_same_cells(&sheet, &sample());
        }
    }

    #[test]
    fn test_open_checks_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = Spreadsheet::with_rules(NameRules::default(), "v2");
        sheet.set_contents("A1", "=1+1").unwrap();
        let path = sheet.save(&dir.path().join("v")).unwrap();

        assert_eq!(Spreadsheet::saved_version(&path).unwrap(), "v2");
        let opened = Spreadsheet::open(&path, NameRules::default(), "v2").unwrap();
        assert_eq!(opened.get_value("A1").unwrap(), CellValue::Number(2.0));
        assert_eq!(opened.version(), "v2");

        let err = Spreadsheet::open(&path, NameRules::default(), "v3").unwrap_err();
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_open_missing_file_is_read_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Spreadsheet::open(&dir.path().join("nope.ss"), NameRules::default(), "1.0")
            .unwrap_err();
        assert!(matches!(err, SheetError::ReadWrite(_)));
    }
}
