use crate::error::{Result, SheetError};
use cellgraph_engine::engine::{Cell, CellContents, CellValue, DependencyGraph, NameRules};
use std::collections::HashMap;

/// Version tag written by documents created without an explicit one.
pub const DEFAULT_VERSION: &str = "1.0";

/// UI-agnostic spreadsheet state.
///
/// Only non-empty cells are stored. Absent cells read as empty text for both
/// contents and value.
#[derive(Clone, Debug)]
pub struct Spreadsheet {
    /// Non-empty cells keyed by normalized name
    pub(crate) cells: HashMap<String, Cell>,
    /// Names of non-empty cells in the order they became non-empty
    pub(crate) non_empty: Vec<String>,
    /// Formula references: `(s, t)` means t's formula mentions s
    pub(crate) graph: DependencyGraph,
    pub(crate) rules: NameRules,
    pub(crate) version: String,
    /// Whether the document changed since it was created, loaded or saved
    pub(crate) changed: bool,
}

impl Spreadsheet {
    /// An empty document with default name rules and version.
    pub fn new() -> Self {
        Self::with_rules(NameRules::default(), DEFAULT_VERSION)
    }

    pub fn with_rules(rules: NameRules, version: impl Into<String>) -> Self {
        Spreadsheet {
            cells: HashMap::new(),
            non_empty: Vec::new(),
            graph: DependencyGraph::new(),
            rules,
            version: version.into(),
            changed: false,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules(&self) -> &NameRules {
        &self.rules
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Normalize `name` and check it against the rules.
    pub(crate) fn resolve_name(&self, name: &str) -> Result<String> {
        self.rules
            .resolve(name)
            .ok_or_else(|| SheetError::InvalidName(name.to_string()))
    }

    pub fn get_contents(&self, name: &str) -> Result<CellContents> {
        let name = self.resolve_name(name)?;
        Ok(self
            .cells
            .get(&name)
            .map(|cell| cell.contents.clone())
            .unwrap_or_default())
    }

    pub fn get_value(&self, name: &str) -> Result<CellValue> {
        let name = self.resolve_name(name)?;
        Ok(self
            .cells
            .get(&name)
            .map(|cell| cell.value.clone())
            .unwrap_or_default())
    }

    /// Names of all non-empty cells, each once.
    pub fn non_empty_names(&self) -> impl Iterator<Item = &str> {
        self.non_empty.iter().map(String::as_str)
    }

    /// Names whose formulas reference `name` directly.
    pub fn direct_dependents(&self, name: &str) -> Result<Vec<String>> {
        let name = self.resolve_name(name)?;
        Ok(self.graph.dependents(&name).map(str::to_string).collect())
    }

    /// The numeric value of a cell, for formula evaluation. `None` when the
    /// cell is absent or its value is not a number.
    pub(crate) fn variable_lookup(&self, name: &str) -> Option<f64> {
        self.cells.get(name).and_then(|cell| cell.value.as_number())
    }
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::new()
    }
}
