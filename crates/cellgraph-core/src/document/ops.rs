use super::Spreadsheet;
use crate::error::{Result, SheetError};
use cellgraph_engine::engine::{Cell, CellContents, CellValue, Formula, recalc_order};
use tracing::{debug, trace, warn};

impl Spreadsheet {
    /// Set a cell from user input.
    ///
    /// Input that parses as a finite number is a number; input starting with
    /// `=` is a formula; anything else is text, and blank text empties the
    /// cell. Returns the edited cell followed by every cell whose value depends
    /// on it, in an order where each cell comes after its dependees.
    ///
    /// Name and formula errors are reported before anything changes. A formula
    /// that would close a cycle is rejected and the document is left exactly as
    /// it was.
    pub fn set_contents(&mut self, name: &str, content: &str) -> Result<Vec<String>> {
        let name = self.resolve_name(name)?;
        match self.classify(content)? {
            CellContents::Number(number) => self.set_number(name, number),
            CellContents::Text(text) => self.set_text(name, text),
            formula => self.replace_cell(name, formula),
        }
    }

    // Only `classify` output reaches these, so every stored number is finite
    // and every stored text reads back as text when saved.
    fn set_number(&mut self, name: String, number: f64) -> Result<Vec<String>> {
        self.replace_cell(name, CellContents::Number(number))
    }

    fn set_text(&mut self, name: String, text: String) -> Result<Vec<String>> {
        self.replace_cell(name, CellContents::Text(text))
    }

    /// Set a formula cell. Variables are normalized with this document's rules.
    pub fn set_formula(&mut self, name: &str, formula: &Formula) -> Result<Vec<String>> {
        let name = self.resolve_name(name)?;
        let formula = Formula::parse_with_rules(formula.canonical(), &self.rules)?;
        self.replace_cell(name, CellContents::Formula(formula))
    }

    /// Whether [`Spreadsheet::set_contents`] would accept this edit.
    ///
    /// Reports the same name, formula and cycle errors, but never applies the
    /// edit: the document is unchanged afterwards whether or not it would have
    /// succeeded.
    pub fn check_contents(&mut self, name: &str, content: &str) -> Result<()> {
        let name = self.resolve_name(name)?;
        let CellContents::Formula(formula) = self.classify(content)? else {
            return Ok(());
        };

        let previous: Vec<String> = self.graph.dependees(&name).map(str::to_string).collect();
        self.graph.replace_dependees(&name, formula.variables());
        let trial = recalc_order(&self.graph, &name);
        self.graph.replace_dependees(&name, &previous);

        trial
            .map(|_| ())
            .map_err(|cycle| SheetError::circular(&name, cycle))
    }

    fn classify(&self, content: &str) -> Result<CellContents> {
        let trimmed = content.trim();
        if let Ok(number) = trimmed.parse::<f64>()
            && number.is_finite()
        {
            return Ok(CellContents::Number(number));
        }
        if let Some(expr) = trimmed.strip_prefix('=') {
            let formula = Formula::parse_with_rules(expr, &self.rules)?;
            return Ok(CellContents::Formula(formula));
        }
        Ok(CellContents::Text(content.to_string()))
    }

    fn replace_cell(&mut self, name: String, contents: CellContents) -> Result<Vec<String>> {
        // Every edit drops the cell's old references first.
        let previous: Vec<String> = self.graph.dependees(&name).map(str::to_string).collect();
        match &contents {
            CellContents::Formula(formula) => self.graph.replace_dependees(&name, formula.variables()),
            _ => self.graph.replace_dependees(&name, Vec::<&str>::new()),
        }

        let order = match recalc_order(&self.graph, &name) {
            Ok(order) => order,
            Err(cycle) => {
                self.graph.replace_dependees(&name, &previous);
                warn!(cell = %name, %cycle, "rejected edit");
                return Err(SheetError::circular(&name, cycle));
            }
        };

        let value = match &contents {
            CellContents::Text(text) => CellValue::Text(text.clone()),
            CellContents::Number(number) => CellValue::Number(*number),
            CellContents::Formula(formula) => {
                CellValue::from(formula.evaluate(|var| self.variable_lookup(var)))
            }
        };

        if contents.is_empty() {
            if self.cells.remove(&name).is_some() {
                self.non_empty.retain(|n| *n != name);
            }
        } else if self
            .cells
            .insert(name.clone(), Cell { contents, value })
            .is_none()
        {
            self.non_empty.push(name.clone());
        }
        self.changed = true;

        self.recalculate(order.iter().skip(1));
        debug!(cell = %name, recalculated = order.len(), "cell updated");
        Ok(order)
    }

    /// Re-evaluate formula cells, in the given order.
    fn recalculate<'a>(&mut self, names: impl Iterator<Item = &'a String>) {
        for name in names {
            let Some(formula) = self.cells.get(name).and_then(Cell::formula) else {
                continue;
            };
            let value = CellValue::from(formula.evaluate(|var| self.variable_lookup(var)));
            trace!(cell = %name, %value, "recalculated");
            if let Some(cell) = self.cells.get_mut(name) {
                cell.value = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgraph_engine::engine::NameRules;

    fn number(sheet: &Spreadsheet, name: &str) -> f64 {
        sheet.get_value(name).unwrap().as_number().unwrap()
    }

    fn names(sheet: &Spreadsheet) -> Vec<String> {
        sheet.non_empty_names().map(str::to_string).collect()
    }

    #[test]
    fn test_classify_content() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("A1", " 2.5 ").unwrap();
        sheet.set_contents("A2", "=a1 * 2").unwrap();
        sheet.set_contents("A3", "hello").unwrap();
        sheet.set_contents("A4", "inf").unwrap();
        sheet.set_contents("A5", "1e3").unwrap();

        assert_eq!(sheet.get_contents("A1").unwrap(), CellContents::Number(2.5));
        assert_eq!(sheet.get_contents("A2").unwrap().to_string(), "=A1*2");
        assert_eq!(sheet.get_contents("A3").unwrap(), CellContents::Text("hello".into()));
        assert_eq!(sheet.get_contents("A4").unwrap(), CellContents::Text("inf".into()));
        assert_eq!(number(&sheet, "A5"), 1000.0);
        assert_eq!(number(&sheet, "A2"), 5.0);
    }

    #[test]
    fn test_dependency_propagation() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("A1", "3").unwrap();
        sheet.set_contents("B1", "=A1*2").unwrap();
        sheet.set_contents("C1", "=B1+A1").unwrap();
        assert_eq!(number(&sheet, "C1"), 9.0);

        let order = sheet.set_contents("A1", "5").unwrap();
        assert_eq!(order, vec!["A1", "B1", "C1"]);
        assert_eq!(number(&sheet, "B1"), 10.0);
        assert_eq!(number(&sheet, "C1"), 15.0);
    }

    #[test]
    fn test_recalculation_set_is_just_the_cell_without_dependents() {
        let mut sheet = Spreadsheet::new();
        assert_eq!(sheet.set_contents("a1", "x").unwrap(), vec!["A1"]);
    }

    #[test]
    fn test_cycle_is_rejected_and_rolled_back() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("A1", "=B1+1").unwrap();
        sheet.set_contents("B1", "4").unwrap();
        assert_eq!(number(&sheet, "A1"), 5.0);

        let err = sheet.set_contents("B1", "=A1+1").unwrap_err();
        assert!(matches!(err, SheetError::Circular { .. }));
        assert_eq!(err.cycle_path().unwrap(), ["B1", "A1", "B1"]);

        assert_eq!(sheet.get_contents("B1").unwrap(), CellContents::Number(4.0));
        assert_eq!(sheet.get_contents("A1").unwrap().to_string(), "=B1+1");
        assert_eq!(sheet.direct_dependents("B1").unwrap(), vec!["A1"]);
        assert!(sheet.direct_dependents("A1").unwrap().is_empty());

        // The graph is intact: edits still propagate.
        sheet.set_contents("B1", "10").unwrap();
        assert_eq!(number(&sheet, "A1"), 11.0);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut sheet = Spreadsheet::new();
        let err = sheet.set_contents("A1", "=A1").unwrap_err();
        assert!(matches!(err, SheetError::Circular { .. }));
        assert_eq!(sheet.non_empty_names().count(), 0);
    }

    #[test]
    fn test_replacing_a_formula_drops_old_references() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("B1", "=A1+1").unwrap();
        sheet.set_contents("B1", "7").unwrap();
        assert!(sheet.direct_dependents("A1").unwrap().is_empty());
        assert_eq!(sheet.set_contents("A1", "1").unwrap(), vec!["A1"]);
    }

    #[test]
    fn test_name_handling() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("a15", "1").unwrap();
        assert_eq!(sheet.get_contents("A15").unwrap(), CellContents::Number(1.0));
        for bad in ["Z", "X_", "hello"] {
            assert_eq!(
                sheet.set_contents(bad, "1").unwrap_err(),
                SheetError::InvalidName(bad.to_string())
            );
        }
        assert_eq!(names(&sheet), vec!["A15"]);
    }

    #[test]
    fn test_bad_formula_changes_nothing() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("A1", "2").unwrap();
        let before = sheet.changed();
        sheet.changed = false;
        let err = sheet.set_contents("A1", "=1 +").unwrap_err();
        assert!(matches!(err, SheetError::FormulaFormat(_)));
        assert_eq!(sheet.get_contents("A1").unwrap(), CellContents::Number(2.0));
        assert!(before);
        assert!(!sheet.changed());
    }

    #[test]
    fn test_formula_variables_must_be_valid_names() {
        let rules = NameRules::default().with_validator(|name| name.starts_with('A'));
        let mut sheet = Spreadsheet::with_rules(rules, "1.0");
        let err = sheet.set_contents("A1", "=B1+1").unwrap_err();
        assert!(matches!(err, SheetError::FormulaFormat(_)));
    }

    #[test]
    fn test_empty_text_removes_cell() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("A1", "x").unwrap();
        sheet.set_contents("B1", "y").unwrap();
        sheet.set_contents("A1", "   ").unwrap();
        assert_eq!(names(&sheet), vec!["B1"]);
        sheet.set_contents("A1", "z").unwrap();
        assert_eq!(names(&sheet), vec!["B1", "A1"]);
        sheet.set_text("A1".into(), String::new()).unwrap();
        assert_eq!(names(&sheet), vec!["B1"]);
    }

    #[test]
    fn test_evaluation_errors_are_values() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("A1", "=1/0").unwrap();
        sheet.set_contents("A2", "=Q9+1").unwrap();
        sheet.set_contents("A3", "text").unwrap();
        sheet.set_contents("A4", "=A3*2").unwrap();
        for name in ["A1", "A2", "A4"] {
            assert!(matches!(sheet.get_value(name).unwrap(), CellValue::Error(_)));
        }

        sheet.set_contents("Q9", "1").unwrap();
        assert_eq!(number(&sheet, "A2"), 2.0);
    }

    #[test]
    fn test_clearing_a_cell_recalculates_dependents() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("A1", "2").unwrap();
        sheet.set_contents("B1", "=A1*3").unwrap();
        let order = sheet.set_contents("A1", "").unwrap();
        assert_eq!(order, vec!["A1", "B1"]);
        assert!(matches!(sheet.get_value("B1").unwrap(), CellValue::Error(_)));
    }

    #[test]
    fn test_typed_setters() {
        let mut sheet = Spreadsheet::new();
        sheet.set_number("A1".into(), 4.0).unwrap();
        let formula = Formula::parse("a1 / 2").unwrap();
        assert_eq!(sheet.set_formula("b1", &formula).unwrap(), vec!["B1"]);
        assert_eq!(sheet.get_contents("B1").unwrap().to_string(), "=A1/2");
        assert_eq!(number(&sheet, "B1"), 2.0);
    }

    #[test]
    fn test_check_contents_never_applies() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("A1", "=B1+1").unwrap();
        sheet.changed = false;

        assert!(sheet.check_contents("B1", "5").is_ok());
        assert!(sheet.check_contents("C1", "=A1*2").is_ok());
        assert!(matches!(
            sheet.check_contents("B1", "=A1"),
            Err(SheetError::Circular { .. })
        ));
        assert!(matches!(sheet.check_contents("B1", "=("), Err(SheetError::FormulaFormat(_))));
        assert!(matches!(sheet.check_contents("1B", "1"), Err(SheetError::InvalidName(_))));

        assert_eq!(names(&sheet), vec!["A1"]);
        assert_eq!(sheet.get_contents("B1").unwrap(), CellContents::default());
        assert_eq!(sheet.direct_dependents("B1").unwrap(), vec!["A1"]);
        assert!(sheet.direct_dependents("A1").unwrap().is_empty());
        assert!(!sheet.changed());
    }

    #[test]
    fn test_dry_runs_and_rejected_edits_leave_graph_size_alone() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("A1", "=B1+1").unwrap();
        let nodes = sheet.graph.node_count();
        assert_eq!(nodes, 2);

        for i in 0..1000 {
            sheet.check_contents("C1", &format!("=Z{i}+1")).unwrap();
        }
        assert!(sheet.set_contents("B1", "=A1+Q7").is_err());
        assert_eq!(sheet.graph.node_count(), nodes);

        sheet.set_contents("A1", "2").unwrap();
        assert_eq!(sheet.graph.node_count(), 0);
    }

    #[test]
    fn test_check_contents_keeps_existing_references() {
        let mut sheet = Spreadsheet::new();
        sheet.set_contents("C1", "=A1+B1").unwrap();
        sheet.check_contents("C1", "=D1").unwrap();
        let mut dependees: Vec<String> = ["A1", "B1"]
            .iter()
            .filter(|n| sheet.direct_dependents(n).unwrap() == vec!["C1"])
            .map(|n| n.to_string())
            .collect();
        dependees.sort();
        assert_eq!(dependees, vec!["A1", "B1"]);
        assert!(sheet.direct_dependents("D1").unwrap().is_empty());
    }
}
