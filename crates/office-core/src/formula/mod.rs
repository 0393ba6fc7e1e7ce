//! Formula parsing, evaluation and workbook recalculation.
//!
//! Covers arithmetic, comparison and text operators, cell and range references
//! (optionally sheet-qualified) and a core set of functions. A formula using
//! anything else keeps the cached value it was stored with.

mod ast;
mod eval;
mod parser;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use thiserror::Error;

use crate::cell::{CellAddress, CellValue};
use crate::range::CellRange;
use crate::workbook::Workbook;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::{evaluate, CellSource, Scalar};
pub use parser::parse;

pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

#[derive(Debug, Error)]
pub enum FormulaError {
    #[error("could not parse formula: {0}")]
    Parse(String),

    /// Valid syntax this evaluator does not compute (named ranges, unknown functions)
    #[error("unsupported in formulas: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Arguments(String),
}

/// Formula chains deeper than this fall back to cached values
const MAX_DEPTH: usize = 512;

/// (sheet index, row, col)
type Key = (usize, u32, u16);

/// Recompute the cached value of every formula the evaluator understands.
///
/// Returns the number of formulas updated. Shared-formula members are left
/// alone, since their text is the anchor's and is not shifted to their cell.
pub fn recalculate(workbook: &mut Workbook) -> usize {
    let mut parsed = HashMap::new();
    for (sheet, ws) in workbook.worksheets().enumerate() {
        for (addr, cell) in ws.cells() {
            let CellValue::Formula { text, shared, .. } = &cell.value else {
                continue;
            };
            if shared.as_ref().is_some_and(|s| s.range.is_none()) {
                continue;
            }
            if let Ok(expr) = parse(text) {
                parsed.insert((sheet, addr.row, addr.col), Rc::new(expr));
            }
        }
    }

    let keys: Vec<Key> = parsed.keys().copied().collect();
    let mut calc = Recalc {
        workbook,
        sheet: 0,
        parsed,
        results: HashMap::new(),
        active: HashSet::new(),
    };
    for key in keys {
        calc.value_of(key);
    }
    let results = calc.results;

    let mut updated = 0;
    for ((sheet, row, col), result) in results {
        let Some(value) = result else { continue };
        if let Some(ws) = workbook.worksheet_mut(sheet) {
            if ws.set_cached_value(&CellAddress::new(row, col), value.into_cell()) {
                updated += 1;
            }
        }
    }
    updated
}

struct Recalc<'a> {
    workbook: &'a Workbook,
    /// Sheet that unqualified references point at
    sheet: usize,
    parsed: HashMap<Key, Rc<Expr>>,
    /// `None` for formulas that could not be computed
    results: HashMap<Key, Option<Scalar>>,
    active: HashSet<Key>,
}

impl Recalc<'_> {
    fn value_of(&mut self, key: Key) -> Option<Scalar> {
        if let Some(done) = self.results.get(&key) {
            return done.clone();
        }
        let expr = Rc::clone(self.parsed.get(&key)?);
        // circular reference, or a chain too deep to follow
        if self.active.len() >= MAX_DEPTH || !self.active.insert(key) {
            return None;
        }
        let outer = std::mem::replace(&mut self.sheet, key.0);
        let result = evaluate(&expr, self).ok();
        self.sheet = outer;
        self.active.remove(&key);
        self.results.insert(key, result.clone());
        result
    }

    fn sheet_index(&self, sheet: Option<&str>) -> Option<usize> {
        match sheet {
            None => Some(self.sheet),
            Some(name) => self
                .workbook
                .worksheets()
                .position(|ws| ws.name().eq_ignore_ascii_case(name)),
        }
    }

    fn stored(&mut self, sheet: usize, addr: CellAddress, value: &CellValue) -> Scalar {
        if value.is_formula() {
            if let Some(result) = self.value_of((sheet, addr.row, addr.col)) {
                return result;
            }
        }
        Scalar::from_cell(value)
    }
}

impl CellSource for Recalc<'_> {
    fn cell(&mut self, sheet: Option<&str>, address: CellAddress) -> Scalar {
        let workbook = self.workbook;
        let Some(index) = self.sheet_index(sheet) else {
            return Scalar::Error(eval::REF.into());
        };
        match workbook.worksheet(index).and_then(|ws| ws.cell(&address)) {
            Some(cell) => self.stored(index, address, &cell.value),
            None => Scalar::Empty,
        }
    }

    fn range(&mut self, sheet: Option<&str>, range: &CellRange) -> Result<Vec<Scalar>, Scalar> {
        let workbook = self.workbook;
        let ws = self
            .sheet_index(sheet)
            .and_then(|index| workbook.worksheet(index).map(|ws| (index, ws)));
        let Some((index, ws)) = ws else {
            return Err(Scalar::Error(eval::REF.into()));
        };
        Ok(ws
            .cells_in(range)
            .into_iter()
            .map(|(addr, cell)| self.stored(index, addr, &cell.value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, SharedFormula};
    use pretty_assertions::assert_eq;

    fn addr(a1: &str) -> CellAddress {
        CellAddress::parse(a1).unwrap()
    }

    fn cached(workbook: &Workbook, sheet: usize, a1: &str) -> CellValue {
        workbook
            .worksheet(sheet)
            .unwrap()
            .get(&addr(a1))
            .effective()
            .clone()
    }

    #[test]
    fn test_recalculate_follows_chains_and_sheets() {
        let mut wb = Workbook::new();
        wb.add_worksheet(Some("Rates")).unwrap();
        {
            let ws = wb.worksheet_mut(0).unwrap();
            ws.set(&addr("A1"), 5.0);
            // A3 depends on A2, which is computed later in key order
            ws.set(&addr("A3"), CellValue::formula("=A2+1"));
            ws.set(&addr("A2"), CellValue::formula("=A1*2"));
            ws.set(&addr("B1"), CellValue::formula("=SUM(A1:A3)*Rates!A1"));
            ws.set(&addr("B2"), CellValue::formula("=\"n=\"&A1"));
        }
        wb.worksheet_mut(1).unwrap().set(&addr("A1"), 0.5);

        assert_eq!(recalculate(&mut wb), 4);
        assert_eq!(cached(&wb, 0, "A2"), CellValue::Number(10.0));
        assert_eq!(cached(&wb, 0, "A3"), CellValue::Number(11.0));
        assert_eq!(cached(&wb, 0, "B1"), CellValue::Number(13.0));
        assert_eq!(cached(&wb, 0, "B2"), CellValue::Text("n=5".into()));

        wb.worksheet_mut(0).unwrap().set(&addr("A1"), 1.0);
        recalculate(&mut wb);
        assert_eq!(cached(&wb, 0, "A3"), CellValue::Number(3.0));
    }

    #[test]
    fn test_recalculate_keeps_what_it_cannot_compute() {
        let mut wb = Workbook::new();
        let ws = wb.worksheet_mut(0).unwrap();
        ws.set(
            &addr("A1"),
            CellValue::Formula {
                text: "=VLOOKUP(1,C1:D2,2)".into(),
                cached_value: Box::new(CellValue::Number(42.0)),
                shared: None,
            },
        );
        ws.set(&addr("A2"), CellValue::formula("=A1+1"));
        ws.set(&addr("B1"), CellValue::formula("=B2"));
        ws.set(&addr("B2"), CellValue::formula("=B1"));
        ws.set(&addr("C1"), CellValue::formula("=Missing!A1"));
        ws.set_cell(
            &addr("C2"),
            Cell {
                value: CellValue::Formula {
                    text: "=A2*2".into(),
                    cached_value: Box::new(CellValue::Number(7.0)),
                    shared: Some(SharedFormula { index: 0, range: None }),
                },
                style: 0,
            },
        );

        recalculate(&mut wb);
        assert_eq!(cached(&wb, 0, "A1"), CellValue::Number(42.0));
        assert_eq!(cached(&wb, 0, "A2"), CellValue::Number(43.0));
        // the cycle still resolves: each side reads the other's (empty) cache
        assert_eq!(cached(&wb, 0, "B1"), CellValue::Number(0.0));
        assert_eq!(cached(&wb, 0, "C1"), CellValue::Error("#REF!".into()));
        assert_eq!(cached(&wb, 0, "C2"), CellValue::Number(7.0));
    }
}
