//! Bulk-fetched blocks of cell values

use std::collections::BTreeMap;

use serde_json::Value;

use crate::cell::{CellAddress, CellValue};
use crate::range::CellRange;

static EMPTY: CellValue = CellValue::Empty;

/// A rectangular block of values anchored at `origin`.
///
/// This is what a bulk read returns, whichever backend produced it; the
/// analyzers in [`crate::analysis`] work on grids only. Only non-empty cells
/// are stored, so a sheet with a stray value far from its data costs no more
/// than its cell count.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    origin: CellAddress,
    height: usize,
    width: usize,
    /// Keyed by sheet (row, col)
    cells: BTreeMap<(u32, u16), CellValue>,
}

impl Grid {
    /// Build a grid from dense rows; short rows read as `Empty`
    pub fn new(origin: CellAddress, rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let height = if width == 0 { 0 } else { rows.len() };
        let mut cells = BTreeMap::new();
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                if !value.is_empty() {
                    cells.insert((origin.row + r as u32, origin.col + c as u16), value);
                }
            }
        }
        Self {
            origin,
            height,
            width,
            cells,
        }
    }

    /// Build a grid covering `range` from the cells that hold values.
    ///
    /// Cells outside the range are ignored.
    pub fn from_cells(
        range: &CellRange,
        cells: impl IntoIterator<Item = (CellAddress, CellValue)>,
    ) -> Self {
        let cells = cells
            .into_iter()
            .filter(|(addr, value)| range.contains(addr) && !value.is_empty())
            .map(|(addr, value)| ((addr.row, addr.col), value))
            .collect();
        Self {
            origin: range.start,
            height: range.rows(),
            width: range.cols(),
            cells,
        }
    }

    /// A grid with no cells (an unused sheet)
    pub fn empty() -> Self {
        Self::new(CellAddress::new(0, 0), Vec::new())
    }

    pub fn origin(&self) -> CellAddress {
        self.origin
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// The sheet range this grid covers
    pub fn range(&self) -> Option<CellRange> {
        if self.is_empty() {
            return None;
        }
        CellRange::from_start_and_size(self.origin, self.height, self.width).ok()
    }

    /// Value at a sheet address; addresses outside the grid read as empty
    pub fn value_at(&self, addr: &CellAddress) -> &CellValue {
        self.cells.get(&(addr.row, addr.col)).unwrap_or(&EMPTY)
    }

    /// Cells holding a value with their sheet address, row-major
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &CellValue)> + '_ {
        self.cells
            .iter()
            .map(|(&(row, col), value)| (CellAddress::new(row, col), value))
    }

    /// The whole block as rows, gaps filled with `Empty`.
    ///
    /// Callers bound the size first (see [`CellRange::check_read_size`]).
    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        let mut rows = vec![vec![CellValue::Empty; self.width]; self.height];
        for (&(row, col), value) in &self.cells {
            let r = (row - self.origin.row) as usize;
            let c = (col - self.origin.col) as usize;
            rows[r][c] = value.clone();
        }
        rows
    }

    /// Combine a value grid with the same range's formula grid.
    ///
    /// Applications report values and formulas as two separate arrays; cells
    /// whose formula text starts with `=` become [`CellValue::Formula`] with the
    /// value as their cached result.
    pub fn with_formulas(mut self, formulas: &Grid) -> Grid {
        for (&key, formula) in &formulas.cells {
            let Some(text) = formula.as_text().filter(|t| t.starts_with('=')) else {
                continue;
            };
            let value = self.cells.remove(&key).unwrap_or(CellValue::Empty);
            self.cells.insert(
                key,
                CellValue::Formula {
                    text: text.to_string(),
                    cached_value: Box::new(value),
                    shared: None,
                },
            );
        }
        self
    }

    /// JSON rows of effective values
    pub fn to_json(&self) -> Vec<Vec<Value>> {
        self.rows()
            .iter()
            .map(|row| row.iter().map(CellValue::to_json).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_are_padded() {
        let g = Grid::new(
            CellAddress::parse("B2").unwrap(),
            vec![vec![1.0.into()], vec![2.0.into(), 3.0.into()]],
        );
        assert_eq!((g.height(), g.width()), (2, 2));
        assert_eq!(g.range().unwrap().to_a1(), "B2:C3");
        assert!(g.value_at(&CellAddress::parse("C2").unwrap()).is_empty());
        assert_eq!(
            g.value_at(&CellAddress::parse("C3").unwrap()),
            &CellValue::Number(3.0)
        );
        assert!(g.value_at(&CellAddress::parse("A1").unwrap()).is_empty());
    }

    #[test]
    fn test_with_formulas() {
        let origin = CellAddress::new(0, 0);
        let values = Grid::new(origin, vec![vec![2.0.into(), "x".into()]]);
        let formulas = Grid::new(origin, vec![vec!["=1+1".into(), "x".into()]]);
        let merged = values.with_formulas(&formulas);
        assert_eq!(merged.rows()[0][0].formula_text(), Some("=1+1"));
        assert_eq!(merged.rows()[0][0].as_number(), Some(2.0));
        assert_eq!(merged.rows()[0][1], CellValue::Text("x".into()));
    }

    #[test]
    fn test_empty_grid_has_no_range() {
        assert!(Grid::empty().range().is_none());
        assert!(Grid::new(CellAddress::new(0, 0), vec![vec![]]).is_empty());
    }

    #[test]
    fn test_from_cells_stores_only_values() {
        let range = CellRange::parse("A1:XFD1048576").unwrap();
        let grid = Grid::from_cells(
            &range,
            vec![
                (CellAddress::parse("A1").unwrap(), CellValue::Number(1.0)),
                (CellAddress::parse("XFD1048576").unwrap(), "far".into()),
                (CellAddress::parse("B1").unwrap(), CellValue::Empty),
            ],
        );
        assert_eq!(grid.width(), 16_384);
        assert_eq!(grid.height(), 1_048_576);
        assert_eq!(grid.iter().count(), 2);
        assert_eq!(
            grid.value_at(&CellAddress::parse("XFD1048576").unwrap()).as_text(),
            Some("far")
        );
    }
}
