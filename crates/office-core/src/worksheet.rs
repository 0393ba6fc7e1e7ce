//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{Cell, CellAddress, CellValue};
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::range::CellRange;

/// Sheet visibility as stored in the workbook part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    /// Only unhideable programmatically
    VeryHidden,
}

impl SheetVisibility {
    /// Parse the `state` attribute of a `<sheet>` element
    pub fn from_state(state: &str) -> Self {
        match state {
            "hidden" => SheetVisibility::Hidden,
            "veryHidden" => SheetVisibility::VeryHidden,
            _ => SheetVisibility::Visible,
        }
    }

    /// Value for the `state` attribute; `None` for visible sheets
    pub fn as_state(&self) -> Option<&'static str> {
        match self {
            SheetVisibility::Visible => None,
            SheetVisibility::Hidden => Some("hidden"),
            SheetVisibility::VeryHidden => Some("veryHidden"),
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, SheetVisibility::Visible)
    }
}

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    name: String,
    visibility: SheetVisibility,
    /// Cells keyed by 0-based (row, col); row-major iteration order
    cells: BTreeMap<(u32, u16), Cell>,
}

static EMPTY: CellValue = CellValue::Empty;

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn visibility(&self) -> SheetVisibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: SheetVisibility) {
        self.visibility = visibility;
    }

    // === Cell Access ===

    /// Value at an address (`Empty` for cells never written)
    pub fn get(&self, addr: &CellAddress) -> &CellValue {
        self.cells
            .get(&(addr.row, addr.col))
            .map_or(&EMPTY, |c| &c.value)
    }

    /// Value by A1 text
    pub fn get_a1(&self, address: &str) -> Result<&CellValue> {
        Ok(self.get(&CellAddress::parse(address)?))
    }

    /// Full cell (value and style index)
    pub fn cell(&self, addr: &CellAddress) -> Option<&Cell> {
        self.cells.get(&(addr.row, addr.col))
    }

    /// Set a value, keeping the cell's existing style.
    ///
    /// Writing `Empty` to an unstyled cell drops it entirely.
    pub fn set(&mut self, addr: &CellAddress, value: impl Into<CellValue>) {
        let value = value.into();
        let key = (addr.row, addr.col);
        match self.cells.get_mut(&key) {
            Some(cell) => {
                cell.value = value;
                if cell.value.is_empty() && cell.style == 0 {
                    self.cells.remove(&key);
                }
            }
            None if value.is_empty() => {}
            None => {
                self.cells.insert(key, Cell { value, style: 0 });
            }
        }
    }

    /// Insert a cell with its style index, as the package reader does
    pub fn set_cell(&mut self, addr: &CellAddress, cell: Cell) {
        self.cells.insert((addr.row, addr.col), cell);
    }

    /// Replace a formula's cached result; `false` if the cell holds no formula
    pub fn set_cached_value(&mut self, addr: &CellAddress, value: CellValue) -> bool {
        match self.cells.get_mut(&(addr.row, addr.col)) {
            Some(Cell {
                value: CellValue::Formula { cached_value, .. },
                ..
            }) => {
                **cached_value = value;
                true
            }
            _ => false,
        }
    }

    /// Clear the values in a range (styles stay)
    pub fn clear(&mut self, range: &CellRange) {
        for addr in range.cells() {
            self.set(&addr, CellValue::Empty);
        }
    }

    /// All stored cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells
            .iter()
            .map(|(&(row, col), cell)| (CellAddress::new(row, col), cell))
    }

    /// Bounding box of cells holding a value
    pub fn used_range(&self) -> Option<CellRange> {
        let mut bounds: Option<(u32, u16, u32, u16)> = None;
        for (&(row, col), cell) in &self.cells {
            if cell.value.is_empty() {
                continue;
            }
            bounds = Some(match bounds {
                None => (row, col, row, col),
                Some((r0, c0, r1, c1)) => (r0.min(row), c0.min(col), r1.max(row), c1.max(col)),
            });
        }
        bounds.map(|(r0, c0, r1, c1)| CellRange::from_indices(r0, c0, r1, c1))
    }

    /// Stored cells inside a range, row-major, without visiting blank positions
    pub fn cells_in(&self, range: &CellRange) -> Vec<(CellAddress, &Cell)> {
        if range.rows() > self.cells.len() {
            return self
                .cells()
                .filter(|(addr, _)| range.contains(addr))
                .collect();
        }
        (range.start.row..=range.end.row)
            .flat_map(|row| {
                self.cells
                    .range((row, range.start.col)..=(row, range.end.col))
                    .map(|(&(row, col), cell)| (CellAddress::new(row, col), cell))
            })
            .collect()
    }

    /// Bulk read of a range, refused past [`crate::MAX_READ_CELLS`]
    pub fn grid(&self, range: &CellRange) -> Result<Grid> {
        range.check_read_size()?;
        let cells = self
            .cells_in(range)
            .into_iter()
            .map(|(addr, cell)| (addr, cell.value.clone()));
        Ok(Grid::from_cells(range, cells))
    }

    /// Bulk read of the used range, holding only the cells with values
    pub fn used_grid(&self) -> Grid {
        match self.used_range() {
            Some(range) => Grid::from_cells(
                &range,
                self.cells
                    .iter()
                    .map(|(&(row, col), cell)| (CellAddress::new(row, col), cell.value.clone())),
            ),
            None => Grid::empty(),
        }
    }

    /// Write rows of values starting at `start`, returning the range covered.
    ///
    /// Rows may differ in length; the range spans the widest row.
    pub fn write_block(&mut self, start: &CellAddress, rows: &[Vec<CellValue>]) -> Result<CellRange> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || rows.iter().any(Vec::is_empty) {
            return Err(Error::InvalidBlock(
                "values must be a non-empty list of non-empty rows".into(),
            ));
        }
        let range = CellRange::from_start_and_size(*start, rows.len(), width)?;
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let addr = CellAddress::new(start.row + r as u32, start.col + c as u16);
                self.set(&addr, value.clone());
            }
        }
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_set_get_and_used_range() {
        let mut ws = Worksheet::new("Data");
        assert!(ws.used_range().is_none());
        ws.set(&addr("B2"), "Revenue");
        ws.set(&addr("D5"), 10.0);
        assert_eq!(ws.get(&addr("B2")).as_text(), Some("Revenue"));
        assert!(ws.get(&addr("Z99")).is_empty());
        assert_eq!(ws.used_range().unwrap().to_a1(), "B2:D5");

        ws.set(&addr("D5"), CellValue::Empty);
        assert_eq!(ws.used_range().unwrap().to_a1(), "B2");
    }

    #[test]
    fn test_set_keeps_style() {
        let mut ws = Worksheet::new("S");
        ws.set_cell(&addr("A1"), Cell { value: 1.0.into(), style: 3 });
        ws.set(&addr("A1"), CellValue::Empty);
        assert_eq!(ws.cell(&addr("A1")).unwrap().style, 3);
        assert!(ws.used_range().is_none());
    }

    #[test]
    fn test_write_block_and_grid() {
        let mut ws = Worksheet::new("S");
        let range = ws
            .write_block(
                &addr("B2"),
                &[vec!["a".into(), "b".into()], vec![1.0.into()]],
            )
            .unwrap();
        assert_eq!(range.to_a1(), "B2:C3");
        let grid = ws.grid(&range).unwrap();
        assert_eq!(grid.rows()[1], vec![CellValue::Number(1.0), CellValue::Empty]);
        assert!(ws.write_block(&addr("A1"), &[]).is_err());
        assert!(ws.write_block(&addr("A1"), &[vec![]]).is_err());
    }

    #[test]
    fn test_bulk_reads_stay_sparse() {
        let mut ws = Worksheet::new("S");
        ws.set(&addr("A1"), 1.0);
        ws.set(&addr("XFD1048576"), "stray");

        let whole = CellRange::parse("A1:XFD1048576").unwrap();
        assert!(matches!(ws.grid(&whole), Err(Error::InvalidRange(_))));

        let used = ws.used_grid();
        assert_eq!(used.range().unwrap().to_a1(), "A1:XFD1048576");
        assert_eq!(used.iter().count(), 2);

        let grid = ws.grid(&CellRange::parse("A1:B2").unwrap()).unwrap();
        assert_eq!(grid.iter().count(), 1);
    }

    #[test]
    fn test_cells_in_and_cached_value() {
        let mut ws = Worksheet::new("S");
        ws.set(&addr("B2"), 1.0);
        ws.set(&addr("C9"), CellValue::formula("=B2"));
        ws.set(&addr("Z1"), "outside");

        let column = CellRange::parse("A1:C1048576").unwrap();
        let found: Vec<String> = ws.cells_in(&column).iter().map(|(a, _)| a.to_a1()).collect();
        assert_eq!(found, vec!["B2", "C9"]);
        let row = CellRange::parse("A2:Z2").unwrap();
        assert_eq!(ws.cells_in(&row).len(), 1);

        assert!(ws.set_cached_value(&addr("C9"), CellValue::Number(1.0)));
        assert_eq!(ws.get(&addr("C9")).as_number(), Some(1.0));
        assert!(!ws.set_cached_value(&addr("B2"), CellValue::Number(3.0)));
    }

    #[test]
    fn test_clear() {
        let mut ws = Worksheet::new("S");
        ws.write_block(&addr("A1"), &[vec![1.0.into(), 2.0.into()]])
            .unwrap();
        ws.clear(&CellRange::parse("A1:B1").unwrap());
        assert!(ws.used_range().is_none());
    }
}
