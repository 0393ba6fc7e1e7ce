//! Rectangular cell ranges

use std::fmt;

use crate::cell::CellAddress;
use crate::error::{Error, Result};
use crate::MAX_READ_CELLS;

/// An inclusive rectangle of cells, always stored top-left to bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Range from two corners in any order
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        let start = CellAddress::new(a.row.min(b.row), a.col.min(b.col));
        let end = CellAddress::new(a.row.max(b.row), a.col.max(b.col));
        Self { start, end }
    }

    /// Range covering one cell
    pub fn single(addr: CellAddress) -> Self {
        Self::new(addr, addr)
    }

    /// Range from 0-based inclusive bounds
    pub fn from_indices(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self::new(
            CellAddress::new(first_row, first_col),
            CellAddress::new(last_row, last_col),
        )
    }

    /// Range of `rows` x `cols` cells anchored at `start`
    pub fn from_start_and_size(start: CellAddress, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidRange(format!(
                "cannot size a range to {rows}x{cols}"
            )));
        }
        let end = start
            .offset(rows as i64 - 1, cols as i64 - 1)
            .ok_or_else(|| {
                Error::InvalidRange(format!(
                    "{rows}x{cols} block starting at {} runs off the sheet",
                    start.to_a1()
                ))
            })?;
        Ok(Self::new(start, end))
    }

    /// Parse `A1:C5`, `$A$1:$C$5` or a single cell `B2`
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        if text.is_empty() {
            return Err(Error::InvalidRange("empty range".into()));
        }
        let mut parts = text.split(':');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(Error::InvalidRange(format!("too many ':' in '{text}'")));
        }
        let a = CellAddress::parse(first)
            .map_err(|e| Error::InvalidRange(format!("'{text}': {e}")))?;
        let b = match second {
            Some(part) => CellAddress::parse(part)
                .map_err(|e| Error::InvalidRange(format!("'{text}': {e}")))?,
            None => a,
        };
        Ok(Self::new(a, b))
    }

    pub fn rows(&self) -> usize {
        (self.end.row - self.start.row) as usize + 1
    }

    pub fn cols(&self) -> usize {
        (self.end.col - self.start.col) as usize + 1
    }

    pub fn cell_count(&self) -> u64 {
        self.rows() as u64 * self.cols() as u64
    }

    /// Fail with `InvalidRange` when the range is too large to read in bulk
    pub fn check_read_size(&self) -> Result<()> {
        let count = self.cell_count();
        if count > MAX_READ_CELLS {
            return Err(Error::InvalidRange(format!(
                "'{}' spans {count} cells; bulk reads are limited to {MAX_READ_CELLS} cells",
                self.to_a1()
            )));
        }
        Ok(())
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.col..=self.end.col).map(move |col| CellAddress::new(row, col))
        })
    }

    /// Relative text (`A1:C5`, or `A1` for one cell)
    pub fn to_a1(&self) -> String {
        if self.is_single_cell() {
            self.start.to_a1()
        } else {
            format!("{}:{}", self.start.to_a1(), self.end.to_a1())
        }
    }

    /// Absolute text (`$A$1:$C$5`, or `$A$1` for one cell)
    pub fn to_absolute(&self) -> String {
        if self.is_single_cell() {
            self.start.to_absolute()
        } else {
            format!("{}:{}", self.start.to_absolute(), self.end.to_absolute())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}
