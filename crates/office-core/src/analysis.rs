//! Heuristic analyzers over bulk-fetched sheet data.
//!
//! Everything here runs on a [`Grid`] already read from a sheet, so the live and
//! document backends share one implementation. Addresses in the output are
//! absolute (`$B$3`) and row/column numbers are 1-based, matching what the
//! spreadsheet application itself reports.

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;
use serde_json::Value;

use crate::cell::{CellAddress, CellValue};
use crate::grid::Grid;
use crate::range::CellRange;

/// Rows scanned below a candidate column header
const HEADER_SCAN_ROWS: u32 = 19;

/// One contiguous block of used cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsedRange {
    pub range: String,
    pub rows: usize,
    pub cols: usize,
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u32,
    pub last_col: u32,
}

impl UsedRange {
    pub fn from_range(range: &CellRange) -> Self {
        Self {
            range: range.to_absolute(),
            rows: range.rows(),
            cols: range.cols(),
            first_row: range.start.row_number(),
            last_row: range.end.row_number(),
            first_col: range.start.col_number(),
            last_col: range.end.col_number(),
        }
    }
}

/// A text cell with its location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringCell {
    pub value: String,
    pub address: String,
    pub sheet: String,
    pub row: u32,
    pub col: u32,
}

/// Coarse classification of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Formula,
    Empty,
    Text,
    Number,
    Other,
}

impl CellKind {
    pub fn of(value: &CellValue) -> Self {
        match value {
            CellValue::Formula { .. } => CellKind::Formula,
            v if is_blank(v) => CellKind::Empty,
            CellValue::Text(_) => CellKind::Text,
            CellValue::Number(_) => CellKind::Number,
            _ => CellKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizontalPair {
    pub label: String,
    pub label_address: String,
    pub value: Value,
    pub value_address: String,
    pub row: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerticalPair {
    pub label: String,
    pub label_address: String,
    pub value: Value,
    pub value_address: String,
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableHeader {
    pub header: String,
    pub header_address: String,
    pub data_count: usize,
    pub data_range: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSummary {
    pub total_string_cells: usize,
    pub used_ranges: usize,
}

/// Label/value structure found on a sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelValuePatterns {
    pub horizontal_pairs: Vec<HorizontalPair>,
    pub vertical_lists: Vec<VerticalPair>,
    pub table_headers: Vec<TableHeader>,
    pub summary: PatternSummary,
}

fn is_blank(value: &CellValue) -> bool {
    match value {
        CellValue::Empty => true,
        CellValue::Text(s) => s.is_empty(),
        _ => false,
    }
}

fn nonzero_number(value: &CellValue) -> Option<f64> {
    value.as_number().filter(|n| *n != 0.0)
}

/// Split the used cells of a grid into 8-connected blocks, ordered top-to-bottom
/// then left-to-right.
///
/// Only stored cells are visited, so the cost follows the number of values
/// rather than the area they span.
pub fn used_ranges(grid: &Grid) -> Vec<UsedRange> {
    let mut pending: BTreeSet<(u32, u16)> = grid
        .iter()
        .filter(|(_, value)| !is_blank(value))
        .map(|(addr, _)| (addr.row, addr.col))
        .collect();
    let mut blocks: Vec<(u32, u16, u32, u16)> = Vec::new();

    while let Some(first) = pending.pop_first() {
        let mut bounds = (first.0, first.1, first.0, first.1);
        let mut queue = VecDeque::from([first]);
        while let Some((row, col)) = queue.pop_front() {
            bounds = (
                bounds.0.min(row),
                bounds.1.min(col),
                bounds.2.max(row),
                bounds.3.max(col),
            );
            for ny in row.saturating_sub(1)..=row.saturating_add(1) {
                for nx in col.saturating_sub(1)..=col.saturating_add(1) {
                    if pending.remove(&(ny, nx)) {
                        queue.push_back((ny, nx));
                    }
                }
            }
        }
        blocks.push(bounds);
    }

    blocks.sort_by_key(|&(r0, c0, _, _)| (r0, c0));
    blocks
        .into_iter()
        .map(|(r0, c0, r1, c1)| UsedRange::from_range(&CellRange::from_indices(r0, c0, r1, c1)))
        .collect()
}

/// Every non-blank text cell, trimmed, in row-major order
pub fn string_cells(sheet: &str, grid: &Grid) -> Vec<StringCell> {
    grid.iter()
        .filter_map(|(addr, value)| {
            let text = value.as_text()?.trim();
            if text.is_empty() {
                return None;
            }
            Some(StringCell {
                value: text.to_string(),
                address: addr.to_absolute(),
                sheet: sheet.to_string(),
                row: addr.row_number(),
                col: addr.col_number(),
            })
        })
        .collect()
}

/// Classify every cell of a grid
pub fn cell_kinds(grid: &Grid) -> Vec<Vec<CellKind>> {
    grid.rows()
        .iter()
        .map(|row| row.iter().map(CellKind::of).collect())
        .collect()
}

/// Find labels sitting next to (or above) numbers.
///
/// `grid` should be the sheet's used-range grid; neighbours outside it read as
/// empty.
pub fn label_value_patterns(sheet: &str, grid: &Grid) -> LabelValuePatterns {
    let labels = string_cells(sheet, grid);
    let last_row = grid.range().map_or(0, |r| r.end.row);

    let mut horizontal_pairs = Vec::new();
    let mut table_headers = Vec::new();
    let mut vertical_lists = Vec::new();

    for label in &labels {
        let at = CellAddress::new(label.row - 1, (label.col - 1) as u16);

        if let Some(right) = at.offset(0, 1) {
            let value = grid.value_at(&right);
            if nonzero_number(value).is_some() {
                horizontal_pairs.push(HorizontalPair {
                    label: label.value.clone(),
                    label_address: label.address.clone(),
                    value: value.to_json(),
                    value_address: right.to_absolute(),
                    row: label.row,
                });
            }
        }

        let scan_end = (at.row + HEADER_SCAN_ROWS).min(last_row);
        let numbers_below: Vec<CellAddress> = (at.row + 1..=scan_end)
            .map(|row| CellAddress::new(row, at.col))
            .filter(|addr| nonzero_number(grid.value_at(addr)).is_some())
            .collect();
        if numbers_below.len() >= 2 {
            let last = numbers_below[numbers_below.len() - 1];
            table_headers.push(TableHeader {
                header: label.value.clone(),
                header_address: label.address.clone(),
                data_count: numbers_below.len(),
                data_range: format!("{}:{}", label.address, last.to_absolute()),
            });
            continue;
        }

        if let Some(below) = at.offset(1, 0) {
            let value = grid.value_at(&below);
            if nonzero_number(value).is_some() {
                vertical_lists.push(VerticalPair {
                    label: label.value.clone(),
                    label_address: label.address.clone(),
                    value: value.to_json(),
                    value_address: below.to_absolute(),
                    col: label.col,
                });
            }
        }
    }

    LabelValuePatterns {
        summary: PatternSummary {
            total_string_cells: labels.len(),
            used_ranges: used_ranges(grid).len(),
        },
        horizontal_pairs,
        vertical_lists,
        table_headers,
    }
}
