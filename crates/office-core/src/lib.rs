//! # office-core
//!
//! Shared data structures for the office-mcp servers.
//!
//! - [`CellAddress`], [`CellRange`] and [`CellValue`] - spreadsheet addressing and values
//! - [`Workbook`], [`Worksheet`] - the in-memory spreadsheet used by the document backend
//! - [`Grid`] and [`analysis`] - bulk-read blocks and the label/value heuristics over them
//! - [`shape`] - the slide shape snapshot, name catalogues and shape searches
//!
//! ## Example
//!
//! ```rust
//! use office_core::{analysis, CellAddress, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set(&CellAddress::parse("A1").unwrap(), "Revenue");
//! sheet.set(&CellAddress::parse("B1").unwrap(), 1250.0);
//!
//! let patterns = analysis::label_value_patterns(sheet.name(), &sheet.used_grid());
//! assert_eq!(patterns.horizontal_pairs[0].label, "Revenue");
//! ```

pub mod analysis;
pub mod cell;
pub mod color;
pub mod error;
pub mod formula;
pub mod grid;
pub mod identifier;
pub mod range;
pub mod shape;
pub mod workbook;
pub mod worksheet;

pub use cell::{Cell, CellAddress, CellValue, SharedFormula};
pub use color::Rgb;
pub use error::{Error, Result};
pub use grid::Grid;
pub use identifier::Identifier;
pub use range::CellRange;
pub use shape::ShapeInfo;
pub use workbook::Workbook;
pub use worksheet::{SheetVisibility, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Largest range a single bulk read may cover
pub const MAX_READ_CELLS: u64 = 1_000_000;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
