//! Cell addressing and values

mod address;
mod value;

pub use address::CellAddress;
pub use value::{excel_serial, CellValue, SharedFormula};

/// A stored cell: its value plus the package style index it was read with
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub style: u32,
}
