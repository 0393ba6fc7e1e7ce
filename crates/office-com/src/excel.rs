//! Excel commands on the bridge.
//!
//! Workbooks and worksheets are addressed by their 1-based position in the
//! application's collections.

use office_com_protocol::{Command, ResponseData, SheetRef, WireSheet, WireWorkbook};
use office_core::{CellAddress, CellRange, CellValue, Grid};

use crate::bridge::{BridgeError, BridgeResult, ComBridge};
use crate::convert;

impl ComBridge {
    pub fn list_workbooks(&self) -> BridgeResult<Vec<WireWorkbook>> {
        match self.call_for(Command::ListWorkbooks)? {
            ResponseData::Workbooks { workbooks } => Ok(workbooks),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Open a workbook; `path` is already in the form the application expects.
    pub fn open_workbook(&self, path: &str) -> BridgeResult<WireWorkbook> {
        let data = self.call_for(Command::OpenWorkbook {
            path: path.to_string(),
        })?;
        match data {
            ResponseData::Workbook { workbook } => Ok(workbook),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    pub fn save_workbook(&self, workbook: u32, path: Option<&str>) -> BridgeResult<()> {
        self.call(Command::SaveWorkbook {
            workbook,
            path: path.map(str::to_string),
        })?;
        Ok(())
    }

    pub fn list_worksheets(&self, workbook: u32) -> BridgeResult<Vec<WireSheet>> {
        match self.call_for(Command::ListWorksheets { workbook })? {
            ResponseData::Worksheets { worksheets } => Ok(worksheets),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    pub fn add_worksheet(&self, workbook: u32, name: Option<&str>) -> BridgeResult<WireSheet> {
        let data = self.call_for(Command::AddWorksheet {
            workbook,
            name: name.map(str::to_string),
        })?;
        match data {
            ResponseData::Worksheet { worksheet } => Ok(worksheet),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    pub fn get_cell_value(
        &self,
        workbook: u32,
        sheet: SheetRef,
        cell: &CellAddress,
    ) -> BridgeResult<CellValue> {
        let data = self.call_for(Command::GetCellValue {
            workbook,
            sheet,
            cell: cell.to_a1(),
        })?;
        match data {
            ResponseData::Value { value } => Ok(convert::cell_value(&value)),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    pub fn set_cell_value(
        &self,
        workbook: u32,
        sheet: SheetRef,
        cell: &CellAddress,
        value: &CellValue,
    ) -> BridgeResult<()> {
        self.call(Command::SetCellValue {
            workbook,
            sheet,
            cell: cell.to_a1(),
            value: convert::wire_value(value),
        })?;
        Ok(())
    }

    /// Values of a range as a grid anchored at its top-left cell
    pub fn range_grid(&self, workbook: u32, sheet: SheetRef, range: &CellRange) -> BridgeResult<Grid> {
        let data = self.call_for(Command::GetRangeValues {
            workbook,
            sheet,
            range: range.to_a1(),
        })?;
        match data {
            ResponseData::Values { values } => Ok(Grid::new(range.start, convert::cell_rows(&values))),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Values of a range with formula cells marked as formulas
    pub fn range_grid_with_formulas(
        &self,
        workbook: u32,
        sheet: SheetRef,
        range: &CellRange,
    ) -> BridgeResult<Grid> {
        let values = self.range_grid(workbook, sheet.clone(), range)?;
        let data = self.call_for(Command::GetRangeFormulas {
            workbook,
            sheet,
            range: range.to_a1(),
        })?;
        match data {
            ResponseData::Formulas { formulas } => {
                let formulas = Grid::new(range.start, convert::formula_rows(&formulas));
                Ok(values.with_formulas(&formulas))
            }
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    pub fn set_range_values(
        &self,
        workbook: u32,
        sheet: SheetRef,
        start: &CellAddress,
        rows: &[Vec<CellValue>],
    ) -> BridgeResult<()> {
        let values = rows
            .iter()
            .map(|row| row.iter().map(convert::wire_value).collect())
            .collect();
        self.call(Command::SetRangeValues {
            workbook,
            sheet,
            start_cell: start.to_a1(),
            values,
        })?;
        Ok(())
    }

    /// The sheet's used range as a grid; an untouched sheet gives an empty grid
    pub fn used_grid(&self, workbook: u32, sheet: SheetRef) -> BridgeResult<Grid> {
        let data = self.call_for(Command::GetUsedRange { workbook, sheet })?;
        let ResponseData::UsedRange { used_range } = data else {
            return Err(BridgeError::UnexpectedResponse);
        };
        let range = CellRange::parse(&used_range.address).map_err(|e| {
            BridgeError::Command(format!("Unexpected used range '{}': {e}", used_range.address))
        })?;
        Ok(Grid::new(range.start, convert::cell_rows(&used_range.values)))
    }
}
