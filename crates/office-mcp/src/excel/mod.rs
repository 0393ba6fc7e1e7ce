//! Excel tools, served by either backend.
//!
//! The backends only resolve identifiers and move values in and out of the
//! workbook; payload shapes, validation and the sheet analyzers live here so
//! both strategies answer the same way.

mod document;
mod live;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use office_core::analysis::{self, CellKind};
use office_core::{CellAddress, CellRange, CellValue, Grid, Identifier};

use crate::error::{ToolError, ToolResult};
use crate::tools::{self, arguments, payload, Schema, ToolDefinition, ToolSet};

pub use document::DocumentExcel;
pub use live::LiveExcel;

/// Message for a save without a target on a workbook that has no file yet
pub const SAVE_PATH_REQUIRED: &str =
    "save_path is required for a new workbook that hasn't been saved before.";

/// A workbook as `list_open_workbooks` reports it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbookSummary {
    pub name: String,
    pub path: String,
    pub sheets_count: usize,
    pub saved: bool,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbookRef {
    pub name: String,
    pub path: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub index: usize,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSheet {
    pub name: String,
    pub index: usize,
}

/// A sheet's used cells and the sheet's name
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    pub sheet: String,
    pub grid: Grid,
}

pub fn workbook_not_found(id: &Identifier) -> ToolError {
    ToolError::not_found(format!("Workbook '{id}' not found."))
}

pub fn worksheet_not_found(id: &Identifier) -> ToolError {
    ToolError::not_found(format!("Worksheet '{id}' not found."))
}

/// Workbook access for one strategy
pub trait ExcelBackend: Send {
    fn list_workbooks(&mut self) -> ToolResult<Vec<WorkbookSummary>>;
    fn open_workbook(&mut self, path: &str) -> ToolResult<WorkbookRef>;
    fn save_workbook(&mut self, workbook: &Identifier, save_path: Option<&str>) -> ToolResult<()>;
    fn list_worksheets(&mut self, workbook: &Identifier) -> ToolResult<Vec<SheetSummary>>;
    /// Append a sheet; a rejected name keeps the generated one
    fn add_worksheet(&mut self, workbook: &Identifier, name: Option<&str>) -> ToolResult<NewSheet>;
    fn get_cell_value(
        &mut self,
        workbook: &Identifier,
        sheet: &Identifier,
        cell: &CellAddress,
    ) -> ToolResult<CellValue>;
    fn set_cell_value(
        &mut self,
        workbook: &Identifier,
        sheet: &Identifier,
        cell: &CellAddress,
        value: CellValue,
    ) -> ToolResult<()>;
    /// Values of a range; with `formulas`, formula cells come back as formulas
    fn range_grid(
        &mut self,
        workbook: &Identifier,
        sheet: &Identifier,
        range: &CellRange,
        formulas: bool,
    ) -> ToolResult<Grid>;
    fn set_range_values(
        &mut self,
        workbook: &Identifier,
        sheet: &Identifier,
        start: &CellAddress,
        rows: &[Vec<CellValue>],
    ) -> ToolResult<()>;
    fn used_grid(&mut self, workbook: &Identifier, sheet: &Identifier) -> ToolResult<SheetGrid>;
}

#[derive(Debug, Deserialize)]
struct OpenArgs {
    path: String,
}

#[derive(Debug, Deserialize)]
struct WorkbookArgs {
    identifier: Identifier,
}

#[derive(Debug, Deserialize)]
struct SaveArgs {
    identifier: Identifier,
    #[serde(default)]
    save_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddSheetArgs {
    identifier: Identifier,
    #[serde(default)]
    sheet_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SheetArgs {
    identifier: Identifier,
    sheet_identifier: Identifier,
}

#[derive(Debug, Deserialize)]
struct CellArgs {
    identifier: Identifier,
    sheet_identifier: Identifier,
    cell_address: String,
}

#[derive(Debug, Deserialize)]
struct SetCellArgs {
    identifier: Identifier,
    sheet_identifier: Identifier,
    cell_address: String,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct RangeArgs {
    identifier: Identifier,
    sheet_identifier: Identifier,
    range_address: String,
}

#[derive(Debug, Deserialize)]
struct SetRangeArgs {
    identifier: Identifier,
    sheet_identifier: Identifier,
    start_cell: String,
    values: Value,
}

/// Rows of a `values` argument; must be a non-empty list of non-empty lists
fn value_rows(values: &Value) -> ToolResult<Vec<Vec<CellValue>>> {
    const SHAPE: &str = "Input 'values' must be a non-empty list of lists.";
    let rows = values.as_array().filter(|r| !r.is_empty()).ok_or_else(|| ToolError::invalid(SHAPE))?;
    rows.iter()
        .map(|row| {
            let cells = row
                .as_array()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| ToolError::invalid(SHAPE))?;
            Ok(cells.iter().map(CellValue::from_json).collect())
        })
        .collect()
}

/// The Excel tool family over one backend
pub struct ExcelTools<B> {
    backend: B,
}

impl<B: ExcelBackend> ExcelTools<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn list_open_workbooks(&mut self) -> ToolResult<Value> {
        Ok(json!({ "workbooks": payload(self.backend.list_workbooks()?)? }))
    }

    fn open_workbook(&mut self, args: OpenArgs) -> ToolResult<Value> {
        let workbook = self.backend.open_workbook(&args.path)?;
        Ok(json!({
            "message": format!("Workbook '{}' opened successfully.", workbook.name),
            "workbook": payload(workbook)?,
        }))
    }

    fn save_workbook(&mut self, args: SaveArgs) -> ToolResult<Value> {
        self.backend
            .save_workbook(&args.identifier, args.save_path.as_deref())?;
        Ok(json!({
            "message": format!(
                "Save command issued for workbook '{}' successfully.",
                args.identifier
            )
        }))
    }

    fn list_worksheets(&mut self, args: WorkbookArgs) -> ToolResult<Value> {
        Ok(json!({ "worksheets": payload(self.backend.list_worksheets(&args.identifier)?)? }))
    }

    fn add_worksheet(&mut self, args: AddSheetArgs) -> ToolResult<Value> {
        let sheet = self
            .backend
            .add_worksheet(&args.identifier, args.sheet_name.as_deref())?;
        Ok(json!({
            "message": "Worksheet added successfully.",
            "sheet_info": payload(sheet)?,
        }))
    }

    fn get_cell_value(&mut self, args: CellArgs) -> ToolResult<Value> {
        let cell = CellAddress::parse(&args.cell_address)?;
        let value = self
            .backend
            .get_cell_value(&args.identifier, &args.sheet_identifier, &cell)?;
        Ok(json!({ "value": value.to_json() }))
    }

    fn set_cell_value(&mut self, args: SetCellArgs) -> ToolResult<Value> {
        let cell = CellAddress::parse(&args.cell_address)?;
        self.backend.set_cell_value(
            &args.identifier,
            &args.sheet_identifier,
            &cell,
            CellValue::from_json(&args.value),
        )?;
        Ok(json!({
            "message": format!("Successfully set cell '{}' to {}.", args.cell_address, args.value)
        }))
    }

    fn range(&mut self, args: &RangeArgs, formulas: bool) -> ToolResult<Grid> {
        let range = CellRange::parse(&args.range_address)?;
        range.check_read_size()?;
        self.backend
            .range_grid(&args.identifier, &args.sheet_identifier, &range, formulas)
    }

    fn get_range_values(&mut self, args: RangeArgs) -> ToolResult<Value> {
        let grid = self.range(&args, false)?;
        Ok(json!({ "values": grid.to_json() }))
    }

    fn set_range_values(&mut self, args: SetRangeArgs) -> ToolResult<Value> {
        let rows = value_rows(&args.values)?;
        let start = CellAddress::parse(&args.start_cell)?;
        self.backend
            .set_range_values(&args.identifier, &args.sheet_identifier, &start, &rows)?;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Ok(json!({
            "message": format!(
                "Successfully set {}x{} range starting at '{}'.",
                rows.len(),
                width,
                args.start_cell
            )
        }))
    }

    fn used(&mut self, args: &SheetArgs) -> ToolResult<SheetGrid> {
        self.backend
            .used_grid(&args.identifier, &args.sheet_identifier)
    }

    fn find_used_ranges(&mut self, args: SheetArgs) -> ToolResult<Value> {
        let used = self.used(&args)?;
        Ok(json!({ "used_ranges": payload(analysis::used_ranges(&used.grid))? }))
    }

    fn extract_string_cells(&mut self, args: SheetArgs) -> ToolResult<Value> {
        let used = self.used(&args)?;
        let cells = analysis::string_cells(&used.sheet, &used.grid);
        Ok(json!({ "string_cells": payload(cells)? }))
    }

    fn get_cell_types_in_range(&mut self, args: RangeArgs) -> ToolResult<Value> {
        let grid = self.range(&args, true)?;
        let kinds: Vec<Vec<CellKind>> = analysis::cell_kinds(&grid);
        Ok(json!({ "cell_types": payload(kinds)? }))
    }

    fn analyze_label_value_patterns(&mut self, args: SheetArgs) -> ToolResult<Value> {
        let used = self.used(&args)?;
        let patterns = analysis::label_value_patterns(&used.sheet, &used.grid);
        Ok(json!({ "patterns": payload(patterns)? }))
    }
}

fn workbook_schema() -> Schema {
    Schema::new().required(
        "identifier",
        tools::identifier("Workbook name, full path, or 1-based index"),
    )
}

fn sheet_schema() -> Schema {
    workbook_schema().required(
        "sheet_identifier",
        tools::identifier("Worksheet name or 1-based index"),
    )
}

impl<B: ExcelBackend> ToolSet for ExcelTools<B> {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "list_open_workbooks",
                "List the open workbooks with their 1-based index",
                Schema::new().build(),
            ),
            ToolDefinition::new(
                "open_workbook",
                "Open a workbook file",
                Schema::new()
                    .required("path", tools::string("Path of the workbook file"))
                    .build(),
            ),
            ToolDefinition::new(
                "save_workbook",
                "Save a workbook, optionally to a new path",
                workbook_schema()
                    .optional("save_path", tools::string("Target path; required for a new workbook"))
                    .build(),
            ),
            ToolDefinition::new(
                "list_worksheets",
                "List the worksheets of a workbook",
                workbook_schema().build(),
            ),
            ToolDefinition::new(
                "add_worksheet",
                "Add a worksheet after the last one",
                workbook_schema()
                    .optional("sheet_name", tools::string("Name for the new sheet"))
                    .build(),
            ),
            ToolDefinition::new(
                "get_cell_value",
                "Read one cell",
                sheet_schema()
                    .required("cell_address", tools::string("Cell address, e.g. B3"))
                    .build(),
            ),
            ToolDefinition::new(
                "set_cell_value",
                "Write one cell; strings starting with '=' are formulas",
                sheet_schema()
                    .required("cell_address", tools::string("Cell address, e.g. B3"))
                    .required("value", tools::scalar("Value to write"))
                    .build(),
            ),
            ToolDefinition::new(
                "get_range_values",
                "Read a range as a list of rows",
                sheet_schema()
                    .required("range_address", tools::string("Range address, e.g. A1:C5"))
                    .build(),
            ),
            ToolDefinition::new(
                "set_range_values",
                "Write a block of rows starting at a cell",
                sheet_schema()
                    .required("start_cell", tools::string("Top-left cell of the block"))
                    .required(
                        "values",
                        json!({"type": "array", "items": {"type": "array"}, "description": "Rows of values"}),
                    )
                    .build(),
            ),
            ToolDefinition::new(
                "find_used_ranges",
                "Find the separate blocks of used cells on a sheet",
                sheet_schema().build(),
            ),
            ToolDefinition::new(
                "extract_string_cells",
                "List every non-blank text cell on a sheet",
                sheet_schema().build(),
            ),
            ToolDefinition::new(
                "get_cell_types_in_range",
                "Classify each cell of a range as formula, empty, text, number or other",
                sheet_schema()
                    .required("range_address", tools::string("Range address, e.g. A1:C5"))
                    .build(),
            ),
            ToolDefinition::new(
                "analyze_label_value_patterns",
                "Find label/value pairs and column headers over numbers",
                sheet_schema().build(),
            ),
        ]
    }

    fn call(&mut self, name: &str, args: Value) -> ToolResult<Value> {
        match name {
            "list_open_workbooks" => self.list_open_workbooks(),
            "open_workbook" => self.open_workbook(arguments(args)?),
            "save_workbook" => self.save_workbook(arguments(args)?),
            "list_worksheets" => self.list_worksheets(arguments(args)?),
            "add_worksheet" => self.add_worksheet(arguments(args)?),
            "get_cell_value" => self.get_cell_value(arguments(args)?),
            "set_cell_value" => self.set_cell_value(arguments(args)?),
            "get_range_values" => self.get_range_values(arguments(args)?),
            "set_range_values" => self.set_range_values(arguments(args)?),
            "find_used_ranges" => self.find_used_ranges(arguments(args)?),
            "extract_string_cells" => self.extract_string_cells(arguments(args)?),
            "get_cell_types_in_range" => self.get_cell_types_in_range(arguments(args)?),
            "analyze_label_value_patterns" => self.analyze_label_value_patterns(arguments(args)?),
            other => Err(tools::unknown_tool(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_rows() {
        let rows = value_rows(&json!([[1, "a"], [true]])).unwrap();
        assert_eq!(rows[0][0], CellValue::Number(1.0));
        assert_eq!(rows[1][0], CellValue::Boolean(true));

        for bad in [json!([]), json!([[]]), json!("x"), json!([1, 2]), json!([[1], []])] {
            let err = value_rows(&bad).unwrap_err();
            assert_eq!(err.to_string(), "Input 'values' must be a non-empty list of lists.");
        }
    }

    #[test]
    fn test_tool_names_are_unique() {
        let tools = ExcelTools::new(DocumentExcel::new(std::env::temp_dir()));
        let mut names: Vec<String> = tools.definitions().into_iter().map(|d| d.name).collect();
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
        assert_eq!(count, 13);
    }
}
