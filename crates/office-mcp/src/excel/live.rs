//! Excel backend driving the running application through the COM bridge

use office_com::{SheetRef, WireSheet, WireWorkbook};
use office_core::{CellAddress, CellRange, CellValue, Grid, Identifier};
use tracing::warn;

use super::{
    workbook_not_found, worksheet_not_found, ExcelBackend, NewSheet, SheetGrid, SheetSummary,
    WorkbookRef, WorkbookSummary, SAVE_PATH_REQUIRED,
};
use crate::error::{ToolError, ToolResult};
use crate::live::LiveSession;

pub struct LiveExcel {
    session: LiveSession,
}

impl LiveExcel {
    pub fn new(session: LiveSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &LiveSession {
        &self.session
    }

    /// Open workbook a caller means: 1-based position, name, or full path of
    /// a saved workbook (names and paths ignore case)
    fn workbook(&self, id: &Identifier) -> ToolResult<WireWorkbook> {
        let books = self.session.bridge().list_workbooks()?;
        let found = match id {
            Identifier::Index(_) => id.position_in(books.len()).map(|i| books[i].clone()),
            Identifier::Name(name) => {
                let wanted = name.trim().to_lowercase();
                books.into_iter().find(|wb| {
                    wb.name.to_lowercase() == wanted
                        || (!wb.path.is_empty() && wb.full_name.to_lowercase() == wanted)
                })
            }
        };
        found.ok_or_else(|| workbook_not_found(id))
    }

    fn sheet(&self, workbook: u32, id: &Identifier) -> ToolResult<WireSheet> {
        let sheets = self.session.bridge().list_worksheets(workbook)?;
        let found = match id {
            Identifier::Index(_) => id.position_in(sheets.len()).map(|i| sheets[i].clone()),
            Identifier::Name(name) => {
                let wanted = name.to_lowercase();
                sheets.into_iter().find(|s| s.name.to_lowercase() == wanted)
            }
        };
        found.ok_or_else(|| worksheet_not_found(id))
    }

    /// Workbook position and sheet reference for a cell-level call
    fn target(&self, workbook: &Identifier, sheet: &Identifier) -> ToolResult<(u32, WireSheet)> {
        let book = self.workbook(workbook)?;
        let sheet = self.sheet(book.index, sheet)?;
        Ok((book.index, sheet))
    }
}

impl ExcelBackend for LiveExcel {
    fn list_workbooks(&mut self) -> ToolResult<Vec<WorkbookSummary>> {
        let books = self.session.bridge().list_workbooks()?;
        Ok(books
            .into_iter()
            .map(|wb| WorkbookSummary {
                path: if wb.read_only {
                    format!("{} (ReadOnly)", wb.full_name)
                } else {
                    wb.full_name
                },
                name: wb.name,
                sheets_count: wb.sheets_count as usize,
                saved: wb.saved,
                index: wb.index as usize,
            })
            .collect())
    }

    fn open_workbook(&mut self, path: &str) -> ToolResult<WorkbookRef> {
        let app_path = self.session.app_path(path);
        let wb = self.session.bridge().open_workbook(&app_path)?;
        Ok(WorkbookRef {
            name: wb.name,
            path: wb.full_name,
            index: wb.index as usize,
        })
    }

    fn save_workbook(&mut self, id: &Identifier, save_path: Option<&str>) -> ToolResult<()> {
        let book = self.workbook(id)?;
        let target = save_path.map(|p| self.session.app_path(p));
        if target.is_none() && book.path.is_empty() {
            return Err(ToolError::invalid(SAVE_PATH_REQUIRED));
        }
        self.session
            .bridge()
            .save_workbook(book.index, target.as_deref())?;
        Ok(())
    }

    fn list_worksheets(&mut self, id: &Identifier) -> ToolResult<Vec<SheetSummary>> {
        let book = self.workbook(id)?;
        let sheets = self.session.bridge().list_worksheets(book.index)?;
        Ok(sheets
            .into_iter()
            .map(|s| SheetSummary {
                name: s.name,
                index: s.index as usize,
                visible: s.visible,
            })
            .collect())
    }

    fn add_worksheet(&mut self, id: &Identifier, name: Option<&str>) -> ToolResult<NewSheet> {
        let book = self.workbook(id)?;
        let added = self.session.bridge().add_worksheet(book.index, name)?;
        if let Some(name) = name {
            if added.name != name {
                warn!("Could not rename sheet to '{name}', kept '{}'", added.name);
            }
        }
        Ok(NewSheet {
            name: added.name,
            index: added.index as usize,
        })
    }

    fn get_cell_value(
        &mut self,
        workbook: &Identifier,
        sheet: &Identifier,
        cell: &CellAddress,
    ) -> ToolResult<CellValue> {
        let (book, sheet) = self.target(workbook, sheet)?;
        Ok(self
            .session
            .bridge()
            .get_cell_value(book, SheetRef::Index(sheet.index), cell)?)
    }

    fn set_cell_value(
        &mut self,
        workbook: &Identifier,
        sheet: &Identifier,
        cell: &CellAddress,
        value: CellValue,
    ) -> ToolResult<()> {
        let (book, sheet) = self.target(workbook, sheet)?;
        self.session
            .bridge()
            .set_cell_value(book, SheetRef::Index(sheet.index), cell, &value)?;
        Ok(())
    }

    fn range_grid(
        &mut self,
        workbook: &Identifier,
        sheet: &Identifier,
        range: &CellRange,
        formulas: bool,
    ) -> ToolResult<Grid> {
        let (book, sheet) = self.target(workbook, sheet)?;
        let bridge = self.session.bridge();
        let sheet = SheetRef::Index(sheet.index);
        let grid = if formulas {
            bridge.range_grid_with_formulas(book, sheet, range)?
        } else {
            bridge.range_grid(book, sheet, range)?
        };
        Ok(grid)
    }

    fn set_range_values(
        &mut self,
        workbook: &Identifier,
        sheet: &Identifier,
        start: &CellAddress,
        rows: &[Vec<CellValue>],
    ) -> ToolResult<()> {
        let (book, sheet) = self.target(workbook, sheet)?;
        self.session
            .bridge()
            .set_range_values(book, SheetRef::Index(sheet.index), start, rows)?;
        Ok(())
    }

    fn used_grid(&mut self, workbook: &Identifier, sheet: &Identifier) -> ToolResult<SheetGrid> {
        let (book, sheet) = self.target(workbook, sheet)?;
        let grid = self
            .session
            .bridge()
            .used_grid(book, SheetRef::Index(sheet.index))?;
        Ok(SheetGrid {
            sheet: sheet.name,
            grid,
        })
    }
}
