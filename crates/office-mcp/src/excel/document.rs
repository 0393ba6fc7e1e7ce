//! Excel backend over XLSX files held in memory

use std::fs;
use std::path::{Path, PathBuf};

use office_core::{CellAddress, CellRange, CellValue, Grid, Identifier, Workbook};
use office_xlsx::{XlsxDocument, XlsxError, XlsxReader, XlsxWriter};
use tracing::{debug, info, warn};

use super::{
    workbook_not_found, ExcelBackend, NewSheet, SheetGrid, SheetSummary, WorkbookRef,
    WorkbookSummary,
};
use crate::cache::DocumentCache;
use crate::error::ToolResult;

/// Workbooks tracked by path; relative paths are taken from the workspace
pub struct DocumentExcel {
    workspace: PathBuf,
    cache: DocumentCache<XlsxDocument>,
}

/// Read an existing workbook, or create and write a fresh one with `Sheet1`
fn load_or_create(path: &Path) -> Result<(XlsxDocument, bool), XlsxError> {
    if path.exists() {
        let mut document = XlsxReader::read_file(path)?;
        let computed = document.workbook.recalculate();
        debug!("recalculated {computed} formula(s) in {}", path.display());
        return Ok((document, true));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let document = XlsxDocument::new();
    XlsxWriter::write_file(&document, path)?;
    info!("created new workbook {}", path.display());
    Ok((document, true))
}

impl DocumentExcel {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            cache: DocumentCache::new(),
        }
    }

    fn workspace_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// 0-based cache position; a name that is a workbook file in the
    /// workspace is opened on first use
    fn position(&mut self, id: &Identifier) -> ToolResult<usize> {
        if let Some(index) = self.cache.resolve(id) {
            return Ok(index);
        }
        if let Identifier::Name(name) = id {
            let path = self.workspace_path(name.trim());
            if path.is_file() {
                return Ok(self.cache.get_or_load(&path, load_or_create)?);
            }
        }
        Err(workbook_not_found(id))
    }

    fn workbook(&mut self, id: &Identifier) -> ToolResult<&Workbook> {
        let index = self.position(id)?;
        self.cache
            .get(index)
            .map(|e| &e.document.workbook)
            .ok_or_else(|| workbook_not_found(id))
    }

    fn workbook_mut(&mut self, id: &Identifier) -> ToolResult<&mut Workbook> {
        let index = self.position(id)?;
        self.cache
            .get_mut(index)
            .map(|e| &mut e.document_mut().workbook)
            .ok_or_else(|| workbook_not_found(id))
    }
}

impl ExcelBackend for DocumentExcel {
    fn list_workbooks(&mut self) -> ToolResult<Vec<WorkbookSummary>> {
        Ok(self
            .cache
            .iter()
            .enumerate()
            .map(|(i, entry)| WorkbookSummary {
                name: entry.name(),
                path: entry.path.display().to_string(),
                sheets_count: entry.document.workbook.sheet_count(),
                saved: entry.saved,
                index: i + 1,
            })
            .collect())
    }

    fn open_workbook(&mut self, path: &str) -> ToolResult<WorkbookRef> {
        let full = self.workspace_path(path);
        let index = self.cache.get_or_load(&full, load_or_create)?;
        let entry = self
            .cache
            .get(index)
            .ok_or_else(|| workbook_not_found(&Identifier::parse(path)))?;
        Ok(WorkbookRef {
            name: entry.name(),
            path: entry.path.display().to_string(),
            index: index + 1,
        })
    }

    fn save_workbook(&mut self, id: &Identifier, save_path: Option<&str>) -> ToolResult<()> {
        let index = self.position(id)?;
        let target = save_path.map(|p| self.workspace_path(p));
        let entry = self
            .cache
            .get_mut(index)
            .ok_or_else(|| workbook_not_found(id))?;
        let path = target.clone().unwrap_or_else(|| entry.path.clone());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        XlsxWriter::write_file(&entry.document, &path)?;
        entry.saved = true;
        info!("saved workbook to {}", path.display());
        if let Some(target) = target {
            self.cache.rename(index, &target);
        }
        Ok(())
    }

    fn list_worksheets(&mut self, id: &Identifier) -> ToolResult<Vec<SheetSummary>> {
        Ok(self
            .workbook(id)?
            .worksheets()
            .enumerate()
            .map(|(i, ws)| SheetSummary {
                name: ws.name().to_string(),
                index: i + 1,
                visible: ws.visibility().is_visible(),
            })
            .collect())
    }

    fn add_worksheet(&mut self, id: &Identifier, name: Option<&str>) -> ToolResult<NewSheet> {
        let workbook = self.workbook_mut(id)?;
        let index = match name {
            Some(name) => match workbook.add_worksheet(Some(name)) {
                Ok(index) => index,
                Err(e) => {
                    warn!("Could not rename sheet to '{name}': {e}");
                    workbook.add_worksheet(None)?
                }
            },
            None => workbook.add_worksheet(None)?,
        };
        let name = workbook
            .worksheet(index)
            .map(|ws| ws.name().to_string())
            .unwrap_or_default();
        Ok(NewSheet {
            name,
            index: index + 1,
        })
    }

    fn get_cell_value(
        &mut self,
        id: &Identifier,
        sheet: &Identifier,
        cell: &CellAddress,
    ) -> ToolResult<CellValue> {
        let sheet = self.workbook(id)?.sheet_by_identifier(sheet)?;
        Ok(sheet.get(cell).clone())
    }

    fn set_cell_value(
        &mut self,
        id: &Identifier,
        sheet: &Identifier,
        cell: &CellAddress,
        value: CellValue,
    ) -> ToolResult<()> {
        let workbook = self.workbook_mut(id)?;
        workbook.sheet_by_identifier_mut(sheet)?.set(cell, value);
        workbook.recalculate();
        Ok(())
    }

    /// Formula cells always carry their text here, so `formulas` changes nothing
    fn range_grid(
        &mut self,
        id: &Identifier,
        sheet: &Identifier,
        range: &CellRange,
        _formulas: bool,
    ) -> ToolResult<Grid> {
        Ok(self.workbook(id)?.sheet_by_identifier(sheet)?.grid(range)?)
    }

    fn set_range_values(
        &mut self,
        id: &Identifier,
        sheet: &Identifier,
        start: &CellAddress,
        rows: &[Vec<CellValue>],
    ) -> ToolResult<()> {
        let workbook = self.workbook_mut(id)?;
        workbook
            .sheet_by_identifier_mut(sheet)?
            .write_block(start, rows)?;
        workbook.recalculate();
        Ok(())
    }

    fn used_grid(&mut self, id: &Identifier, sheet: &Identifier) -> ToolResult<SheetGrid> {
        let sheet = self.workbook(id)?.sheet_by_identifier(sheet)?;
        Ok(SheetGrid {
            sheet: sheet.name().to_string(),
            grid: sheet.used_grid(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_creates_missing_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let mut excel = DocumentExcel::new(dir.path());

        let opened = excel.open_workbook("Budget.xlsx").unwrap();
        assert_eq!(opened.name, "Budget.xlsx");
        assert_eq!(opened.index, 1);
        assert!(dir.path().join("Budget.xlsx").is_file());

        let sheets = excel.list_worksheets(&Identifier::Index(1)).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Sheet1");
        assert!(sheets[0].visible);
    }

    #[test]
    fn test_edits_mark_unsaved_until_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut excel = DocumentExcel::new(dir.path());
        excel.open_workbook("Budget.xlsx").unwrap();
        let book = Identifier::parse("budget.xlsx");
        let sheet = Identifier::Index(1);

        excel
            .set_cell_value(&book, &sheet, &CellAddress::parse("B2").unwrap(), CellValue::Number(7.0))
            .unwrap();
        assert!(!excel.list_workbooks().unwrap()[0].saved);

        excel.save_workbook(&book, None).unwrap();
        assert!(excel.list_workbooks().unwrap()[0].saved);

        let reread = XlsxReader::read_file(dir.path().join("Budget.xlsx")).unwrap();
        let value = reread.workbook.worksheet(0).unwrap().get_a1("B2").unwrap().clone();
        assert_eq!(value, CellValue::Number(7.0));
    }

    #[test]
    fn test_save_as_moves_the_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let mut excel = DocumentExcel::new(dir.path());
        excel.open_workbook("a.xlsx").unwrap();
        excel
            .save_workbook(&Identifier::Index(1), Some("out/b.xlsx"))
            .unwrap();
        assert!(dir.path().join("out/b.xlsx").is_file());
        assert_eq!(excel.list_workbooks().unwrap()[0].name, "b.xlsx");
    }

    #[test]
    fn test_rejected_sheet_name_keeps_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut excel = DocumentExcel::new(dir.path());
        excel.open_workbook("a.xlsx").unwrap();
        let book = Identifier::Index(1);

        let added = excel.add_worksheet(&book, Some("Bad/Name")).unwrap();
        assert_eq!(added, NewSheet { name: "Sheet2".into(), index: 2 });
        let named = excel.add_worksheet(&book, Some("Totals")).unwrap();
        assert_eq!(named, NewSheet { name: "Totals".into(), index: 3 });
    }

    #[test]
    fn test_unknown_workbook_and_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let mut excel = DocumentExcel::new(dir.path());
        let err = excel.list_worksheets(&Identifier::parse("nope.xlsx")).unwrap_err();
        assert_eq!(err.to_string(), "Workbook 'nope.xlsx' not found.");

        excel.open_workbook("a.xlsx").unwrap();
        let err = excel
            .used_grid(&Identifier::Index(1), &Identifier::parse("Data"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Worksheet 'Data' not found.");
    }

    #[test]
    fn test_workspace_file_opens_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        XlsxWriter::write_file(&XlsxDocument::new(), dir.path().join("Existing.xlsx")).unwrap();
        let mut excel = DocumentExcel::new(dir.path());
        let sheets = excel.list_worksheets(&Identifier::parse("Existing.xlsx")).unwrap();
        assert_eq!(sheets[0].name, "Sheet1");
        assert_eq!(excel.list_workbooks().unwrap().len(), 1);
    }
}
