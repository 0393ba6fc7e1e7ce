//! Excel automation on top of [`ComObject`].

#![cfg(windows)]

use office_com_protocol::{SheetRef, WireSheet, WireUsedRange, WireValue, WireWorkbook};

use crate::dispatch::{
    variant_bool, variant_get_string, variant_i32, variant_missing, variant_object, variant_str,
    variant_to_rows, variant_to_wire, wire_to_variant, ComObject, VariantArray,
};
use crate::values::workbook_format;

/// `xlSheetVisible`
const XL_SHEET_VISIBLE: i32 = -1;

/// The user's Excel instance
pub struct ExcelSession {
    app: ComObject,
}

impl ExcelSession {
    pub fn attach() -> Result<Self, String> {
        let (app, launched) = ComObject::attach_or_launch("Excel.Application")?;
        if launched {
            app.put("Visible", variant_bool(true))?;
            eprintln!("[office-com-bridge] Launched a new Excel instance");
        } else {
            eprintln!("[office-com-bridge] Attached to running Excel");
        }
        app.put("DisplayAlerts", variant_bool(true))?;
        Ok(Self { app })
    }

    pub fn version(&self) -> Result<String, String> {
        self.app.string("Version")
    }

    /// Run `f` with screen updating and alerts off, restoring both afterwards
    fn bulk<T>(&self, f: impl FnOnce() -> Result<T, String>) -> Result<T, String> {
        let screen = self.app.flag("ScreenUpdating")?;
        let alerts = self.app.flag("DisplayAlerts")?;
        self.app.put("ScreenUpdating", variant_bool(false))?;
        self.app.put("DisplayAlerts", variant_bool(false))?;
        let result = f();
        let _ = self.app.put("ScreenUpdating", variant_bool(screen));
        let _ = self.app.put("DisplayAlerts", variant_bool(alerts));
        result
    }

    fn workbook(&self, index: u32) -> Result<ComObject, String> {
        let books = self.app.object("Workbooks")?;
        let count = books.count()?;
        if index == 0 || index as i32 > count {
            return Err(format!("Workbook index {index} out of range (1-{count})"));
        }
        books.item(index as i32)
    }

    fn sheet(&self, workbook: u32, sheet: &SheetRef) -> Result<ComObject, String> {
        let sheets = self.workbook(workbook)?.object("Worksheets")?;
        let key = match sheet {
            SheetRef::Index(i) => variant_i32(*i as i32),
            SheetRef::Name(name) => variant_str(name),
        };
        sheets
            .object_with("Item", &[key])
            .map_err(|_| match sheet {
                SheetRef::Index(i) => format!("Worksheet index {i} not found"),
                SheetRef::Name(name) => format!("Worksheet '{name}' not found"),
            })
    }

    fn range(&self, workbook: u32, sheet: &SheetRef, address: &str) -> Result<ComObject, String> {
        self.sheet(workbook, sheet)?
            .object_with("Range", &[variant_str(address)])
            .map_err(|e| format!("Invalid range address '{address}': {e}"))
    }

    fn describe(index: u32, book: &ComObject) -> Result<WireWorkbook, String> {
        Ok(WireWorkbook {
            index,
            name: book.string("Name")?,
            full_name: book.string("FullName")?,
            path: book.string("Path")?,
            sheets_count: book.object("Worksheets")?.count()? as u32,
            saved: book.flag("Saved")?,
            read_only: book.flag("ReadOnly")?,
        })
    }

    pub fn list_workbooks(&self) -> Result<Vec<WireWorkbook>, String> {
        let books = self.app.object("Workbooks")?;
        (1..=books.count()?)
            .map(|i| Self::describe(i as u32, &books.item(i)?))
            .collect()
    }

    pub fn open_workbook(&self, path: &str) -> Result<WireWorkbook, String> {
        let books = self.app.object("Workbooks")?;
        let opened = books.call_object("Open", &[variant_str(path)])?;
        let full_name = opened.string("FullName")?;
        for i in 1..=books.count()? {
            let book = books.item(i)?;
            if book.string("FullName")? == full_name {
                return Self::describe(i as u32, &book);
            }
        }
        Self::describe(books.count()? as u32, &opened)
    }

    pub fn save_workbook(&self, index: u32, path: Option<&str>) -> Result<(), String> {
        let book = self.workbook(index)?;
        self.bulk(|| match path {
            Some(path) => {
                let format = workbook_format(path).unwrap_or(51);
                book.call("SaveAs", &[variant_str(path), variant_i32(format)])
                    .map(|_| ())
            }
            None if book.string("Path")?.is_empty() => Err(
                "save_path is required for a workbook that has never been saved".to_string(),
            ),
            None => book.call("Save", &[]).map(|_| ()),
        })
    }

    pub fn list_worksheets(&self, workbook: u32) -> Result<Vec<WireSheet>, String> {
        let sheets = self.workbook(workbook)?.object("Worksheets")?;
        (1..=sheets.count()?)
            .map(|i| {
                let sheet = sheets.item(i)?;
                Ok(WireSheet {
                    index: i as u32,
                    name: sheet.string("Name")?,
                    visible: sheet.int("Visible")? == XL_SHEET_VISIBLE,
                })
            })
            .collect()
    }

    pub fn add_worksheet(&self, workbook: u32, name: Option<&str>) -> Result<WireSheet, String> {
        let sheets = self.workbook(workbook)?.object("Worksheets")?;
        self.bulk(|| {
            let last = sheets.item(sheets.count()?)?;
            let added = sheets.call_object("Add", &[variant_missing(), variant_object(&last)])?;
            if let Some(name) = name {
                if let Err(e) = added.put("Name", variant_str(name)) {
                    eprintln!("[office-com-bridge] Could not rename sheet to '{name}': {e}");
                }
            }
            Ok(WireSheet {
                index: added.int("Index")? as u32,
                name: added.string("Name")?,
                visible: true,
            })
        })
    }

    pub fn get_cell_value(&self, workbook: u32, sheet: &SheetRef, cell: &str) -> Result<WireValue, String> {
        let value = self.range(workbook, sheet, cell)?.get("Value")?;
        Ok(variant_to_wire(&value))
    }

    pub fn set_cell_value(
        &self,
        workbook: u32,
        sheet: &SheetRef,
        cell: &str,
        value: &WireValue,
    ) -> Result<(), String> {
        self.range(workbook, sheet, cell)?
            .put("Value", wire_to_variant(value))
    }

    pub fn get_range_values(
        &self,
        workbook: u32,
        sheet: &SheetRef,
        address: &str,
    ) -> Result<Vec<Vec<WireValue>>, String> {
        let value = self.range(workbook, sheet, address)?.get("Value")?;
        variant_to_rows(&value, variant_to_wire)
    }

    pub fn get_range_formulas(
        &self,
        workbook: u32,
        sheet: &SheetRef,
        address: &str,
    ) -> Result<Vec<Vec<String>>, String> {
        let formulas = self.range(workbook, sheet, address)?.get("Formula")?;
        variant_to_rows(&formulas, |v| variant_get_string(v).unwrap_or_default())
    }

    pub fn set_range_values(
        &self,
        workbook: u32,
        sheet: &SheetRef,
        start_cell: &str,
        values: &[Vec<WireValue>],
    ) -> Result<(), String> {
        let width = values.iter().map(Vec::len).max().unwrap_or(0);
        if values.is_empty() || width == 0 {
            return Err("Input 'values' must be a non-empty list of lists.".to_string());
        }
        let start = self.range(workbook, sheet, start_cell)?;
        let array = VariantArray::from_rows(values)?;
        self.bulk(|| {
            let target = start.object_with(
                "Resize",
                &[variant_i32(values.len() as i32), variant_i32(width as i32)],
            )?;
            target.put("Value", array.as_variant())
        })
    }

    pub fn get_used_range(&self, workbook: u32, sheet: &SheetRef) -> Result<WireUsedRange, String> {
        let used = self.sheet(workbook, sheet)?.object("UsedRange")?;
        let address = used.string("Address")?;
        let values = variant_to_rows(&used.get("Value")?, variant_to_wire)?;
        Ok(WireUsedRange { address, values })
    }
}
