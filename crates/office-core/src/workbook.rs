//! Workbook type - the in-memory spreadsheet document

use crate::error::{Error, Result};
use crate::identifier::Identifier;
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A workbook (spreadsheet document)
#[derive(Debug, Clone)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create a new workbook with a single `Sheet1`
    pub fn new() -> Self {
        Self {
            worksheets: vec![Worksheet::new("Sheet1")],
        }
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
        }
    }

    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by 0-based index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Recompute formula results; see [`crate::formula::recalculate`]
    pub fn recalculate(&mut self) -> usize {
        crate::formula::recalculate(self)
    }

    /// 0-based index of the sheet a caller means: a 1-based position, or a
    /// case-insensitive name.
    pub fn sheet_index(&self, id: &Identifier) -> Result<usize> {
        let found = match id {
            Identifier::Index(_) => id.position_in(self.worksheets.len()),
            Identifier::Name(name) => {
                let wanted = name.to_lowercase();
                self.worksheets
                    .iter()
                    .position(|ws| ws.name().to_lowercase() == wanted)
            }
        };
        found.ok_or_else(|| Error::SheetNotFound(id.to_string()))
    }

    pub fn sheet_by_identifier(&self, id: &Identifier) -> Result<&Worksheet> {
        let index = self.sheet_index(id)?;
        Ok(&self.worksheets[index])
    }

    pub fn sheet_by_identifier_mut(&mut self, id: &Identifier) -> Result<&mut Worksheet> {
        let index = self.sheet_index(id)?;
        Ok(&mut self.worksheets[index])
    }

    /// Append a worksheet after the last one, returning its 0-based index.
    ///
    /// Without a name the first free `SheetN` is used.
    pub fn add_worksheet(&mut self, name: Option<&str>) -> Result<usize> {
        let name = match name {
            Some(name) => {
                self.validate_sheet_name(name, None)?;
                name.to_string()
            }
            None => self.generate_sheet_name(),
        };
        self.worksheets.push(Worksheet::new(name));
        Ok(self.worksheets.len() - 1)
    }

    /// Append a worksheet built elsewhere (the package reader)
    pub fn push_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name(), None)?;
        self.worksheets.push(worksheet);
        Ok(self.worksheets.len() - 1)
    }

    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetNotFound((index + 1).to_string()));
        }
        self.validate_sheet_name(new_name, Some(index))?;
        self.worksheets[index].set_name(new_name);
        Ok(())
    }

    fn validate_sheet_name(&self, name: &str, exclude_index: Option<usize>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {MAX_SHEET_NAME_LEN} characters)"
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{c}'"
            )));
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return Err(Error::InvalidSheetName(
                "Sheet name cannot begin or end with an apostrophe".into(),
            ));
        }

        let name_lower = name.to_lowercase();
        let taken = self
            .worksheets
            .iter()
            .enumerate()
            .any(|(i, ws)| Some(i) != exclude_index && ws.name().to_lowercase() == name_lower);
        if taken {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }

    fn generate_sheet_name(&self) -> String {
        let mut n = 1;
        loop {
            let name = format!("Sheet{n}");
            if self.validate_sheet_name(&name, None).is_ok() {
                return name;
            }
            n += 1;
        }
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names_fill_first_gap() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_worksheet(None).unwrap(), 1);
        assert_eq!(wb.worksheet(1).unwrap().name(), "Sheet2");
        wb.rename_worksheet(0, "Data").unwrap();
        wb.add_worksheet(None).unwrap();
        assert_eq!(wb.worksheet(2).unwrap().name(), "Sheet1");
    }

    #[test]
    fn test_name_validation() {
        let mut wb = Workbook::new();
        assert!(matches!(
            wb.add_worksheet(Some("sheet1")),
            Err(Error::DuplicateSheetName(_))
        ));
        for bad in ["", "a/b", "x[1]", "'quoted", &"n".repeat(32)] {
            assert!(wb.add_worksheet(Some(bad)).is_err(), "accepted {bad:?}");
        }
        assert!(wb.add_worksheet(Some("Q1 Results")).is_ok());
        // renaming a sheet to its own name in another case is fine
        assert!(wb.rename_worksheet(0, "SHEET1").is_ok());
    }

    #[test]
    fn test_sheet_lookup() {
        let mut wb = Workbook::new();
        wb.add_worksheet(Some("Summary")).unwrap();
        assert_eq!(wb.sheet_index(&Identifier::Index(2)).unwrap(), 1);
        assert_eq!(wb.sheet_index(&"summary".into()).unwrap(), 1);
        assert_eq!(wb.sheet_index(&"1".into()).unwrap(), 0);
        let err = wb.sheet_index(&"Missing".into()).unwrap_err();
        assert_eq!(err.to_string(), "Worksheet 'Missing' not found.");
        assert!(wb.sheet_index(&Identifier::Index(0)).is_err());
    }
}
