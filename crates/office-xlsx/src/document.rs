//! A workbook together with the package parts kept verbatim

use office_core::Workbook;

/// Parts copied through unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreservedParts {
    /// `xl/styles.xml`
    pub styles: Option<Vec<u8>>,
    /// `xl/theme/theme1.xml`
    pub theme: Option<Vec<u8>>,
}

/// An XLSX package as the document backend holds it
#[derive(Debug, Clone, Default)]
pub struct XlsxDocument {
    pub workbook: Workbook,
    pub preserved: PreservedParts,
}

impl XlsxDocument {
    /// A fresh document with one empty `Sheet1`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_workbook(workbook: Workbook) -> Self {
        Self {
            workbook,
            preserved: PreservedParts::default(),
        }
    }
}
