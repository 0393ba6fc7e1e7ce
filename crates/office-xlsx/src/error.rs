//! Errors from reading and writing workbook packages

use thiserror::Error;

pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("workbook file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workbook package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("workbook XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The package opened but its structure is not a workbook
    #[error("not a valid .xlsx workbook: {0}")]
    InvalidFormat(String),

    /// A part the workbook relationships point at is absent
    #[error("workbook part '{0}' is missing")]
    MissingPart(String),

    #[error("could not read workbook value: {0}")]
    Parse(String),

    #[error("{0}")]
    Core(#[from] office_core::Error),
}
