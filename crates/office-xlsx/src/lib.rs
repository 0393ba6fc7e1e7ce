//! # office-xlsx
//!
//! XLSX (Office Open XML) reader and writer backing the Excel document strategy.
//!
//! Only cell content is modelled. The stylesheet and theme parts are carried
//! through a read/write cycle byte for byte, and each cell keeps the style index
//! it was read with.

pub mod document;
pub mod error;
pub mod reader;
pub mod writer;

pub use document::{PreservedParts, XlsxDocument};
pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
