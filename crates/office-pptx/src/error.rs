//! PPTX error types

use thiserror::Error;

/// Result type for PPTX operations
pub type PptxResult<T> = std::result::Result<T, PptxError>;

/// Errors that can occur while reading, editing or writing a presentation
#[derive(Debug, Error)]
pub enum PptxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// The package is not a presentation or a part is malformed
    #[error("Invalid PPTX format: {0}")]
    InvalidFormat(String),

    /// `number` is 1-based, as users count slides
    #[error("Slide {number} out of range. Presentation has {count} slides.")]
    SlideOutOfRange { number: usize, count: usize },

    #[error("Shape with ID {0} not found on slide")]
    ShapeNotFound(u32),

    #[error("Layout '{0}' not found")]
    LayoutNotFound(String),

    /// The shape kind does not support the requested edit
    #[error("{0}")]
    Unsupported(String),

    /// Core error
    #[error("{0}")]
    Core(#[from] office_core::Error),
}
