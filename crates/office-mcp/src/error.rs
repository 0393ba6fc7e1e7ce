//! Error type shared by every tool

use office_com::BridgeError;
use office_pptx::PptxError;
use office_xlsx::XlsxError;
use thiserror::Error;

/// Result type for tool operations
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Why a tool call failed. The message is what the caller sees in `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments that cannot be decoded or do not make sense
    #[error("{0}")]
    InvalidArgument(String),

    /// A document, sheet, slide, shape or tool that does not exist
    #[error("{0}")]
    NotFound(String),

    /// The live application could not be reached
    #[error("Could not connect to {0}. Please ensure it is running.")]
    Connection(String),

    /// The application or the package library reported a failure
    #[error("{0}")]
    Backend(String),
}

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ToolError::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ToolError::NotFound(message.into())
    }
}

impl From<office_core::Error> for ToolError {
    fn from(err: office_core::Error) -> Self {
        use office_core::Error as E;
        match err {
            E::SheetNotFound(_) => ToolError::NotFound(err.to_string()),
            E::RowOutOfBounds(..) | E::ColumnOutOfBounds(..) => {
                ToolError::InvalidArgument(err.to_string())
            }
            E::InvalidAddress(_)
            | E::InvalidRange(_)
            | E::InvalidSheetName(_)
            | E::DuplicateSheetName(_)
            | E::InvalidBlock(_)
            | E::InvalidColor(_)
            | E::InvalidStyle(_)
            | E::UnknownName(_) => ToolError::InvalidArgument(err.to_string()),
        }
    }
}

impl From<XlsxError> for ToolError {
    fn from(err: XlsxError) -> Self {
        match err {
            XlsxError::Core(e) => e.into(),
            other => ToolError::Backend(other.to_string()),
        }
    }
}

impl From<PptxError> for ToolError {
    fn from(err: PptxError) -> Self {
        match err {
            PptxError::Core(e) => e.into(),
            PptxError::SlideOutOfRange { .. }
            | PptxError::ShapeNotFound(_)
            | PptxError::LayoutNotFound(_) => ToolError::NotFound(err.to_string()),
            PptxError::Unsupported(msg) => ToolError::InvalidArgument(msg),
            other => ToolError::Backend(other.to_string()),
        }
    }
}

impl From<BridgeError> for ToolError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Connection(app) => ToolError::Connection(app.to_string()),
            BridgeError::Command(msg) => ToolError::Backend(msg),
            other if other.is_transport() => {
                ToolError::Backend(format!("Office communication error: {other}"))
            }
            other => ToolError::Backend(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::InvalidArgument(format!("Invalid arguments: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use office_com_protocol::App;

    #[test]
    fn test_connection_message() {
        let err: ToolError = BridgeError::Connection(App::Excel).into();
        assert_eq!(
            err.to_string(),
            "Could not connect to Excel. Please ensure it is running."
        );
    }

    #[test]
    fn test_library_errors_are_classified() {
        let err: ToolError = office_core::Error::SheetNotFound("Data".into()).into();
        assert!(matches!(err, ToolError::NotFound(_)));
        assert_eq!(err.to_string(), "Worksheet 'Data' not found.");

        let err: ToolError = PptxError::SlideOutOfRange { number: 4, count: 2 }.into();
        assert!(matches!(err, ToolError::NotFound(_)));

        let err: ToolError = PptxError::Core(office_core::Error::InvalidColor("x".into())).into();
        assert!(matches!(err, ToolError::InvalidArgument(_)));

        let err: ToolError = BridgeError::Command("Range failed".into()).into();
        assert_eq!(err.to_string(), "Range failed");
    }
}
