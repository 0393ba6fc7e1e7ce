//! MCP server exposing Excel and PowerPoint editing tools.
//!
//! Each application is served by one of two strategies:
//!
//! - **live**: the running application is driven through the COM bridge
//!   (`office-com`), so edits show up in the user's open window
//! - **document**: `.xlsx`/`.pptx` files are loaded into memory, edited with
//!   `office-xlsx`/`office-pptx` and written back on save
//!
//! ```text
//! [ MCP client ]
//!      | JSON-RPC over stdio
//!      v
//! [ McpServer ] -> ToolSet (ExcelTools / PowerPointTools)
//!                     |
//!                     +--> live backend     -> ComBridge -> Office
//!                     +--> document backend -> DocumentCache -> OOXML files
//! ```
//!
//! Every tool returns a JSON payload; failures come back as
//! `{"error": "<message>"}` with `isError` set.

pub mod cache;
pub mod config;
pub mod elements;
pub mod error;
pub mod excel;
pub mod live;
pub mod powerpoint;
pub mod protocol;
pub mod server;
pub mod tools;

pub use config::{AppKind, Args, ServerConfig, Strategy};
pub use error::{ToolError, ToolResult};
pub use server::McpServer;
pub use tools::{ToolDefinition, ToolSet};

use excel::{DocumentExcel, ExcelTools, LiveExcel};
use live::LiveSession;
use powerpoint::{DocumentPowerPoint, LivePowerPoint, PowerPointTools};

/// The tool family for a configuration, with its backend connected
pub fn build_tools(config: &ServerConfig) -> ToolResult<Box<dyn ToolSet>> {
    let workspace = config.workspace.clone();
    let tools: Box<dyn ToolSet> = match (config.app, config.strategy) {
        (AppKind::Excel, Strategy::Document) => {
            Box::new(ExcelTools::new(DocumentExcel::new(workspace)))
        }
        (AppKind::Powerpoint, Strategy::Document) => Box::new(PowerPointTools::new(
            DocumentPowerPoint::new(&workspace),
            workspace,
        )),
        (app, Strategy::Live) => {
            let session = LiveSession::start(config.bridge.clone(), app.com_app())?;
            match app {
                AppKind::Excel => Box::new(ExcelTools::new(LiveExcel::new(session))),
                AppKind::Powerpoint => {
                    Box::new(PowerPointTools::new(LivePowerPoint::new(session), workspace))
                }
            }
        }
    };
    Ok(tools)
}
