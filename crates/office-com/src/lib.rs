//! Client library for live Excel and PowerPoint automation through a COM bridge process.
//!
//! This crate spawns a Windows `.exe` (under WINE on Linux) that automates the
//! running Office application through COM, communicating over JSON-over-stdio.
//! Changes land in the user's open application window.
//!
//! # Architecture
//!
//! ```text
//! office-mcp (live strategy)
//!     └── ComBridge (this crate)
//!           └── spawns: [wine] office-com-bridge.exe
//!                 └── COM: Excel.Application / PowerPoint.Application
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use office_com::{App, BridgeConfig, ComBridge};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = ComBridge::start(BridgeConfig::default(), App::Excel)?;
//!     for workbook in bridge.list_workbooks()? {
//!         println!("{} ({} sheets)", workbook.name, workbook.sheets_count);
//!     }
//!     bridge.shutdown()?;
//!     Ok(())
//! }
//! ```

mod bridge;
pub mod convert;
mod excel;
mod powerpoint;

pub use bridge::{
    default_launcher, find_bridge_exe, host_to_app_path, linux_to_wine_path, BridgeConfig,
    BridgeError, BridgeResult, Channel, ChannelFactory, ComBridge, ProcessChannel, BRIDGE_EXE,
};
pub use office_com_protocol::{App, SheetRef, WireLayout, WirePresentation, WireSheet, WireWorkbook};
pub use powerpoint::SlideShapes;
