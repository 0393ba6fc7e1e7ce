//! Connection to the running Office application, shared by the live backends

use std::path::{Path, PathBuf};

use office_com::{find_bridge_exe, host_to_app_path, BridgeConfig, ComBridge};
use office_com_protocol::App;
use tracing::info;

use crate::cache::canonical_path;
use crate::error::ToolResult;

/// A bridge to one application and the launcher it runs under
pub struct LiveSession {
    bridge: ComBridge,
    launcher: Option<PathBuf>,
}

/// `C:\...`, `C:/...` or `\\server\share`
fn is_windows_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    let drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');
    drive || path.starts_with("\\\\")
}

impl LiveSession {
    /// Spawn the bridge and attach to `app`
    pub fn start(mut config: BridgeConfig, app: App) -> ToolResult<Self> {
        if config.bridge_exe_path.is_none() {
            config.bridge_exe_path = Some(find_bridge_exe());
        }
        let launcher = config.launcher.clone();
        info!(
            bridge = ?config.bridge_exe_path,
            launcher = ?launcher,
            "starting COM bridge for {app}"
        );
        let bridge = ComBridge::start(config, app)?;
        Ok(Self { bridge, launcher })
    }

    pub fn new(bridge: ComBridge, launcher: Option<PathBuf>) -> Self {
        Self { bridge, launcher }
    }

    pub fn bridge(&self) -> &ComBridge {
        &self.bridge
    }

    pub fn app(&self) -> App {
        self.bridge.app()
    }

    /// A caller's path in the form the application opens: Windows paths pass
    /// through, host paths are made absolute and mapped for WINE
    pub fn app_path(&self, path: &str) -> String {
        if is_windows_path(path) {
            return path.to_string();
        }
        host_to_app_path(&canonical_path(Path::new(path)), self.launcher.as_deref())
    }
}
