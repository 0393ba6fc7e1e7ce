//! Command line and resolved server configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use office_com::{default_launcher, BridgeConfig};
use office_com_protocol::App;

/// Which Office application the server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppKind {
    Excel,
    Powerpoint,
}

impl AppKind {
    pub fn com_app(self) -> App {
        match self {
            AppKind::Excel => App::Excel,
            AppKind::Powerpoint => App::PowerPoint,
        }
    }

    fn default_workspace(self) -> &'static str {
        match self {
            AppKind::Excel => "workbooks",
            AppKind::Powerpoint => "presentations",
        }
    }
}

/// Live application through COM, or OOXML documents in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    Live,
    #[default]
    Document,
}

/// MCP server for Excel and PowerPoint
#[derive(Debug, Parser)]
#[command(name = "office-mcp")]
#[command(author, version, about = "MCP server for Excel and PowerPoint editing")]
pub struct Args {
    /// Application whose tools are served
    #[arg(long, value_enum, env = "OFFICE_MCP_APP")]
    pub app: AppKind,

    /// Drive the running application or edit files directly
    #[arg(long, value_enum, env = "OFFICE_MCP_STRATEGY", default_value = "document")]
    pub strategy: Strategy,

    /// Directory for documents and templates (default: workbooks/ or presentations/)
    #[arg(long, env = "OFFICE_MCP_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Path to office-com-bridge.exe
    #[arg(long, env = "OFFICE_MCP_BRIDGE_EXE")]
    pub bridge_exe: Option<PathBuf>,

    /// Program that runs the bridge (default: wine, except on Windows)
    #[arg(long, env = "OFFICE_MCP_LAUNCHER")]
    pub launcher: Option<PathBuf>,

    /// WINEPREFIX for the bridge
    #[arg(long, env = "WINEPREFIX")]
    pub wine_prefix: Option<PathBuf>,

    /// Seconds to wait for each bridge response
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Resolved configuration handed to the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub app: AppKind,
    pub strategy: Strategy,
    pub workspace: PathBuf,
    pub bridge: BridgeConfig,
}

impl ServerConfig {
    pub fn from_args(args: Args) -> Self {
        let workspace = args
            .workspace
            .unwrap_or_else(|| PathBuf::from(args.app.default_workspace()));
        let bridge = BridgeConfig {
            bridge_exe_path: args.bridge_exe,
            launcher: args.launcher.or_else(default_launcher),
            wine_prefix: args.wine_prefix,
            timeout: Duration::from_secs(args.timeout_secs),
        };
        Self {
            app: args.app,
            strategy: args.strategy,
            workspace,
            bridge,
        }
    }

    /// A document-strategy configuration rooted at `workspace`
    pub fn document(app: AppKind, workspace: impl Into<PathBuf>) -> Self {
        Self {
            app,
            strategy: Strategy::Document,
            workspace: workspace.into(),
            bridge: BridgeConfig::default(),
        }
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.workspace.join("templates")
    }

    /// Create the workspace and its `templates/` directory
    pub fn prepare_workspace(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.templates_dir())
    }

    /// Resolve a caller's path against the workspace
    pub fn workspace_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["office-mcp", "--app", "excel"]).unwrap();
        assert_eq!(args.strategy, Strategy::Document);
        assert_eq!(args.timeout_secs, 30);

        let config = ServerConfig::from_args(args);
        assert_eq!(config.workspace, PathBuf::from("workbooks"));
        assert_eq!(config.templates_dir(), PathBuf::from("workbooks/templates"));
        assert_eq!(config.bridge.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_powerpoint_live() {
        let args = Args::try_parse_from([
            "office-mcp",
            "--app",
            "powerpoint",
            "--strategy",
            "live",
            "--launcher",
            "/opt/wine/bin/wine",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        let config = ServerConfig::from_args(args);
        assert_eq!(config.app.com_app(), App::PowerPoint);
        assert_eq!(config.strategy, Strategy::Live);
        assert_eq!(config.workspace, PathBuf::from("presentations"));
        assert_eq!(config.bridge.launcher, Some(PathBuf::from("/opt/wine/bin/wine")));
    }

    #[test]
    fn test_unknown_app_rejected() {
        assert!(Args::try_parse_from(["office-mcp", "--app", "word"]).is_err());
    }

    #[test]
    fn test_workspace_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::document(AppKind::Powerpoint, dir.path().join("decks"));
        config.prepare_workspace().unwrap();
        assert!(dir.path().join("decks/templates").is_dir());
        assert_eq!(config.workspace_path("a.pptx"), dir.path().join("decks/a.pptx"));
        let absolute = dir.path().join("b.pptx");
        assert_eq!(config.workspace_path(absolute.to_str().unwrap()), absolute);
    }
}
