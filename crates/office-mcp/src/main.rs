//! office-mcp: MCP server for Excel and PowerPoint
//!
//! ```bash
//! office-mcp --app excel --strategy document --workspace ./workbooks
//! office-mcp --app powerpoint --strategy live
//! ```
//!
//! Requests and responses use stdout; logs go to stderr (`RUST_LOG`, default
//! `office_mcp=info`).

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use office_mcp::{build_tools, Args, McpServer, ServerConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("office_mcp=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let config = ServerConfig::from_args(Args::parse());
    tracing::info!(
        app = ?config.app,
        strategy = ?config.strategy,
        workspace = %config.workspace.display(),
        "starting office-mcp"
    );

    config
        .prepare_workspace()
        .with_context(|| format!("creating workspace {}", config.workspace.display()))?;
    let tools = build_tools(&config).context("connecting the tool backend")?;

    let mut server = McpServer::new(tools);
    let stdin = io::stdin();
    server
        .run(stdin.lock(), io::stdout())
        .context("serving stdio")?;
    Ok(())
}
