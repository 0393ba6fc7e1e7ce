//! Subprocess management and JSON IPC for the COM bridge process.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use office_com_protocol::{App, Command as BridgeCommand, Request, Response, ResponseData, ResponseResult};
use tracing::{debug, info, warn};

/// Name of the bridge executable
pub const BRIDGE_EXE: &str = "office-com-bridge.exe";

/// Errors from the Office COM bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to spawn bridge process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Bridge process not running")]
    NotRunning,

    #[error("Failed to send command to bridge: {0}")]
    SendFailed(String),

    #[error("Failed to read response from bridge: {0}")]
    ReadFailed(String),

    #[error("Bridge did not answer within {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The application raised an error for this command
    #[error("{0}")]
    Command(String),

    #[error("Unexpected response data")]
    UnexpectedResponse,

    #[error("Launcher '{0}' not found. Install WINE and ensure it is in PATH.")]
    LauncherNotFound(String),

    #[error("Bridge executable not found at: {0}")]
    BridgeExeNotFound(String),

    #[error("Could not connect to {0}. Please ensure it is running.")]
    Connection(App),
}

impl BridgeError {
    /// The pipe to the bridge is gone, as opposed to a command failing
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BridgeError::NotRunning
                | BridgeError::SendFailed(_)
                | BridgeError::ReadFailed(_)
                | BridgeError::Timeout(_)
        )
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Configuration for the Office COM bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Path to `office-com-bridge.exe`. If None, searched for next to the
    /// current binary and in the cross-compile target directories.
    pub bridge_exe_path: Option<PathBuf>,

    /// Program that runs the bridge, e.g. `wine`. None runs it directly.
    pub launcher: Option<PathBuf>,

    /// Optional WINEPREFIX to use (for isolating the WINE environment).
    pub wine_prefix: Option<PathBuf>,

    /// Timeout for waiting for bridge responses.
    pub timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bridge_exe_path: None,
            launcher: default_launcher(),
            wine_prefix: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// `wine` everywhere but Windows
pub fn default_launcher() -> Option<PathBuf> {
    if cfg!(windows) {
        None
    } else {
        Some(PathBuf::from("wine"))
    }
}

/// One line out, one line back.
///
/// The process implementation talks to a real bridge; tests script one.
pub trait Channel: Send {
    fn send_line(&mut self, line: &str) -> BridgeResult<()>;
    fn receive_line(&mut self, timeout: Duration) -> BridgeResult<String>;
    /// Stop the other end; called on shutdown and before a restart replaces it
    fn close(&mut self) {}
}

/// Builds a fresh channel, used at start and when the bridge has to be restarted
pub type ChannelFactory = Box<dyn Fn() -> BridgeResult<Box<dyn Channel>> + Send + Sync>;

/// The bridge as a child process
pub struct ProcessChannel {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<std::io::Result<String>>,
}

impl ProcessChannel {
    pub fn spawn(config: &BridgeConfig) -> BridgeResult<Self> {
        let exe_path = config.bridge_exe_path.clone().unwrap_or_else(find_bridge_exe);
        if !exe_path.exists() {
            return Err(BridgeError::BridgeExeNotFound(exe_path.display().to_string()));
        }

        let mut cmd = match &config.launcher {
            Some(launcher) => {
                let mut cmd = std::process::Command::new(launcher);
                cmd.arg(&exe_path);
                cmd
            }
            None => std::process::Command::new(&exe_path),
        };
        if let Some(prefix) = &config.wine_prefix {
            cmd.env("WINEPREFIX", prefix);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit()); // Bridge diagnostics go to our stderr

        let mut child = cmd.spawn().map_err(|e| match (&config.launcher, e.kind()) {
            (Some(launcher), std::io::ErrorKind::NotFound) => {
                BridgeError::LauncherNotFound(launcher.display().to_string())
            }
            _ => BridgeError::SpawnFailed(e),
        })?;
        let stdin = child.stdin.take().ok_or(BridgeError::NotRunning)?;
        let stdout = child.stdout.take().ok_or(BridgeError::NotRunning)?;

        // Blocking reads happen on their own thread so a hung bridge can time out
        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });

        info!("started bridge {}", exe_path.display());
        Ok(Self {
            child,
            stdin,
            lines,
        })
    }
}

impl Channel for ProcessChannel {
    fn send_line(&mut self, line: &str) -> BridgeResult<()> {
        writeln!(self.stdin, "{line}").map_err(|e| BridgeError::SendFailed(e.to_string()))?;
        self.stdin
            .flush()
            .map_err(|e| BridgeError::SendFailed(e.to_string()))
    }

    fn receive_line(&mut self, timeout: Duration) -> BridgeResult<String> {
        match self.lines.recv_timeout(timeout) {
            Ok(Ok(line)) => Ok(line),
            Ok(Err(e)) => Err(BridgeError::ReadFailed(e.to_string())),
            Err(RecvTimeoutError::Timeout) => Err(BridgeError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(BridgeError::NotRunning),
        }
    }

    fn close(&mut self) {
        // kill fails once the child has exited; wait still reaps it
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// The main handle for communicating with the Office COM bridge.
///
/// Every call first pings the application. The bridge re-attaches once when
/// the application stopped answering; when the bridge process itself is gone
/// it is restarted once.
pub struct ComBridge {
    app: App,
    timeout: Duration,
    factory: ChannelFactory,
    channel: Mutex<Box<dyn Channel>>,
    next_id: AtomicU64,
}

impl ComBridge {
    /// Start the bridge process and attach to the application.
    pub fn start(config: BridgeConfig, app: App) -> BridgeResult<Self> {
        let timeout = config.timeout;
        let factory: ChannelFactory = Box::new(move || {
            let channel: Box<dyn Channel> = Box::new(ProcessChannel::spawn(&config)?);
            Ok(channel)
        });
        Self::with_channel(app, timeout, factory)
    }

    /// Attach through channels built by `factory`
    pub fn with_channel(app: App, timeout: Duration, factory: ChannelFactory) -> BridgeResult<Self> {
        let channel = factory()?;
        let bridge = Self {
            app,
            timeout,
            factory,
            channel: Mutex::new(channel),
            next_id: AtomicU64::new(1),
        };
        {
            let mut channel = bridge.lock()?;
            bridge
                .exchange(channel.as_mut(), BridgeCommand::Init { app })
                .map_err(|e| bridge.connection_error(e))?;
        }
        Ok(bridge)
    }

    pub fn app(&self) -> App {
        self.app
    }

    fn lock(&self) -> BridgeResult<MutexGuard<'_, Box<dyn Channel>>> {
        self.channel.lock().map_err(|_| BridgeError::NotRunning)
    }

    fn connection_error(&self, err: BridgeError) -> BridgeError {
        warn!("{} connection failed: {err}", self.app);
        BridgeError::Connection(self.app)
    }

    /// Send a command to the bridge and wait for the response.
    fn exchange(
        &self,
        channel: &mut dyn Channel,
        command: BridgeCommand,
    ) -> BridgeResult<Option<ResponseData>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request { id, command };
        let json = serde_json::to_string(&request)?;
        debug!("-> {json}");
        channel.send_line(&json)?;

        loop {
            let line = channel.receive_line(self.timeout)?;
            if line.is_empty() {
                return Err(BridgeError::NotRunning);
            }
            let response: Response = serde_json::from_str(&line)?;
            // answer to an earlier request that timed out
            if response.id < id {
                debug!("dropping late response to request {}", response.id);
                continue;
            }
            if response.id != id {
                return Err(BridgeError::ReadFailed(format!(
                    "response id {} does not match request {id}",
                    response.id
                )));
            }
            return match response.result {
                ResponseResult::Ok { data } => Ok(data),
                ResponseResult::Error { message } => Err(BridgeError::Command(message)),
            };
        }
    }

    /// Make sure the application answers, restarting the bridge once if the
    /// process died
    fn ensure_connected(&self, channel: &mut Box<dyn Channel>) -> BridgeResult<()> {
        match self.exchange(channel.as_mut(), BridgeCommand::Ping) {
            Ok(_) => Ok(()),
            Err(err) if err.is_transport() => {
                warn!("bridge lost ({err}), restarting once");
                channel.close();
                let mut fresh = (self.factory)().map_err(|e| self.connection_error(e))?;
                self.exchange(fresh.as_mut(), BridgeCommand::Init { app: self.app })
                    .map_err(|e| self.connection_error(e))?;
                *channel = fresh;
                Ok(())
            }
            Err(err) => Err(self.connection_error(err)),
        }
    }

    /// Send one command after checking the connection.
    pub fn call(&self, command: BridgeCommand) -> BridgeResult<Option<ResponseData>> {
        let mut channel = self.lock()?;
        self.ensure_connected(&mut channel)?;
        self.exchange(channel.as_mut(), command)
    }

    /// Send a command that must come back with data.
    pub(crate) fn call_for(&self, command: BridgeCommand) -> BridgeResult<ResponseData> {
        self.call(command)?.ok_or(BridgeError::UnexpectedResponse)
    }

    /// Shut down the bridge: release COM and terminate the process. The
    /// application itself stays open.
    pub fn shutdown(self) -> BridgeResult<()> {
        let mut channel = self.lock()?;
        let _ = self.exchange(channel.as_mut(), BridgeCommand::Shutdown);
        channel.close();
        Ok(())
    }
}

/// Convert a Linux filesystem path to a WINE (Windows) path.
///
/// WINE maps `/` to `Z:\`, so `/home/user/file.xlsx` becomes `Z:\home\user\file.xlsx`.
pub fn linux_to_wine_path(linux_path: &Path) -> String {
    let abs = if linux_path.is_absolute() {
        linux_path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(linux_path)
    };

    // WINE maps the root filesystem to Z:
    format!("Z:{}", abs.display()).replace('/', "\\")
}

/// Path as the application should see it: WINE form when a launcher is in use
pub fn host_to_app_path(path: &Path, launcher: Option<&Path>) -> String {
    match launcher {
        Some(_) => linux_to_wine_path(path),
        None => path.display().to_string(),
    }
}

/// Attempt to locate the bridge exe relative to the current executable or in common paths.
pub fn find_bridge_exe() -> PathBuf {
    // Check next to the current executable
    if let Ok(mut exe) = std::env::current_exe() {
        exe.pop();
        let candidate = exe.join(BRIDGE_EXE);
        if candidate.exists() {
            return candidate;
        }
    }

    // Check in the target directory (for development)
    for profile in ["release", "debug"] {
        let target_path = PathBuf::from(format!("target/x86_64-pc-windows-gnu/{profile}/{BRIDGE_EXE}"));
        if target_path.exists() {
            return target_path;
        }
    }

    // Default: assume it's in the current directory
    PathBuf::from(BRIDGE_EXE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_to_wine_path() {
        assert_eq!(
            linux_to_wine_path(Path::new("/home/user/book.xlsx")),
            "Z:\\home\\user\\book.xlsx"
        );
        assert_eq!(
            host_to_app_path(Path::new("/tmp/a.pptx"), None),
            "/tmp/a.pptx"
        );
        assert_eq!(
            host_to_app_path(Path::new("/tmp/a.pptx"), Some(Path::new("wine"))),
            "Z:\\tmp\\a.pptx"
        );
    }

    #[test]
    fn test_transport_errors() {
        assert!(BridgeError::NotRunning.is_transport());
        assert!(BridgeError::Timeout(Duration::from_secs(1)).is_transport());
        assert!(!BridgeError::Command("bad range".into()).is_transport());
        assert_eq!(
            BridgeError::Connection(App::Excel).to_string(),
            "Could not connect to Excel. Please ensure it is running."
        );
    }
}
