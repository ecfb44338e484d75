//! Driver process lifecycle.
//!
//! Spawns the Playwright Node.js driver in `run-driver` mode and manages
//! its shutdown. Protocol traffic flows over the child's stdio pipes via
//! the transport layer.

use tokio::process::{Child, Command};

use crate::driver::get_driver_executable;
use crate::error::{Error, Result};

/// A running Playwright driver child process.
#[derive(Debug)]
pub struct DriverProcess {
    /// The driver child process. Public so the connection layer can take
    /// the stdio pipes.
    pub process: Child,
}

impl DriverProcess {
    /// Launch the driver process with `node <driver>/cli.js run-driver`.
    ///
    /// # Errors
    ///
    /// Returns `Error::DriverNotFound` if the driver cannot be located and
    /// `Error::LaunchFailed` if the process fails to start or exits
    /// immediately.
    pub async fn launch() -> Result<Self> {
        let (node_exe, cli_js) = get_driver_executable()?;

        let mut cmd = Command::new(&node_exe);
        cmd.arg(&cli_js)
            .arg("run-driver")
            .env("PW_LANG_NAME", "rust")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit());

        // Pass through the browser cache location so provisioned binaries
        // are found by the driver.
        if let Ok(browsers_path) = std::env::var("PLAYWRIGHT_BROWSERS_PATH") {
            cmd.env("PLAYWRIGHT_BROWSERS_PATH", browsers_path);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::LaunchFailed(format!("Failed to spawn process: {e}")))?;

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        match child.try_wait() {
            Ok(Some(status)) => Err(Error::LaunchFailed(format!(
                "Driver process exited immediately with status: {status}"
            ))),
            Ok(None) => Ok(Self { process: child }),
            Err(e) => Err(Error::LaunchFailed(format!(
                "Failed to check process status: {e}"
            ))),
        }
    }

    /// Shut down the driver, killing the process and waiting for it to exit.
    pub async fn shutdown(mut self) -> Result<()> {
        #[cfg(windows)]
        {
            // tokio uses a blocking threadpool for child stdio on Windows;
            // pipes must be closed before the kill or the wait can hang.
            drop(self.process.stdin.take());
            drop(self.process.stdout.take());
            drop(self.process.stderr.take());
        }

        self.process
            .kill()
            .await
            .map_err(|e| Error::LaunchFailed(format!("Failed to kill process: {e}")))?;

        let _ = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            self.process.wait(),
        )
        .await;

        Ok(())
    }

    /// Best-effort synchronous kill, usable from Drop impls.
    pub fn start_kill(&mut self) {
        #[cfg(windows)]
        {
            drop(self.process.stdin.take());
            drop(self.process.stdout.take());
            drop(self.process.stderr.take());
        }

        if let Err(e) = self.process.start_kill() {
            tracing::warn!("Failed to kill driver process: {e}");
        }
    }
}
