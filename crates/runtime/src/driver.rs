//! Playwright driver discovery and browser installation.
//!
//! Locating the Node.js driver follows the same search order as the
//! official language bindings: explicit environment overrides first,
//! then npm installations as a development fallback.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Get the path to the Playwright driver executable.
///
/// Search order:
/// 1. `PLAYWRIGHT_NODE_EXE` and `PLAYWRIGHT_CLI_JS` environment variables
/// 2. `PLAYWRIGHT_DRIVER_PATH` environment variable
/// 3. Global npm installation (`npm root -g`)
/// 4. Local npm installation (`npm root`)
///
/// Returns a tuple of (node_executable_path, cli_js_path).
///
/// # Errors
///
/// Returns `Error::DriverNotFound` if the driver cannot be located in any
/// of the search paths.
pub fn get_driver_executable() -> Result<(PathBuf, PathBuf)> {
    if let Some((node, cli)) = try_node_cli_env() {
        let usable = node_is_usable(&node);
        debug!(node = %node.display(), cli = %cli.display(), usable, "env node/cli candidate");
        if usable {
            return Ok((node, cli));
        }
        warn!(
            node = %node.display(),
            "PLAYWRIGHT_NODE_EXE is set but node is not runnable; falling back"
        );
    }

    if let Some((node, cli)) = try_driver_path_env() {
        let usable = node_is_usable(&node);
        debug!(node = %node.display(), cli = %cli.display(), usable, "PLAYWRIGHT_DRIVER_PATH candidate");
        if usable {
            return Ok((node, cli));
        }
        warn!(
            node = %node.display(),
            "PLAYWRIGHT_DRIVER_PATH is set but node is not runnable; falling back"
        );
    }

    if let Some((node, cli)) = try_npm_root(true) {
        if node_is_usable(&node) {
            return Ok((node, cli));
        }
    }

    if let Some((node, cli)) = try_npm_root(false) {
        if node_is_usable(&node) {
            return Ok((node, cli));
        }
    }

    Err(Error::DriverNotFound)
}

/// Install browser binaries for the given engine by running
/// `node cli.js install <engine>`.
///
/// This blocks until the installer exits and may download hundreds of
/// megabytes. Installer output is forwarded to the tracing log at debug
/// level.
///
/// # Errors
///
/// Returns `Error::InstallFailed` if the installer exits non-zero, or
/// `Error::DriverNotFound` if the driver cannot be located.
pub async fn install_browser(engine: &str) -> Result<()> {
    let (node_exe, cli_js) = get_driver_executable()?;

    let mut child = tokio::process::Command::new(&node_exe)
        .arg(&cli_js)
        .arg("install")
        .arg(engine)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::InstallFailed(format!("failed to spawn installer: {e}")))?;

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(target: "qrm::install", "{line}");
        }
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| Error::InstallFailed(format!("installer did not exit cleanly: {e}")))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::InstallFailed(format!(
            "installer exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }
}

/// Try `PLAYWRIGHT_NODE_EXE` and `PLAYWRIGHT_CLI_JS` environment variables.
fn try_node_cli_env() -> Option<(PathBuf, PathBuf)> {
    let (node_exe, cli_js) = (
        std::env::var("PLAYWRIGHT_NODE_EXE").ok()?,
        std::env::var("PLAYWRIGHT_CLI_JS").ok()?,
    );
    let node_path = PathBuf::from(node_exe);
    let cli_path = PathBuf::from(cli_js);

    if node_path.exists() && cli_path.exists() {
        Some((node_path, cli_path))
    } else {
        None
    }
}

/// Try the `PLAYWRIGHT_DRIVER_PATH` environment variable.
fn try_driver_path_env() -> Option<(PathBuf, PathBuf)> {
    let driver_dir = PathBuf::from(std::env::var("PLAYWRIGHT_DRIVER_PATH").ok()?);
    let node_exe = if cfg!(windows) {
        driver_dir.join("node.exe")
    } else {
        driver_dir.join("node")
    };
    let cli_js = driver_dir.join("package").join("cli.js");

    if node_exe.exists() && cli_js.exists() {
        Some((node_exe, cli_js))
    } else {
        None
    }
}

/// Try an npm installation (global when `global` is true, local otherwise).
fn try_npm_root(global: bool) -> Option<(PathBuf, PathBuf)> {
    let mut cmd = Command::new("npm");
    cmd.arg("root");
    if global {
        cmd.arg("-g");
    }
    let output = cmd.output().ok()?;
    if !output.status.success() {
        return None;
    }

    let npm_root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let node_modules = PathBuf::from(npm_root);
    if !node_modules.exists() {
        return None;
    }

    find_playwright_in_node_modules(&node_modules)
}

fn node_is_usable(node: &Path) -> bool {
    Command::new(node)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Find the Playwright CLI in a node_modules directory.
fn find_playwright_in_node_modules(node_modules: &Path) -> Option<(PathBuf, PathBuf)> {
    let playwright_dirs = [
        node_modules.join("playwright"),
        node_modules.join("@playwright").join("test"),
    ];

    for playwright_dir in &playwright_dirs {
        let cli_js = playwright_dir.join("cli.js");
        if !cli_js.exists() {
            continue;
        }

        if let Some(node_exe) = find_node_executable() {
            return Some((node_exe, cli_js));
        }
    }

    None
}

/// Find the node executable in PATH or common locations.
fn find_node_executable() -> Option<PathBuf> {
    #[cfg(not(windows))]
    let which_cmd = "which";
    #[cfg(windows)]
    let which_cmd = "where";

    if let Ok(output) = Command::new(which_cmd).arg("node").output() {
        if output.status.success() {
            let node_path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if let Some(first) = node_path.lines().next() {
                let path = PathBuf::from(first);
                if path.exists() {
                    return Some(path);
                }
            }
        }
    }

    #[cfg(not(windows))]
    let common_locations = [
        "/usr/local/bin/node",
        "/usr/bin/node",
        "/opt/homebrew/bin/node",
        "/opt/local/bin/node",
    ];

    #[cfg(windows)]
    let common_locations = [
        "C:\\Program Files\\nodejs\\node.exe",
        "C:\\Program Files (x86)\\nodejs\\node.exe",
    ];

    common_locations
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_node_does_not_panic() {
        match find_node_executable() {
            Some(node_path) => assert!(node_path.exists()),
            None => println!("Node.js not found (expected if Node.js not installed)"),
        }
    }

    #[test]
    fn driver_lookup_does_not_panic() {
        match get_driver_executable() {
            Ok((node, cli)) => {
                assert!(node.exists());
                assert!(cli.exists());
            }
            Err(Error::DriverNotFound) => {
                println!("Playwright driver not found (expected in some environments)");
            }
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }
}
