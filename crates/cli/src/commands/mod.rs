mod devices;
mod open;
mod scan_camera;
mod scan_file;

use std::path::PathBuf;

use qrm::Engine;

use crate::cli::{self, Cli, Commands};
use crate::error::{QrmError, Result};
use crate::report::Reporter;
use crate::worker::WorkerGate;

/// Settings shared by every command.
pub struct CommandContext {
    pub engine: Engine,
    pub device: String,
    pub screenshot_path: PathBuf,
    pub reporter: Reporter,
}

/// Gate shared by every operation in this process.
static PROCESS_GATE: WorkerGate = WorkerGate::new();

pub async fn dispatch(cli: Cli) -> Result<()> {
    // One operation at a time; the permit is released on every exit path.
    let _permit = PROCESS_GATE.begin().ok_or(QrmError::Busy)?;

    let Cli {
        verbose: _,
        engine,
        device,
        screenshot,
        command,
    } = cli;

    let ctx = CommandContext {
        engine: engine.into(),
        device,
        screenshot_path: screenshot.unwrap_or_else(cli::default_screenshot_path),
        reporter: Reporter::stdout(),
    };

    match command {
        Commands::ScanFile { path } => scan_file::execute(&path, &ctx).await,
        Commands::ScanCamera { camera } => scan_camera::execute(camera, &ctx).await,
        Commands::Open { url } => open::execute(&url, &ctx).await,
        Commands::Devices => devices::execute(&ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn dispatch_fails_fast_while_gate_is_held() {
        let _permit = PROCESS_GATE.begin().unwrap();

        let cli = Cli::try_parse_from(["qrm", "devices"]).unwrap();
        let err = dispatch(cli).await.unwrap_err();
        assert!(matches!(err, QrmError::Busy));
    }
}
