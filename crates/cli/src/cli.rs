use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use qrm::Engine;

#[derive(Parser, Debug)]
#[command(name = "qrm")]
#[command(about = "QR Mobile - scan a QR code and open it like a phone")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Browser engine to emulate the device in
    #[arg(short, long, global = true, value_enum, default_value = "chromium")]
    pub engine: EngineKind,

    /// Device profile to emulate
    #[arg(short, long, global = true, default_value = "iPhone 13", value_name = "NAME")]
    pub device: String,

    /// Where to write the full-page screenshot
    #[arg(long, global = true, value_name = "FILE")]
    pub screenshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Browser engine choice (clap-compatible enum)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl From<EngineKind> for Engine {
    fn from(kind: EngineKind) -> Self {
        match kind {
            EngineKind::Chromium => Engine::Chromium,
            EngineKind::Firefox => Engine::Firefox,
            EngineKind::Webkit => Engine::Webkit,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a QR code from an image file and open it as a phone
    #[command(alias = "file")]
    ScanFile {
        /// Image file holding the QR code
        path: PathBuf,
    },

    /// Watch the webcam until a QR code is decoded, then open it
    #[command(alias = "camera")]
    ScanCamera {
        /// Camera index to open
        #[arg(long, default_value_t = 0)]
        camera: u32,
    },

    /// Open a URL directly in an emulated phone browser
    Open {
        /// URL or text content to handle
        url: String,
    },

    /// List available device profiles
    Devices,
}

/// Default screenshot location: the desktop when one exists, otherwise
/// the home directory.
pub fn default_screenshot_path() -> PathBuf {
    let base = dirs::home_dir()
        .map(|home| {
            let desktop = home.join("Desktop");
            if desktop.is_dir() { desktop } else { home }
        })
        .unwrap_or_default();
    base.join("QRMobile_screenshot.png")
}
