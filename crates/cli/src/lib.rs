//! QR Mobile application core.
//!
//! Decodes QR codes from image files or a live webcam and opens URL
//! payloads in a device-emulating browser session. Everything the `qrm`
//! binary does goes through this crate so integration tests can drive
//! the same paths.

pub mod camera;
pub mod capture;
pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod provision;
pub mod qr;
pub mod registry;
pub mod report;
pub mod scan;
pub mod session;
pub mod worker;

pub use error::{QrmError, Result};
