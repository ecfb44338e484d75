//! Runtime layer for driving the Playwright Node.js driver.
//!
//! This crate owns everything below the typed API: locating the driver
//! (`driver`), spawning and reaping the driver process (`server`), the
//! length-prefixed JSON pipe transport (`transport`), and the
//! request/response connection with its remote-object registry
//! (`connection`).

pub mod connection;
pub mod driver;
pub mod error;
pub mod server;
pub mod transport;

pub use connection::Connection;
pub use error::{Error, Result};
pub use server::DriverProcess;
pub use transport::PipeTransport;
