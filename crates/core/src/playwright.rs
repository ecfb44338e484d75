// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Playwright - root protocol object.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use qrm_runtime::{Connection, DriverProcess, Error, PipeTransport, Result};

use crate::browser_type::BrowserType;
use crate::devices::DeviceCatalog;
use crate::engine::Engine;

/// Root handle over a running driver process.
///
/// Provides access to the three browser engines and the device catalog
/// announced during the protocol handshake. Dropping the handle kills
/// the driver; prefer calling [`Playwright::shutdown`] for a clean exit.
pub struct Playwright {
    connection: Arc<Connection>,
    /// Driver process, taken on shutdown
    server: Mutex<Option<DriverProcess>>,
    /// BrowserType guids keyed by engine
    browser_types: HashMap<Engine, String>,
    devices: DeviceCatalog,
}

impl Playwright {
    /// Launches the driver and performs the protocol handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver is missing, fails to start, or the
    /// handshake does not complete within 30 seconds.
    pub async fn launch() -> Result<Self> {
        let mut server = DriverProcess::launch().await?;

        let stdin = server
            .process
            .stdin
            .take()
            .ok_or_else(|| Error::LaunchFailed("Failed to get driver stdin".to_string()))?;
        let stdout = server
            .process
            .stdout
            .take()
            .ok_or_else(|| Error::LaunchFailed("Failed to get driver stdout".to_string()))?;

        let (transport, message_rx) = PipeTransport::new(stdin, stdout);
        let connection = Connection::new();

        let connection_for_loop = Arc::clone(&connection);
        tokio::spawn(async move {
            connection_for_loop.run(transport, message_rx).await;
        });

        tracing::debug!("initializing driver protocol");
        let response = tokio::time::timeout(Duration::from_secs(30), connection.initialize())
            .await
            .map_err(|_| Error::Timeout("driver initialization after 30 seconds".to_string()))??;

        let playwright_guid = response["playwright"]["guid"]
            .as_str()
            .ok_or_else(|| {
                Error::Protocol("initialize response missing 'playwright.guid'".to_string())
            })?
            .to_string();

        let root = connection
            .wait_for_object(&playwright_guid, Duration::from_secs(5))
            .await?;

        let mut browser_types = HashMap::new();
        for engine in Engine::ALL {
            let guid = root.state[engine.as_str()]["guid"]
                .as_str()
                .ok_or_else(|| {
                    Error::Protocol(format!(
                        "Playwright initializer missing '{}.guid'",
                        engine.as_str()
                    ))
                })?
                .to_string();
            browser_types.insert(engine, guid);
        }

        let devices = DeviceCatalog::from_descriptors(&root.state["deviceDescriptors"])?;
        tracing::debug!(profiles = devices.len(), "device catalog loaded");

        Ok(Self {
            connection,
            server: Mutex::new(Some(server)),
            browser_types,
            devices,
        })
    }

    /// Returns a handle for the given engine.
    pub fn browser_type(&self, engine: Engine) -> Result<BrowserType> {
        let guid = self
            .browser_types
            .get(&engine)
            .ok_or_else(|| Error::ObjectNotFound(engine.as_str().to_string()))?;
        BrowserType::from_connection(Arc::clone(&self.connection), guid.clone())
    }

    /// The device catalog announced by the driver.
    pub fn devices(&self) -> &DeviceCatalog {
        &self.devices
    }

    /// Shuts down the driver process.
    pub async fn shutdown(&self) -> Result<()> {
        let server = match self.server.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(server) = server {
            tracing::debug!("shutting down driver");
            server.shutdown().await?;
        }
        Ok(())
    }
}

impl Drop for Playwright {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.server.lock() {
            if let Some(server) = slot.as_mut() {
                tracing::debug!("drop: killing driver process");
                server.start_kill();
            }
        }
    }
}

impl std::fmt::Debug for Playwright {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playwright")
            .field("devices", &self.devices.len())
            .finish()
    }
}
