// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// BrowserType - represents one browser engine (chromium, firefox, webkit).

use std::sync::Arc;
use std::time::Duration;

use qrm_runtime::{Connection, Error, Result};

use crate::browser::Browser;
use crate::options::LaunchOptions;

/// Handle on one of the driver's browser engines.
pub struct BrowserType {
    connection: Arc<Connection>,
    guid: String,
    name: String,
    executable_path: String,
}

impl BrowserType {
    /// Builds the handle from the registry entry for `guid`.
    pub(crate) fn from_connection(connection: Arc<Connection>, guid: String) -> Result<Self> {
        let object = connection.object(&guid)?;

        let name = object.state["name"]
            .as_str()
            .ok_or_else(|| Error::Protocol("BrowserType initializer missing 'name'".to_string()))?
            .to_string();
        let executable_path = object.state["executablePath"]
            .as_str()
            .ok_or_else(|| {
                Error::Protocol("BrowserType initializer missing 'executablePath'".to_string())
            })?
            .to_string();

        Ok(Self {
            connection,
            guid,
            name,
            executable_path,
        })
    }

    /// The engine name ("chromium", "firefox", or "webkit").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path to the engine binary the driver would launch.
    pub fn executable_path(&self) -> &str {
        &self.executable_path
    }

    /// Launches a browser instance.
    ///
    /// # Errors
    ///
    /// Fails when the engine binary is missing or the launch times out;
    /// a missing binary is the signal the provisioner keys off.
    pub async fn launch(&self, options: LaunchOptions) -> Result<Browser> {
        let params = serde_json::to_value(&options)?;
        let response = self.connection.send(&self.guid, "launch", params).await?;

        let browser_guid = response["browser"]["guid"]
            .as_str()
            .ok_or_else(|| Error::Protocol("launch response missing 'browser.guid'".to_string()))?;

        self.connection
            .wait_for_object(browser_guid, Duration::from_secs(10))
            .await?;

        Ok(Browser::new(
            Arc::clone(&self.connection),
            browser_guid.to_string(),
        ))
    }
}

impl std::fmt::Debug for BrowserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserType")
            .field("guid", &self.guid)
            .field("name", &self.name)
            .field("executable_path", &self.executable_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exposes_name_and_executable_from_initializer() {
        let connection = Connection::new();
        connection.dispatch(json!({
            "guid": "",
            "method": "__create__",
            "params": {
                "type": "BrowserType",
                "guid": "browser-type@chromium",
                "initializer": {
                    "name": "chromium",
                    "executablePath": "/opt/chromium/chrome"
                }
            }
        }));

        let browser_type =
            BrowserType::from_connection(connection, "browser-type@chromium".to_string()).unwrap();
        assert_eq!(browser_type.name(), "chromium");
        assert_eq!(browser_type.executable_path(), "/opt/chromium/chrome");
    }

    #[test]
    fn incomplete_initializer_is_a_protocol_error() {
        let connection = Connection::new();
        connection.dispatch(json!({
            "guid": "",
            "method": "__create__",
            "params": {
                "type": "BrowserType",
                "guid": "browser-type@firefox",
                "initializer": {"name": "firefox"}
            }
        }));

        assert!(
            BrowserType::from_connection(connection, "browser-type@firefox".to_string()).is_err()
        );
    }
}
