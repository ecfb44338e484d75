// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Browser - a launched browser process.

use std::sync::Arc;
use std::time::Duration;

use qrm_runtime::{Connection, Error, Result};

use crate::browser_context::BrowserContext;
use crate::options::ContextOptions;

/// A launched browser instance.
#[derive(Clone)]
pub struct Browser {
    connection: Arc<Connection>,
    guid: String,
}

impl Browser {
    pub(crate) fn new(connection: Arc<Connection>, guid: String) -> Self {
        Self { connection, guid }
    }

    /// The browser version string, when the driver reported one.
    pub fn version(&self) -> Option<String> {
        self.connection
            .object(&self.guid)
            .ok()
            .and_then(|object| object.state["version"].as_str().map(str::to_string))
    }

    /// Creates an isolated browser context with the given options.
    pub async fn new_context(&self, options: ContextOptions) -> Result<BrowserContext> {
        let params = serde_json::to_value(&options)?;
        let response = self
            .connection
            .send(&self.guid, "newContext", params)
            .await?;

        let context_guid = response["context"]["guid"].as_str().ok_or_else(|| {
            Error::Protocol("newContext response missing 'context.guid'".to_string())
        })?;

        self.connection
            .wait_for_object(context_guid, Duration::from_secs(10))
            .await?;

        Ok(BrowserContext::new(
            Arc::clone(&self.connection),
            context_guid.to_string(),
        ))
    }

    /// Closes the browser and all of its contexts.
    pub async fn close(&self) -> Result<()> {
        self.connection
            .send(&self.guid, "close", serde_json::json!({}))
            .await
            .map(|_| ())
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser").field("guid", &self.guid).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn version_reads_registered_state() {
        let connection = Connection::new();
        connection.dispatch(json!({
            "guid": "",
            "method": "__create__",
            "params": {
                "type": "Browser",
                "guid": "browser@1",
                "initializer": {"version": "120.0.6099.28"}
            }
        }));

        let browser = Browser::new(Arc::clone(&connection), "browser@1".to_string());
        assert_eq!(browser.version().as_deref(), Some("120.0.6099.28"));
    }

    #[test]
    fn version_is_none_for_unregistered_browser() {
        let connection = Connection::new();
        let browser = Browser::new(connection, "browser@9".to_string());
        assert!(browser.version().is_none());
    }
}
