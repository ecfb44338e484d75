// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// BrowserContext - an isolated browser session.

use std::sync::Arc;
use std::time::Duration;

use qrm_runtime::{Connection, Error, Result};

use crate::page::Page;

/// An isolated browser context carrying the device emulation options it
/// was created with.
///
/// Contexts must be closed before the browser that owns them.
#[derive(Clone)]
pub struct BrowserContext {
    connection: Arc<Connection>,
    guid: String,
}

impl BrowserContext {
    pub(crate) fn new(connection: Arc<Connection>, guid: String) -> Self {
        Self { connection, guid }
    }

    /// Opens a new page in this context.
    pub async fn new_page(&self) -> Result<Page> {
        let response = self
            .connection
            .send(&self.guid, "newPage", serde_json::json!({}))
            .await?;

        let page_guid = response["page"]["guid"]
            .as_str()
            .ok_or_else(|| Error::Protocol("newPage response missing 'page.guid'".to_string()))?;

        let page = self
            .connection
            .wait_for_object(page_guid, Duration::from_secs(10))
            .await?;

        let main_frame_guid = page.state["mainFrame"]["guid"]
            .as_str()
            .ok_or_else(|| {
                Error::Protocol("Page initializer missing 'mainFrame.guid'".to_string())
            })?
            .to_string();

        Ok(Page::new(
            Arc::clone(&self.connection),
            page_guid.to_string(),
            main_frame_guid,
        ))
    }

    /// Closes the context and all of its pages.
    pub async fn close(&self) -> Result<()> {
        self.connection
            .send(&self.guid, "close", serde_json::json!({}))
            .await
            .map(|_| ())
    }
}

impl std::fmt::Debug for BrowserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserContext")
            .field("guid", &self.guid)
            .finish()
    }
}
