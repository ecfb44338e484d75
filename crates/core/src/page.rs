// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Page - one tab inside a browser context.

use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use qrm_runtime::{Connection, Error, Result};

use crate::options::{GotoOptions, ScreenshotOptions};

/// A single page. Navigation is delegated to the page's main frame, as
/// the protocol requires.
#[derive(Clone)]
pub struct Page {
    connection: Arc<Connection>,
    guid: String,
    main_frame_guid: String,
}

impl Page {
    pub(crate) fn new(connection: Arc<Connection>, guid: String, main_frame_guid: String) -> Self {
        Self {
            connection,
            guid,
            main_frame_guid,
        }
    }

    /// Navigates the main frame to `url`.
    ///
    /// # Errors
    ///
    /// Surfaces the driver's navigation error (DNS failure, timeout,
    /// aborted load) as `Error::Remote`.
    pub async fn goto(&self, url: &str, options: GotoOptions) -> Result<()> {
        let mut params = serde_json::to_value(&options)?;
        params["url"] = serde_json::Value::String(url.to_string());

        self.connection
            .send(&self.main_frame_guid, "goto", params)
            .await
            .map(|_| ())
    }

    /// The page's current URL, tracked through frame navigation events.
    ///
    /// After a redirecting navigation this is the final resolved URL.
    pub fn url(&self) -> String {
        self.connection
            .object(&self.main_frame_guid)
            .ok()
            .and_then(|frame| frame.state["url"].as_str().map(str::to_string))
            .unwrap_or_else(|| "about:blank".to_string())
    }

    /// Captures a screenshot and returns the raw image bytes.
    pub async fn screenshot(&self, options: ScreenshotOptions) -> Result<Vec<u8>> {
        let params = serde_json::to_value(&options)?;
        let response = self.connection.send(&self.guid, "screenshot", params).await?;

        let binary = response["binary"].as_str().ok_or_else(|| {
            Error::Protocol("screenshot response missing 'binary'".to_string())
        })?;

        BASE64
            .decode(binary)
            .map_err(|e| Error::Protocol(format!("screenshot payload is not base64: {e}")))
    }

    /// Captures a screenshot and writes it to `path`, creating parent
    /// directories as needed. An existing file is overwritten.
    pub async fn screenshot_to_file(
        &self,
        path: &Path,
        options: ScreenshotOptions,
    ) -> Result<()> {
        let bytes = self.screenshot(options).await?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("guid", &self.guid)
            .field("main_frame", &self.main_frame_guid)
            .finish()
    }
}
