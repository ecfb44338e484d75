// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Protocol option structs. Field names serialize to the camelCase keys
// the driver expects; unset fields are omitted.

use serde::{Deserialize, Serialize};

use crate::devices::DeviceProfile;

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Options for `BrowserType::launch`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOptions {
    /// Whether to run the browser without a visible window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,

    /// Maximum launch time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

impl LaunchOptions {
    /// Sets headless mode.
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = Some(headless);
        self
    }

    /// Sets the launch timeout in milliseconds.
    pub fn timeout(mut self, timeout_ms: f64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }
}

/// When a navigation is considered finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    NetworkIdle,
    Commit,
}

/// Options for `Page::goto`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GotoOptions {
    /// Maximum navigation time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,

    /// When to consider navigation succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_until: Option<WaitUntil>,
}

impl GotoOptions {
    /// Sets the wait-until condition.
    pub fn wait_until(mut self, wait_until: WaitUntil) -> Self {
        self.wait_until = Some(wait_until);
        self
    }
}

/// Options for `Browser::new_context`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextOptions {
    /// Viewport dimensions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,

    /// User agent string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Device scale factor (default: 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_scale_factor: Option<f64>,

    /// Whether the meta viewport tag is honored and touch events enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mobile: Option<bool>,

    /// Whether the viewport supports touch events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_touch: Option<bool>,
}

impl ContextOptions {
    /// Builds context options emulating the given device profile.
    pub fn from_device(profile: &DeviceProfile) -> Self {
        Self {
            viewport: Some(profile.viewport),
            user_agent: Some(profile.user_agent.clone()),
            device_scale_factor: Some(profile.device_scale_factor),
            is_mobile: Some(profile.is_mobile),
            has_touch: Some(profile.has_touch),
        }
    }
}

/// Options for `Page::screenshot`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotOptions {
    /// Image format
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub screenshot_type: Option<ScreenshotType>,

    /// Capture the full scrollable page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_page: Option<bool>,

    /// Screenshot timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

impl ScreenshotOptions {
    /// Sets full-page capture.
    pub fn full_page(mut self, full_page: bool) -> Self {
        self.full_page = Some(full_page);
        self
    }
}

/// Screenshot image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotType {
    Png,
    Jpeg,
}
