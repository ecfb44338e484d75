// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0

//! Typed Playwright surface for QR Mobile.
//!
//! Exposes exactly the slice of the Playwright protocol the application
//! needs: launching the driver, the three browser engines, device
//! emulation contexts, navigation and full-page screenshots.
//!
//! # Example
//!
//! ```ignore
//! let playwright = Playwright::launch().await?;
//! let profile = playwright.devices().get("iPhone 13").unwrap();
//! let browser = playwright
//!     .browser_type(Engine::Chromium)?
//!     .launch(LaunchOptions::default().headless(false))
//!     .await?;
//! let context = browser
//!     .new_context(ContextOptions::from_device(profile))
//!     .await?;
//! let page = context.new_page().await?;
//! page.goto("https://example.com", GotoOptions::default()).await?;
//! context.close().await?;
//! browser.close().await?;
//! playwright.shutdown().await?;
//! ```

mod browser;
mod browser_context;
mod browser_type;
mod devices;
mod engine;
mod options;
mod page;
mod playwright;

pub use browser::Browser;
pub use browser_context::BrowserContext;
pub use browser_type::BrowserType;
pub use devices::{DeviceCatalog, DeviceProfile};
pub use engine::Engine;
pub use options::{ContextOptions, GotoOptions, LaunchOptions, ScreenshotOptions, Viewport, WaitUntil};
pub use page::Page;
pub use playwright::Playwright;

pub use qrm_runtime::driver;
pub use qrm_runtime::{Error, Result};
