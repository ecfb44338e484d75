//! Mobile browser sessions.
//!
//! Opens a decoded payload in a headful browser emulating the selected
//! device. URL payloads are navigated to and captured as a full-page
//! screenshot; anything else is printed as text. The context is always
//! closed before its browser, on every exit path.

use std::path::Path;

use async_trait::async_trait;
use qrm::{
    Browser, BrowserContext, ContextOptions, DeviceCatalog, DeviceProfile, Engine, GotoOptions,
    LaunchOptions, Page, Playwright, ScreenshotOptions, WaitUntil,
};
use tracing::{debug, info, warn};

use crate::error::{QrmError, Result};
use crate::report::Reporter;
use crate::scan::ScanResult;

/// The browser-facing half of a session, behind a trait so the
/// navigate/screenshot/teardown sequence can be tested without a
/// driver.
#[async_trait]
pub trait SessionResources: Send {
    /// Navigates and returns the final URL after redirects.
    async fn goto(&mut self, url: &str) -> qrm::Result<String>;

    /// Writes a full-page screenshot to `path`.
    async fn screenshot(&mut self, path: &Path) -> qrm::Result<()>;

    async fn close_context(&mut self) -> qrm::Result<()>;

    async fn close_browser(&mut self) -> qrm::Result<()>;
}

/// Runs one session over already-opened resources and tears them down.
///
/// Teardown runs whether or not the session succeeded, context first,
/// then browser. A failed screenshot is reported but does not fail the
/// session.
pub async fn run_session(
    resources: &mut dyn SessionResources,
    scan: &ScanResult,
    screenshot_path: &Path,
    reporter: &Reporter,
) -> Result<()> {
    let outcome = drive(resources, scan, screenshot_path, reporter).await;

    if let Err(e) = resources.close_context().await {
        warn!(target: "qrm::session", error = %e, "context close failed");
    }
    if let Err(e) = resources.close_browser().await {
        warn!(target: "qrm::session", error = %e, "browser close failed");
    }

    outcome
}

async fn drive(
    resources: &mut dyn SessionResources,
    scan: &ScanResult,
    screenshot_path: &Path,
    reporter: &Reporter,
) -> Result<()> {
    if !scan.is_url() {
        reporter.say("QR content is not a URL. Text below:");
        reporter.say(&scan.payload);
        return Ok(());
    }

    reporter.say(format!("Opening: {}", scan.payload));
    let final_url = resources
        .goto(&scan.payload)
        .await
        .map_err(|source| QrmError::Navigation {
            url: scan.payload.clone(),
            source,
        })?;
    info!(target: "qrm::session", url = %final_url, "navigation complete");
    reporter.say(format!("Final URL: {final_url}"));

    match resources.screenshot(screenshot_path).await {
        Ok(()) => reporter.say(format!("Screenshot: {}", screenshot_path.display())),
        Err(e) => reporter.say(format!("Could not take a screenshot: {e}")),
    }

    Ok(())
}

/// Opens a device-emulating session and runs the payload through it.
///
/// The device profile is resolved before anything launches, so an
/// unknown device name fails regardless of payload kind. Non-URL
/// payloads still open the emulated context; the text is printed
/// instead of navigating.
pub async fn open_mobile(
    scan: &ScanResult,
    device_name: &str,
    engine: Engine,
    screenshot_path: &Path,
    reporter: &Reporter,
) -> Result<()> {
    let playwright = Playwright::launch().await?;
    let outcome = open_and_run(&playwright, scan, device_name, engine, screenshot_path, reporter).await;
    if let Err(e) = playwright.shutdown().await {
        warn!(target: "qrm::session", error = %e, "driver shutdown failed");
    }
    outcome
}

async fn open_and_run(
    playwright: &Playwright,
    scan: &ScanResult,
    device_name: &str,
    engine: Engine,
    screenshot_path: &Path,
    reporter: &Reporter,
) -> Result<()> {
    let profile = resolve_profile(playwright.devices(), device_name)?;
    debug!(target: "qrm::session", device = %profile.name, %engine, "launching session");

    let browser_type = playwright.browser_type(engine)?;
    debug!(
        target: "qrm::session",
        engine = browser_type.name(),
        executable = browser_type.executable_path(),
        "launching browser"
    );
    let browser = browser_type
        .launch(LaunchOptions::default().headless(false))
        .await
        .map_err(|e| QrmError::Session(format!("could not launch {engine}: {e}")))?;
    if let Some(version) = browser.version() {
        debug!(target: "qrm::session", %version, "browser launched");
    }

    let mut resources = match LiveResources::open(browser.clone(), &profile).await {
        Ok(resources) => resources,
        Err(e) => {
            if let Err(close_err) = browser.close().await {
                warn!(target: "qrm::session", error = %close_err, "browser close failed");
            }
            return Err(QrmError::Session(format!(
                "could not open device context: {e}"
            )));
        }
    };

    run_session(&mut resources, scan, screenshot_path, reporter).await
}

fn resolve_profile(catalog: &DeviceCatalog, name: &str) -> Result<DeviceProfile> {
    catalog
        .get(name)
        .cloned()
        .ok_or_else(|| QrmError::ProfileNotFound {
            name: name.to_string(),
        })
}

/// Real resources over a launched browser.
struct LiveResources {
    browser: Browser,
    context: BrowserContext,
    page: Page,
}

impl LiveResources {
    async fn open(browser: Browser, profile: &DeviceProfile) -> qrm::Result<Self> {
        let context = browser
            .new_context(ContextOptions::from_device(profile))
            .await?;
        let page = context.new_page().await?;
        Ok(Self {
            browser,
            context,
            page,
        })
    }
}

#[async_trait]
impl SessionResources for LiveResources {
    async fn goto(&mut self, url: &str) -> qrm::Result<String> {
        self.page
            .goto(url, GotoOptions::default().wait_until(WaitUntil::DomContentLoaded))
            .await?;
        Ok(self.page.url())
    }

    async fn screenshot(&mut self, path: &Path) -> qrm::Result<()> {
        self.page
            .screenshot_to_file(path, ScreenshotOptions::default().full_page(true))
            .await
    }

    async fn close_context(&mut self) -> qrm::Result<()> {
        self.context.close().await
    }

    async fn close_browser(&mut self) -> qrm::Result<()> {
        self.browser.close().await
    }
}
