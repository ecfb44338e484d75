//! Lazy device catalog.
//!
//! Fetching the catalog means starting a driver process, so the result
//! is cached for the life of the process. Profile lookups against the
//! cached catalog are pure.

use qrm::{DeviceCatalog, DeviceProfile, Playwright};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{QrmError, Result};

pub struct DeviceRegistry {
    catalog: OnceCell<DeviceCatalog>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self {
            catalog: OnceCell::new(),
        }
    }

    /// Registry seeded with a known catalog, skipping the driver. Test
    /// support.
    pub fn preloaded(catalog: DeviceCatalog) -> Self {
        Self {
            catalog: OnceCell::new_with(Some(catalog)),
        }
    }

    /// The catalog, fetching it from a short-lived driver session on
    /// first use.
    pub async fn catalog(&self) -> Result<&DeviceCatalog> {
        self.catalog
            .get_or_try_init(|| async {
                debug!(target: "qrm::devices", "fetching device catalog from driver");
                let playwright = Playwright::launch().await?;
                let catalog = playwright.devices().clone();
                playwright.shutdown().await?;
                Ok::<_, QrmError>(catalog)
            })
            .await
    }

    /// All profile names, sorted.
    pub async fn names(&self) -> Result<Vec<String>> {
        let catalog = self.catalog().await?;
        Ok(catalog.names().into_iter().map(str::to_string).collect())
    }

    /// Looks up one profile by exact name.
    pub async fn resolve(&self, name: &str) -> Result<DeviceProfile> {
        let catalog = self.catalog().await?;
        catalog
            .get(name)
            .cloned()
            .ok_or_else(|| QrmError::ProfileNotFound {
                name: name.to_string(),
            })
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
