// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Device descriptor catalog. The driver announces its built-in device
// profiles in the Playwright initializer's `deviceDescriptors` array;
// this module parses them into an immutable, name-ordered catalog.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::engine::Engine;
use crate::options::Viewport;
use qrm_runtime::{Error, Result};

/// A named bundle of mobile emulation parameters.
///
/// Immutable once parsed; profiles come from the driver's built-in
/// catalog and are never edited locally.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    /// Catalog name, e.g. "iPhone 13"
    pub name: String,
    pub viewport: Viewport,
    pub user_agent: String,
    pub device_scale_factor: f64,
    pub is_mobile: bool,
    pub has_touch: bool,
    /// Engine the device ships with, when the catalog says so
    pub default_browser_type: Option<Engine>,
}

/// The full set of device profiles known to the driver, keyed by name.
///
/// Backed by a `BTreeMap`, so iteration order is the sorted name order
/// the UI needs.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    profiles: BTreeMap<String, DeviceProfile>,
}

impl DeviceCatalog {
    /// Parses the `deviceDescriptors` array from the Playwright
    /// initializer.
    ///
    /// # Errors
    ///
    /// Returns a protocol error when the array or a descriptor is
    /// malformed. Descriptors must never be partially parsed: a profile
    /// is either complete or the whole catalog load fails.
    pub fn from_descriptors(descriptors: &Value) -> Result<Self> {
        let entries = descriptors
            .as_array()
            .ok_or_else(|| Error::Protocol("deviceDescriptors is not an array".to_string()))?;

        let mut profiles = BTreeMap::new();
        for entry in entries {
            let name = entry["name"]
                .as_str()
                .ok_or_else(|| Error::Protocol("device descriptor missing 'name'".to_string()))?
                .to_string();
            let descriptor = &entry["descriptor"];

            let viewport = Viewport {
                width: read_u32(descriptor, &name, "viewport.width")?,
                height: read_u32(descriptor, &name, "viewport.height")?,
            };
            let user_agent = descriptor["userAgent"]
                .as_str()
                .ok_or_else(|| missing(&name, "userAgent"))?
                .to_string();
            let device_scale_factor = descriptor["deviceScaleFactor"]
                .as_f64()
                .ok_or_else(|| missing(&name, "deviceScaleFactor"))?;
            let is_mobile = descriptor["isMobile"]
                .as_bool()
                .ok_or_else(|| missing(&name, "isMobile"))?;
            let has_touch = descriptor["hasTouch"]
                .as_bool()
                .ok_or_else(|| missing(&name, "hasTouch"))?;
            let default_browser_type = descriptor["defaultBrowserType"]
                .as_str()
                .and_then(|s| s.parse::<Engine>().ok());

            profiles.insert(
                name.clone(),
                DeviceProfile {
                    name,
                    viewport,
                    user_agent,
                    device_scale_factor,
                    is_mobile,
                    has_touch,
                    default_browser_type,
                },
            );
        }

        Ok(Self { profiles })
    }

    /// Profile names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Looks up a profile by exact name.
    pub fn get(&self, name: &str) -> Option<&DeviceProfile> {
        self.profiles.get(name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn read_u32(descriptor: &Value, device: &str, dotted: &str) -> Result<u32> {
    let mut value = descriptor;
    for key in dotted.split('.') {
        value = &value[key];
    }
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| missing(device, dotted))
}

fn missing(device: &str, field: &str) -> Error {
    Error::Protocol(format!("device descriptor '{device}' missing '{field}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_descriptors() -> Value {
        json!([
            {
                "name": "Pixel 7",
                "descriptor": {
                    "userAgent": "Mozilla/5.0 (Linux; Android 13; Pixel 7)",
                    "viewport": {"width": 412, "height": 915},
                    "deviceScaleFactor": 2.625,
                    "isMobile": true,
                    "hasTouch": true,
                    "defaultBrowserType": "chromium"
                }
            },
            {
                "name": "iPhone 13",
                "descriptor": {
                    "userAgent": "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X)",
                    "viewport": {"width": 390, "height": 844},
                    "deviceScaleFactor": 3.0,
                    "isMobile": true,
                    "hasTouch": true,
                    "defaultBrowserType": "webkit"
                }
            }
        ])
    }

    #[test]
    fn parses_profiles() {
        let catalog = DeviceCatalog::from_descriptors(&sample_descriptors()).unwrap();
        assert_eq!(catalog.len(), 2);

        let iphone = catalog.get("iPhone 13").unwrap();
        assert_eq!(iphone.viewport.width, 390);
        assert_eq!(iphone.viewport.height, 844);
        assert_eq!(iphone.device_scale_factor, 3.0);
        assert!(iphone.is_mobile);
        assert!(iphone.has_touch);
        assert_eq!(iphone.default_browser_type, Some(Engine::Webkit));
    }

    #[test]
    fn names_are_sorted() {
        let catalog = DeviceCatalog::from_descriptors(&sample_descriptors()).unwrap();
        assert_eq!(catalog.names(), vec!["Pixel 7", "iPhone 13"]);
    }

    #[test]
    fn lookup_is_idempotent() {
        let catalog = DeviceCatalog::from_descriptors(&sample_descriptors()).unwrap();
        let first = catalog.get("iPhone 13").unwrap().clone();
        let second = catalog.get("iPhone 13").unwrap().clone();
        assert_eq!(first, second);
        assert!(catalog.get("iPhone 99").is_none());
    }

    #[test]
    fn malformed_descriptor_fails_whole_load() {
        let descriptors = json!([
            {"name": "Broken", "descriptor": {"userAgent": "x"}}
        ]);
        assert!(DeviceCatalog::from_descriptors(&descriptors).is_err());
    }
}
