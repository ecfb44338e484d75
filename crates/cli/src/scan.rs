//! What a decoded QR payload is and where it came from.

use std::path::PathBuf;

/// How the payload will be handled downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Opened in the emulated browser.
    Url,
    /// Printed for the user, never navigated to.
    Text,
}

/// Where a payload was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanSource {
    File(PathBuf),
    Camera(u32),
    /// Typed on the command line, no decode step involved.
    Direct,
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub payload: String,
    pub kind: PayloadKind,
    pub source: ScanSource,
}

impl ScanResult {
    /// Classifies `payload` by scheme prefix. Only plain `http://` and
    /// `https://` count as URLs; everything else is treated as text.
    pub fn new(payload: String, source: ScanSource) -> Self {
        let kind = if is_url(&payload) {
            PayloadKind::Url
        } else {
            PayloadKind::Text
        };
        Self {
            payload,
            kind,
            source,
        }
    }

    pub fn is_url(&self) -> bool {
        self.kind == PayloadKind::Url
    }
}

fn is_url(payload: &str) -> bool {
    payload.starts_with("http://") || payload.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_https_classify_as_url() {
        for payload in ["http://example.com", "https://example.com/path?q=1"] {
            let scan = ScanResult::new(payload.to_string(), ScanSource::Direct);
            assert_eq!(scan.kind, PayloadKind::Url, "{payload}");
        }
    }

    #[test]
    fn other_schemes_and_text_classify_as_text() {
        for payload in [
            "ftp://example.com",
            "mailto:someone@example.com",
            "WIFI:S:net;T:WPA;P:secret;;",
            "hello world",
            "HTTPS://EXAMPLE.COM",
        ] {
            let scan = ScanResult::new(payload.to_string(), ScanSource::Direct);
            assert_eq!(scan.kind, PayloadKind::Text, "{payload}");
        }
    }
}
