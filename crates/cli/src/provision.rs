//! Browser engine provisioning.
//!
//! Before a command launches a browser, the provisioner verifies the
//! engine binary is usable by launching and closing it headless. When
//! the probe fails it runs the driver's installer once. A successful
//! install is trusted without a second probe.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use qrm::{Engine, LaunchOptions, Playwright};
use tracing::{debug, info};

use crate::error::{QrmError, Result};
use crate::report::Reporter;

/// How the provisioner checks and installs an engine. Split out so
/// tests can substitute a scripted probe.
#[async_trait]
pub trait EngineProbe: Send + Sync {
    /// Verifies the engine can launch. An error means the binary is
    /// missing or broken.
    async fn probe(&self, engine: Engine) -> qrm::Result<()>;

    /// Downloads the engine through the driver's installer.
    async fn install(&self, engine: Engine) -> qrm::Result<()>;
}

/// Probe backed by a real driver session.
pub struct DriverProbe;

#[async_trait]
impl EngineProbe for DriverProbe {
    async fn probe(&self, engine: Engine) -> qrm::Result<()> {
        let playwright = Playwright::launch().await?;
        let outcome = async {
            let browser = playwright
                .browser_type(engine)?
                .launch(LaunchOptions::default().headless(true))
                .await?;
            browser.close().await
        }
        .await;
        // Probe verdict stands regardless of how shutdown goes.
        if let Err(e) = playwright.shutdown().await {
            debug!(target: "qrm::provision", error = %e, "driver shutdown after probe failed");
        }
        outcome
    }

    async fn install(&self, engine: Engine) -> qrm::Result<()> {
        qrm::driver::install_browser(engine.as_str()).await
    }
}

pub struct Provisioner {
    probe: Box<dyn EngineProbe>,
    /// Engines verified during this process. Repeat calls skip the
    /// probe entirely.
    verified: Mutex<HashSet<Engine>>,
}

impl Provisioner {
    pub fn new() -> Self {
        Self::with_probe(Box::new(DriverProbe))
    }

    pub fn with_probe(probe: Box<dyn EngineProbe>) -> Self {
        Self {
            probe,
            verified: Mutex::new(HashSet::new()),
        }
    }

    /// Makes sure `engine` is ready to launch, installing it if the
    /// probe fails.
    pub async fn ensure_available(&self, engine: Engine, reporter: &Reporter) -> Result<()> {
        if self.is_verified(engine) {
            return Ok(());
        }

        match self.probe.probe(engine).await {
            Ok(()) => {
                debug!(target: "qrm::provision", %engine, "engine probe succeeded");
                self.mark_verified(engine);
                Ok(())
            }
            Err(probe_error) => {
                debug!(target: "qrm::provision", %engine, error = %probe_error, "engine probe failed");
                reporter.say(format!(
                    "Playwright browser not found ({engine}). Downloading..."
                ));
                match self.probe.install(engine).await {
                    Ok(()) => {
                        info!(target: "qrm::provision", %engine, "engine installed");
                        reporter.say("Download finished.");
                        self.mark_verified(engine);
                        Ok(())
                    }
                    Err(source) => {
                        reporter.say(format!("Could not install the browser: {source}"));
                        Err(QrmError::Provision { engine, source })
                    }
                }
            }
        }
    }

    fn is_verified(&self, engine: Engine) -> bool {
        match self.verified.lock() {
            Ok(verified) => verified.contains(&engine),
            Err(poisoned) => poisoned.into_inner().contains(&engine),
        }
    }

    fn mark_verified(&self, engine: Engine) {
        if let Ok(mut verified) = self.verified.lock() {
            verified.insert(engine);
        }
    }
}

impl Default for Provisioner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::report::MemorySink;

    struct ScriptedProbe {
        probe_ok: bool,
        install_ok: bool,
        probes: Arc<AtomicUsize>,
        installs: Arc<AtomicUsize>,
    }

    impl ScriptedProbe {
        fn new(probe_ok: bool, install_ok: bool) -> Self {
            Self {
                probe_ok,
                install_ok,
                probes: Arc::new(AtomicUsize::new(0)),
                installs: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
            (self.probes.clone(), self.installs.clone())
        }
    }

    #[async_trait]
    impl EngineProbe for ScriptedProbe {
        async fn probe(&self, _engine: Engine) -> qrm::Result<()> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.probe_ok {
                Ok(())
            } else {
                Err(qrm::Error::LaunchFailed("missing binary".to_string()))
            }
        }

        async fn install(&self, _engine: Engine) -> qrm::Result<()> {
            self.installs.fetch_add(1, Ordering::SeqCst);
            if self.install_ok {
                Ok(())
            } else {
                Err(qrm::Error::InstallFailed("download failed".to_string()))
            }
        }
    }

    fn reporter_with_sink() -> (Reporter, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        (Reporter::new(sink.clone()), sink)
    }

    #[tokio::test]
    async fn healthy_engine_skips_install() {
        let probe = ScriptedProbe::new(true, true);
        let (probes, installs) = probe.counters();
        let provisioner = Provisioner::with_probe(Box::new(probe));
        let (reporter, sink) = reporter_with_sink();

        provisioner
            .ensure_available(Engine::Chromium, &reporter)
            .await
            .unwrap();

        assert_eq!(probes.load(Ordering::SeqCst), 1);
        assert_eq!(installs.load(Ordering::SeqCst), 0);
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn failed_probe_triggers_install_and_narration() {
        let probe = ScriptedProbe::new(false, true);
        let (_probes, installs) = probe.counters();
        let provisioner = Provisioner::with_probe(Box::new(probe));
        let (reporter, sink) = reporter_with_sink();

        provisioner
            .ensure_available(Engine::Firefox, &reporter)
            .await
            .unwrap();

        assert_eq!(installs.load(Ordering::SeqCst), 1);
        let lines = sink.lines();
        assert_eq!(
            lines,
            vec![
                "Playwright browser not found (firefox). Downloading...",
                "Download finished.",
            ]
        );
    }

    #[tokio::test]
    async fn verified_engine_is_not_probed_again() {
        let probe = ScriptedProbe::new(false, true);
        let (probes, installs) = probe.counters();
        let provisioner = Provisioner::with_probe(Box::new(probe));
        let (reporter, _sink) = reporter_with_sink();

        provisioner
            .ensure_available(Engine::Webkit, &reporter)
            .await
            .unwrap();
        provisioner
            .ensure_available(Engine::Webkit, &reporter)
            .await
            .unwrap();

        assert_eq!(probes.load(Ordering::SeqCst), 1);
        assert_eq!(installs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_install_is_fatal_and_not_cached() {
        let probe = ScriptedProbe::new(false, false);
        let (probes, _installs) = probe.counters();
        let provisioner = Provisioner::with_probe(Box::new(probe));
        let (reporter, sink) = reporter_with_sink();

        let err = provisioner
            .ensure_available(Engine::Chromium, &reporter)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QrmError::Provision {
                engine: Engine::Chromium,
                ..
            }
        ));
        assert!(
            sink.lines()
                .iter()
                .any(|line| line.starts_with("Could not install the browser:"))
        );

        // Next call starts over from the probe.
        let _ = provisioner
            .ensure_available(Engine::Chromium, &reporter)
            .await;
        assert_eq!(probes.load(Ordering::SeqCst), 2);
    }
}
