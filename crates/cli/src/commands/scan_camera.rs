use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::camera::CameraSource;
use crate::capture::{self, NoOverlay};
use crate::commands::CommandContext;
use crate::error::{QrmError, Result};
use crate::provision::Provisioner;
use crate::scan::{ScanResult, ScanSource};
use crate::session;

pub async fn execute(camera: u32, ctx: &CommandContext) -> Result<()> {
    info!(target: "qrm", camera, "scan-camera");

    let provisioner = Provisioner::new();
    provisioner
        .ensure_available(ctx.engine, &ctx.reporter)
        .await?;

    // Ctrl-C raises the cancel flag; the capture loop checks it once
    // per frame.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let reporter = ctx.reporter.clone();
    let report = tokio::task::spawn_blocking(move || {
        let mut source = CameraSource::open(camera)?;
        capture::capture_until_decoded(&mut source, &mut NoOverlay, &cancel, &reporter)
    })
    .await
    .map_err(|e| QrmError::Camera(format!("camera worker failed: {e}")))??;

    info!(target: "qrm", frames = report.frames_seen, "camera capture finished");
    let scan = ScanResult::new(report.payload, ScanSource::Camera(camera));

    session::open_mobile(
        &scan,
        &ctx.device,
        ctx.engine,
        &ctx.screenshot_path,
        &ctx.reporter,
    )
    .await
}
