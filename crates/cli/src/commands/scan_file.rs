use std::path::Path;

use tracing::info;

use crate::commands::CommandContext;
use crate::error::Result;
use crate::provision::Provisioner;
use crate::scan::{ScanResult, ScanSource};
use crate::{qr, session};

pub async fn execute(path: &Path, ctx: &CommandContext) -> Result<()> {
    info!(target: "qrm", path = %path.display(), "scan-file");

    let provisioner = Provisioner::new();
    provisioner
        .ensure_available(ctx.engine, &ctx.reporter)
        .await?;

    let payload = qr::decode_file(path)?;
    let scan = ScanResult::new(payload, ScanSource::File(path.to_path_buf()));

    session::open_mobile(
        &scan,
        &ctx.device,
        ctx.engine,
        &ctx.screenshot_path,
        &ctx.reporter,
    )
    .await
}
