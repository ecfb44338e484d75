use tracing::info;

use crate::commands::CommandContext;
use crate::error::Result;
use crate::provision::Provisioner;
use crate::scan::{ScanResult, ScanSource};
use crate::session;

pub async fn execute(url: &str, ctx: &CommandContext) -> Result<()> {
    info!(target: "qrm", url, "open");

    if url.trim().is_empty() {
        ctx.reporter.say("Empty content.");
        return Ok(());
    }

    let provisioner = Provisioner::new();
    provisioner
        .ensure_available(ctx.engine, &ctx.reporter)
        .await?;

    let scan = ScanResult::new(url.to_string(), ScanSource::Direct);

    session::open_mobile(
        &scan,
        &ctx.device,
        ctx.engine,
        &ctx.screenshot_path,
        &ctx.reporter,
    )
    .await
}
