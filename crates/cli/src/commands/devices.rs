use tracing::info;

use crate::commands::CommandContext;
use crate::error::Result;
use crate::registry::DeviceRegistry;

pub async fn execute(ctx: &CommandContext) -> Result<()> {
    info!(target: "qrm", "devices");

    let registry = DeviceRegistry::new();
    for name in registry.names().await? {
        ctx.reporter.say(name);
    }
    Ok(())
}
