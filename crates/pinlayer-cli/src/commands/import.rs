use std::path::Path;

use crate::commands::common::CommandContext;
use crate::error::CliError;

pub async fn run_import(context: &CommandContext, path: &Path) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(path)?;
    let (_, mut controller) = context.open_controller(false).await?;

    let count = controller.import_json(&raw)?;
    controller.settle().await;

    let failed = controller
        .comments()
        .iter()
        .filter(|comment| {
            matches!(
                controller.sync_status(&comment.id),
                Some(pinlayer_core::SyncStatus::Failed(_))
            )
        })
        .count();
    if failed > 0 {
        return Err(CliError::Sync(format!(
            "{failed} of {count} imported comments were not stored"
        )));
    }

    println!("Imported {count} comments from {}", path.display());
    Ok(())
}
