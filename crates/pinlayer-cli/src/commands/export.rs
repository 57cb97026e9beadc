use std::path::{Path, PathBuf};

use chrono::Utc;
use pinlayer_core::export::suggested_export_file_name;

use crate::commands::common::CommandContext;
use crate::error::CliError;

pub async fn run_export(context: &CommandContext, output_path: Option<&Path>) -> Result<(), CliError> {
    let (_, controller) = context.open_controller(false).await?;
    let rendered = controller.export_json()?;

    if let Some(path) = output_path {
        let path = resolve_export_path(path, Utc::now().timestamp_millis());
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

/// A directory target gets a timestamped file name inside it
pub fn resolve_export_path(path: &Path, timestamp_ms: i64) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(timestamp_ms))
    } else {
        path.to_path_buf()
    }
}
