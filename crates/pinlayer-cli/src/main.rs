//! pinlayer CLI - positioned comments from the command line
//!
//! Manages the comments of a layer directly and replays recorded pointer
//! sessions through the same controller an interactive host uses.

mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::common::{resolve_data_path, CommandContext};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(
                    "pinlayer=info"
                        .parse()
                        .map_err(|error| CliError::Config(format!("{error}")))?,
                ),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let context = CommandContext {
        data_path: resolve_data_path(cli.data_path)?,
        profile: cli.profile,
        prototype: cli.prototype,
    };

    match cli.command {
        Some(Commands::List { json }) => commands::list::run_list(&context, json).await?,
        Some(Commands::Add { x, y, author, text }) => {
            commands::add::run_add(&context, x, y, author.as_deref(), &text).await?;
        }
        Some(Commands::Move { id, x, y }) => {
            commands::move_cmd::run_move(&context, &id, x, y).await?;
        }
        Some(Commands::Edit { id, text }) => {
            commands::edit::run_edit(&context, &id, &text).await?;
        }
        Some(Commands::Delete { id, yes }) => {
            commands::delete::run_delete(&context, &id, yes).await?;
        }
        Some(Commands::Export { output }) => {
            commands::export::run_export(&context, output.as_deref()).await?;
        }
        Some(Commands::Import { path }) => commands::import::run_import(&context, &path).await?,
        Some(Commands::Replay {
            script,
            dry_run,
            yes,
        }) => commands::replay::run_replay(&context, &script, dry_run, yes).await?,
        Some(Commands::Config { command }) => commands::config::run_config(command, &context)?,
        None => {
            Cli::command().print_help().map_err(CliError::Io)?;
            println!();
        }
    }

    Ok(())
}
