use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pinlayer")]
#[command(about = "Leave positioned comments on canvases and prototypes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to the local comment file
    #[arg(long, global = true, value_name = "PATH")]
    pub data_path: Option<PathBuf>,

    /// CLI profile name for backend configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Prototype the comments belong to
    #[arg(long, global = true, value_name = "ID")]
    pub prototype: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List comments
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drop a comment pin at a container-relative position
    #[command(alias = "new")]
    Add {
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, allow_negative_numbers = true)]
        y: f64,
        /// Display name (defaults to the remembered name for the prototype)
        #[arg(long)]
        author: Option<String>,
        /// Comment text (read from stdin when omitted)
        text: Vec<String>,
    },
    /// Move a comment pin
    Move {
        /// Comment ID or unique ID prefix
        id: String,
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, allow_negative_numbers = true)]
        y: f64,
    },
    /// Replace a comment's text
    Edit {
        /// Comment ID or unique ID prefix
        id: String,
        /// New text (read from stdin when omitted)
        text: Vec<String>,
    },
    /// Delete a comment
    Delete {
        /// Comment ID or unique ID prefix
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Export comments as JSON
    Export {
        /// Output file or directory (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Replace comments with an exported JSON file
    Import {
        /// File to import
        path: PathBuf,
    },
    /// Replay a recorded pointer session through the comment controller
    Replay {
        /// JSON replay script
        script: PathBuf,
        /// Run against an in-memory copy; nothing is saved
        #[arg(long)]
        dry_run: bool,
        /// Confirm every delete request without prompting
        #[arg(short, long)]
        yes: bool,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Comment table name
        #[arg(long, value_name = "TABLE")]
        table: Option<String>,
        /// Default prototype identifier
        #[arg(long = "default-prototype", value_name = "ID")]
        default_prototype: Option<String>,
        /// Default display name
        #[arg(long, value_name = "NAME")]
        author: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile
    Show,
}
