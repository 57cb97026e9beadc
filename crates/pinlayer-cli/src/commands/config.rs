use std::env;

use pinlayer_core::config::{
    is_http_url, normalize_text_option, ENV_AUTHOR, ENV_PROTOTYPE, ENV_SUPABASE_ANON_KEY,
    ENV_SUPABASE_URL, ENV_TABLE,
};
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::commands::common::CommandContext;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, context: &CommandContext) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            table,
            default_prototype,
            author,
            no_activate,
        } => run_config_init(
            context.profile.as_deref(),
            ProfileValues {
                supabase_url,
                supabase_anon_key,
                table,
                prototype: default_prototype,
                author,
            },
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(context),
    }
}

/// Values supplied to `config init`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileValues {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub table: Option<String>,
    pub prototype: Option<String>,
    pub author: Option<String>,
}

pub fn run_config_init(
    profile_name: Option<&str>,
    values: ProfileValues,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let profile = config.profile_mut_or_default(&profile_name);
    merge_profile(profile, values, |key| env::var(key).ok());
    validate_profile(profile)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profiles
        .get(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let mut missing_fields = Vec::new();
    if profile.supabase_url().is_none() {
        missing_fields.push("supabase_url");
    }
    if profile.supabase_anon_key().is_none() {
        missing_fields.push("supabase_anon_key");
    }
    if missing_fields.is_empty() {
        println!("Profile '{profile_name}' stores comments in the remote table.");
    } else {
        println!(
            "Profile '{}' is missing: {} (comments stay in the local file)",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Explicit values win, then `PINLAYER_*` variables, then what the profile
/// already holds.
pub fn merge_profile(
    profile: &mut CliProfile,
    values: ProfileValues,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let merge = |explicit: Option<String>, key: &str, existing: &mut Option<String>| {
        if let Some(value) =
            normalize_text_option(explicit).or_else(|| normalize_text_option(lookup(key)))
        {
            *existing = Some(value);
        }
    };
    merge(values.supabase_url, ENV_SUPABASE_URL, &mut profile.supabase_url);
    merge(
        values.supabase_anon_key,
        ENV_SUPABASE_ANON_KEY,
        &mut profile.supabase_anon_key,
    );
    merge(values.table, ENV_TABLE, &mut profile.table);
    merge(values.prototype, ENV_PROTOTYPE, &mut profile.prototype);
    merge(values.author, ENV_AUTHOR, &mut profile.author);
}

pub fn validate_profile(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.supabase_url() {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    if profile.supabase_url().is_some() != profile.supabase_anon_key().is_some() {
        tracing::warn!("Supabase URL and anon key should be configured together");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ProfileView {
    profile: String,
    active: bool,
    supabase_url: Option<String>,
    supabase_anon_key: Option<&'static str>,
    table: String,
    prototype: Option<String>,
    author: Option<String>,
    data_path: String,
}

fn run_config_show(context: &CommandContext) -> Result<(), CliError> {
    let resolved = context.resolve_layer()?;
    let layer = &resolved.layer;
    let view = ProfileView {
        active: resolved.config.active_profile.as_deref() == Some(resolved.profile_name.as_str()),
        profile: resolved.profile_name.clone(),
        supabase_url: normalize_text_option(layer.supabase_url.clone()),
        supabase_anon_key: normalize_text_option(layer.supabase_anon_key.clone())
            .map(|_| "[REDACTED]"),
        table: layer.table_name(),
        prototype: layer.prototype(),
        author: normalize_text_option(layer.author.clone()),
        data_path: context.data_path.display().to_string(),
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
