use std::env;
use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use pinlayer_core::config::{normalize_text_option, resolve_author, LayerConfig};
use pinlayer_core::controller::{CommentController, Confirm, ControllerOptions, SyncStatus};
use pinlayer_core::models::{Comment, CommentId, CommentPatch, NewComment};
use pinlayer_core::store::{
    CommentStore, JsonFileSnapshot, LocalCommentStore, MemoryCommentStore, SupabaseCommentStore,
};
use serde::Serialize;

use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub const ENV_DATA_PATH: &str = "PINLAYER_DATA_PATH";

/// Global flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub data_path: PathBuf,
    pub profile: Option<String>,
    pub prototype: Option<String>,
}

/// Profile file plus the layer settings it resolves to
#[derive(Debug, Clone)]
pub struct ResolvedLayer {
    pub config: CliProfilesConfig,
    pub profile_name: String,
    pub layer: LayerConfig,
}

impl CommandContext {
    /// Profile values, overridden by `PINLAYER_*` variables, then by `--prototype`
    pub fn resolve_layer(&self) -> Result<ResolvedLayer, CliError> {
        let config = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = config.resolve_profile_name(self.profile.as_deref());
        let mut layer = config
            .profile(&profile_name)
            .map(CliProfile::layer_config)
            .unwrap_or_default()
            .with_env_overrides();
        if let Some(prototype) = normalize_text_option(self.prototype.clone()) {
            layer.prototype = Some(prototype);
        }

        Ok(ResolvedLayer {
            config,
            profile_name,
            layer,
        })
    }

    pub async fn open_controller(
        &self,
        dry_run: bool,
    ) -> Result<(ResolvedLayer, CommentController<CliStore>), CliError> {
        let resolved = self.resolve_layer()?;
        let controller = open_controller(&resolved.layer, &self.data_path, dry_run).await?;
        Ok((resolved, controller))
    }
}

impl ResolvedLayer {
    /// Pick the display name for new comments and remember it in the profile
    pub fn resolve_author(&mut self, explicit: Option<&str>) -> String {
        let prototype = self.layer.prototype();
        let profile = self.config.profile_mut_or_default(&self.profile_name);
        let author = pick_author(explicit, profile, &self.layer);

        if profile.remember_author(prototype.as_deref(), &author) {
            match self.config.save() {
                Ok(path) => tracing::debug!("Remembered author in {}", path.display()),
                Err(error) => tracing::warn!("Failed to remember author: {}", error),
            }
        }
        author
    }
}

/// Explicit name, then the remembered name for the prototype, then the
/// configured default, then a generated guest label.
pub fn pick_author(explicit: Option<&str>, profile: &CliProfile, layer: &LayerConfig) -> String {
    if let Some(author) = normalize_text_option(explicit.map(ToString::to_string)) {
        return author;
    }
    let remembered = profile
        .remembered_author(layer.prototype().as_deref())
        .or_else(|| layer.author.clone());
    resolve_author(remembered, None)
}

/// Store selected by configuration: the remote table when credentials are
/// present, otherwise the local comment file. `Memory` backs dry runs.
#[derive(Debug)]
pub enum CliStore {
    Remote(SupabaseCommentStore),
    Local(LocalCommentStore<JsonFileSnapshot>),
    Memory(MemoryCommentStore),
}

impl CommentStore for CliStore {
    async fn list_all(&self, prototype: Option<&str>) -> pinlayer_core::Result<Vec<Comment>> {
        match self {
            Self::Remote(store) => store.list_all(prototype).await,
            Self::Local(store) => store.list_all(prototype).await,
            Self::Memory(store) => store.list_all(prototype).await,
        }
    }

    async fn insert(&self, comment: &NewComment) -> pinlayer_core::Result<Comment> {
        match self {
            Self::Remote(store) => store.insert(comment).await,
            Self::Local(store) => store.insert(comment).await,
            Self::Memory(store) => store.insert(comment).await,
        }
    }

    async fn update_fields(
        &self,
        id: &CommentId,
        patch: &CommentPatch,
    ) -> pinlayer_core::Result<()> {
        match self {
            Self::Remote(store) => store.update_fields(id, patch).await,
            Self::Local(store) => store.update_fields(id, patch).await,
            Self::Memory(store) => store.update_fields(id, patch).await,
        }
    }

    async fn delete_by_id(&self, id: &CommentId) -> pinlayer_core::Result<()> {
        match self {
            Self::Remote(store) => store.delete_by_id(id).await,
            Self::Local(store) => store.delete_by_id(id).await,
            Self::Memory(store) => store.delete_by_id(id).await,
        }
    }

    async fn import(&self, comments: &[Comment]) -> pinlayer_core::Result<()> {
        match self {
            Self::Remote(store) => store.import(comments).await,
            Self::Local(store) => store.import(comments).await,
            Self::Memory(store) => store.import(comments).await,
        }
    }
}

pub fn open_store(layer: &LayerConfig, data_path: &Path) -> Result<CliStore, CliError> {
    if let Some(remote) = layer.remote()? {
        tracing::info!("Using remote comment table '{}'", remote.table);
        let store = SupabaseCommentStore::new(&remote.url, remote.anon_key, &remote.table)?;
        return Ok(CliStore::Remote(store));
    }
    tracing::debug!("Using local comment file {}", data_path.display());
    Ok(CliStore::Local(LocalCommentStore::open(JsonFileSnapshot::new(
        data_path,
    ))))
}

/// Load a controller over the configured store. A dry run loads from the
/// configured store once and then works on an in-memory copy.
pub async fn open_controller(
    layer: &LayerConfig,
    data_path: &Path,
    dry_run: bool,
) -> Result<CommentController<CliStore>, CliError> {
    let mut store = open_store(layer, data_path)?;
    if dry_run {
        let prototype = layer.prototype();
        let comments = store.list_all(prototype.as_deref()).await?;
        store = CliStore::Memory(MemoryCommentStore::with_comments(comments));
    }
    let options = ControllerOptions::from_config(layer);
    Ok(CommentController::load(Arc::new(store), options).await)
}

/// Wait for background writes and surface a failure for `id`
pub async fn settle_and_check<S: CommentStore + 'static>(
    controller: &mut CommentController<S>,
    id: &CommentId,
) -> Result<(), CliError> {
    controller.settle().await;
    match controller.sync_status(id) {
        Some(SyncStatus::Failed(reason)) => Err(CliError::Sync(reason)),
        _ => Ok(()),
    }
}

/// Resolve a full id or unique id prefix against the loaded comments
pub fn find_comment(comments: &[Comment], query: &str) -> Result<CommentId, CliError> {
    let query = normalize_comment_identifier(query)?;
    if let Some(comment) = comments.iter().find(|comment| comment.id.as_str() == query) {
        return Ok(comment.id.clone());
    }

    let matching_ids = comments
        .iter()
        .filter(|comment| comment.id.as_str().starts_with(&query))
        .map(|comment| comment.id.clone())
        .collect::<Vec<_>>();

    match matching_ids.as_slice() {
        [] => Err(CliError::CommentNotFound(query)),
        [id] => Ok(id.clone()),
        _ => {
            let options = matching_ids
                .iter()
                .take(3)
                .map(short_id)
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousCommentId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentListItem {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub preview: String,
    pub author: String,
    pub created_at: String,
    pub relative_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prototype: Option<String>,
}

pub fn format_comment_lines(comments: &[Comment]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    comments
        .iter()
        .map(|comment| {
            let short_id = short_id(&comment.id);
            let position = format!("({:.0}, {:.0})", comment.x, comment.y);
            let author = comment.author_label();
            let preview = comment_preview(comment, 40);
            let relative_time =
                format_relative_time(comment.created_at.timestamp_millis(), now_ms);
            format!("{short_id:<13}  {position:<14}  {author:<12}  {preview:<40}  {relative_time}")
        })
        .collect()
}

pub fn comment_to_list_item(comment: &Comment) -> CommentListItem {
    let now_ms = Utc::now().timestamp_millis();
    CommentListItem {
        id: comment.id.to_string(),
        x: comment.x,
        y: comment.y,
        text: comment.text.clone(),
        preview: comment_preview(comment, 80),
        author: comment.author_label().to_string(),
        created_at: comment.created_at.to_rfc3339(),
        relative_time: format_relative_time(comment.created_at.timestamp_millis(), now_ms),
        prototype: comment.prototype.clone(),
    }
}

fn short_id(id: &CommentId) -> String {
    id.as_str().chars().take(13).collect()
}

pub fn comment_preview(comment: &Comment, max_chars: usize) -> String {
    let first_line = comment.text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < year {
        format!("{}w ago", diff / week)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Text from the command line, else from piped stdin
pub fn resolve_comment_text(text_parts: &[String]) -> Result<String, CliError> {
    if let Some(text) = normalize_content(&text_parts.join(" ")) {
        return Ok(text);
    }
    if let Some(text) = read_piped_stdin()? {
        return Ok(text);
    }
    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_comment_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyCommentId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

/// `y`/`yes` prompt on the terminal. Non-interactive stdin always declines.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            eprintln!("{message} (declined: not a terminal, pass --yes to confirm)");
            return false;
        }

        eprint!("{message} [y/N] ");
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_affirmative(&answer)
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn resolve_data_path(cli_data_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_data_path.or_else(|| env::var_os(ENV_DATA_PATH).map(PathBuf::from)) {
        return Ok(path);
    }
    default_data_path()
}

pub fn default_data_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("pinlayer").join("comments.json"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}
