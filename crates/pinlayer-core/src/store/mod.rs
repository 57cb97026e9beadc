//! Persistence seams for comments.
//!
//! `CommentStore` is the per-record interface the controller mirrors its
//! mutations to. Calls are issued from spawned tasks, so every future must be
//! `Send`. `SnapshotStore` is the whole-list load/save interface of the local
//! variant; `LocalCommentStore` adapts one to the other.

use std::future::Future;

use crate::error::Result;
use crate::models::{Comment, CommentId, CommentPatch, NewComment};

mod local;
mod memory;
mod supabase;

pub use local::{JsonFileSnapshot, LocalCommentStore};
pub use memory::MemoryCommentStore;
pub use supabase::{normalize_rest_url, SupabaseCommentStore, DEFAULT_TABLE};

/// Durable comment storage with backend-assigned ids
pub trait CommentStore: Send + Sync {
    /// Load every comment, optionally scoped to one prototype, oldest first
    fn list_all(
        &self,
        prototype: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Comment>>> + Send;

    /// Insert a comment and return it with its durable id
    fn insert(&self, comment: &NewComment) -> impl Future<Output = Result<Comment>> + Send;

    /// Apply a partial update to the record with `id`
    fn update_fields(
        &self,
        id: &CommentId,
        patch: &CommentPatch,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove the record with `id`
    fn delete_by_id(&self, id: &CommentId) -> impl Future<Output = Result<()>> + Send;

    /// Write `comments` keeping their ids, replacing records with the same id
    fn import(&self, comments: &[Comment]) -> impl Future<Output = Result<()>> + Send;
}

/// Synchronous whole-list storage (the browser local-storage variant)
pub trait SnapshotStore {
    /// Read the stored list. A missing snapshot is an empty list.
    fn load(&self) -> Result<Vec<Comment>>;

    /// Overwrite the stored list
    fn save(&self, comments: &[Comment]) -> Result<()>;
}
