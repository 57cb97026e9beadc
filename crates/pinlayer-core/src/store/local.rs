//! Local snapshot persistence.
//!
//! The whole list is read once at startup and rewritten after every
//! mutation, the way the browser local-storage variant behaves.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{CommentStore, SnapshotStore};
use crate::error::{Error, Result};
use crate::export::{parse_json_import, render_json_export};
use crate::models::{Comment, CommentId, CommentPatch, NewComment};

/// Snapshot stored as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileSnapshot {
    fn load(&self) -> Result<Vec<Comment>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_json_import(&raw)
    }

    fn save(&self, comments: &[Comment]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, render_json_export(comments)?)?;
        Ok(())
    }
}

/// `CommentStore` over a [`SnapshotStore`]
#[derive(Debug)]
pub struct LocalCommentStore<F> {
    snapshot: F,
    comments: Mutex<Vec<Comment>>,
}

impl<F: SnapshotStore> LocalCommentStore<F> {
    /// Load the snapshot. Unreadable or malformed data starts an empty list.
    pub fn open(snapshot: F) -> Self {
        let comments = match snapshot.load() {
            Ok(comments) => comments,
            Err(error) => {
                tracing::warn!("Failed to load local comments, starting empty: {}", error);
                Vec::new()
            }
        };
        Self {
            snapshot,
            comments: Mutex::new(comments),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Comment>>> {
        self.comments
            .lock()
            .map_err(|_| Error::InvalidInput("Local comment store lock poisoned".to_string()))
    }

    fn mutate<T>(&self, apply: impl FnOnce(&mut Vec<Comment>) -> Result<T>) -> Result<T> {
        let mut comments = self.lock()?;
        let value = apply(&mut comments)?;
        self.snapshot.save(&comments)?;
        Ok(value)
    }
}

impl<F: SnapshotStore + Send + Sync> CommentStore for LocalCommentStore<F> {
    async fn list_all(&self, prototype: Option<&str>) -> Result<Vec<Comment>> {
        let comments = self.lock()?;
        Ok(comments
            .iter()
            .filter(|comment| prototype.is_none() || comment.prototype.as_deref() == prototype)
            .cloned()
            .collect())
    }

    async fn insert(&self, comment: &NewComment) -> Result<Comment> {
        let stored = comment.clone().into_comment(CommentId::new());
        self.mutate(|comments| {
            comments.push(stored.clone());
            Ok(())
        })?;
        Ok(stored)
    }

    async fn update_fields(&self, id: &CommentId, patch: &CommentPatch) -> Result<()> {
        self.mutate(|comments| {
            let comment = comments
                .iter_mut()
                .find(|comment| &comment.id == id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            patch.apply_to(comment);
            Ok(())
        })
    }

    async fn delete_by_id(&self, id: &CommentId) -> Result<()> {
        self.mutate(|comments| {
            let before = comments.len();
            comments.retain(|comment| &comment.id != id);
            if comments.len() == before {
                return Err(Error::NotFound(id.to_string()));
            }
            Ok(())
        })
    }

    async fn import(&self, imported: &[Comment]) -> Result<()> {
        self.mutate(|comments| {
            for incoming in imported {
                match comments.iter_mut().find(|comment| comment.id == incoming.id) {
                    Some(existing) => existing.clone_from(incoming),
                    None => comments.push(incoming.clone()),
                }
            }
            Ok(())
        })
    }
}
