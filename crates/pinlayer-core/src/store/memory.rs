//! In-process comment store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::CommentStore;
use crate::error::{Error, Result};
use crate::models::{Comment, CommentId, CommentPatch, NewComment};

/// `CommentStore` kept in memory, assigning sequential integer ids the way
/// the remote table does.
#[derive(Debug, Default)]
pub struct MemoryCommentStore {
    comments: Mutex<Vec<Comment>>,
    next_id: AtomicU64,
}

impl MemoryCommentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing records; new ids continue after the largest numeric id.
    #[must_use]
    pub fn with_comments(comments: Vec<Comment>) -> Self {
        let highest = comments
            .iter()
            .filter_map(|comment| comment.id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            comments: Mutex::new(comments),
            next_id: AtomicU64::new(highest),
        }
    }

    /// Copy of everything currently stored
    pub fn snapshot(&self) -> Result<Vec<Comment>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Comment>>> {
        self.comments
            .lock()
            .map_err(|_| Error::InvalidInput("Memory comment store lock poisoned".to_string()))
    }
}

impl CommentStore for MemoryCommentStore {
    async fn list_all(&self, prototype: Option<&str>) -> Result<Vec<Comment>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|comment| prototype.is_none() || comment.prototype.as_deref() == prototype)
            .cloned()
            .collect())
    }

    async fn insert(&self, comment: &NewComment) -> Result<Comment> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = comment
            .clone()
            .into_comment(CommentId::from_raw(id.to_string()));
        self.lock()?.push(stored.clone());
        Ok(stored)
    }

    async fn update_fields(&self, id: &CommentId, patch: &CommentPatch) -> Result<()> {
        let mut comments = self.lock()?;
        let comment = comments
            .iter_mut()
            .find(|comment| &comment.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        patch.apply_to(comment);
        Ok(())
    }

    async fn delete_by_id(&self, id: &CommentId) -> Result<()> {
        let mut comments = self.lock()?;
        let before = comments.len();
        comments.retain(|comment| &comment.id != id);
        if comments.len() == before {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn import(&self, imported: &[Comment]) -> Result<()> {
        let mut comments = self.lock()?;
        for incoming in imported {
            match comments.iter_mut().find(|comment| comment.id == incoming.id) {
                Some(existing) => existing.clone_from(incoming),
                None => comments.push(incoming.clone()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = MemoryCommentStore::new();
        let draft = Comment::new(Point::new(0.0, 0.0), "a", None).to_new();

        let first = store.insert(&draft).await.unwrap();
        let second = store.insert(&draft).await.unwrap();
        assert_eq!(first.id.as_str(), "1");
        assert_eq!(second.id.as_str(), "2");
    }

    #[tokio::test]
    async fn seeded_store_continues_numbering() {
        let mut seeded = Comment::new(Point::new(0.0, 0.0), "seed", None);
        seeded.id = CommentId::from_raw("41");
        let store = MemoryCommentStore::with_comments(vec![seeded]);

        let draft = Comment::new(Point::new(0.0, 0.0), "next", None).to_new();
        assert_eq!(store.insert(&draft).await.unwrap().id.as_str(), "42");
    }

    #[tokio::test]
    async fn import_upserts_by_id() {
        let mut existing = Comment::new(Point::new(0.0, 0.0), "old", None);
        existing.id = CommentId::from_raw("1");
        let store = MemoryCommentStore::with_comments(vec![existing.clone()]);

        let mut replacement = existing.clone();
        replacement.text = "new".to_string();
        let added = Comment::new(Point::new(5.0, 5.0), "added", None);
        store.import(&[replacement, added]).await.unwrap();

        let stored = store.snapshot().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].text, "new");
    }
}
