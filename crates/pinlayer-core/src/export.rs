//! Comment export and import.
//!
//! Export is a pretty-printed JSON array of comments. Import accepts the
//! same document plus older hand-edited or legacy files: missing ids and
//! timestamps are filled in, and `createdAt` is accepted for `created_at`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{Comment, CommentId};

/// Render comments as pretty-printed JSON.
pub fn render_json_export(comments: &[Comment]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(comments)
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(timestamp_ms: i64) -> String {
    format!("comments-{timestamp_ms}.json")
}

/// Parse and normalize an imported comment document.
///
/// The document must be a JSON array. Entries without an id get a fresh one,
/// entries without a timestamp are stamped now, and missing text becomes
/// empty. Coordinates must be finite numbers; anything else rejects the
/// whole document so a bad file never half-replaces the list.
pub fn parse_json_import(raw: &str) -> Result<Vec<Comment>> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|error| Error::Import(format!("not valid JSON: {error}")))?;
    let Value::Array(entries) = document else {
        return Err(Error::Import("expected a list of comments".to_string()));
    };

    let now = Utc::now();
    let mut comments = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let imported = ImportedComment::deserialize(entry)
            .map_err(|error| Error::Import(format!("entry {index}: {error}")))?;
        comments.push(imported.normalize(index, now)?);
    }

    let mut seen = std::collections::HashSet::new();
    for comment in &comments {
        if !seen.insert(&comment.id) {
            return Err(Error::Import(format!("duplicate comment id {}", comment.id)));
        }
    }

    Ok(comments)
}

#[derive(Debug, Deserialize)]
struct ImportedComment {
    #[serde(default)]
    id: Option<CommentId>,
    x: f64,
    y: f64,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default, alias = "createdAt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    prototype: Option<String>,
}

impl ImportedComment {
    fn normalize(self, index: usize, now: DateTime<Utc>) -> Result<Comment> {
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(Error::Import(format!(
                "entry {index}: coordinates must be finite"
            )));
        }
        Ok(Comment {
            id: self.id.unwrap_or_default(),
            x: self.x,
            y: self.y,
            text: self.text.unwrap_or_default(),
            author: self.author,
            created_at: self.created_at.unwrap_or(now),
            prototype: self.prototype,
        })
    }
}
