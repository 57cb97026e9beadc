//! Comment model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::Point;

/// Identifier of a comment.
///
/// Client-generated ids are UUID v7 strings; the remote table assigns integer
/// keys. Both are carried as text so a provisional id can be swapped for the
/// backend's once an insert is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommentId(String);

impl CommentId {
    /// Create a new client-side id using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wrap an existing identifier
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CommentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CommentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CommentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        let raw = match RawId::deserialize(deserializer)? {
            RawId::Text(text) => text,
            RawId::Signed(value) => value.to_string(),
            RawId::Unsigned(value) => value.to_string(),
        };
        if raw.trim().is_empty() {
            return Err(serde::de::Error::custom("comment id must not be empty"));
        }
        Ok(Self(raw))
    }
}

/// A positioned comment pin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// Container-relative x in pixels
    pub x: f64,
    /// Container-relative y in pixels
    pub y: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Creation timestamp, immutable after creation
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Prototype the comment was left on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype: Option<String>,
}

impl Comment {
    /// Create a comment at `position` with a fresh client-side id
    #[must_use]
    pub fn new(position: Point, text: impl Into<String>, author: Option<String>) -> Self {
        Self {
            id: CommentId::new(),
            x: position.x,
            y: position.y,
            text: text.into(),
            author,
            created_at: Utc::now(),
            prototype: None,
        }
    }

    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn move_to(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    /// Author label for display, `"Unknown"` when absent
    #[must_use]
    pub fn author_label(&self) -> &str {
        self.author.as_deref().unwrap_or("Unknown")
    }

    /// Insert payload for this record, without its id
    #[must_use]
    pub fn to_new(&self) -> NewComment {
        NewComment {
            x: self.x,
            y: self.y,
            text: self.text.clone(),
            author: self.author.clone(),
            created_at: self.created_at,
            prototype: self.prototype.clone(),
        }
    }
}

/// Insert payload; the store assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype: Option<String>,
}

impl NewComment {
    /// Materialize the record once the store has chosen an id
    #[must_use]
    pub fn into_comment(self, id: CommentId) -> Comment {
        Comment {
            id,
            x: self.x,
            y: self.y,
            text: self.text,
            author: self.author,
            created_at: self.created_at,
            prototype: self.prototype,
        }
    }
}

/// Partial update. Only populated fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CommentPatch {
    #[must_use]
    pub const fn position(position: Point) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            text: None,
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            x: None,
            y: None,
            text: Some(text.into()),
        }
    }

    /// Patch carrying every mutable field of `comment`
    #[must_use]
    pub fn full(comment: &Comment) -> Self {
        Self {
            x: Some(comment.x),
            y: Some(comment.y),
            text: Some(comment.text.clone()),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.text.is_none()
    }

    pub fn apply_to(&self, comment: &mut Comment) {
        if let Some(x) = self.x {
            comment.x = x;
        }
        if let Some(y) = self.y {
            comment.y = y;
        }
        if let Some(text) = &self.text {
            comment.text.clone_from(text);
        }
    }
}
