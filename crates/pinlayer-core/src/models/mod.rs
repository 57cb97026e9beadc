//! Data models for pinlayer

mod comment;
mod geometry;

pub use comment::{Comment, CommentId, CommentPatch, NewComment};
pub use geometry::{ContainerBounds, Point};
