//! pinlayer-core - Core library for pinlayer
//!
//! This crate contains the comment model, the pointer gesture state machine,
//! the gesture/sync controller, and the persistence backends used by every
//! pinlayer host.

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod gesture;
pub mod models;
pub mod store;

pub use controller::{CommentController, Confirm, ControllerOptions, Intent, SyncStatus};
pub use error::{Error, Result};
pub use models::{Comment, CommentId};
