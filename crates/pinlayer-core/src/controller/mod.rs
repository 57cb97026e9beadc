//! Gesture/sync controller.
//!
//! `CommentController` owns the comment list and the pointer gesture context
//! of one comment layer. Hosts feed it pointer events (or call the operations
//! directly) and render from its state. Every mutation is applied locally
//! first and then mirrored to the store from a spawned task; outcomes come
//! back over a channel and are folded in by [`CommentController::poll_sync`]
//! or [`CommentController::settle`].
//!
//! Spawning requires a tokio runtime, so mutating operations must be called
//! from within one.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::{normalize_text_option, LayerConfig};
use crate::error::Result;
use crate::export::{parse_json_import, render_json_export};
use crate::gesture::{GestureState, GestureTracker, PointerEvent, PointerTarget};
use crate::models::{Comment, CommentId, CommentPatch, ContainerBounds, Point};
use crate::store::CommentStore;

mod sync;

pub use sync::{SyncStatus, WriteKind};
use sync::{SyncOutcome, SyncTracker, WriteMode, WriteOp};


/// Prompt shown before a comment is deleted
pub const DELETE_PROMPT: &str = "Delete this comment?";

/// Blocking yes/no prompt used before destructive actions
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Construction options for a controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerOptions {
    /// Prototype new comments are tagged with and loads are scoped to
    pub prototype: Option<String>,
    /// Author used when a submit does not name one
    pub author: Option<String>,
    pub bounds: ContainerBounds,
}

impl ControllerOptions {
    #[must_use]
    pub fn from_config(config: &LayerConfig) -> Self {
        Self {
            prototype: config.prototype(),
            author: normalize_text_option(config.author.clone()),
            bounds: ContainerBounds::default(),
        }
    }
}

/// The new-comment popup
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    /// Container-relative anchor of the popup
    pub position: Point,
    pub text: String,
}

/// What the renderer should do in response to a pointer event
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Suppress the platform's default drag/selection behavior
    PreventDefault,
    OpenPopup(Point),
    ClosePopup,
    Moved { id: CommentId, position: Point },
    DragEnded { id: CommentId },
    ToggledDetails { id: CommentId, expanded: bool },
    /// Ask the user, then call [`CommentController::delete_comment`]
    ConfirmDelete(CommentId),
}

pub struct CommentController<S> {
    store: Arc<S>,
    options: ControllerOptions,
    comments: Vec<Comment>,
    gesture: GestureTracker,
    bounds: ContainerBounds,
    draft: Option<Draft>,
    comment_mode: bool,
    show_comments: bool,
    expanded: HashSet<CommentId>,
    sync: SyncTracker,
    outcome_tx: mpsc::UnboundedSender<SyncOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<SyncOutcome>,
}

impl<S> std::fmt::Debug for CommentController<S> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CommentController")
            .field("comments", &self.comments.len())
            .field("gesture", &self.gesture.state())
            .field("draft", &self.draft)
            .field("comment_mode", &self.comment_mode)
            .field("show_comments", &self.show_comments)
            .field("in_flight", &self.sync.in_flight())
            .finish_non_exhaustive()
    }
}

impl<S: CommentStore + 'static> CommentController<S> {
    /// Controller with an empty list
    pub fn new(store: Arc<S>, options: ControllerOptions) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            store,
            bounds: options.bounds,
            options,
            comments: Vec::new(),
            gesture: GestureTracker::new(),
            draft: None,
            comment_mode: true,
            show_comments: true,
            expanded: HashSet::new(),
            sync: SyncTracker::default(),
            outcome_tx,
            outcome_rx,
        }
    }

    /// Controller populated from the store.
    ///
    /// This is the only awaited store call. A failed load is logged and the
    /// layer starts empty.
    pub async fn load(store: Arc<S>, options: ControllerOptions) -> Self {
        let mut controller = Self::new(store, options);
        let prototype = controller.options.prototype.clone();
        match controller.store.list_all(prototype.as_deref()).await {
            Ok(comments) => {
                tracing::info!("Loaded {} comments", comments.len());
                for comment in &comments {
                    controller.sync.mark_durable(&comment.id);
                }
                controller.comments = comments;
            }
            Err(error) => {
                tracing::warn!("Failed to load comments, starting empty: {}", error);
            }
        }
        controller
    }

    // ---- state ----

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    #[must_use]
    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|comment| &comment.id == id)
    }

    /// Pins the renderer should draw
    #[must_use]
    pub fn visible_pins(&self) -> &[Comment] {
        if self.show_comments {
            self.comments.as_slice()
        } else {
            &[]
        }
    }

    #[must_use]
    pub const fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    #[must_use]
    pub const fn comment_mode(&self) -> bool {
        self.comment_mode
    }

    #[must_use]
    pub const fn show_comments(&self) -> bool {
        self.show_comments
    }

    #[must_use]
    pub const fn gesture_state(&self) -> GestureState {
        self.gesture.state()
    }

    #[must_use]
    pub const fn bounds(&self) -> ContainerBounds {
        self.bounds
    }

    #[must_use]
    pub fn is_expanded(&self, id: &CommentId) -> bool {
        self.expanded.contains(id)
    }

    /// Close a pin's details. Returns `false` when they were not open.
    pub fn collapse(&mut self, id: &CommentId) -> bool {
        self.expanded.remove(id)
    }

    #[must_use]
    pub fn sync_status(&self, id: &CommentId) -> Option<SyncStatus> {
        self.sync.status(id)
    }

    /// Writes issued and not yet folded back in
    #[must_use]
    pub const fn pending_writes(&self) -> usize {
        self.sync.in_flight()
    }

    // ---- toolbar and popup ----

    /// Update the container's client-space origin after scroll or resize
    pub fn set_container_bounds(&mut self, bounds: ContainerBounds) {
        self.bounds = bounds;
    }

    /// Turning comment mode off also closes the popup
    pub fn set_comment_mode(&mut self, enabled: bool) {
        self.comment_mode = enabled;
        if !enabled {
            self.draft = None;
        }
    }

    pub fn toggle_comment_mode(&mut self) -> bool {
        self.set_comment_mode(!self.comment_mode);
        self.comment_mode
    }

    pub fn toggle_show_comments(&mut self) -> bool {
        self.show_comments = !self.show_comments;
        if !self.show_comments {
            self.gesture.reset();
        }
        self.show_comments
    }

    /// Replace the popup's text. Returns `false` when no popup is open.
    pub fn set_draft_text(&mut self, text: impl Into<String>) -> bool {
        match &mut self.draft {
            Some(draft) => {
                draft.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn cancel_draft(&mut self) {
        self.draft = None;
    }

    // ---- gestures ----

    /// Pointer pressed on the pin at `index`.
    ///
    /// Returns `true` when the host should suppress the platform's default
    /// drag behavior.
    pub fn begin_drag(&mut self, index: usize) -> bool {
        if !self.show_comments || index >= self.comments.len() {
            return false;
        }
        self.gesture.press_pin(index);
        true
    }

    /// Pointer moved to `pointer` (client coordinates).
    ///
    /// Moves the held pin and mirrors the new position to the store.
    pub fn update_drag(&mut self, pointer: Point) -> Option<(CommentId, Point)> {
        let position = self.bounds.to_local(pointer);
        if !position.is_finite() {
            return None;
        }
        let index = self.gesture.state().active_index()?;
        let comment = self.comments.get_mut(index)?;
        self.gesture.movement();
        comment.move_to(position);
        let id = comment.id.clone();
        self.persist_patch(&id, CommentPatch::position(position));
        Some((id, position))
    }

    /// Pointer released. Returns the dragged pin, if the press became a drag.
    pub fn end_drag(&mut self) -> Option<CommentId> {
        let index = self.gesture.release()?;
        self.comments.get(index).map(|comment| comment.id.clone())
    }

    /// Click on the container. Opens the popup at the container-relative
    /// point when comment mode is on, the click landed on the canvas itself,
    /// and it is not the trailing click of a drag.
    pub fn handle_canvas_click(&mut self, pointer: Point, target: PointerTarget) -> Option<Point> {
        let suppressed = self.gesture.take_click_suppression();
        if suppressed || !self.comment_mode || target != PointerTarget::Canvas {
            return None;
        }
        let position = self.bounds.to_local(pointer);
        if !position.is_finite() {
            return None;
        }
        self.draft = Some(Draft {
            position,
            text: String::new(),
        });
        Some(position)
    }

    /// Click on the pin at `index`. Returns the new expanded state, or `None`
    /// when the click was swallowed.
    pub fn handle_pin_click(&mut self, index: usize) -> Option<(CommentId, bool)> {
        if self.gesture.take_click_suppression() || !self.show_comments {
            return None;
        }
        let id = self.comments.get(index)?.id.clone();
        let expanded = if self.expanded.remove(&id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        };
        Some((id, expanded))
    }

    /// Pointer-down anywhere while the popup is open. Anything but the popup
    /// closes it and discards the draft.
    pub fn dismiss_on_outside_interaction(&mut self, target: PointerTarget) -> bool {
        if self.draft.is_none() || target == PointerTarget::Popup {
            return false;
        }
        self.draft = None;
        true
    }

    /// Route a raw pointer event and report what the renderer should do.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<Intent> {
        let mut intents = Vec::new();
        match event {
            PointerEvent::Down { target, .. } => {
                self.gesture.press();
                if self.dismiss_on_outside_interaction(target) {
                    intents.push(Intent::ClosePopup);
                }
                if let PointerTarget::Pin(index) = target {
                    if self.begin_drag(index) {
                        intents.push(Intent::PreventDefault);
                    }
                }
            }
            PointerEvent::Move { position } => {
                if let Some((id, position)) = self.update_drag(position) {
                    intents.push(Intent::Moved { id, position });
                }
            }
            PointerEvent::Up { .. } => {
                if let Some(id) = self.end_drag() {
                    intents.push(Intent::DragEnded { id });
                }
            }
            PointerEvent::Click { position, target } => match target {
                PointerTarget::Pin(index) => {
                    if let Some((id, expanded)) = self.handle_pin_click(index) {
                        intents.push(Intent::ToggledDetails { id, expanded });
                    }
                }
                _ => {
                    if let Some(anchor) = self.handle_canvas_click(position, target) {
                        intents.push(Intent::OpenPopup(anchor));
                    }
                }
            },
            PointerEvent::DoubleClick { target } => {
                if let PointerTarget::Pin(index) = target {
                    if let Some(comment) = self.visible_pins().get(index) {
                        intents.push(Intent::ConfirmDelete(comment.id.clone()));
                    }
                }
            }
        }
        intents
    }

    // ---- mutations ----

    /// Create a comment at the container-relative `position`.
    ///
    /// Blank text is a no-op. The popup closes and the insert runs in the
    /// background; the returned id is provisional until it completes.
    pub fn submit_comment(
        &mut self,
        position: Point,
        text: &str,
        author: Option<&str>,
    ) -> Option<CommentId> {
        let text = text.trim();
        if text.is_empty() || !position.is_finite() {
            return None;
        }
        let author = normalize_text_option(author.map(ToString::to_string))
            .or_else(|| self.options.author.clone());

        let mut comment = Comment::new(position, text, author);
        comment.prototype.clone_from(&self.options.prototype);
        let id = comment.id.clone();
        let payload = comment.to_new();

        self.comments.push(comment);
        self.draft = None;
        self.spawn_write(vec![id.clone()], WriteOp::Create(payload));
        Some(id)
    }

    /// Submit the open popup
    pub fn submit_draft(&mut self, author: Option<&str>) -> Option<CommentId> {
        let draft = self.draft.as_ref()?;
        let (position, text) = (draft.position, draft.text.clone());
        self.submit_comment(position, &text, author)
    }

    /// Delete `id` after confirmation. Returns whether it was removed.
    pub fn delete_comment<C: Confirm + ?Sized>(&mut self, id: &CommentId, confirm: &mut C) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if !confirm.confirm(DELETE_PROMPT) {
            return false;
        }

        self.comments.remove(index);
        self.expanded.remove(id);
        if self.gesture.state() != GestureState::Idle {
            // indices shifted under the held pin
            self.gesture.reset();
        }
        self.discard_remote(id);
        true
    }

    pub fn update_comment_text(&mut self, id: &CommentId, text: impl Into<String>) -> bool {
        let text = text.into();
        let Some(comment) = self.comments.iter_mut().find(|comment| &comment.id == id) else {
            return false;
        };
        comment.text.clone_from(&text);
        self.persist_patch(id, CommentPatch::text(text));
        true
    }

    /// Move `id` to a container-relative position
    pub fn move_comment(&mut self, id: &CommentId, position: Point) -> bool {
        if !position.is_finite() {
            return false;
        }
        let Some(comment) = self.comments.iter_mut().find(|comment| &comment.id == id) else {
            return false;
        };
        comment.move_to(position);
        self.persist_patch(id, CommentPatch::position(position));
        true
    }

    // ---- import / export ----

    pub fn export_json(&self) -> Result<String> {
        Ok(render_json_export(&self.comments)?)
    }

    /// Replace the list with an imported document.
    ///
    /// Malformed input leaves everything untouched. Otherwise the imported
    /// records are upserted to the store and records missing from the
    /// document are deleted there. A record whose insert is still running
    /// keeps its provisional id out of the upsert; its imported fields are
    /// written once the insert reports the durable id.
    pub fn import_json(&mut self, raw: &str) -> Result<usize> {
        let imported = parse_json_import(raw)?;
        let kept: HashSet<CommentId> = imported.iter().map(|comment| comment.id.clone()).collect();

        let removed: Vec<CommentId> = self
            .comments
            .iter()
            .filter(|comment| !kept.contains(&comment.id))
            .map(|comment| comment.id.clone())
            .collect();
        for id in &removed {
            self.discard_remote(id);
        }

        self.comments = imported;
        self.expanded.retain(|id| kept.contains(id));
        self.gesture.reset();

        let mut upserted = Vec::with_capacity(self.comments.len());
        for comment in &self.comments {
            if self.sync.write_mode(&comment.id) == WriteMode::Creating {
                self.sync.mark_dirty(&comment.id);
            } else {
                self.sync.mark_durable(&comment.id);
                upserted.push(comment.clone());
            }
        }
        if !upserted.is_empty() {
            let ids = upserted.iter().map(|comment| comment.id.clone()).collect();
            self.spawn_write(ids, WriteOp::Import(upserted));
        }
        let count = self.comments.len();
        tracing::info!("Imported {} comments", count);
        Ok(count)
    }

    // ---- sync ----

    /// Fold in every write that has finished, without waiting.
    /// Returns how many were applied.
    pub fn poll_sync(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
            applied += 1;
        }
        applied
    }

    /// Wait for every in-flight write, including follow-ups issued while
    /// reconciling inserts.
    pub async fn settle(&mut self) {
        self.poll_sync();
        while self.sync.in_flight() > 0 {
            let Some(outcome) = self.outcome_rx.recv().await else {
                break;
            };
            self.apply_outcome(outcome);
        }
    }

    fn index_of(&self, id: &CommentId) -> Option<usize> {
        self.comments.iter().position(|comment| &comment.id == id)
    }

    fn spawn_write(&mut self, ids: Vec<CommentId>, op: WriteOp) {
        let seq = self.sync.begin(&ids);
        let kind = op.kind();
        let store = Arc::clone(&self.store);
        let outcome_tx = self.outcome_tx.clone();
        tracing::debug!("Issuing {} #{} for {} comment(s)", kind, seq, ids.len());

        tokio::spawn(async move {
            let result = op
                .run(store.as_ref())
                .await
                .map_err(|error| error.to_string());
            // receiver gone means the controller was dropped
            let _ = outcome_tx.send(SyncOutcome {
                ids,
                seq,
                kind,
                result,
            });
        });
    }

    fn persist_patch(&mut self, id: &CommentId, patch: CommentPatch) {
        match self.sync.write_mode(id) {
            WriteMode::Durable => self.spawn_write(
                vec![id.clone()],
                WriteOp::Update {
                    id: id.clone(),
                    patch,
                },
            ),
            WriteMode::Creating => self.sync.mark_dirty(id),
            WriteMode::LocalOnly => {
                tracing::debug!("Comment {} is not stored remotely, keeping change local", id);
            }
        }
    }

    fn discard_remote(&mut self, id: &CommentId) {
        match self.sync.write_mode(id) {
            WriteMode::Durable => {
                self.sync.mark_deleted(id);
                self.spawn_write(vec![id.clone()], WriteOp::Delete { id: id.clone() });
            }
            WriteMode::Creating => self.sync.mark_deleted(id),
            WriteMode::LocalOnly => self.sync.forget(id),
        }
    }

    fn apply_outcome(&mut self, outcome: SyncOutcome) {
        self.sync.finish(&outcome);
        match outcome.result {
            Ok(Some(stored)) if outcome.kind == WriteKind::Create => {
                if let Some(provisional) = outcome.ids.first() {
                    self.reconcile_insert(provisional, stored);
                }
            }
            Ok(_) => {}
            Err(error) => {
                let ids: Vec<&str> = outcome.ids.iter().map(CommentId::as_str).collect();
                tracing::warn!(
                    "Failed to {} comment(s) {}: {}",
                    outcome.kind,
                    ids.join(", "),
                    error
                );
            }
        }
    }

    fn reconcile_insert(&mut self, provisional: &CommentId, stored: Comment) {
        let durable = stored.id;
        let reconciled = self.sync.reconcile(provisional, &durable);
        if self.expanded.remove(provisional) {
            self.expanded.insert(durable.clone());
        }
        tracing::debug!("Comment {} stored as {}", provisional, durable);

        if reconciled.deleted {
            self.spawn_write(vec![durable.clone()], WriteOp::Delete { id: durable });
            return;
        }

        let Some(comment) = self
            .comments
            .iter_mut()
            .find(|comment| &comment.id == provisional)
        else {
            return;
        };
        comment.id = durable.clone();
        if reconciled.dirty {
            let patch = CommentPatch::full(comment);
            self.spawn_write(
                vec![durable.clone()],
                WriteOp::Update { id: durable, patch },
            );
        }
    }
}
