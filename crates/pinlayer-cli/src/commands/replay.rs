//! Replay a recorded pointer session through the comment controller.
//!
//! A script is either a bare list of steps or an object with optional
//! container `bounds` and a `steps` list. Pointer steps carry a raw
//! `PointerEvent`; the remaining steps stand in for popup and toolbar input.

use std::path::Path;

use pinlayer_core::controller::{CommentController, Confirm, Intent};
use pinlayer_core::gesture::PointerEvent;
use pinlayer_core::models::{ContainerBounds, Point};
use pinlayer_core::store::CommentStore;
use pinlayer_core::SyncStatus;
use serde::{Deserialize, Serialize};

use crate::commands::common::{CommandContext, StdinConfirm};
use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReplayStep {
    Pointer {
        event: PointerEvent,
    },
    /// Type into the open popup
    Type {
        text: String,
    },
    /// Submit the open popup
    Submit {
        #[serde(default)]
        author: Option<String>,
    },
    Cancel,
    ToggleCommentMode,
    ToggleShowComments,
    Bounds {
        left: f64,
        top: f64,
    },
    Edit {
        index: usize,
        text: String,
    },
    /// Close the details bubble of the pin at `index`
    Collapse {
        index: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub bounds: Option<ContainerBounds>,
    pub steps: Vec<ReplayStep>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptDocument {
    Script(ReplayScript),
    Steps(Vec<ReplayStep>),
}

pub fn parse_replay_script(raw: &str) -> Result<ReplayScript, CliError> {
    let document = serde_json::from_str::<ScriptDocument>(raw)
        .map_err(|error| CliError::Replay(format!("invalid script: {error}")))?;
    Ok(match document {
        ScriptDocument::Script(script) => script,
        ScriptDocument::Steps(steps) => ReplayScript {
            bounds: None,
            steps,
        },
    })
}

pub async fn run_replay(
    context: &CommandContext,
    script_path: &Path,
    dry_run: bool,
    yes: bool,
) -> Result<(), CliError> {
    let script = parse_replay_script(&std::fs::read_to_string(script_path)?)?;
    let (mut resolved, mut controller) = context.open_controller(dry_run).await?;
    let author = resolved.resolve_author(None);
    if let Some(bounds) = script.bounds {
        controller.set_container_bounds(bounds);
    }

    let lines = if yes {
        replay_steps(&mut controller, &script.steps, &author, &mut |_: &str| true)?
    } else {
        replay_steps(&mut controller, &script.steps, &author, &mut StdinConfirm)?
    };
    for line in lines {
        println!("{line}");
    }

    controller.settle().await;
    for comment in controller.comments() {
        if let Some(SyncStatus::Failed(reason)) = controller.sync_status(&comment.id) {
            eprintln!("Failed to save {}: {reason}", comment.id);
        }
    }

    let suffix = if dry_run { " (dry run, nothing saved)" } else { "" };
    println!("{} comments{suffix}", controller.comments().len());
    Ok(())
}

/// Drive `controller` through `steps` and describe what happened
pub fn replay_steps<S, C>(
    controller: &mut CommentController<S>,
    steps: &[ReplayStep],
    author: &str,
    confirm: &mut C,
) -> Result<Vec<String>, CliError>
where
    S: CommentStore + 'static,
    C: Confirm + ?Sized,
{
    let mut lines = Vec::new();
    for (number, step) in steps.iter().enumerate() {
        match step {
            ReplayStep::Pointer { event } => {
                for intent in controller.handle_pointer(*event) {
                    if let Intent::ConfirmDelete(id) = intent {
                        if controller.delete_comment(&id, confirm) {
                            lines.push(format!("deleted {id}"));
                        } else {
                            lines.push(format!("kept {id}"));
                        }
                    } else if let Some(line) = describe_intent(&intent) {
                        lines.push(line);
                    }
                }
            }
            ReplayStep::Type { text } => {
                if !controller.set_draft_text(text.clone()) {
                    return Err(CliError::Replay(format!(
                        "step {number}: no popup is open to type into"
                    )));
                }
            }
            ReplayStep::Submit { author: step_author } => {
                if controller.draft().is_none() {
                    return Err(CliError::Replay(format!(
                        "step {number}: no popup is open to submit"
                    )));
                }
                let author = step_author.as_deref().unwrap_or(author);
                match controller.submit_draft(Some(author)) {
                    Some(id) => lines.push(format!("created {id}")),
                    None => lines.push("submit ignored: empty text".to_string()),
                }
            }
            ReplayStep::Cancel => {
                controller.cancel_draft();
                lines.push("popup closed".to_string());
            }
            ReplayStep::ToggleCommentMode => {
                let enabled = controller.toggle_comment_mode();
                lines.push(format!("comment mode {}", on_off(enabled)));
            }
            ReplayStep::ToggleShowComments => {
                let shown = controller.toggle_show_comments();
                lines.push(format!("comments {}", if shown { "shown" } else { "hidden" }));
            }
            ReplayStep::Bounds { left, top } => {
                controller.set_container_bounds(ContainerBounds::new(*left, *top));
            }
            ReplayStep::Edit { index, text } => {
                let Some(id) = controller.comments().get(*index).map(|c| c.id.clone()) else {
                    return Err(CliError::Replay(format!(
                        "step {number}: no comment at index {index}"
                    )));
                };
                controller.update_comment_text(&id, text.clone());
                lines.push(format!("edited {id}"));
            }
            ReplayStep::Collapse { index } => {
                let Some(id) = controller.comments().get(*index).map(|c| c.id.clone()) else {
                    return Err(CliError::Replay(format!(
                        "step {number}: no comment at index {index}"
                    )));
                };
                if controller.collapse(&id) {
                    lines.push(format!("collapsed {id}"));
                }
            }
        }
    }
    Ok(lines)
}

pub fn describe_intent(intent: &Intent) -> Option<String> {
    match intent {
        Intent::PreventDefault | Intent::ConfirmDelete(_) => None,
        Intent::OpenPopup(anchor) => Some(format!("popup opened at {}", format_point(*anchor))),
        Intent::ClosePopup => Some("popup closed".to_string()),
        Intent::Moved { id, position } => {
            Some(format!("moved {id} to {}", format_point(*position)))
        }
        Intent::DragEnded { id } => Some(format!("drag ended {id}")),
        Intent::ToggledDetails { id, expanded } => Some(format!(
            "{} {id}",
            if *expanded { "expanded" } else { "collapsed" }
        )),
    }
}

fn format_point(point: Point) -> String {
    format!("({}, {})", point.x, point.y)
}

const fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
