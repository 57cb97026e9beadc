use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use clap::Parser;
use pinlayer_core::config::LayerConfig;
use pinlayer_core::controller::{CommentController, ControllerOptions, Intent};
use pinlayer_core::gesture::{PointerEvent, PointerTarget};
use pinlayer_core::models::{Comment, CommentId, Point};
use pinlayer_core::store::MemoryCommentStore;
use pretty_assertions::assert_eq;

use crate::cli::{Cli, Commands};
use crate::commands::common::{
    comment_preview, find_comment, format_comment_lines, format_relative_time, is_affirmative,
    normalize_comment_identifier, normalize_content, open_controller, pick_author,
};
use crate::commands::config::{merge_profile, validate_profile, ProfileValues};
use crate::commands::export::resolve_export_path;
use crate::commands::replay::{describe_intent, parse_replay_script, replay_steps, ReplayStep};
use crate::config_profiles::CliProfile;
use crate::error::CliError;

fn comment(id: &str, text: &str) -> Comment {
    Comment {
        id: CommentId::from_raw(id),
        x: 10.0,
        y: 20.0,
        text: text.to_string(),
        author: Some("Alice".to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap(),
        prototype: None,
    }
}

fn pointer(event: PointerEvent) -> ReplayStep {
    ReplayStep::Pointer { event }
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_comment_identifier_rejects_empty() {
    assert!(matches!(
        normalize_comment_identifier(" \n "),
        Err(CliError::EmptyCommentId)
    ));
    assert_eq!(normalize_comment_identifier("  abc123  ").unwrap(), "abc123");
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
}

#[test]
fn comment_preview_truncates_with_ellipsis() {
    let long = comment("1", "This is a very long sentence that should be shortened");
    assert_eq!(comment_preview(&long, 20), "This is a very lo...");
    let multiline = comment("2", "first   line\nsecond line");
    assert_eq!(comment_preview(&multiline, 40), "first line");
}

#[test]
fn format_comment_lines_include_position_and_author() {
    let lines = format_comment_lines(&[comment("42", "Check this button")]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("42"));
    assert!(lines[0].contains("(10, 20)"));
    assert!(lines[0].contains("Alice"));
    assert!(lines[0].contains("Check this button"));
}

#[test]
fn find_comment_supports_exact_and_prefix_id() {
    let comments = vec![
        comment("0190aaaa-1111", "A"),
        comment("0190aaaa-2222", "B"),
        comment("7", "C"),
    ];

    assert_eq!(find_comment(&comments, "7").unwrap().as_str(), "7");
    assert_eq!(
        find_comment(&comments, "0190aaaa-2").unwrap().as_str(),
        "0190aaaa-2222"
    );
    assert!(matches!(
        find_comment(&comments, "0190aaaa"),
        Err(CliError::AmbiguousCommentId(_))
    ));
    assert!(matches!(
        find_comment(&comments, "missing"),
        Err(CliError::CommentNotFound(_))
    ));
}

#[test]
fn confirmation_answers() {
    assert!(is_affirmative("y\n"));
    assert!(is_affirmative(" YES "));
    assert!(!is_affirmative(""));
    assert!(!is_affirmative("no"));
}

#[test]
fn author_prefers_explicit_then_remembered_then_guest() {
    let layer = LayerConfig {
        prototype: Some("mobile-cpq-v1".to_string()),
        ..LayerConfig::default()
    };
    let mut profile = CliProfile::default();

    assert_eq!(pick_author(Some(" Bob "), &profile, &layer), "Bob");
    assert!(pick_author(None, &profile, &layer).starts_with("Guest-"));

    profile.remember_author(Some("mobile-cpq-v1"), "Alice");
    assert_eq!(pick_author(None, &profile, &layer), "Alice");
    assert_eq!(pick_author(Some("  "), &profile, &layer), "Alice");
}

#[test]
fn merge_profile_prefers_explicit_then_env_then_existing() {
    let mut profile = CliProfile {
        supabase_url: Some("https://old.supabase.co".to_string()),
        table: Some("commenting".to_string()),
        authors: BTreeMap::new(),
        ..CliProfile::default()
    };
    let values = ProfileValues {
        supabase_url: Some("https://new.supabase.co".to_string()),
        ..ProfileValues::default()
    };
    merge_profile(&mut profile, values, |key| {
        (key == "PINLAYER_SUPABASE_ANON_KEY" || key == "PINLAYER_SUPABASE_URL")
            .then(|| format!("env-{key}"))
    });

    assert_eq!(
        profile.supabase_url.as_deref(),
        Some("https://new.supabase.co")
    );
    assert_eq!(
        profile.supabase_anon_key.as_deref(),
        Some("env-PINLAYER_SUPABASE_ANON_KEY")
    );
    assert_eq!(profile.table.as_deref(), Some("commenting"));
}

#[test]
fn validate_profile_requires_http_url() {
    let profile = CliProfile {
        supabase_url: Some("project.supabase.co".to_string()),
        ..CliProfile::default()
    };
    assert!(matches!(
        validate_profile(&profile),
        Err(CliError::Config(_))
    ));
}

#[test]
fn resolve_export_path_names_file_inside_directory() {
    let tmp = tempfile::tempdir().unwrap();
    assert_eq!(
        resolve_export_path(tmp.path(), 123),
        tmp.path().join("comments-123.json")
    );
    let file = tmp.path().join("out.json");
    assert_eq!(resolve_export_path(&file, 123), file);
}

#[test]
fn cli_accepts_negative_coordinates() {
    let cli = Cli::try_parse_from(["pinlayer", "add", "--x", "-5", "--y", "12.5", "hello"]).unwrap();
    match cli.command {
        Some(Commands::Add { x, y, text, .. }) => {
            assert_eq!((x, y), (-5.0, 12.5));
            assert_eq!(text, vec!["hello".to_string()]);
        }
        _ => panic!("expected add command"),
    }
}

#[test]
fn replay_script_accepts_bare_step_list_and_object() {
    let bare = parse_replay_script(
        r#"[{"step": "pointer", "event": {"type": "click", "position": {"x": 1, "y": 2}, "target": "canvas"}},
            {"step": "type", "text": "hi"},
            {"step": "submit"}]"#,
    )
    .unwrap();
    assert_eq!(bare.bounds, None);
    assert_eq!(bare.steps.len(), 3);

    let full = parse_replay_script(
        r#"{"bounds": {"left": 100, "top": 40},
            "steps": [{"step": "pointer", "event": {"type": "down", "position": {"x": 1, "y": 2}, "target": {"pin": 0}}}]}"#,
    )
    .unwrap();
    assert_eq!(full.bounds.map(|bounds| bounds.left), Some(100.0));
    assert_eq!(
        full.steps[0],
        pointer(PointerEvent::Down {
            position: Point::new(1.0, 2.0),
            target: PointerTarget::Pin(0),
        })
    );

    assert!(matches!(
        parse_replay_script(r#"{"steps": "nope"}"#),
        Err(CliError::Replay(_))
    ));
}

#[test]
fn describe_intent_skips_prevent_default() {
    assert_eq!(describe_intent(&Intent::PreventDefault), None);
    assert_eq!(
        describe_intent(&Intent::OpenPopup(Point::new(5.0, 6.5))).as_deref(),
        Some("popup opened at (5, 6.5)")
    );
}

#[tokio::test(flavor = "current_thread")]
async fn replay_session_creates_drags_and_deletes() {
    let mut controller = CommentController::new(
        Arc::new(MemoryCommentStore::new()),
        ControllerOptions::default(),
    );
    let steps = vec![
        pointer(PointerEvent::Click {
            position: Point::new(10.0, 20.0),
            target: PointerTarget::Canvas,
        }),
        ReplayStep::Type {
            text: "Check this".to_string(),
        },
        ReplayStep::Submit { author: None },
        pointer(PointerEvent::Down {
            position: Point::new(10.0, 20.0),
            target: PointerTarget::Pin(0),
        }),
        pointer(PointerEvent::Move {
            position: Point::new(50.0, 60.0),
        }),
        pointer(PointerEvent::Up {
            position: Point::new(50.0, 60.0),
        }),
        pointer(PointerEvent::Click {
            position: Point::new(50.0, 60.0),
            target: PointerTarget::Canvas,
        }),
    ];

    let lines = replay_steps(&mut controller, &steps, "Alice", &mut |_: &str| true).unwrap();
    assert_eq!(lines[0], "popup opened at (10, 20)");
    assert!(lines[1].starts_with("created "));
    assert!(lines.iter().any(|line| line.contains("to (50, 60)")));
    assert_eq!(controller.draft(), None);
    assert_eq!(controller.comments().len(), 1);
    assert_eq!(controller.comments()[0].position(), Point::new(50.0, 60.0));
    assert_eq!(controller.comments()[0].author.as_deref(), Some("Alice"));

    controller.settle().await;
    let stored = controller.store().snapshot().unwrap();
    assert_eq!(stored[0].position(), Point::new(50.0, 60.0));

    let delete = vec![ReplayStep::Pointer {
        event: PointerEvent::DoubleClick {
            target: PointerTarget::Pin(0),
        },
    }];
    let kept = replay_steps(&mut controller, &delete, "Alice", &mut |_: &str| false).unwrap();
    assert!(kept[0].starts_with("kept "));
    let deleted = replay_steps(&mut controller, &delete, "Alice", &mut |_: &str| true).unwrap();
    assert!(deleted[0].starts_with("deleted "));
    assert!(controller.comments().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn replay_collapse_closes_expanded_details() {
    let store = MemoryCommentStore::with_comments(vec![comment("7", "Look here")]);
    let mut controller =
        CommentController::load(Arc::new(store), ControllerOptions::default()).await;
    let script = parse_replay_script(
        r#"[{"step": "pointer", "event": {"type": "click", "position": {"x": 10, "y": 20}, "target": {"pin": 0}}},
            {"step": "collapse", "index": 0},
            {"step": "collapse", "index": 0}]"#,
    )
    .unwrap();

    let lines = replay_steps(&mut controller, &script.steps, "Alice", &mut |_: &str| true).unwrap();
    assert_eq!(lines, vec!["expanded 7".to_string(), "collapsed 7".to_string()]);
    assert!(!controller.is_expanded(&CommentId::from_raw("7")));
}

#[tokio::test(flavor = "current_thread")]
async fn replay_typing_without_popup_is_an_error() {
    let mut controller = CommentController::new(
        Arc::new(MemoryCommentStore::new()),
        ControllerOptions::default(),
    );
    let steps = vec![ReplayStep::Type {
        text: "orphan".to_string(),
    }];
    assert!(matches!(
        replay_steps(&mut controller, &steps, "Alice", &mut |_: &str| true),
        Err(CliError::Replay(_))
    ));
}

#[tokio::test(flavor = "current_thread")]
async fn local_controller_persists_between_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let data_path = tmp.path().join("comments.json");
    let layer = LayerConfig::default();

    let mut controller = open_controller(&layer, &data_path, false).await.unwrap();
    controller.submit_comment(Point::new(3.0, 4.0), "saved", Some("Alice"));
    controller.settle().await;

    let reopened = open_controller(&layer, &data_path, false).await.unwrap();
    assert_eq!(reopened.comments().len(), 1);
    assert_eq!(reopened.comments()[0].text, "saved");
}

#[tokio::test(flavor = "current_thread")]
async fn dry_run_controller_leaves_file_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let data_path = tmp.path().join("comments.json");
    let layer = LayerConfig::default();

    let mut dry = open_controller(&layer, &data_path, true).await.unwrap();
    dry.submit_comment(Point::new(3.0, 4.0), "not saved", None);
    dry.settle().await;
    assert_eq!(dry.comments().len(), 1);

    let reopened = open_controller(&layer, &data_path, false).await.unwrap();
    assert!(reopened.comments().is_empty());
}
