// Tests for the sequential batch runner: terminal statuses, failure
// isolation, cooperative cancellation and progress accounting.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use banana_batch::batch::{BatchEvent, BatchOutcome, BatchRunner, CancelToken};
use banana_batch::editor::{EditError, EditedImage, ImageEditor, SourceImage};
use banana_batch::library::{ImageItem, ImageStatus};
use proptest::prelude::*;
use tokio::runtime::Runtime;

/// Editor double that replays a fixed script of per-item results.
struct ScriptedEditor {
    script: Mutex<VecDeque<Result<EditedImage, EditError>>>,
}

impl ScriptedEditor {
    fn new(script: Vec<Result<EditedImage, EditError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

impl ImageEditor for ScriptedEditor {
    async fn edit(
        &self,
        _image: SourceImage<'_>,
        _instruction: &str,
    ) -> Result<EditedImage, EditError> {
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Err(EditError::NoImageReturned))
    }
}

fn ok_png(data: &str) -> Result<EditedImage, EditError> {
    Ok(EditedImage {
        data: data.to_string(),
        media_type: "image/png".to_string(),
    })
}

fn queue_item(id: &str, file_name: &str) -> ImageItem {
    ImageItem {
        id: id.to_string(),
        file_name: file_name.to_string(),
        media_type: "image/jpeg".to_string(),
        bytes: Arc::new(vec![0xFF, 0xD8, 0xFF]),
        preview_path: None,
        result_data_url: None,
        status: ImageStatus::Pending,
        error: None,
    }
}

/// Final status per item id, taken from the last ItemStatus event emitted.
fn final_statuses(events: &[BatchEvent]) -> HashMap<String, ImageStatus> {
    let mut map = HashMap::new();
    for event in events {
        if let BatchEvent::ItemStatus { id, status, .. } = event {
            map.insert(id.clone(), *status);
        }
    }
    map
}

fn last_progress(events: &[BatchEvent]) -> Option<(usize, usize)> {
    events.iter().rev().find_map(|event| match event {
        BatchEvent::Progress { current, total } => Some((*current, *total)),
        _ => None,
    })
}

#[tokio::test]
async fn uncancelled_run_leaves_every_item_terminal() {
    let editor = ScriptedEditor::new(vec![
        ok_png("AAAA"),
        Err(EditError::Transport("connection reset".to_string())),
        ok_png("BBBB"),
    ]);
    let runner = BatchRunner::new(editor);
    let queue = vec![
        queue_item("a", "a.jpg"),
        queue_item("b", "b.jpg"),
        queue_item("c", "c.jpg"),
    ];

    let mut events = Vec::new();
    let token = CancelToken::new();
    let outcome = runner
        .run(&queue, "make it pop", &token, |event| events.push(event))
        .await;

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.completed, 2);
    assert_eq!(outcome.failed, 1);
    assert!(!outcome.cancelled);

    let statuses = final_statuses(&events);
    assert_eq!(statuses.len(), 3);
    for status in statuses.values() {
        assert!(
            matches!(status, ImageStatus::Completed | ImageStatus::Failed),
            "item left in non-terminal status: {:?}",
            status
        );
    }
    assert_eq!(last_progress(&events), Some((3, 3)));
}

#[tokio::test]
async fn failure_on_first_item_does_not_stop_the_second() {
    let editor = ScriptedEditor::new(vec![Err(EditError::NoImageReturned), ok_png("CCCC")]);
    let runner = BatchRunner::new(editor);
    let queue = vec![queue_item("one", "one.jpg"), queue_item("two", "two.jpg")];

    let mut events = Vec::new();
    let outcome = runner
        .run(&queue, "sepia", &CancelToken::new(), |event| {
            events.push(event)
        })
        .await;

    let statuses = final_statuses(&events);
    assert_eq!(statuses["one"], ImageStatus::Failed);
    assert_eq!(statuses["two"], ImageStatus::Completed);
    assert_eq!(outcome.attempted, 2);
    assert_eq!(outcome.total, 2);
    assert_eq!(last_progress(&events), Some((2, 2)));
}

#[tokio::test]
async fn completed_item_carries_result_data_url() {
    let editor = ScriptedEditor::new(vec![ok_png("QUJD")]);
    let runner = BatchRunner::new(editor);
    let queue = vec![queue_item("only", "photo.jpg")];

    let mut events = Vec::new();
    runner
        .run(&queue, "make it black and white", &CancelToken::new(), |e| {
            events.push(e)
        })
        .await;

    let payload = events.iter().find_map(|event| match event {
        BatchEvent::ItemStatus {
            status: ImageStatus::Completed,
            result_data_url,
            ..
        } => result_data_url.clone(),
        _ => None,
    });
    assert_eq!(payload.as_deref(), Some("data:image/png;base64,QUJD"));
}

#[tokio::test]
async fn cancellation_between_items_leaves_the_rest_untouched() {
    let editor = ScriptedEditor::new(vec![ok_png("AAAA"), ok_png("BBBB"), ok_png("CCCC")]);
    let runner = BatchRunner::new(editor);
    let queue = vec![
        queue_item("a", "a.jpg"),
        queue_item("b", "b.jpg"),
        queue_item("c", "c.jpg"),
    ];

    let token = CancelToken::new();
    let stopper = token.clone();
    let mut events = Vec::new();
    let outcome = runner
        .run(&queue, "invert", &token, |event| {
            // stop after the first attempt is accounted for
            if matches!(event, BatchEvent::Progress { current: 1, .. }) {
                stopper.request_stop();
            }
            events.push(event);
        })
        .await;

    assert!(outcome.cancelled);
    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.completed, 1);

    let statuses = final_statuses(&events);
    assert_eq!(statuses.len(), 1, "unreached items must get no events");
    assert!(!statuses.contains_key("b"));
    assert!(!statuses.contains_key("c"));
    assert_eq!(last_progress(&events), Some((1, 3)));

    // the token is cleared on loop exit, ready for the next run
    assert!(!token.is_stopped());
}

#[tokio::test]
async fn blank_instruction_is_a_no_op() {
    let editor = ScriptedEditor::new(vec![ok_png("AAAA")]);
    let runner = BatchRunner::new(editor);
    let queue = vec![queue_item("a", "a.jpg")];

    let mut events = Vec::new();
    let outcome = runner
        .run(&queue, "   ", &CancelToken::new(), |event| {
            events.push(event)
        })
        .await;

    assert_eq!(outcome.attempted, 0);
    assert_eq!(outcome.total, 0);
    assert!(events.is_empty());
}

#[tokio::test]
async fn already_stopped_token_is_reset_before_the_run() {
    let editor = ScriptedEditor::new(vec![ok_png("AAAA")]);
    let runner = BatchRunner::new(editor);
    let queue = vec![queue_item("a", "a.jpg")];

    // stale stop request from a previous run must not cancel a fresh one
    let token = CancelToken::new();
    token.request_stop();

    let outcome = runner
        .run(&queue, "grayscale", &token, |_| {})
        .await;

    assert!(!outcome.cancelled);
    assert_eq!(outcome.attempted, 1);
}

proptest! {
    /// Whatever the success/failure script, an uncancelled run never leaves
    /// an item pending or processing, and progress counts every attempt.
    #[test]
    fn any_script_ends_with_terminal_statuses(script in proptest::collection::vec(any::<bool>(), 1..16)) {
        let runtime = Runtime::new().expect("runtime init failed");

        let results: Vec<Result<EditedImage, EditError>> = script
            .iter()
            .map(|&succeeds| {
                if succeeds {
                    ok_png("QUJD")
                } else {
                    Err(EditError::NoImageReturned)
                }
            })
            .collect();
        let expected_completed = script.iter().filter(|&&s| s).count();

        let queue: Vec<ImageItem> = (0..script.len())
            .map(|i| queue_item(&format!("item-{}", i), &format!("photo_{}.jpg", i)))
            .collect();

        let runner = BatchRunner::new(ScriptedEditor::new(results));
        let mut events = Vec::new();
        let outcome: BatchOutcome = runtime.block_on(runner.run(
            &queue,
            "stylize",
            &CancelToken::new(),
            |event| events.push(event),
        ));

        prop_assert_eq!(outcome.attempted, script.len());
        prop_assert_eq!(outcome.completed, expected_completed);
        prop_assert_eq!(outcome.failed, script.len() - expected_completed);

        let statuses = final_statuses(&events);
        prop_assert_eq!(statuses.len(), script.len());
        for status in statuses.values() {
            prop_assert!(matches!(status, ImageStatus::Completed | ImageStatus::Failed));
        }
        prop_assert_eq!(last_progress(&events), Some((script.len(), script.len())));
    }
}
