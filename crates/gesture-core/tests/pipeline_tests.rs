use std::time::{Duration, Instant};

use gesture_core::extractor::fixtures::{rotated, upright_hand};
use gesture_core::types::{Finger, Handedness};
use gesture_core::{
    load_rules_or_empty, ActionBindings, GesturePipeline, HandLandmarkFrame, PipelineConfig,
    TriggerKind,
};

const RULES: &str = r#"{
    "THUMBS_SIDE": {"conditions": {"direction": "left", "fingers": {"thumb": "extended"}}},
    "POINT": {"conditions": {"fingers": {"index": "extended"}}},
    "PEACE": {"conditions": {"fingers": {"index": "extended", "middle": "extended"}}}
}"#;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn hand(fingers: &[Finger]) -> HandLandmarkFrame {
    upright_hand(Handedness::Right, fingers)
}

fn config(confirmation_threshold: u32) -> PipelineConfig {
    PipelineConfig {
        confirmation_threshold,
        ..PipelineConfig::default()
    }
}

/// Feeds `frames` copies of `frame` spaced 33ms apart and returns every
/// trigger that fired.
fn hold(
    pipeline: &mut GesturePipeline,
    frame: Option<&HandLandmarkFrame>,
    frames: usize,
    clock: &mut Instant,
) -> Vec<String> {
    let mut fired = Vec::new();
    for _ in 0..frames {
        let hands: Vec<HandLandmarkFrame> = frame.cloned().into_iter().collect();
        let outcome = pipeline.process_frame(&hands, *clock);
        fired.extend(outcome.actions.into_iter().map(|a| a.trigger));
        *clock += ms(33);
    }
    fired
}

#[test]
fn rules_file_drives_classification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gestures.json");
    std::fs::write(&path, RULES).unwrap();

    let rules = load_rules_or_empty(&path);
    assert_eq!(rules.len(), 3);

    let mut pipeline = GesturePipeline::new(config(1), rules, ActionBindings::new());
    let now = Instant::now();

    let point = pipeline.process_frame(&[hand(&[Finger::Index])], now);
    assert_eq!(point.hands[0].raw.as_deref(), Some("POINT"));

    let peace = pipeline.process_frame(&[hand(&[Finger::Index, Finger::Middle])], now);
    assert_eq!(peace.hands[0].raw.as_deref(), Some("PEACE"));

    // Thumb out as well: strict matching rejects POINT, count fallback applies.
    let loose = pipeline.process_frame(&[hand(&[Finger::Index, Finger::Thumb])], now);
    assert_eq!(loose.hands[0].raw.as_deref(), Some("TWO"));

    let sideways = rotated(&hand(&[Finger::Thumb]), 90.0);
    let thumbs = pipeline.process_frame(&[sideways], now);
    assert_eq!(thumbs.hands[0].raw.as_deref(), Some("THUMBS_SIDE"));
}

#[test]
fn missing_rules_fall_back_to_counting() {
    let dir = tempfile::tempdir().unwrap();
    let rules = load_rules_or_empty(&dir.path().join("absent.json"));
    assert!(rules.is_empty());

    let mut pipeline = GesturePipeline::new(config(1), rules, ActionBindings::new());
    let outcome = pipeline.process_frame(&[hand(&Finger::ALL[..3])], Instant::now());
    assert_eq!(outcome.hands[0].raw.as_deref(), Some("THREE"));
}

#[test]
fn combo_from_landmarks_fires_once() {
    let bindings = ActionBindings::new().with("ONE-TWO", "echo combo");
    let mut pipeline = GesturePipeline::new(config(3), Vec::new(), bindings);
    let mut clock = Instant::now();

    let one = hand(&[Finger::Index]);
    let two = hand(&[Finger::Index, Finger::Middle]);

    assert!(hold(&mut pipeline, Some(&one), 5, &mut clock).is_empty());
    let fired = hold(&mut pipeline, Some(&two), 10, &mut clock);
    assert_eq!(fired, ["ONE-TWO"]);
    assert!(pipeline.dispatch().combo().is_empty());
}

#[test]
fn combo_window_expires_between_gestures() {
    let bindings = ActionBindings::new().with("ONE-TWO", "echo combo");
    let mut pipeline = GesturePipeline::new(config(1), Vec::new(), bindings);
    let start = Instant::now();

    pipeline.process_frame(&[hand(&[Finger::Index])], start);
    pipeline.process_frame(&[], start + ms(100));
    let outcome = pipeline.process_frame(&[hand(&[Finger::Index, Finger::Middle])], start + ms(1700));

    assert!(outcome.actions.is_empty());
    assert_eq!(pipeline.dispatch().combo().key(), "TWO");
}

#[test]
fn fist_cooldown_end_to_end() {
    let bindings = ActionBindings::new().with("FIST", "playerctl play-pause");
    let mut pipeline = GesturePipeline::new(config(2), Vec::new(), bindings);
    let fist = hand(&[]);
    let mut clock = Instant::now();

    assert_eq!(hold(&mut pipeline, Some(&fist), 4, &mut clock), ["FIST"]);
    hold(&mut pipeline, None, 3, &mut clock);
    assert!(hold(&mut pipeline, Some(&fist), 4, &mut clock).is_empty());

    hold(&mut pipeline, None, 3, &mut clock);
    clock += ms(1200);
    assert_eq!(hold(&mut pipeline, Some(&fist), 4, &mut clock), ["FIST"]);
}

#[test]
fn combo_beats_single_binding() {
    let bindings = ActionBindings::new()
        .with("TWO", "echo two")
        .with("ONE-TWO", "echo combo");
    let mut pipeline = GesturePipeline::new(config(1), Vec::new(), bindings);
    let now = Instant::now();

    pipeline.process_frame(&[hand(&[Finger::Index])], now);
    let outcome = pipeline.process_frame(&[hand(&[Finger::Index, Finger::Middle])], now + ms(40));

    assert_eq!(outcome.actions.len(), 1);
    assert_eq!(outcome.actions[0].kind, TriggerKind::Combo);
    assert_eq!(outcome.actions[0].command, "echo combo");
}

#[test]
fn flicker_does_not_reach_dispatch() {
    let bindings = ActionBindings::new().with("FIVE", "echo five");
    let mut pipeline = GesturePipeline::new(config(3), Vec::new(), bindings);
    let now = Instant::now();

    let five = hand(&Finger::ALL);
    let four = hand(&Finger::ALL[1..]);
    for frame in [&five, &four, &five, &four, &five] {
        let outcome = pipeline.process_frame(std::slice::from_ref(frame), now);
        assert!(outcome.actions.is_empty());
    }
}
