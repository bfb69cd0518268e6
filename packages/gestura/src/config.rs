use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use gesture_core::types::{
    DEFAULT_ACTION_COOLDOWN, DEFAULT_COMBO_TIMEOUT, DEFAULT_CONFIRMATION_THRESHOLD,
    DEFAULT_HAND_SLOTS, THUMB_EXTENSION_THRESHOLD,
};
use gesture_core::{PipelineConfig, SlotAssignment};
use tracing::warn;

use crate::source::FrameInput;

pub const DEFAULT_HELPER: &str =
    "mediapipe_helper/venv/bin/python mediapipe_helper/mediapipe_helper.py";
pub const DEFAULT_REPLAY_INTERVAL: Duration = Duration::from_millis(33);
/// Upper bound on tracked hands; each slot carries its own stabilizer.
pub const MAX_HAND_SLOTS: usize = 8;

#[derive(Parser, Debug, Default)]
#[command(name = "gestura", about = "Hand-gesture shortcuts driven by a landmark helper")]
pub struct Cli {
    /// Emit per-frame telemetry as JSON lines on stderr and pass --debug to the helper
    #[arg(long)]
    pub debug: bool,

    /// Gesture rules file
    #[arg(long)]
    pub gestures: Option<PathBuf>,

    /// Action bindings file
    #[arg(long)]
    pub actions: Option<PathBuf>,

    /// Helper command line (split on whitespace)
    #[arg(long)]
    pub helper: Option<String>,

    /// Replay landmark JSON lines from a file instead of the helper ("-" for stdin)
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub gestures_path: PathBuf,
    pub actions_path: PathBuf,
    pub confirmation_frames: u32,
    pub combo_timeout: Duration,
    pub action_cooldown: Duration,
    pub thumb_ratio: f64,
    pub hand_slots: usize,
    pub slot_assignment: SlotAssignment,
    pub helper: String,
    pub input: Option<PathBuf>,
    pub replay_interval: Duration,
    pub debug: bool,
    pub notify: bool,
    pub log_level: Option<String>,
    /// Set when `ENABLE_FILE_LOGS` is on.
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gestures_path: PathBuf::from("gestures.json"),
            actions_path: PathBuf::from("actions.json"),
            confirmation_frames: DEFAULT_CONFIRMATION_THRESHOLD,
            combo_timeout: DEFAULT_COMBO_TIMEOUT,
            action_cooldown: DEFAULT_ACTION_COOLDOWN,
            thumb_ratio: THUMB_EXTENSION_THRESHOLD,
            hand_slots: DEFAULT_HAND_SLOTS,
            slot_assignment: SlotAssignment::DetectionOrder,
            helper: DEFAULT_HELPER.to_string(),
            input: None,
            replay_interval: DEFAULT_REPLAY_INTERVAL,
            debug: false,
            notify: true,
            log_level: None,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. Unparseable values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let parsed = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<u64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(key, value = %raw, "ignoring non-numeric value");
                    None
                }
            }
        };

        let slot_assignment = match lookup("GESTURA_SLOT_ASSIGNMENT") {
            Some(raw) => SlotAssignment::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown slot assignment, using detection order");
                defaults.slot_assignment
            }),
            None => defaults.slot_assignment,
        };

        let hand_slots = match parsed("GESTURA_HAND_SLOTS") {
            Some(requested) => {
                let slots = requested.clamp(1, MAX_HAND_SLOTS as u64) as usize;
                if slots as u64 != requested {
                    warn!(requested, slots, "hand slot count out of range, clamped");
                }
                slots
            }
            None => defaults.hand_slots,
        };

        let thumb_ratio = lookup("GESTURA_THUMB_RATIO")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
            .unwrap_or(defaults.thumb_ratio);

        Self {
            gestures_path: lookup("GESTURA_GESTURES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.gestures_path),
            actions_path: lookup("GESTURA_ACTIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.actions_path),
            confirmation_frames: parsed("GESTURA_CONFIRMATION_FRAMES")
                .map(|n| n.clamp(1, u32::MAX as u64) as u32)
                .unwrap_or(defaults.confirmation_frames),
            combo_timeout: parsed("GESTURA_COMBO_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.combo_timeout),
            action_cooldown: parsed("GESTURA_ACTION_COOLDOWN_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.action_cooldown),
            thumb_ratio,
            hand_slots,
            slot_assignment,
            helper: lookup("GESTURA_HELPER")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.helper),
            input: lookup("GESTURA_INPUT").map(PathBuf::from),
            replay_interval: parsed("GESTURA_REPLAY_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.replay_interval),
            debug: lookup("GESTURA_DEBUG").map(|v| flag(&v)).unwrap_or(false),
            notify: lookup("GESTURA_NOTIFY").map(|v| flag(&v)).unwrap_or(true),
            log_level: lookup("RUST_LOG"),
            log_dir: lookup("ENABLE_FILE_LOGS")
                .filter(|v| v == "true" || v == "1")
                .map(|_| {
                    lookup("LOG_DIR")
                        .map(PathBuf::from)
                        .unwrap_or_else(|| PathBuf::from("./logs"))
                }),
        }
    }

    /// Command-line values win over the environment.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if cli.debug {
            self.debug = true;
        }
        if let Some(path) = &cli.gestures {
            self.gestures_path = path.clone();
        }
        if let Some(path) = &cli.actions {
            self.actions_path = path.clone();
        }
        if let Some(helper) = &cli.helper {
            self.helper = helper.clone();
        }
        if let Some(input) = &cli.input {
            self.input = Some(input.clone());
        }
        self
    }

    /// `RUST_LOG` if set, otherwise `debug` in debug mode and `info` otherwise.
    pub fn log_level(&self) -> &str {
        match &self.log_level {
            Some(level) => level,
            None if self.debug => "debug",
            None => "info",
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            thumb_extension_ratio: self.thumb_ratio,
            confirmation_threshold: self.confirmation_frames.max(1),
            combo_timeout: self.combo_timeout,
            action_cooldown: self.action_cooldown,
            hand_slots: self.hand_slots.clamp(1, MAX_HAND_SLOTS),
            slot_assignment: self.slot_assignment,
        }
    }

    pub fn frame_input(&self) -> FrameInput {
        match &self.input {
            Some(path) if path.as_os_str() == "-" => FrameInput::Stdin {
                interval: self.replay_interval,
            },
            Some(path) => FrameInput::File {
                path: path.clone(),
                interval: self.replay_interval,
            },
            None => {
                let mut argv: Vec<String> =
                    self.helper.split_whitespace().map(str::to_owned).collect();
                if self.debug {
                    argv.push("--debug".to_string());
                }
                FrameInput::Helper { argv }
            }
        }
    }
}

fn flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
