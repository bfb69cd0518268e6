//! Landmark frame source.
//!
//! Frames arrive as newline-delimited JSON, either from the helper process's
//! stdout or from a recorded file. The reader task publishes each decoded frame
//! into a `watch` channel, so a slow consumer always sees the newest frame and
//! skips the rest.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use gesture_core::HandLandmarkFrame;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::RuntimeError;

/// One line of helper output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HelperMessage {
    #[serde(default)]
    pub hands: Vec<HandLandmarkFrame>,
    /// Base64 JPEG, only sent when the helper runs with `--debug`.
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A decoded frame handed to the pipeline.
#[derive(Debug, Clone)]
pub struct FramePacket {
    pub seq: u64,
    pub hands: Vec<HandLandmarkFrame>,
    pub received_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    Helper { argv: Vec<String> },
    File { path: PathBuf, interval: Duration },
    Stdin { interval: Duration },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub lines: u64,
    pub frames: u64,
    pub malformed: u64,
}

/// Blank lines decode to `None`.
pub fn decode_line(line: &str) -> Result<Option<HelperMessage>, RuntimeError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// Reads lines until EOF or a helper `error` message. Malformed lines are
/// logged and skipped. With `interval` set, frames are paced for replay.
pub async fn pump<R>(
    reader: R,
    tx: watch::Sender<Option<FramePacket>>,
    interval: Option<Duration>,
) -> Result<SourceStats, RuntimeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = SourceStats::default();
    let mut ticker = interval.map(tokio::time::interval);

    while let Some(line) = lines.next_line().await? {
        stats.lines += 1;
        let message = match decode_line(&line) {
            Ok(Some(message)) => message,
            Ok(None) => continue,
            Err(err) => {
                stats.malformed += 1;
                warn!(line = stats.lines, error = %err, "skipping malformed frame");
                continue;
            }
        };

        if let Some(error) = message.error {
            return Err(RuntimeError::Helper(error));
        }

        if let Some(ticker) = ticker.as_mut() {
            ticker.tick().await;
        }

        stats.frames += 1;
        let packet = FramePacket {
            seq: stats.frames,
            hands: message.hands,
            received_at: Instant::now(),
        };
        if tx.send(Some(packet)).is_err() {
            debug!("frame consumer gone, stopping reader");
            break;
        }
    }

    Ok(stats)
}

pub fn spawn_helper(argv: &[String]) -> Result<Child, RuntimeError> {
    let (program, args) = argv.split_first().ok_or(RuntimeError::EmptyHelperCommand)?;
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RuntimeError::Spawn {
            program: program.clone(),
            source,
        })?;
    info!(program = %program, pid = ?child.id(), "landmark helper started");
    Ok(child)
}

/// Running frame source: the reader task plus the helper process, if any.
pub struct FrameSource {
    rx: watch::Receiver<Option<FramePacket>>,
    reader: JoinHandle<Result<SourceStats, RuntimeError>>,
    helper: Option<Child>,
}

impl FrameSource {
    pub async fn start(input: FrameInput) -> Result<Self, RuntimeError> {
        let (tx, rx) = watch::channel(None);

        let (reader, helper) = match input {
            FrameInput::Helper { argv } => {
                let mut child = spawn_helper(&argv)?;
                let stdout = child.stdout.take().ok_or(RuntimeError::MissingStdout)?;
                let reader = tokio::spawn(pump(BufReader::new(stdout), tx, None));
                (reader, Some(child))
            }
            FrameInput::File { path, interval } => {
                let file = tokio::fs::File::open(&path).await?;
                info!(path = %path.display(), "replaying landmark frames");
                let reader = tokio::spawn(pump(BufReader::new(file), tx, Some(interval)));
                (reader, None)
            }
            FrameInput::Stdin { interval } => {
                info!("replaying landmark frames from stdin");
                let stdin = BufReader::new(tokio::io::stdin());
                (tokio::spawn(pump(stdin, tx, Some(interval))), None)
            }
        };

        Ok(Self { rx, reader, helper })
    }

    /// Waits for a frame newer than the last one taken. `None` once the
    /// reader has stopped and every frame has been seen.
    pub async fn next_frame(&mut self) -> Option<FramePacket> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(packet) = self.rx.borrow_and_update().clone() {
                return Some(packet);
            }
        }
    }

    /// Stops the reader, kills the helper and reports how the stream ended.
    pub async fn shutdown(mut self) -> Result<SourceStats, RuntimeError> {
        if let Some(mut child) = self.helper.take() {
            info!("terminating landmark helper");
            if let Err(err) = child.kill().await {
                warn!(error = %err, "failed to kill landmark helper");
            }
        }

        // A closed channel means the reader already returned; keep its result.
        let reader_done = self.rx.has_changed().is_err() || self.reader.is_finished();
        if !reader_done {
            self.reader.abort();
        }
        match self.reader.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Ok(SourceStats::default()),
            Err(err) => Err(err.into()),
        }
    }
}
