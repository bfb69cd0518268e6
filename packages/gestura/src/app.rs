use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gesture_core::{load_rules_or_empty, ActionBindings, GesturePipeline};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{spawn_json_lines, EventBus, PipelineEvent};
use crate::executor::{ActionExecutor, Notifier, NotifySend, Silent};
use crate::source::{FrameSource, SourceStats};

const TELEMETRY_DRAIN: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    /// Frames replaced in the latest-frame slot before the pipeline saw them.
    pub skipped_frames: u64,
    pub actions: u64,
}

pub struct App {
    config: Config,
    pipeline: GesturePipeline,
    events: Arc<EventBus>,
    notifier: Arc<dyn Notifier>,
}

impl App {
    /// Loads rules and bindings. Missing or broken files leave the
    /// corresponding set empty.
    pub fn new(config: Config) -> Self {
        let rules = load_rules_or_empty(&config.gestures_path);
        let bindings = ActionBindings::load_or_empty(&config.actions_path);
        let pipeline = GesturePipeline::new(config.pipeline_config(), rules, bindings);

        let notifier: Arc<dyn Notifier> = if config.notify {
            Arc::new(NotifySend)
        } else {
            Arc::new(Silent)
        };

        Self {
            config,
            pipeline,
            events: Arc::new(EventBus::new()),
            notifier,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &GesturePipeline {
        &self.pipeline
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    /// Drives the pipeline until the frame source ends or `shutdown`
    /// resolves. A frame that has started processing always completes.
    pub async fn run<F>(mut self, shutdown: F) -> Result<RunSummary, RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let pipeline_config = self.pipeline.config();
        info!(
            rules = self.pipeline.classifier().rules().len(),
            bindings = self.pipeline.bindings().len(),
            confirmation_frames = pipeline_config.confirmation_threshold,
            combo_timeout_ms = pipeline_config.combo_timeout.as_millis() as u64,
            cooldown_ms = pipeline_config.action_cooldown.as_millis() as u64,
            "gesture pipeline ready"
        );

        let mut source = FrameSource::start(self.config.frame_input()).await?;
        let executor = ActionExecutor::spawn(Arc::clone(&self.notifier));
        let mut telemetry = self
            .config
            .debug
            .then(|| spawn_json_lines(self.events.subscribe(), std::io::stderr()));

        tokio::pin!(shutdown);
        let mut summary = RunSummary::default();
        let mut last_seq = 0u64;

        loop {
            let packet = tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                packet = source.next_frame() => packet,
            };
            let Some(packet) = packet else {
                info!("frame source ended");
                break;
            };

            let skipped = packet.seq.saturating_sub(last_seq + 1);
            if skipped > 0 {
                debug!(skipped, seq = packet.seq, "pipeline behind, stale frames dropped");
            }
            summary.skipped_frames += skipped;
            last_seq = packet.seq;

            let outcome = self.pipeline.process_frame(&packet.hands, packet.received_at);
            summary.frames += 1;
            summary.actions += outcome.actions.len() as u64;

            for action in &outcome.actions {
                executor.submit(action.clone());
            }
            for event in PipelineEvent::from_outcome(packet.seq, &outcome) {
                self.events.publish(event);
            }
        }

        let source_result = source.shutdown().await;
        executor.shutdown().await;

        let events = self.events.stats();
        drop(self.events);
        if let Some(task) = telemetry.as_mut() {
            if tokio::time::timeout(TELEMETRY_DRAIN, task).await.is_err() {
                warn!("telemetry writer still busy, abandoning");
            }
        }
        if let Some(task) = telemetry {
            task.abort();
        }

        let source_stats: SourceStats = source_result?;
        info!(
            frames = summary.frames,
            skipped = summary.skipped_frames,
            actions = summary.actions,
            malformed = source_stats.malformed,
            events = events.total_events,
            "gesture pipeline stopped"
        );
        Ok(summary)
    }
}
