//! Judgment recorder.
//!
//! Provides the main `JudgmentRecorder` type, which ties a configuration to a
//! sink and stamps configured defaults onto recorded events.

use ajt_core::{AjtConfig, Encoding, OutputConfig, OutputKind};
use std::sync::Arc;

use crate::error::TrailError;
use crate::event::{JudgmentEvent, JudgmentEventBuilder};
use crate::policy::PolicyEngine;
use crate::sink::{NullSink, TrailSink, WriterSink, append, append_batch, create_sink};

/// The main judgment recorder.
pub struct JudgmentRecorder {
    config: AjtConfig,
    sink: Arc<dyn TrailSink>,
}

impl JudgmentRecorder {
    /// Create a recorder with the sink described by `config.output`.
    pub fn new(config: AjtConfig) -> Result<Self, TrailError> {
        config.validate()?;

        let sink: Arc<dyn TrailSink> = if config.enabled {
            create_sink(&config.output)?
        } else {
            Arc::new(NullSink::new())
        };

        Ok(Self { config, sink })
    }

    /// Create a recorder with a custom sink.
    pub fn with_sink(config: AjtConfig, sink: Arc<dyn TrailSink>) -> Self {
        Self { config, sink }
    }

    /// Create a disabled (no-op) recorder.
    pub fn disabled() -> Self {
        Self {
            config: AjtConfig {
                enabled: false,
                ..Default::default()
            },
            sink: Arc::new(NullSink::new()),
        }
    }

    /// Create a stdout-only recorder (useful for development).
    pub fn console_only() -> Self {
        Self {
            config: AjtConfig {
                output: OutputConfig {
                    kind: OutputKind::Stdout,
                    ..Default::default()
                },
                ..Default::default()
            },
            sink: Arc::new(WriterSink::stdout()),
        }
    }

    /// Check if recording is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn encoding(&self) -> Encoding {
        self.config.output.encoding
    }

    pub fn config(&self) -> &AjtConfig {
        &self.config
    }

    /// Start an event builder pre-filled with the configured `app_version`.
    pub fn builder(&self) -> JudgmentEventBuilder {
        JudgmentEvent::builder().app_version(&self.config.app_version)
    }

    /// Record a judgment event.
    pub fn record(&self, event: &JudgmentEvent) -> Result<(), TrailError> {
        if !self.config.enabled {
            return Ok(());
        }

        tracing::debug!(
            run_id = %event.run_id(),
            decision = %event.decision(),
            risk_level = %event.risk_level(),
            human_in_loop = event.human_in_loop(),
            "Judgment event"
        );

        append(event, self.sink.as_ref(), self.encoding())
    }

    /// Record several events. Nothing is written unless all of them serialize.
    pub fn record_batch(&self, events: &[JudgmentEvent]) -> Result<(), TrailError> {
        if !self.config.enabled {
            return Ok(());
        }

        tracing::debug!(count = events.len(), "Judgment batch");
        append_batch(events, self.sink.as_ref(), self.encoding())
    }

    /// Ask `engine` for a verdict on `input`, then record it.
    ///
    /// The engine's version becomes the event's `policy_version`.
    pub fn record_verdict(
        &self,
        engine: &dyn PolicyEngine,
        input: &str,
        model: &str,
        session_id: &str,
    ) -> Result<JudgmentEvent, TrailError> {
        let verdict = engine
            .evaluate(input, session_id)
            .map_err(TrailError::Policy)?;

        let event = verdict
            .into_builder()
            .model(model)
            .policy_version(engine.version())
            .app_version(&self.config.app_version)
            .session_id(session_id)
            .build()?;

        self.record(&event)?;
        Ok(event)
    }
}
