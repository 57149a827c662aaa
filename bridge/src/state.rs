//! Application state module.
//!
//! Every shared dependency is built exactly once here and handed to both the
//! HTTP router and the gRPC services.

use crate::config::{Config, SinkKind};
use shared::auth::AuthGate;
use shared::dispatch::WriteDispatcher;
use shared::pipeline::Pipeline;
use shared::sink::{InMemorySink, InfluxSink, SinkError, WriteSink, WriteTarget};
use std::sync::Arc;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    gate: Arc<AuthGate>,
    dispatcher: WriteDispatcher,
    pipeline: Pipeline,
}

impl AppState {
    /// Creates the state around an existing sink and starts the writer pool.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: Config, sink: Arc<dyn WriteSink>) -> Self {
        let target = WriteTarget::new(
            config.settings.bucket.as_str(),
            config.settings.organization.as_str(),
        );
        let dispatcher = WriteDispatcher::start(sink, target, &config.dispatch);
        let pipeline = Pipeline::new(&dispatcher, config.metric_policy);
        let gate = Arc::new(AuthGate::new(&config.settings.expected_token));

        Self {
            config: Arc::new(config),
            gate,
            dispatcher,
            pipeline,
        }
    }

    /// Creates the state with the sink selected by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store client cannot be constructed.
    pub fn from_config(config: Config) -> Result<Self, SinkError> {
        let sink: Arc<dyn WriteSink> = match config.sink {
            SinkKind::Influx => Arc::new(InfluxSink::new(
                &config.settings.url,
                &config.settings.token,
                config.write_timeout,
            )?),
            SinkKind::Memory => {
                tracing::warn!("Using in-memory sink, points will not be persisted");
                InMemorySink::new_shared()
            }
        };
        Ok(Self::new(config, sink))
    }

    /// Creates the state with an in-memory sink.
    ///
    /// This is useful for development and testing.
    #[must_use]
    pub fn with_in_memory_sink(config: Config) -> (Self, Arc<InMemorySink>) {
        let sink = InMemorySink::new_shared();
        (Self::new(config, sink.clone()), sink)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the authentication gate.
    #[must_use]
    pub fn gate(&self) -> Arc<AuthGate> {
        Arc::clone(&self.gate)
    }

    /// Returns the write dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &WriteDispatcher {
        &self.dispatcher
    }

    /// Returns the signal pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}
