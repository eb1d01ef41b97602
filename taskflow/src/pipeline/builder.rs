//! Pipeline builder with validation.

use super::chain::chain_with_sink;
use super::config::PipelineConfig;
use super::stage::{Stage, ValueStream};
use crate::cancellation::CancellationToken;
use crate::errors::ConfigError;
use crate::events::{EventSink, NoOpEventSink};
use std::sync::Arc;
use tracing::debug;

/// An ordered list of stages that can be run over many input streams.
pub struct Pipeline<T> {
    name: String,
    stages: Vec<(String, Arc<dyn Stage<T>>)>,
    config: PipelineConfig,
    event_sink: Arc<dyn EventSink>,
}

impl<T> Pipeline<T>
where
    T: Send + 'static,
{
    /// Starts building a pipeline.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PipelineBuilder<T> {
        PipelineBuilder::new(name)
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the stages over `input`, stopping when `cancel` fires.
    ///
    /// See [`super::chain`] for the relay behavior.
    pub fn run(&self, input: ValueStream<T>, cancel: Arc<CancellationToken>) -> ValueStream<T> {
        debug!(pipeline = %self.name, stages = ?self.stage_names(), "Starting pipeline");
        let stages: Vec<Arc<dyn Stage<T>>> =
            self.stages.iter().map(|(_, stage)| stage.clone()).collect();
        chain_with_sink(input, cancel, &stages, &self.config, &self.event_sink)
    }
}

impl<T> std::fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stages.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder<T> {
    name: String,
    stages: Vec<(String, Arc<dyn Stage<T>>)>,
    config: PipelineConfig,
    event_sink: Arc<dyn EventSink>,
}

impl<T> PipelineBuilder<T>
where
    T: Send + 'static,
{
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            config: PipelineConfig::default(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, name: impl Into<String>, stage: impl Stage<T> + 'static) -> Self {
        self.stages.push((name.into(), Arc::new(stage)));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn shared_stage(mut self, name: impl Into<String>, stage: Arc<dyn Stage<T>>) -> Self {
        self.stages.push((name.into(), stage));
        self
    }

    /// Appends every stage of `other` after this builder's stages.
    ///
    /// The composed pipeline keeps this builder's config and sink.
    #[must_use]
    pub fn compose(mut self, other: Self) -> Self {
        self.name = format!("{}+{}", self.name, other.name);
        self.stages.extend(other.stages);
        self
    }

    /// Sets the relay configuration.
    #[must_use]
    pub const fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the event sink for relay events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Validates and builds the pipeline.
    pub fn build(self) -> Result<Pipeline<T>, ConfigError> {
        self.config.validate()?;

        Ok(Pipeline {
            name: self.name,
            stages: self.stages,
            config: self.config,
            event_sink: self.event_sink,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingEventSink, RELAY_STOPPED};
    use crate::pipeline::{filter, map};
    use crate::testing::{collect_with_timeout, stream_of};
    use std::time::Duration;

    #[tokio::test]
    async fn test_builder_runs_stages() {
        let pipeline = Pipeline::builder("numbers")
            .stage("double", map(|v: u32| v * 2))
            .stage("big", filter(|v: &u32| *v > 4))
            .build()
            .unwrap();

        assert_eq!(pipeline.name(), "numbers");
        assert_eq!(pipeline.stage_names(), vec!["double", "big"]);

        let cancel = Arc::new(CancellationToken::new());
        let out = pipeline.run(stream_of(1..=5), cancel);
        let values = collect_with_timeout(out, Duration::from_secs(1)).await;
        assert_eq!(values, Some(vec![6, 8, 10]));
    }

    #[tokio::test]
    async fn test_pipeline_runs_many_inputs() {
        let pipeline = Pipeline::builder("inc")
            .stage("inc", map(|v: i32| v + 1))
            .build()
            .unwrap();

        for start in 0..3 {
            let cancel = Arc::new(CancellationToken::new());
            let out = pipeline.run(stream_of(vec![start]), cancel);
            let values = collect_with_timeout(out, Duration::from_secs(1)).await;
            assert_eq!(values, Some(vec![start + 1]));
        }
    }

    #[test]
    fn test_build_rejects_zero_capacity() {
        let result = Pipeline::<u8>::builder("bad")
            .with_config(PipelineConfig::new().with_relay_capacity(0))
            .build();

        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidRelayCapacity { capacity: 0 }
        );
    }

    #[tokio::test]
    async fn test_compose_appends_stages() {
        let first = PipelineBuilder::new("a").stage("add", map(|v: i32| v + 3));
        let second = PipelineBuilder::new("b").stage("mul", map(|v: i32| v * 10));

        let pipeline = first.compose(second).build().unwrap();
        assert_eq!(pipeline.name(), "a+b");
        assert_eq!(pipeline.stage_names(), vec!["add", "mul"]);

        let cancel = Arc::new(CancellationToken::new());
        let out = pipeline.run(stream_of(vec![1]), cancel);
        let values = collect_with_timeout(out, Duration::from_secs(1)).await;
        assert_eq!(values, Some(vec![40]));
    }

    #[tokio::test]
    async fn test_relay_events_reach_sink() {
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = Pipeline::builder("observed")
            .stage("one", map(|v: i32| v))
            .stage("two", map(|v: i32| v))
            .with_event_sink(sink.clone())
            .build()
            .unwrap();

        let cancel = Arc::new(CancellationToken::new());
        let out = pipeline.run(stream_of(vec![1, 2]), cancel);
        let _ = collect_with_timeout(out, Duration::from_secs(1)).await;

        let stopped = sink.wait_for(RELAY_STOPPED, 2, Duration::from_secs(1)).await;
        assert_eq!(stopped, 2);
    }
}
