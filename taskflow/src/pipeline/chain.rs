//! Composition of stages into one cancellable stream.

use super::config::PipelineConfig;
use super::relay::spawn_relay;
use super::stage::{Stage, ValueStream};
use crate::cancellation::CancellationToken;
use crate::events::{EventSink, NoOpEventSink};
use std::sync::Arc;

/// Applies `stages` left to right, with a relay after each one.
///
/// Every relay races its reads and writes against `cancel`, so cancelling
/// ends the returned stream no matter how many stages there are or how
/// much data is left upstream. A closed relay output also looks like end
/// of data to the next stage, which lets the shutdown run down the chain.
///
/// With no stages a single relay is placed over `input`, so the result
/// yields the same values and still honors `cancel`.
///
/// Returns immediately. Must be called from within a Tokio runtime.
pub fn chain<T>(
    input: ValueStream<T>,
    cancel: Arc<CancellationToken>,
    stages: &[Arc<dyn Stage<T>>],
    config: &PipelineConfig,
) -> ValueStream<T>
where
    T: Send + 'static,
{
    let sink: Arc<dyn EventSink> = Arc::new(NoOpEventSink);
    chain_with_sink(input, cancel, stages, config, &sink)
}

pub(crate) fn chain_with_sink<T>(
    input: ValueStream<T>,
    cancel: Arc<CancellationToken>,
    stages: &[Arc<dyn Stage<T>>],
    config: &PipelineConfig,
    sink: &Arc<dyn EventSink>,
) -> ValueStream<T>
where
    T: Send + 'static,
{
    let capacity = config.relay_capacity;

    if stages.is_empty() {
        return spawn_relay(input, cancel, 0, capacity, sink.clone());
    }

    stages
        .iter()
        .enumerate()
        .fold(input, |stream, (boundary, stage)| {
            spawn_relay(stage.apply(stream), cancel.clone(), boundary, capacity, sink.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::map;
    use crate::testing::{collect_with_timeout, stream_of};
    use futures::StreamExt;
    use std::time::Duration;

    #[tokio::test]
    async fn test_chain_no_stages_is_identity() {
        let cancel = Arc::new(CancellationToken::new());
        let out = chain(stream_of(vec![3, 1, 2]), cancel, &[], &PipelineConfig::default());

        let values = collect_with_timeout(out, Duration::from_secs(1)).await;
        assert_eq!(values, Some(vec![3, 1, 2]));
    }

    #[tokio::test]
    async fn test_chain_applies_in_order() {
        let cancel = Arc::new(CancellationToken::new());
        let stages: Vec<Arc<dyn Stage<i64>>> = vec![
            Arc::new(map(|v: i64| v + 1)),
            Arc::new(map(|v: i64| v * 2)),
        ];

        let out = chain(stream_of(vec![1, 2, 3]), cancel, &stages, &PipelineConfig::default());
        let values: Vec<i64> = out.collect().await;

        // (v + 1) * 2, not v * 2 + 1
        assert_eq!(values, vec![4, 6, 8]);
    }

    #[tokio::test]
    async fn test_chain_no_stages_honors_cancel() {
        let cancel = Arc::new(CancellationToken::new());
        cancel.cancel("before start");

        let out = chain(stream_of(0..1000), cancel, &[], &PipelineConfig::default());
        let values = collect_with_timeout(out, Duration::from_secs(1)).await;
        assert_eq!(values, Some(Vec::new()));
    }
}
