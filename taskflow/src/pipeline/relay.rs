//! Cancellation-aware relay between pipeline stages.
//!
//! A relay owns one upstream stream and one bounded channel. It forwards
//! values one at a time and stops on whichever comes first: upstream end,
//! cancellation, or its consumer going away. In every case the sender is
//! dropped, which closes the downstream stream exactly once.

use super::stage::ValueStream;
use crate::cancellation::CancellationToken;
use crate::events::{Event, EventSink, RELAY_STOPPED};
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Why a relay stopped forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReason {
    /// The upstream stream ended.
    Exhausted,
    /// The shared token was cancelled.
    Cancelled,
    /// The downstream stream was dropped.
    ConsumerDropped,
}

impl StopReason {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
            Self::ConsumerDropped => "consumer_dropped",
        }
    }
}

/// Spawns a relay over `upstream` and returns its output stream.
///
/// Must be called from within a Tokio runtime.
pub(crate) fn spawn_relay<T>(
    mut upstream: ValueStream<T>,
    cancel: Arc<CancellationToken>,
    boundary: usize,
    capacity: usize,
    sink: Arc<dyn EventSink>,
) -> ValueStream<T>
where
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let reader_cancel = cancel.clone();

    tokio::spawn(async move {
        let mut forwarded = 0u64;

        let reason = loop {
            let value = tokio::select! {
                biased;
                () = cancel.cancelled() => break StopReason::Cancelled,
                next = upstream.next() => match next {
                    Some(value) => value,
                    None => break StopReason::Exhausted,
                },
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => break StopReason::Cancelled,
                sent = tx.send(value) => {
                    if sent.is_err() {
                        break StopReason::ConsumerDropped;
                    }
                }
            }
            forwarded += 1;
        };

        drop(tx);
        drop(upstream);

        debug!(boundary, forwarded, reason = reason.as_str(), "Relay stopped");
        sink.emit(Event::new(
            RELAY_STOPPED,
            json!({
                "boundary": boundary,
                "forwarded": forwarded,
                "reason": reason.as_str(),
            }),
        ));
    });

    receiver_stream(rx, reader_cancel)
}

/// Turns a relay's receiver into a stream that also ends on cancellation,
/// so values still buffered in the channel are not handed out afterwards.
fn receiver_stream<T>(rx: mpsc::Receiver<T>, cancel: Arc<CancellationToken>) -> ValueStream<T>
where
    T: Send + 'static,
{
    let values = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|value| (value, rx))
    });

    values
        .take_until(async move { cancel.cancelled().await })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingEventSink, NoOpEventSink};
    use crate::testing::{collect_with_timeout, counting_stream, stream_of};
    use std::time::Duration;

    fn noop() -> Arc<dyn EventSink> {
        Arc::new(NoOpEventSink)
    }

    #[tokio::test]
    async fn test_relay_forwards_in_order() {
        let cancel = Arc::new(CancellationToken::new());
        let out = spawn_relay(stream_of(vec![1, 2, 3, 4]), cancel, 0, 1, noop());

        let values = collect_with_timeout(out, Duration::from_secs(1)).await;
        assert_eq!(values, Some(vec![1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn test_relay_closes_on_cancel() {
        let cancel = Arc::new(CancellationToken::new());
        let mut out = spawn_relay(counting_stream(), cancel.clone(), 0, 1, noop());

        assert_eq!(out.next().await, Some(0));
        cancel.cancel("stop");

        let rest = collect_with_timeout(out, Duration::from_secs(1)).await;
        assert_eq!(rest, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_relay_already_cancelled_yields_nothing() {
        let cancel = Arc::new(CancellationToken::new());
        cancel.cancel("early");

        let out = spawn_relay(counting_stream(), cancel, 0, 4, noop());
        let values = collect_with_timeout(out, Duration::from_secs(1)).await;
        assert_eq!(values, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_relay_reports_stop_reason() {
        let sink = Arc::new(CollectingEventSink::new());
        let cancel = Arc::new(CancellationToken::new());
        let out = spawn_relay(stream_of(vec!['a', 'b']), cancel, 3, 1, sink.clone());

        let _ = collect_with_timeout(out, Duration::from_secs(1)).await;
        assert_eq!(sink.wait_for(RELAY_STOPPED, 1, Duration::from_secs(1)).await, 1);

        let events = sink.events_of_type(RELAY_STOPPED);
        let data = &events[0].data;
        assert_eq!(data["boundary"], 3);
        assert_eq!(data["forwarded"], 2);
        assert_eq!(data["reason"], "exhausted");
    }

    #[tokio::test]
    async fn test_relay_stops_when_consumer_dropped() {
        let sink = Arc::new(CollectingEventSink::new());
        let cancel = Arc::new(CancellationToken::new());
        let mut out = spawn_relay(counting_stream(), cancel, 0, 1, sink.clone());

        assert_eq!(out.next().await, Some(0));
        drop(out);
        assert_eq!(sink.wait_for(RELAY_STOPPED, 1, Duration::from_secs(1)).await, 1);

        let events = sink.events_of_type(RELAY_STOPPED);
        let data = &events[0].data;
        assert_eq!(data["reason"], "consumer_dropped");
    }

    #[test]
    fn test_stop_reason_names() {
        assert_eq!(StopReason::Exhausted.as_str(), "exhausted");
        assert_eq!(StopReason::Cancelled.as_str(), "cancelled");
        assert_eq!(StopReason::ConsumerDropped.as_str(), "consumer_dropped");
    }
}
