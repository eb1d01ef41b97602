//! Stream helpers for pipeline tests.

use futures::stream::{self, StreamExt};
use std::time::Duration;

use crate::pipeline::ValueStream;

/// Returns a stream over the given values.
pub fn stream_of<T, I>(values: I) -> ValueStream<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
{
    stream::iter(values).boxed()
}

/// Returns an endless stream of `0, 1, 2, ...`.
pub fn counting_stream() -> ValueStream<u64> {
    stream::iter(0_u64..).boxed()
}

/// Collects a stream, or returns `None` if it does not end within `limit`.
pub async fn collect_with_timeout<T>(stream: ValueStream<T>, limit: Duration) -> Option<Vec<T>> {
    tokio::time::timeout(limit, stream.collect::<Vec<_>>()).await.ok()
}
