//! Stage trait and stream combinators.
//!
//! A stage turns one lazy stream into another. It never sees the
//! cancellation token; the chainer handles that between stages.

use futures::stream::{BoxStream, StreamExt};
use std::future::Future;
use std::sync::Arc;

/// An ordered, lazily produced, single-consumer stream of values.
pub type ValueStream<T> = BoxStream<'static, T>;

/// A stream-to-stream transformation.
///
/// Implemented for every `Fn(ValueStream<T>) -> ValueStream<T>` closure,
/// so most stages are written inline or built with [`map`], [`filter`],
/// [`then`] and [`inspect`].
pub trait Stage<T>: Send + Sync {
    /// Wraps `input` in this stage's transformation.
    fn apply(&self, input: ValueStream<T>) -> ValueStream<T>;
}

impl<T, F> Stage<T> for F
where
    F: Fn(ValueStream<T>) -> ValueStream<T> + Send + Sync,
{
    fn apply(&self, input: ValueStream<T>) -> ValueStream<T> {
        self(input)
    }
}

/// A stage that transforms every value.
pub fn map<T, F>(func: F) -> impl Stage<T>
where
    T: Send + 'static,
    F: Fn(T) -> T + Send + Sync + 'static,
{
    let func = Arc::new(func);
    move |input: ValueStream<T>| -> ValueStream<T> {
        let func = func.clone();
        input.map(move |value| func(value)).boxed()
    }
}

/// A stage that drops values failing `predicate`.
pub fn filter<T, P>(predicate: P) -> impl Stage<T>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    let predicate = Arc::new(predicate);
    move |input: ValueStream<T>| -> ValueStream<T> {
        let predicate = predicate.clone();
        input
            .filter(move |value| futures::future::ready(predicate(value)))
            .boxed()
    }
}

/// A stage that transforms every value with an async function, one at a time.
pub fn then<T, F, Fut>(func: F) -> impl Stage<T>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let func = Arc::new(func);
    move |input: ValueStream<T>| -> ValueStream<T> {
        let func = func.clone();
        input.then(move |value| func(value)).boxed()
    }
}

/// A stage that observes every value without changing it.
pub fn inspect<T, F>(func: F) -> impl Stage<T>
where
    T: Send + 'static,
    F: Fn(&T) + Send + Sync + 'static,
{
    let func = Arc::new(func);
    move |input: ValueStream<T>| -> ValueStream<T> {
        let func = func.clone();
        input.inspect(move |value| func(value)).boxed()
    }
}
