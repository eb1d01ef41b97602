//! Task trait and function adapters.
//!
//! A task is a zero-argument unit of work that either succeeds or fails.
//! The executor only looks at the outcome; whatever the error carries is
//! for logs.

use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Trait for units of work run by the executor.
#[async_trait]
pub trait Task: Send + Sync {
    /// Returns the name of the task, used in logs and events.
    fn name(&self) -> &str;

    /// Runs the task to completion.
    ///
    /// Any `Err` counts as one failure toward the error limit.
    async fn run(&self) -> anyhow::Result<()>;
}

/// A task shared between the caller and the executor.
///
/// The caller keeps ownership of the list and may hand the same tasks to
/// several executions.
pub type SharedTask = Arc<dyn Task>;

/// A task backed by an async closure.
pub struct FnTask<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    name: String,
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnTask<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    /// Creates a new function-based task.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut> Debug for FnTask<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTask").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, Fut> Task for FnTask<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> anyhow::Result<()> {
        (self.func)().await
    }
}

/// A task backed by a synchronous closure, run on Tokio's blocking pool.
///
/// Use this for CPU-bound or blocking-IO work so it does not stall the
/// async workers.
pub struct BlockingTask<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    name: String,
    func: Arc<F>,
}

impl<F> BlockingTask<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    /// Creates a new blocking task.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl<F> Debug for BlockingTask<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingTask").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Task for BlockingTask<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> anyhow::Result<()> {
        let func = Arc::clone(&self.func);
        tokio::task::spawn_blocking(move || func())
            .await
            .map_err(|e| anyhow::anyhow!("blocking task '{}' did not finish: {e}", self.name))?
    }
}

/// Wraps an async closure as a [`SharedTask`].
pub fn task_fn<F, Fut>(name: impl Into<String>, func: F) -> SharedTask
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnTask::new(name, func))
}

/// Wraps a synchronous closure as a [`SharedTask`] run on the blocking pool.
pub fn blocking_task<F>(name: impl Into<String>, func: F) -> SharedTask
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(BlockingTask::new(name, func))
}
