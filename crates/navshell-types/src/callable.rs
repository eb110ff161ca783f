use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a callable is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallableKind {
    Sync,
    Async,
}

impl CallableKind {
    pub fn from_async_flag(is_async: bool) -> Self {
        if is_async {
            CallableKind::Async
        } else {
            CallableKind::Sync
        }
    }
}

/// Errors reported by an external callable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CallableError {
    #[error("Callable failed: {0}")]
    Failed(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A callable that runs to completion on the calling thread.
///
/// The dispatcher moves sync callables onto a blocking thread, so they may do
/// file or network I/O without stalling the runtime.
pub trait SyncCallable: Send + Sync + 'static {
    fn call(&self, args: Value) -> Result<Value, CallableError>;
}

impl<F> SyncCallable for F
where
    F: Fn(Value) -> Result<Value, CallableError> + Send + Sync + 'static,
{
    fn call(&self, args: Value) -> Result<Value, CallableError> {
        (self)(args)
    }
}

/// A callable that is awaited.
#[async_trait]
pub trait AsyncCallable: Send + Sync + 'static {
    async fn call(&self, args: Value) -> Result<Value, CallableError>;
}

type BoxedCallFuture = Pin<Box<dyn Future<Output = Result<Value, CallableError>> + Send>>;

/// Adapter turning a closure that returns a boxed future into an [`AsyncCallable`].
pub struct AsyncFnCallable<F>(pub F);

impl<F> AsyncFnCallable<F>
where
    F: Fn(Value) -> BoxedCallFuture + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> AsyncCallable for AsyncFnCallable<F>
where
    F: Fn(Value) -> BoxedCallFuture + Send + Sync + 'static,
{
    async fn call(&self, args: Value) -> Result<Value, CallableError> {
        (self.0)(args).await
    }
}
