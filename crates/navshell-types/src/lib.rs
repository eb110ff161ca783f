//! Contract between navshell and the external functions bound to callable nodes.
//!
//! Action implementations depend on this crate only. The engine looks them up
//! by the `function_name` recorded in a node's binding and invokes them either
//! synchronously ([`SyncCallable`], run on a blocking thread) or by awaiting
//! ([`AsyncCallable`]), according to the node's `is_async` flag.

pub mod callable;

pub use callable::{AsyncCallable, AsyncFnCallable, CallableError, CallableKind, SyncCallable};
