//! Callable execution: argument validation, the callable registry and the
//! dispatcher that records every invocation with the status tracker.

mod args;
mod dispatcher;
mod registry;

pub use args::validate_args;
pub use dispatcher::{DispatchOutcome, Dispatcher, DEFAULT_TIMEOUT_SECS};
pub use registry::{CallableRegistry, RegisteredCallable};
