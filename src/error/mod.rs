//! Error types for the shell engine.
//!
//! - [`ResolveError`]: an address token did not resolve to exactly one node.
//! - [`ExecutionError`]: argument validation or callable invocation failed.
//! - [`ApprovalError`]: a trust-state transition was contradictory.
//! - [`StoreError`]: workflow record persistence failed.
//! - [`ShellError`]: top-level error returned by commands and config builds.
//!
//! Load-time validation problems are not errors; they are collected as
//! [`ValidationWarning`](crate::validation::ValidationWarning)s.

pub mod approval_error;
pub mod execution_error;
pub mod resolve_error;
pub mod shell_error;

pub use approval_error::{ApprovalError, StoreError};
pub use execution_error::ExecutionError;
pub use resolve_error::ResolveError;
pub use shell_error::ShellError;

/// Convenience alias for shell-level results.
pub type ShellResult<T> = Result<T, ShellError>;
