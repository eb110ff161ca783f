//! # navshell: address resolution and layered configuration for a command tree shell
//!
//! `navshell` loads a tree of menu and callable nodes from per-family
//! configuration documents, applies a user customization layer over the
//! system defaults, and resolves caller addresses against the merged tree:
//!
//! - **Family loading**: one document per family (JSON, YAML or TOML); a user
//!   family replaces the system family of the same name.
//! - **Config merge**: `override_nodes` / `add_nodes` / `exclude_nodes`
//!   applied in that order, with exclusion always winning.
//! - **Navigation**: families in the nav order get numeric coordinates
//!   (`0.0`, `0.1`, ...) that walk the same nodes as their semantic paths.
//! - **Zones and shortcuts**: named groupings of nodes, configured jump and
//!   chain shortcuts, and runtime aliases.
//! - **Execution**: callable nodes validate their arguments, run a registered
//!   sync or async function under a timeout, and every run is recorded.
//! - **Workflow tracking**: executed paths enter quarantine and become golden
//!   only through an explicit approval.
//! - **Session**: `back`, `menu` and `history` over the commands of one shell,
//!   plus saved variables usable as `$name` in arguments.
//!
//! Invalid configuration never aborts a load; it is reported as
//! [`ValidationWarning`]s on the snapshot, unreadable files included. Only a
//! source directory that cannot be listed and nav coordinate collisions fail
//! a build.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use navshell::exec::CallableRegistry;
//! use navshell::loader::DirSource;
//! use navshell::shell::Shell;
//!
//! #[tokio::main]
//! async fn main() -> navshell::ShellResult<()> {
//!     let shell = Shell::builder(DirSource::new("config/system"))
//!         .user_source(DirSource::new("config/user"))
//!         .registry(CallableRegistry::new())
//!         .build()?;
//!     println!("{}", shell.handle("nav").await?);
//!     println!("{}", shell.handle("jump 0.0").await?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod exec;
pub mod loader;
pub mod merge;
pub mod nav;
pub mod resolve;
pub mod schema;
pub mod shell;
pub mod store;
pub mod tracker;
pub mod validation;
pub mod zone;

pub use crate::config::ShellSettings;
pub use crate::error::{
    ApprovalError, ExecutionError, ResolveError, ShellError, ShellResult, StoreError,
};
pub use crate::events::{create_event_channel, EventReceiver, EventSender, ShellEvent};
pub use crate::exec::{CallableRegistry, Dispatcher};
pub use crate::resolve::{AddressResolver, AliasTable, ResolvedAddress, View};
pub use crate::shell::{CommandOutput, Shell, ShellBuilder};
pub use crate::store::{NodeStore, ShellSnapshot, SnapshotBuilder, SnapshotHandle};
pub use crate::tracker::{StatusTracker, WorkflowRecord, WorkflowStatus};
pub use crate::validation::ValidationWarning;
pub use navshell_types::{AsyncCallable, AsyncFnCallable, CallableError, CallableKind, SyncCallable};
