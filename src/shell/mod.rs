//! Command surface: parsing, placeholder substitution, session state,
//! rendering and the [`Shell`] coordinator.

mod command;
mod coordinator;
mod render;
mod session;
mod vars;

pub use command::{ChainStep, Command, CHAIN_SEPARATOR};
pub use coordinator::{Shell, ShellBuilder};
pub use render::{
    ActionView, ArgField, ChainStepView, CommandOutput, ExecutionView, MenuOption, MenuView, NavLine,
    NavTree, ShortcutEntry,
};
pub use session::{HistoryEntry, Session, HISTORY_LIMIT};
pub use vars::{ChainVars, LAST_RESULT, PREV};
