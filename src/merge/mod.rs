//! Layered config merge: a system layer of full definitions combined with a
//! user customization record (override, add, exclude) per configuration kind.

mod engine;
mod kinds;

pub use engine::{collect_system, merge, MergeKind, Merged};
pub use kinds::{NodeMerge, ShortcutMerge, ZoneMerge};
