//! Numeric navigation coordinates over a priority-ordered subset of families.

mod assigner;
mod combo;
mod map;

pub use assigner::NavAssigner;
pub use combo::ComboAddress;
pub use map::{is_numeric_segment, normalize_coordinate, parse_coordinate, NavEntry, NavMap};
