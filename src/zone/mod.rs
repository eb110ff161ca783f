//! Zones: named many-to-many groupings of nodes, independent of the tree.

mod grouper;

pub use grouper::{Zone, ZoneGrouper, ZoneMap};
