//! The merged node store and the snapshot that bundles it with nav, zones
//! and shortcuts.

mod node_store;
mod snapshot;

pub use node_store::NodeStore;
pub use snapshot::{
    ShellSnapshot, SnapshotBuilder, SnapshotHandle, NAV_DOC, NODES_CUSTOM_DOC, SHORTCUTS_CUSTOM_DOC,
    SHORTCUTS_DOC, ZONES_CUSTOM_DOC, ZONES_DOC,
};
