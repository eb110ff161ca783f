//! Config sources and the family loader.

mod family_loader;
mod source;

pub use family_loader::{FamilyLoader, LoadedFamilies};
pub use source::{ConfigSource, DirSource, MemorySource, RawDocument, FAMILIES_DIR, FAMILY_SUFFIX};
