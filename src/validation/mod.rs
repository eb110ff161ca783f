//! Load-time validation of node and family definitions.
//!
//! Validation never fails a load: problems are returned as
//! [`ValidationWarning`]s and the offending entry is omitted.
//!
//! | Code | Meaning |
//! |------|---------|
//! | W001 | family document unreadable or unparseable, family skipped |
//! | W002 | family has no valid root node |
//! | W003 | user family unusable, system family kept |
//! | W100 | node definition malformed |
//! | W101 | missing or unknown node type |
//! | W102 | menu without label |
//! | W103 | callable without function_name |
//! | W104 | callable without args_schema |
//! | W105 | malformed args_schema |
//! | W106 | reserved option selector dropped |
//! | W107 | callable options ignored |
//! | W108 | duplicate node id in a family |

mod family;
mod node;
mod types;

pub use family::{validate_family, ValidatedFamily};
pub use node::validate_node;
pub use types::{with_code, Layer, ValidationWarning};
