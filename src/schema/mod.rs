//! Configuration document models and the multi-format parser.
//!
//! Raw documents keep node, zone and shortcut entries as JSON values so that
//! customization patches can be merged before anything is validated.

pub mod args;
pub mod customization;
pub mod family;
pub mod nav;
pub mod node;
pub mod parser;
pub mod shortcut;
pub mod zone;

pub use args::{ArgType, ArgsSchema, FieldSpec};
pub use customization::CustomizationRecord;
pub use family::{qualify_key, Family, FamilyDoc, FamilyOrigin};
pub use nav::{NavConfig, DEFAULT_NAV_PREFIX};
pub use node::{
    Binding, Node, NodeDef, NodeKind, ACTION_SELECTOR, MENU_SELECTOR, RESERVED_SELECTORS,
};
pub use parser::{parse_document, parse_value, ConfigFormat};
pub use shortcut::{Shortcut, ShortcutsDoc};
pub use zone::{ZoneConfig, ZoneDef};
