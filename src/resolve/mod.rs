//! Address resolution: caller tokens to canonical node ids.

mod address;
mod alias;
mod resolver;

pub use address::{ResolvedAddress, Rule, View};
pub use alias::AliasTable;
pub use resolver::{AddressResolver, DEFAULT_MAX_ALIAS_DEPTH};
