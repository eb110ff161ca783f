use std::fmt;

use serde::Serialize;

use crate::schema::{ACTION_SELECTOR, MENU_SELECTOR};

/// What an address asks of its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// `.0`: description plus available selectors.
    Menu,
    /// `.1` / `.1.0`: argument review before invocation.
    ActionMenu,
    /// `.1.1`: invoke.
    Execute,
}

impl View {
    pub fn suffix(&self) -> &'static str {
        match self {
            View::Menu => "0",
            View::ActionMenu => "1.0",
            View::Execute => "1.1",
        }
    }

    /// Interpret a trailing run of universal selectors.
    ///
    /// `None` means the tail continues past a terminal position.
    pub fn from_tail(tail: &[&str]) -> Option<Self> {
        match tail {
            [] => Some(View::Menu),
            [MENU_SELECTOR] => Some(View::Menu),
            [ACTION_SELECTOR] => Some(View::ActionMenu),
            [ACTION_SELECTOR, MENU_SELECTOR] => Some(View::ActionMenu),
            [ACTION_SELECTOR, ACTION_SELECTOR] => Some(View::Execute),
            _ => None,
        }
    }

    pub fn is_universal_selector(segment: &str) -> bool {
        segment == MENU_SELECTOR || segment == ACTION_SELECTOR
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Menu => f.write_str("menu"),
            View::ActionMenu => f.write_str("action menu"),
            View::Execute => f.write_str("execute"),
        }
    }
}

/// Resolution rule that produced a match, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Numeric,
    Semantic,
    BareName,
    Zone,
    Alias,
}

/// A token resolved to exactly one canonical node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAddress {
    pub node_id: String,
    /// The address as written, without its selector tail.
    pub base: String,
    /// Numeric coordinate of the node, when its family has one.
    pub coordinate: Option<String>,
    pub view: View,
    pub rule: Rule,
}

impl ResolvedAddress {
    /// Fully expanded address, e.g. `0.0.10.0`.
    pub fn address(&self) -> String {
        format!("{}.{}", self.base, self.view.suffix())
    }
}
