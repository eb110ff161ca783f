use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::store::NodeStore;

use super::map::NavMap;

/// A numeric coordinate paired with the semantic path it was assigned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComboAddress {
    pub coordinate: String,
    pub semantic: String,
}

impl fmt::Display for ComboAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.coordinate, self.semantic)
    }
}

impl ComboAddress {
    /// Derive the combo address of `node_id`, if its family has a nav
    /// coordinate and the node is reachable from the family root.
    ///
    /// The coordinate is the family coordinate followed by the option
    /// selectors of the shortest path from the root, first option first.
    pub fn derive(nav: &NavMap, store: &NodeStore, node_id: &str) -> Option<Self> {
        let node = store.get(node_id)?;
        let family_coordinate = nav.coordinate_of(&node.family)?;
        let path = selector_path(store, &node.family, node_id)?;
        let coordinate = if path.is_empty() {
            family_coordinate.to_string()
        } else {
            format!("{}.{}", family_coordinate, path.join("."))
        };
        Some(Self {
            coordinate,
            semantic: node_id.to_string(),
        })
    }
}

fn selector_path(store: &NodeStore, root: &str, target: &str) -> Option<Vec<String>> {
    let mut queue = VecDeque::new();
    let mut seen = HashSet::new();
    queue.push_back((root.to_string(), Vec::<String>::new()));
    seen.insert(root.to_string());
    while let Some((id, path)) = queue.pop_front() {
        if id == target {
            return Some(path);
        }
        let Some(options) = store.get(&id).and_then(|n| n.options()) else {
            continue;
        };
        for (selector, child) in options {
            if seen.insert(child.clone()) {
                let mut next = path.clone();
                next.push(selector.clone());
                queue.push_back((child.clone(), next));
            }
        }
    }
    None
}
