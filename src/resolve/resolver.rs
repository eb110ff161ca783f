use indexmap::IndexMap;
use tracing::trace;

use crate::error::ResolveError;
use crate::nav::{is_numeric_segment, ComboAddress, NavMap};
use crate::schema::Shortcut;
use crate::store::NodeStore;
use crate::zone::ZoneMap;

use super::address::{ResolvedAddress, Rule, View};
use super::alias::AliasTable;

pub const DEFAULT_MAX_ALIAS_DEPTH: usize = 8;

/// Resolves caller tokens against one snapshot.
///
/// Rules are tried in order: numeric coordinate, semantic path, bare node
/// name, zone-qualified path, alias. The first rule whose base matches and
/// whose remaining segments walk to a node wins.
pub struct AddressResolver<'a> {
    store: &'a NodeStore,
    nav: &'a NavMap,
    zones: Option<&'a ZoneMap>,
    shortcuts: Option<&'a IndexMap<String, Shortcut>>,
    aliases: Option<&'a AliasTable>,
    max_alias_depth: usize,
}

/// Base node found by a rule, before the remainder is walked.
struct Hit {
    anchor: String,
    consumed: usize,
    rule: Rule,
}

impl<'a> AddressResolver<'a> {
    pub fn new(store: &'a NodeStore, nav: &'a NavMap) -> Self {
        Self {
            store,
            nav,
            zones: None,
            shortcuts: None,
            aliases: None,
            max_alias_depth: DEFAULT_MAX_ALIAS_DEPTH,
        }
    }

    pub fn with_zones(mut self, zones: &'a ZoneMap) -> Self {
        self.zones = Some(zones);
        self
    }

    pub fn with_shortcuts(mut self, shortcuts: &'a IndexMap<String, Shortcut>) -> Self {
        self.shortcuts = Some(shortcuts);
        self
    }

    pub fn with_aliases(mut self, aliases: &'a AliasTable) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn with_max_alias_depth(mut self, depth: usize) -> Self {
        self.max_alias_depth = depth;
        self
    }

    /// Resolve a token to one canonical node.
    pub fn resolve(&self, token: &str) -> Result<ResolvedAddress, ResolveError> {
        self.resolve_at_depth(token.trim(), 0)
    }

    /// Resolve using only the numeric, semantic and bare-name rules.
    pub fn resolve_direct(&self, token: &str) -> Result<ResolvedAddress, ResolveError> {
        let token = token.trim();
        let segments = split(token)?;
        match self.direct(&segments)? {
            Some(resolved) => Ok(resolved),
            None => Err(ResolveError::not_found(token)),
        }
    }

    fn resolve_at_depth(&self, token: &str, depth: usize) -> Result<ResolvedAddress, ResolveError> {
        let segments = split(token)?;

        if let Some(resolved) = self.direct(&segments)? {
            trace!(token, node_id = %resolved.node_id, rule = ?resolved.rule, "resolved");
            return Ok(resolved);
        }
        if let Some(resolved) = self.by_zone(&segments)? {
            return Ok(resolved);
        }
        if let Some(target) = self.alias_target(segments[0]) {
            if depth >= self.max_alias_depth {
                return Err(ResolveError::not_found(token));
            }
            let expanded = if segments.len() > 1 {
                format!("{}.{}", target, segments[1..].join("."))
            } else {
                target
            };
            let mut resolved = self.resolve_at_depth(&expanded, depth + 1)?;
            resolved.rule = Rule::Alias;
            return Ok(resolved);
        }
        Err(ResolveError::not_found(token))
    }

    /// Rules 1 to 3.
    fn direct(&self, segments: &[&str]) -> Result<Option<ResolvedAddress>, ResolveError> {
        let hits = [self.numeric_hit(segments), self.semantic_hit(segments)];
        for hit in hits.into_iter().flatten() {
            if let Some(resolved) = self.finish(segments, hit) {
                return Ok(Some(resolved));
            }
        }
        if let Some(hit) = self.bare_name_hit(segments)? {
            return Ok(self.finish(segments, hit));
        }
        Ok(None)
    }

    fn numeric_hit(&self, segments: &[&str]) -> Option<Hit> {
        if !is_numeric_segment(segments[0]) {
            return None;
        }
        let (family, consumed) = self.nav.longest_prefix(segments)?;
        self.store.contains(family).then(|| Hit {
            anchor: family.to_string(),
            consumed,
            rule: Rule::Numeric,
        })
    }

    fn semantic_hit(&self, segments: &[&str]) -> Option<Hit> {
        (1..=segments.len()).rev().find_map(|n| {
            let candidate = segments[..n].join(".");
            self.store.contains(&candidate).then(|| Hit {
                anchor: candidate,
                consumed: n,
                rule: Rule::Semantic,
            })
        })
    }

    fn bare_name_hit(&self, segments: &[&str]) -> Result<Option<Hit>, ResolveError> {
        match self.store.ids_named(segments[0]) {
            [] => Ok(None),
            [only] => Ok(Some(Hit {
                anchor: only.clone(),
                consumed: 1,
                rule: Rule::BareName,
            })),
            many => Err(ResolveError::Ambiguous {
                token: segments[0].to_string(),
                candidates: many.to_vec(),
            }),
        }
    }

    /// Rule 4: `<zone>.<rest>` where the node reached by `rest` is in the zone.
    fn by_zone(&self, segments: &[&str]) -> Result<Option<ResolvedAddress>, ResolveError> {
        let Some(zones) = self.zones else {
            return Ok(None);
        };
        let zone = segments[0];
        if segments.len() < 2 || !zones.has_zone(zone) {
            return Ok(None);
        }
        let rest = &segments[1..];

        // bare names only need to be unique among zone members
        let named: Vec<&String> = self
            .store
            .ids_named(rest[0])
            .iter()
            .filter(|id| zones.is_member(zone, id))
            .collect();
        let bare = match named.as_slice() {
            [] => None,
            [only] => Some(Hit {
                anchor: (*only).clone(),
                consumed: 1,
                rule: Rule::BareName,
            }),
            many => {
                return Err(ResolveError::Ambiguous {
                    token: segments.join("."),
                    candidates: many.iter().map(|id| (*id).clone()).collect(),
                })
            }
        };

        let hits = [self.numeric_hit(rest), self.semantic_hit(rest), bare];
        for hit in hits.into_iter().flatten() {
            let anchor = hit.anchor.clone();
            let Some(mut resolved) = self.finish(rest, hit) else {
                continue;
            };
            if zones.is_member(zone, &anchor) || zones.is_member(zone, &resolved.node_id) {
                resolved.base = format!("{}.{}", zone, resolved.base);
                resolved.rule = Rule::Zone;
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }

    fn alias_target(&self, alias: &str) -> Option<String> {
        if let Some(target) = self.aliases.and_then(|a| a.get(alias)) {
            return Some(target);
        }
        match self.shortcuts.and_then(|s| s.get(alias)) {
            Some(Shortcut::Jump { target }) => Some(target.clone()),
            _ => None,
        }
    }

    /// Walk the segments after the base, then read the selector tail.
    fn finish(&self, segments: &[&str], hit: Hit) -> Option<ResolvedAddress> {
        let mut current = hit.anchor.as_str();
        let mut idx = hit.consumed;
        while idx < segments.len() && !View::is_universal_selector(segments[idx]) {
            current = self.store.select(current, segments[idx])?;
            idx += 1;
        }
        let view = View::from_tail(&segments[idx..])?;
        let node_id = current.to_string();
        Some(ResolvedAddress {
            coordinate: ComboAddress::derive(self.nav, self.store, &node_id).map(|c| c.coordinate),
            node_id,
            base: segments[..idx].join("."),
            view,
            rule: hit.rule,
        })
    }
}

fn split(token: &str) -> Result<Vec<&str>, ResolveError> {
    let segments: Vec<&str> = token.split('.').collect();
    if token.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(ResolveError::not_found(token));
    }
    Ok(segments)
}
