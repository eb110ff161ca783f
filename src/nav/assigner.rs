use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use crate::error::ShellError;
use crate::schema::NavConfig;
use crate::store::NodeStore;
use crate::validation::{Layer, ValidationWarning};

use super::map::{nested_collision, normalize_coordinate, proper_prefixes, NavEntry, NavMap};

/// Assigns numeric coordinates to the families listed in a nav config.
pub struct NavAssigner<'a> {
    config: &'a NavConfig,
}

impl<'a> NavAssigner<'a> {
    pub fn new(config: &'a NavConfig) -> Self {
        Self { config }
    }

    /// Check explicit coordinates for collisions without a node store.
    ///
    /// Any collision here rejects the whole configuration.
    pub fn check_explicit(&self) -> Result<BTreeMap<String, String>, ShellError> {
        let mut by_coordinate: BTreeMap<String, String> = BTreeMap::new();
        let mut by_family: BTreeMap<String, String> = BTreeMap::new();
        for (coordinate, family) in &self.config.coordinate_mapping {
            let normalized = normalize_coordinate(coordinate)?;
            if let Some(existing) = by_coordinate.get(&normalized) {
                return Err(ShellError::CoordinateCollision {
                    coordinate: normalized,
                    existing: existing.clone(),
                    incoming: family.clone(),
                });
            }
            if let Some(existing_coordinate) = by_family.get(family) {
                return Err(ShellError::CoordinateCollision {
                    coordinate: normalized,
                    existing: format!("{} at {}", family, existing_coordinate),
                    incoming: family.clone(),
                });
            }
            by_coordinate.insert(normalized.clone(), family.clone());
            by_family.insert(family.clone(), normalized);
        }
        for (coordinate, family) in &by_coordinate {
            if let Some((outer, outer_family)) =
                proper_prefixes(coordinate).find_map(|p| by_coordinate.get_key_value(&p))
            {
                return Err(nested_collision(coordinate, outer_family, outer, family));
            }
        }
        Ok(by_family)
    }

    /// Assign coordinates for families present in `store`.
    ///
    /// Families are visited by (priority, position in order). Each takes its
    /// explicit coordinate if one is configured, else the next free
    /// `<prefix>.<n>` slot.
    pub fn assign(&self, store: &NodeStore) -> Result<(NavMap, Vec<ValidationWarning>), ShellError> {
        let prefix = normalize_coordinate(self.config.prefix())?;
        let explicit = self.check_explicit()?;
        let mut warnings = Vec::new();

        let mut ordered: Vec<(i64, usize, &str)> = Vec::new();
        let mut seen = HashSet::new();
        let listed = self
            .config
            .nav_tree_order
            .iter()
            .map(String::as_str)
            .chain(self.config.coordinate_mapping.values().map(String::as_str));
        for (position, family) in listed.enumerate() {
            if !seen.insert(family) {
                continue;
            }
            let priority = self.config.family_priorities.get(family).copied().unwrap_or(0);
            ordered.push((priority, position, family));
        }
        ordered.sort();

        let reserved: HashSet<&str> = explicit.values().map(String::as_str).collect();
        let mut next_slot: u32 = 0;
        let mut entries = Vec::new();
        for (priority, _, family) in ordered {
            if store.family(family).is_none() {
                warnings.push(ValidationWarning::new(
                    Layer::User,
                    "W301",
                    Some(family),
                    "nav family is not loaded, skipped",
                ));
                continue;
            }
            let (coordinate, is_explicit) = match explicit.get(family) {
                Some(coordinate) => (coordinate.clone(), true),
                None => loop {
                    let candidate = format!("{}.{}", prefix, next_slot);
                    next_slot += 1;
                    if !reserved.contains(candidate.as_str()) {
                        break (candidate, false);
                    }
                },
            };
            debug!(family, coordinate = %coordinate, priority, "nav coordinate assigned");
            entries.push(NavEntry {
                coordinate,
                family: family.to_string(),
                priority,
                explicit: is_explicit,
            });
        }

        let map = NavMap::from_entries(&prefix, entries)?;
        info!(families = map.len(), prefix = %prefix, "nav map built");
        Ok((map, warnings))
    }
}
