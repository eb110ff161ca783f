use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ShellError;

/// One family bound to a numeric coordinate prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub coordinate: String,
    pub family: String,
    pub priority: i64,
    pub explicit: bool,
}

/// Bidirectional coordinate <-> family map produced by the nav assigner.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NavMap {
    prefix: String,
    /// Entries sorted by numeric coordinate.
    entries: Vec<NavEntry>,
    #[serde(skip)]
    by_coordinate: BTreeMap<String, usize>,
    #[serde(skip)]
    by_family: BTreeMap<String, usize>,
}

impl NavMap {
    /// Build from entries. Fails on a repeated coordinate or family, and on
    /// a coordinate nested under another bound coordinate, which would shadow
    /// that family's option walk.
    pub fn from_entries(prefix: &str, mut entries: Vec<NavEntry>) -> Result<Self, ShellError> {
        // enclosing coordinates sort before the ones nested under them
        entries.sort_by_key(|e| coordinate_key(&e.coordinate));
        let mut by_coordinate: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_family = BTreeMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if let Some(outer) = proper_prefixes(&entry.coordinate).find_map(|p| by_coordinate.get(&p)) {
                return Err(nested_collision(
                    &entry.coordinate,
                    &entries[*outer].family,
                    &entries[*outer].coordinate,
                    &entry.family,
                ));
            }
            if let Some(prev) = by_coordinate.insert(entry.coordinate.clone(), idx) {
                return Err(ShellError::CoordinateCollision {
                    coordinate: entry.coordinate.clone(),
                    existing: entries[prev].family.clone(),
                    incoming: entry.family.clone(),
                });
            }
            if let Some(prev) = by_family.insert(entry.family.clone(), idx) {
                return Err(ShellError::CoordinateCollision {
                    coordinate: entry.coordinate.clone(),
                    existing: format!("{} at {}", entries[prev].family, entries[prev].coordinate),
                    incoming: entry.family.clone(),
                });
            }
        }
        Ok(Self {
            prefix: prefix.to_string(),
            entries,
            by_coordinate,
            by_family,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn family_at(&self, coordinate: &str) -> Option<&str> {
        self.by_coordinate
            .get(coordinate)
            .map(|&i| self.entries[i].family.as_str())
    }

    pub fn coordinate_of(&self, family: &str) -> Option<&str> {
        self.by_family
            .get(family)
            .map(|&i| self.entries[i].coordinate.as_str())
    }

    /// Longest leading run of `segments` that is a bound coordinate.
    /// Returns the family and the number of segments consumed.
    pub fn longest_prefix(&self, segments: &[&str]) -> Option<(&str, usize)> {
        (1..=segments.len()).rev().find_map(|n| {
            let candidate = segments[..n].join(".");
            self.family_at(&candidate).map(|family| (family, n))
        })
    }
}

/// Parse a coordinate into its numeric segments.
pub fn parse_coordinate(coordinate: &str) -> Result<Vec<u32>, ShellError> {
    coordinate
        .split('.')
        .map(|seg| {
            seg.parse::<u32>()
                .map_err(|_| ShellError::InvalidCoordinate(coordinate.to_string()))
        })
        .collect()
}

/// Canonical textual form, e.g. `"0.01"` becomes `"0.1"`.
pub fn normalize_coordinate(coordinate: &str) -> Result<String, ShellError> {
    let segments = parse_coordinate(coordinate.trim())?;
    Ok(segments
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join("."))
}

/// Proper prefixes of a coordinate, shortest first: `0.1.5` yields `0`, `0.1`.
pub fn proper_prefixes(coordinate: &str) -> impl Iterator<Item = String> + '_ {
    let segments: Vec<&str> = coordinate.split('.').collect();
    (1..segments.len()).map(move |n| segments[..n].join("."))
}

pub(crate) fn nested_collision(coordinate: &str, outer_family: &str, outer: &str, family: &str) -> ShellError {
    ShellError::CoordinateCollision {
        coordinate: coordinate.to_string(),
        existing: format!("{} at {}", outer_family, outer),
        incoming: family.to_string(),
    }
}

pub fn is_numeric_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn coordinate_key(coordinate: &str) -> Vec<u32> {
    parse_coordinate(coordinate).unwrap_or_default()
}
