use std::collections::HashMap;

use indexmap::IndexMap;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use serde::Serialize;
use tracing::info;

use crate::resolve::AddressResolver;
use crate::schema::ZoneDef;
use crate::store::NodeStore;
use crate::validation::{Layer, ValidationWarning};

/// 区域图中的顶点
#[derive(Debug, Clone, PartialEq, Eq)]
enum Vertex {
    Zone(String),
    Member(String),
}

/// A resolved zone: name, description and canonical member ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

/// 区域映射 - zone -> member 有向图，并支持反向查询
#[derive(Debug, Clone, Default)]
pub struct ZoneMap {
    graph: StableDiGraph<Vertex, ()>,
    zone_index: HashMap<String, NodeIndex>,
    member_index: HashMap<String, NodeIndex>,
    descriptions: HashMap<String, Option<String>>,
}

impl ZoneMap {
    pub fn has_zone(&self, name: &str) -> bool {
        self.zone_index.contains_key(name)
    }

    pub fn is_member(&self, zone: &str, node_id: &str) -> bool {
        match (self.zone_index.get(zone), self.member_index.get(node_id)) {
            (Some(&z), Some(&m)) => self.graph.find_edge(z, m).is_some(),
            _ => false,
        }
    }

    /// Canonical member ids of a zone, sorted.
    pub fn members(&self, zone: &str) -> Vec<String> {
        let Some(&idx) = self.zone_index.get(zone) else {
            return Vec::new();
        };
        self.collect(idx, Direction::Outgoing)
    }

    /// Zones containing `node_id`, sorted. The reverse index.
    pub fn zones_of(&self, node_id: &str) -> Vec<String> {
        let Some(&idx) = self.member_index.get(node_id) else {
            return Vec::new();
        };
        self.collect(idx, Direction::Incoming)
    }

    /// Zone names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.zone_index.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn zone(&self, name: &str) -> Option<Zone> {
        let description = self.descriptions.get(name)?.clone();
        Some(Zone {
            name: name.to_string(),
            description,
            members: self.members(name),
        })
    }

    pub fn len(&self) -> usize {
        self.zone_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zone_index.is_empty()
    }

    fn collect(&self, idx: NodeIndex, direction: Direction) -> Vec<String> {
        let mut out: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| match self.graph.node_weight(n) {
                Some(Vertex::Zone(name)) | Some(Vertex::Member(name)) => Some(name.clone()),
                None => None,
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    fn add_zone(&mut self, name: &str, description: Option<String>) -> NodeIndex {
        let idx = self.graph.add_node(Vertex::Zone(name.to_string()));
        self.zone_index.insert(name.to_string(), idx);
        self.descriptions.insert(name.to_string(), description);
        idx
    }

    fn add_member(&mut self, zone: NodeIndex, node_id: &str) {
        let member = match self.member_index.get(node_id) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(Vertex::Member(node_id.to_string()));
                self.member_index.insert(node_id.to_string(), idx);
                idx
            }
        };
        if self.graph.find_edge(zone, member).is_none() {
            self.graph.add_edge(zone, member, ());
        }
    }
}

/// Builds the zone map from merged zone definitions.
pub struct ZoneGrouper<'a> {
    store: &'a NodeStore,
    resolver: &'a AddressResolver<'a>,
}

impl<'a> ZoneGrouper<'a> {
    /// `resolver` should carry no zones or aliases; member references
    /// resolve through the numeric, semantic and bare-name rules only.
    pub fn new(store: &'a NodeStore, resolver: &'a AddressResolver<'a>) -> Self {
        Self { store, resolver }
    }

    pub fn build(&self, defs: &IndexMap<String, ZoneDef>) -> (ZoneMap, Vec<ValidationWarning>) {
        let mut map = ZoneMap::default();
        let mut warnings = Vec::new();

        for (name, def) in defs {
            if let Some(reason) = self.name_conflict(name) {
                warnings.push(ValidationWarning::new(Layer::User, "W402", Some(name), reason));
                continue;
            }
            let zone_idx = map.add_zone(name, def.description.clone());
            for reference in &def.members {
                match self.resolver.resolve_direct(reference) {
                    Ok(resolved) => map.add_member(zone_idx, &resolved.node_id),
                    Err(err) => warnings.push(
                        ValidationWarning::new(
                            Layer::User,
                            "W401",
                            Some(name),
                            format!("member '{}' dropped: {}", reference, err),
                        )
                        .with_field("members"),
                    ),
                }
            }
        }

        info!(zones = map.len(), "zone map built");
        (map, warnings)
    }

    fn name_conflict(&self, name: &str) -> Option<String> {
        if name.is_empty() || name.contains('.') {
            return Some(format!("zone name '{}' must be a single segment", name));
        }
        if self.store.contains(name) || self.store.family(name).is_some() {
            return Some(format!("zone name '{}' collides with a node id", name));
        }
        if !self.store.ids_named(name).is_empty() {
            return Some(format!("zone name '{}' collides with a node name", name));
        }
        None
    }
}
