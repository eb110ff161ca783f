use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::schema::{Family, Node, NodeKind};
use crate::validation::{Layer, ValidationWarning};

/// 节点存储 - 一次合并产生的不可变节点集合
///
/// Nodes are keyed by canonical id in sorted order; option edges are mirrored
/// into a graph for parent/child queries.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStore {
    nodes: BTreeMap<String, Node>,
    families: BTreeMap<String, Family>,

    /// 选项图：边权为选择器
    #[serde(skip)]
    graph: StableDiGraph<String, String>,

    /// 节点 ID 到 NodeIndex 的映射
    #[serde(skip)]
    node_index_map: HashMap<String, NodeIndex>,

    /// 末段名称到节点 ID 的索引
    #[serde(skip)]
    by_name: HashMap<String, Vec<String>>,
}

impl NodeStore {
    /// 构建节点存储
    ///
    /// Grafts family roots under their `parent` node and drops option targets
    /// that name no node. Both are reported as warnings.
    pub fn build(
        nodes: IndexMap<String, Node>,
        families: BTreeMap<String, Family>,
    ) -> (Self, Vec<ValidationWarning>) {
        let mut warnings = Vec::new();
        let mut nodes: BTreeMap<String, Node> = nodes.into_iter().collect();

        // families whose root was excluded or replaced by nothing are gone
        let mut families: BTreeMap<String, Family> = families
            .into_iter()
            .filter(|(name, _)| nodes.contains_key(name))
            .collect();
        for family in families.values_mut() {
            family.node_ids = nodes
                .values()
                .filter(|n| n.family == family.name)
                .map(|n| n.id.clone())
                .collect();
        }

        for family in families.values() {
            let Some(parent) = &family.parent else {
                continue;
            };
            let layer = match family.origin {
                crate::schema::FamilyOrigin::System => Layer::System,
                crate::schema::FamilyOrigin::User => Layer::User,
            };
            match nodes.get_mut(parent).map(|n| &mut n.kind) {
                Some(NodeKind::Menu { options }) => {
                    if !options.values().any(|target| target == &family.name) {
                        let key = family.name.rsplit('.').next().unwrap_or(&family.name);
                        options.entry(key.to_string()).or_insert_with(|| family.name.clone());
                    }
                }
                Some(NodeKind::Callable(_)) => warnings.push(ValidationWarning::new(
                    layer,
                    "W206",
                    Some(&family.name),
                    format!("parent '{}' is a callable node, family not grafted", parent),
                )),
                None => warnings.push(ValidationWarning::new(
                    layer,
                    "W206",
                    Some(&family.name),
                    format!("parent '{}' does not exist, family not grafted", parent),
                )),
            }
        }

        let ids: Vec<String> = nodes.keys().cloned().collect();
        for node in nodes.values_mut() {
            let node_id = node.id.clone();
            if let NodeKind::Menu { options } = &mut node.kind {
                options.retain(|selector, target| {
                    let keep = ids.binary_search(target).is_ok();
                    if !keep {
                        warnings.push(
                            ValidationWarning::new(
                                Layer::System,
                                "W205",
                                Some(&node_id),
                                format!("option '{}' targets missing node '{}', dropped", selector, target),
                            )
                            .with_field(&format!("options.{}", selector)),
                        );
                    }
                    keep
                });
            }
        }

        let mut graph = StableDiGraph::new();
        let mut node_index_map = HashMap::new();
        let mut by_name: HashMap<String, Vec<String>> = HashMap::new();
        for node in nodes.values() {
            let idx = graph.add_node(node.id.clone());
            node_index_map.insert(node.id.clone(), idx);
            by_name
                .entry(node.name().to_string())
                .or_default()
                .push(node.id.clone());
        }
        for node in nodes.values() {
            if let Some(options) = node.options() {
                for (selector, target) in options {
                    if let (Some(&from), Some(&to)) =
                        (node_index_map.get(&node.id), node_index_map.get(target))
                    {
                        graph.add_edge(from, to, selector.clone());
                    }
                }
            }
        }

        let store = Self {
            nodes,
            families,
            graph,
            node_index_map,
            by_name,
        };
        (store, warnings)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn family(&self, name: &str) -> Option<&Family> {
        self.families.get(name)
    }

    pub fn families(&self) -> impl Iterator<Item = &Family> {
        self.families.values()
    }

    /// Ids whose final segment equals `name`, sorted.
    pub fn ids_named(&self, name: &str) -> &[String] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Follow one selector from `node_id`: an option key, else the direct
    /// child id `<node_id>.<selector>`.
    pub fn select(&self, node_id: &str, selector: &str) -> Option<&str> {
        let node = self.nodes.get(node_id)?;
        if let Some(target) = node.options().and_then(|o| o.get(selector)) {
            return Some(target.as_str());
        }
        let child = format!("{}.{}", node_id, selector);
        self.nodes.get_key_value(&child).map(|(k, _)| k.as_str())
    }

    /// 获取节点的所有前驱节点 ID
    pub fn parents(&self, node_id: &str) -> Vec<String> {
        let Some(idx) = self.node_index_map.get(node_id) else {
            return Vec::new();
        };
        let mut parents: Vec<String> = self
            .graph
            .edges_directed(*idx, Direction::Incoming)
            .filter_map(|e| self.graph.node_weight(e.source()).cloned())
            .collect();
        parents.sort();
        parents.dedup();
        parents
    }

    /// Descendants of `root` reachable through options, depth first, in
    /// option order. Each id is listed once.
    pub fn subtree(&self, root: &str) -> Vec<(usize, String)> {
        let mut out = Vec::new();
        let mut seen = std::collections::HashSet::new();
        self.walk(root, 0, &mut seen, &mut out);
        out
    }

    fn walk(
        &self,
        id: &str,
        depth: usize,
        seen: &mut std::collections::HashSet<String>,
        out: &mut Vec<(usize, String)>,
    ) {
        if !seen.insert(id.to_string()) {
            return;
        }
        out.push((depth, id.to_string()));
        if let Some(options) = self.nodes.get(id).and_then(Node::options) {
            for target in options.values() {
                self.walk(target, depth + 1, seen, out);
            }
        }
    }
}
