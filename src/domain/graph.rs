// Waypoint navigation graph: nodes with live poses and directed, visually scaled edges.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::domain::geometry::{EdgeTransform, Pose};
use crate::domain::ports::ActorId;

pub type NodeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

/// Display payload of a waypoint. Passed through the graph unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WayPointConfig {
    pub name: String,
    pub resource_id: String,
    pub dimensions: Dimensions,
}

impl Default for WayPointConfig {
    fn default() -> Self {
        Self {
            name: "waypoint".to_string(),
            resource_id: "artifact:2133418241777730301".to_string(),
            dimensions: Dimensions {
                width: 0.05,
                height: 0.05,
                depth: 0.05,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WayPoint {
    pub config: WayPointConfig,
    // Live pose; moves when the marker is grabbed.
    pub pose: Pose,
    pub visible: bool,
    pub actor: Option<ActorId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WayPointEdge {
    // Reference length of the connecting prop; only used for visual scaling.
    pub length: f32,
    pub visible: bool,
    pub transform: Option<EdgeTransform>,
    pub actor: Option<ActorId>,
}

impl WayPointEdge {
    pub fn new(length: f32, visible: bool) -> Self {
        Self {
            length,
            visible,
            transform: None,
            actor: None,
        }
    }
}

/// Outcome of inserting an edge.
#[derive(Debug, PartialEq)]
pub enum EdgeInsert {
    MissingEndpoint,
    Inserted,
    Replaced(WayPointEdge),
}

/// One persisted node: its config, live pose and outgoing neighbours as dense indices.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyEntry {
    pub config: WayPointConfig,
    pub pose: Pose,
    pub adjacency: Vec<usize>,
}

/// Ids assigned by an import, in input order, plus the edges it created.
#[derive(Debug, Default)]
pub struct ImportedTopology {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<(NodeId, NodeId)>,
}

#[derive(Debug, Clone)]
struct GraphNode {
    waypoint: WayPoint,
    adjacency: BTreeMap<NodeId, WayPointEdge>,
}

#[derive(Debug, Default)]
pub struct NavGraph {
    nodes: BTreeMap<NodeId, GraphNode>,
    next_id: NodeId,
    edit: bool,
}

impl NavGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit_mode(&self) -> bool {
        self.edit
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&WayPoint> {
        self.nodes.get(&id).map(|n| &n.waypoint)
    }

    pub fn pose(&self, id: NodeId) -> Option<Pose> {
        self.node(id).map(|w| w.pose)
    }

    /// Node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn waypoints(&self) -> impl Iterator<Item = (NodeId, &WayPoint)> + '_ {
        self.nodes.iter().map(|(id, n)| (*id, &n.waypoint))
    }

    pub fn edge(&self, source: NodeId, target: NodeId) -> Option<&WayPointEdge> {
        self.nodes.get(&source)?.adjacency.get(&target)
    }

    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &WayPointEdge)> + '_ {
        self.nodes.iter().flat_map(|(source, node)| {
            node.adjacency
                .iter()
                .map(move |(target, edge)| (*source, *target, edge))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.adjacency.len()).sum()
    }

    /// Outgoing edges of a node. Empty for an unknown id.
    pub fn adjacency(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &WayPointEdge)> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|n| n.adjacency.iter().map(|(target, edge)| (*target, edge)))
    }

    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.adjacency(id).map(|(target, _)| target).collect()
    }

    pub fn add_node(&mut self, config: WayPointConfig, pose: Pose) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            GraphNode {
                waypoint: WayPoint {
                    config,
                    pose,
                    visible: self.edit,
                    actor: None,
                },
                adjacency: BTreeMap::new(),
            },
        );
        id
    }

    pub fn set_node_actor(&mut self, id: NodeId, actor: ActorId) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.waypoint.actor = Some(actor);
                true
            }
            None => false,
        }
    }

    /// Removes a node and every edge touching it. Returns the actors that were detached.
    pub fn remove_node(&mut self, id: NodeId) -> Vec<ActorId> {
        if !self.nodes.contains_key(&id) {
            return Vec::new();
        }

        let mut detached = Vec::new();
        // Incoming edges first, then outgoing, then the node itself.
        for node in self.nodes.values_mut() {
            if let Some(edge) = node.adjacency.remove(&id) {
                detached.extend(edge.actor);
            }
        }
        if let Some(node) = self.nodes.remove(&id) {
            detached.extend(node.adjacency.into_values().filter_map(|e| e.actor));
            detached.extend(node.waypoint.actor);
        }
        detached
    }

    pub fn add_edge(&mut self, source: NodeId, target: NodeId, edge: WayPointEdge) -> EdgeInsert {
        if !self.nodes.contains_key(&target) {
            return EdgeInsert::MissingEndpoint;
        }
        let Some(node) = self.nodes.get_mut(&source) else {
            return EdgeInsert::MissingEndpoint;
        };
        match node.adjacency.insert(target, edge) {
            Some(previous) => EdgeInsert::Replaced(previous),
            None => EdgeInsert::Inserted,
        }
    }

    pub fn set_edge_actor(&mut self, source: NodeId, target: NodeId, actor: ActorId) -> bool {
        match self
            .nodes
            .get_mut(&source)
            .and_then(|n| n.adjacency.get_mut(&target))
        {
            Some(edge) => {
                edge.actor = Some(actor);
                true
            }
            None => false,
        }
    }

    pub fn remove_edge(&mut self, source: NodeId, target: NodeId) -> Option<WayPointEdge> {
        self.nodes.get_mut(&source)?.adjacency.remove(&target)
    }

    /// Recomputes an edge's visual transform from the current endpoint poses.
    pub fn refresh_edge(&mut self, source: NodeId, target: NodeId) -> Option<&WayPointEdge> {
        let from = self.pose(source)?.position;
        let to = self.pose(target)?.position;
        let edge = self.nodes.get_mut(&source)?.adjacency.get_mut(&target)?;
        edge.transform = Some(EdgeTransform::between(from, to, edge.length));
        Some(edge)
    }

    /// Moves a node and returns every edge that touches it, incoming first.
    pub fn set_pose(&mut self, id: NodeId, pose: Pose) -> Vec<(NodeId, NodeId)> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Vec::new();
        };
        node.waypoint.pose = pose;

        let mut touched: Vec<(NodeId, NodeId)> = self
            .nodes
            .iter()
            .filter(|(source, n)| **source != id && n.adjacency.contains_key(&id))
            .map(|(source, _)| (*source, id))
            .collect();
        touched.extend(self.neighbors(id).into_iter().map(|target| (id, target)));
        touched
    }

    /// Closest node by straight-line distance. Exact ties go to the lowest id.
    pub fn nearest_node(&self, point: Vec3) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for (id, node) in &self.nodes {
            let distance = node.waypoint.pose.position.distance_squared(point);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((*id, distance)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Applies the edit flag to every node and edge; returns the affected actors.
    pub fn set_edit_mode(&mut self, edit: bool) -> Vec<ActorId> {
        self.edit = edit;
        let mut actors = Vec::new();
        for node in self.nodes.values_mut() {
            node.waypoint.visible = edit;
            actors.extend(node.waypoint.actor);
            for edge in node.adjacency.values_mut() {
                edge.visible = edit;
                actors.extend(edge.actor);
            }
        }
        actors
    }

    /// Drops every node and edge and restarts id allocation.
    pub fn clear(&mut self) -> Vec<ActorId> {
        let mut detached = Vec::new();
        for node in std::mem::take(&mut self.nodes).into_values() {
            detached.extend(node.adjacency.into_values().filter_map(|e| e.actor));
            detached.extend(node.waypoint.actor);
        }
        self.next_id = 0;
        detached
    }

    /// Builds nodes first, then edges, so adjacency may reference later entries.
    /// Out-of-range adjacency indices are skipped.
    pub fn import_topology(&mut self, entries: &[TopologyEntry], edge_length: f32) -> ImportedTopology {
        let nodes: Vec<NodeId> = entries
            .iter()
            .map(|entry| self.add_node(entry.config.clone(), entry.pose))
            .collect();

        let mut edges = Vec::new();
        for (entry, &source) in entries.iter().zip(&nodes) {
            for &index in &entry.adjacency {
                let Some(&target) = nodes.get(index) else {
                    continue;
                };
                let edge = WayPointEdge::new(edge_length, self.edit);
                // A repeated index replaces the edge it already made.
                match self.add_edge(source, target, edge) {
                    EdgeInsert::Inserted => {
                        self.refresh_edge(source, target);
                        edges.push((source, target));
                    }
                    EdgeInsert::Replaced(_) => {
                        self.refresh_edge(source, target);
                    }
                    EdgeInsert::MissingEndpoint => {}
                }
            }
        }

        ImportedTopology { nodes, edges }
    }

    /// Dense, id-ordered snapshot of the graph carrying live poses.
    pub fn export_topology(&self) -> Vec<TopologyEntry> {
        let dense: HashMap<NodeId, usize> = self
            .nodes
            .keys()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();

        self.nodes
            .values()
            .map(|node| TopologyEntry {
                config: node.waypoint.config.clone(),
                pose: node.waypoint.pose,
                adjacency: node
                    .adjacency
                    .keys()
                    .filter_map(|target| dense.get(target).copied())
                    .collect(),
            })
            .collect()
    }
}
