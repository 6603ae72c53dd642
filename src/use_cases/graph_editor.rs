// Live editing of the shared navigation graph and the actors that render it.

use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::domain::graph::ImportedTopology;
use crate::domain::ports::{ActorId, Stage};
use crate::domain::tuning::GraphTuning;
use crate::domain::{EdgeInsert, NavGraph, NodeId, Pose, TopologyEntry, WayPointConfig, WayPointEdge};
use crate::use_cases::sync::{read, write};

pub type SharedGraph = Arc<RwLock<NavGraph>>;

/// Applies graph mutations and mirrors them onto the stage. Guards on the graph are
/// never held across an await, so readers are not blocked while an edge waits for its
/// endpoints.
#[derive(Clone)]
pub struct GraphEditor {
    graph: SharedGraph,
    stage: Arc<dyn Stage>,
    tuning: GraphTuning,
}

impl GraphEditor {
    pub fn new(stage: Arc<dyn Stage>, tuning: GraphTuning) -> Self {
        Self {
            graph: Arc::new(RwLock::new(NavGraph::new())),
            stage,
            tuning,
        }
    }

    pub fn graph(&self) -> SharedGraph {
        Arc::clone(&self.graph)
    }

    pub fn tuning(&self) -> &GraphTuning {
        &self.tuning
    }

    pub fn add_node(&self, config: WayPointConfig, pose: Pose) -> NodeId {
        let mut graph = write(&self.graph);
        let visible = graph.edit_mode();
        let actor = self.stage.spawn_waypoint(&config, pose, visible);
        let id = graph.add_node(config, pose);
        graph.set_node_actor(id, actor);
        debug!(node_id = id, "waypoint added");
        id
    }

    pub fn remove_node(&self, id: NodeId) -> bool {
        let detached = {
            let mut graph = write(&self.graph);
            if !graph.contains(id) {
                return false;
            }
            graph.remove_node(id)
        };
        self.destroy_all(detached);
        debug!(node_id = id, "waypoint removed");
        true
    }

    /// Inserts or replaces the edge, then waits for both endpoint actors before placing
    /// its prop. Returns false when an endpoint is missing or the edge was replaced or
    /// removed while waiting.
    pub async fn add_edge(&self, source: NodeId, target: NodeId) -> bool {
        let (actor, endpoints) = {
            let mut graph = write(&self.graph);
            if !graph.contains(source) || !graph.contains(target) {
                return false;
            }
            let visible = graph.edit_mode();
            let actor = self.stage.spawn_edge(&self.tuning.edge_resource_id, visible);
            let mut edge = WayPointEdge::new(self.tuning.edge_length, visible);
            edge.actor = Some(actor);
            if let EdgeInsert::Replaced(previous) = graph.add_edge(source, target, edge) {
                if let Some(old) = previous.actor {
                    self.stage.destroy(old);
                }
            }
            let endpoints = (
                graph.node(source).and_then(|w| w.actor),
                graph.node(target).and_then(|w| w.actor),
            );
            (actor, endpoints)
        };

        tokio::join!(self.wait_ready(endpoints.0), self.wait_ready(endpoints.1));

        let placed = self.place_edge(source, target, actor);
        if placed {
            debug!(source, target, "edge added");
        }
        placed
    }

    pub fn remove_edge(&self, source: NodeId, target: NodeId) -> bool {
        let removed = write(&self.graph).remove_edge(source, target);
        match removed {
            Some(edge) => {
                self.destroy_all(edge.actor);
                debug!(source, target, "edge removed");
                true
            }
            None => false,
        }
    }

    pub fn set_edit_mode(&self, edit: bool) {
        let actors = write(&self.graph).set_edit_mode(edit);
        for actor in actors {
            self.stage.set_visible(actor, edit);
        }
        info!(edit, "edit mode changed");
    }

    /// Grab end: stores the new live pose and re-places every incident edge.
    pub fn move_node(&self, id: NodeId, pose: Pose) -> bool {
        let mut graph = write(&self.graph);
        if !graph.contains(id) {
            return false;
        }
        for (source, target) in graph.set_pose(id, pose) {
            if let Some(edge) = graph.refresh_edge(source, target) {
                if let (Some(actor), Some(transform)) = (edge.actor, edge.transform) {
                    self.stage.place_edge(actor, transform);
                }
            }
        }
        true
    }

    pub fn clear(&self) {
        let detached = write(&self.graph).clear();
        let count = detached.len();
        self.destroy_all(detached);
        debug!(actors = count, "graph cleared");
    }

    /// Builds nodes and edges from a saved level, then places edge props once every
    /// endpoint actor is ready.
    pub async fn import(&self, entries: &[TopologyEntry]) -> ImportedTopology {
        let (imported, edge_actors) = {
            let mut graph = write(&self.graph);
            let imported = graph.import_topology(entries, self.tuning.edge_length);
            let visible = graph.edit_mode();
            for &id in &imported.nodes {
                if let Some(waypoint) = graph.node(id) {
                    let actor = self.stage.spawn_waypoint(&waypoint.config, waypoint.pose, visible);
                    graph.set_node_actor(id, actor);
                }
            }
            let mut edge_actors = Vec::with_capacity(imported.edges.len());
            for &(source, target) in &imported.edges {
                let actor = self.stage.spawn_edge(&self.tuning.edge_resource_id, visible);
                graph.set_edge_actor(source, target, actor);
                edge_actors.push((source, target, actor));
            }
            (imported, edge_actors)
        };

        let node_actors: Vec<Option<ActorId>> = {
            let graph = read(&self.graph);
            imported
                .nodes
                .iter()
                .map(|id| graph.node(*id).and_then(|w| w.actor))
                .collect()
        };
        for actor in node_actors {
            self.wait_ready(actor).await;
        }
        for (source, target, actor) in edge_actors {
            self.place_edge(source, target, actor);
        }

        info!(
            nodes = imported.nodes.len(),
            edges = imported.edges.len(),
            "topology imported"
        );
        imported
    }

    pub fn export(&self) -> Vec<TopologyEntry> {
        read(&self.graph).export_topology()
    }

    async fn wait_ready(&self, actor: Option<ActorId>) {
        if let Some(actor) = actor {
            self.stage.ready(actor).await;
        }
    }

    // Only places the prop if the edge still carries the actor we created for it.
    fn place_edge(&self, source: NodeId, target: NodeId, actor: ActorId) -> bool {
        let mut graph = write(&self.graph);
        if graph.edge(source, target).and_then(|e| e.actor) != Some(actor) {
            return false;
        }
        match graph.refresh_edge(source, target).and_then(|e| e.transform) {
            Some(transform) => {
                self.stage.place_edge(actor, transform);
                true
            }
            None => false,
        }
    }

    fn destroy_all(&self, actors: impl IntoIterator<Item = ActorId>) {
        for actor in actors {
            self.stage.destroy(actor);
        }
    }
}
