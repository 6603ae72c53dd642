// All-pairs shortest-path next-hop table over a snapshot of the navigation graph.

use std::collections::HashMap;

use crate::domain::graph::{NavGraph, NodeId};

/// Next-hop table built with Floyd-Warshall; edge weight is the distance between the
/// endpoint poses at computation time. Never updated in place: recompute after edits.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    ids: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    dist: Vec<f32>,
    next: Vec<Option<usize>>,
}

impl RoutingTable {
    pub fn compute(graph: &NavGraph) -> Self {
        let ids: Vec<NodeId> = graph.node_ids().collect();
        let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let n = ids.len();
        let mut dist = vec![f32::INFINITY; n * n];
        let mut next = vec![None; n * n];

        for i in 0..n {
            dist[i * n + i] = 0.0;
        }
        for (source, target, _) in graph.edges() {
            let (Some(&i), Some(&j)) = (index.get(&source), index.get(&target)) else {
                continue;
            };
            if i == j {
                continue;
            }
            let (Some(from), Some(to)) = (graph.pose(source), graph.pose(target)) else {
                continue;
            };
            dist[i * n + j] = from.distance(&to);
            next[i * n + j] = Some(j);
        }

        // Intermediates are visited in ascending id order and only strict improvements
        // replace a route, so equal-length alternatives keep the earlier choice.
        for k in 0..n {
            for i in 0..n {
                let via_k = dist[i * n + k];
                if via_k.is_infinite() {
                    continue;
                }
                for j in 0..n {
                    let candidate = via_k + dist[k * n + j];
                    if candidate < dist[i * n + j] {
                        dist[i * n + j] = candidate;
                        next[i * n + j] = next[i * n + k];
                    }
                }
            }
        }

        Self {
            ids,
            index,
            dist,
            next,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// First hop on a shortest path. `None` when unreachable, unknown, or already there.
    pub fn next_hop(&self, source: NodeId, target: NodeId) -> Option<NodeId> {
        let (i, j) = self.pair(source, target)?;
        self.next[i * self.ids.len() + j].map(|hop| self.ids[hop])
    }

    pub fn distance(&self, source: NodeId, target: NodeId) -> Option<f32> {
        let (i, j) = self.pair(source, target)?;
        let d = self.dist[i * self.ids.len() + j];
        d.is_finite().then_some(d)
    }

    /// Full hop sequence from source (exclusive) to target (inclusive).
    pub fn path(&self, source: NodeId, target: NodeId) -> Option<Vec<NodeId>> {
        if source == target {
            return self.index.contains_key(&source).then(Vec::new);
        }
        let mut hops = Vec::new();
        let mut current = source;
        while current != target {
            current = self.next_hop(current, target)?;
            hops.push(current);
            if hops.len() > self.ids.len() {
                return None;
            }
        }
        Some(hops)
    }

    fn pair(&self, source: NodeId, target: NodeId) -> Option<(usize, usize)> {
        Some((*self.index.get(&source)?, *self.index.get(&target)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Pose;
    use crate::domain::graph::{WayPointConfig, WayPointEdge};
    use glam::Vec3;

    fn node_at(graph: &mut NavGraph, position: Vec3) -> NodeId {
        graph.add_node(WayPointConfig::default(), Pose::at(position))
    }

    fn link(graph: &mut NavGraph, source: NodeId, target: NodeId) {
        graph.add_edge(source, target, WayPointEdge::new(1.0, false));
    }

    #[test]
    fn when_path_goes_through_b_then_next_hop_from_a_to_c_is_b() {
        let mut graph = NavGraph::new();
        let a = node_at(&mut graph, Vec3::ZERO);
        let b = node_at(&mut graph, Vec3::new(3.0, 0.0, 0.0));
        let c = node_at(&mut graph, Vec3::new(3.0, 0.0, 4.0));
        link(&mut graph, a, b);
        link(&mut graph, b, c);

        let table = RoutingTable::compute(&graph);

        assert_eq!(table.next_hop(a, c), Some(b));
        let ab = table.distance(a, b).expect("a reaches b");
        let bc = table.distance(b, c).expect("b reaches c");
        assert_eq!(table.distance(a, c), Some(ab + bc));
        assert_eq!(table.distance(a, c), Some(7.0));
        assert_eq!(table.path(a, c), Some(vec![b, c]));
    }

    #[test]
    fn when_edges_are_directed_then_reverse_route_is_missing() {
        let mut graph = NavGraph::new();
        let a = node_at(&mut graph, Vec3::ZERO);
        let b = node_at(&mut graph, Vec3::X);
        link(&mut graph, a, b);

        let table = RoutingTable::compute(&graph);

        assert_eq!(table.next_hop(b, a), None);
        assert_eq!(table.distance(b, a), None);
        assert_eq!(table.path(b, a), None);
    }

    #[test]
    fn when_direct_edge_ties_with_a_detour_then_direct_edge_is_kept() {
        let mut graph = NavGraph::new();
        let a = node_at(&mut graph, Vec3::ZERO);
        let b = node_at(&mut graph, Vec3::new(1.0, 0.0, 0.0));
        let c = node_at(&mut graph, Vec3::new(2.0, 0.0, 0.0));
        link(&mut graph, a, c);
        link(&mut graph, a, b);
        link(&mut graph, b, c);

        let table = RoutingTable::compute(&graph);

        assert_eq!(table.next_hop(a, c), Some(c));
    }

    #[test]
    fn when_two_routes_exist_then_the_shorter_one_is_chosen() {
        let mut graph = NavGraph::new();
        let a = node_at(&mut graph, Vec3::ZERO);
        let high = node_at(&mut graph, Vec3::new(1.0, 5.0, 0.0));
        let low = node_at(&mut graph, Vec3::new(1.0, 0.5, 0.0));
        let c = node_at(&mut graph, Vec3::new(2.0, 0.0, 0.0));
        link(&mut graph, a, high);
        link(&mut graph, high, c);
        link(&mut graph, a, low);
        link(&mut graph, low, c);

        let table = RoutingTable::compute(&graph);

        assert_eq!(table.next_hop(a, c), Some(low));
        assert_eq!(table.next_hop(low, c), Some(c));
    }

    #[test]
    fn when_graph_changes_after_compute_then_table_keeps_the_old_snapshot() {
        let mut graph = NavGraph::new();
        let a = node_at(&mut graph, Vec3::ZERO);
        let b = node_at(&mut graph, Vec3::X);
        link(&mut graph, a, b);
        let table = RoutingTable::compute(&graph);

        graph.remove_node(b);

        assert_eq!(table.next_hop(a, b), Some(b));
        assert_eq!(RoutingTable::compute(&graph).next_hop(a, b), None);
    }

    #[test]
    fn when_source_equals_target_then_there_is_no_hop() {
        let mut graph = NavGraph::new();
        let a = node_at(&mut graph, Vec3::ZERO);

        let table = RoutingTable::compute(&graph);

        assert_eq!(table.next_hop(a, a), None);
        assert_eq!(table.distance(a, a), Some(0.0));
        assert_eq!(table.path(a, a), Some(vec![]));
    }
}
