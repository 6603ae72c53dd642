// Spawn slot selection over a set of waypoints.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::domain::graph::NodeId;

/// Shuffles the candidates and returns the first one that is neither occupied nor excluded.
pub fn pick_spawn_slot<R: Rng + ?Sized>(
    candidates: &[NodeId],
    occupied: &HashSet<NodeId>,
    excluded: Option<NodeId>,
    rng: &mut R,
) -> Option<NodeId> {
    let mut order = candidates.to_vec();
    order.shuffle(rng);
    order
        .into_iter()
        .find(|id| !occupied.contains(id) && Some(*id) != excluded)
}
