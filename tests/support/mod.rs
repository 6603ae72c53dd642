// Shared fixtures for the range integration tests.
#![allow(dead_code)]

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use range_sim::domain::entities::UserHandle;
use range_sim::domain::ports::TopologyStore;
use range_sim::domain::tuning::RangeTuning;
use range_sim::domain::{NodeId, Pose};
use range_sim::interface_adapters::access::RoleAccessPolicy;
use range_sim::interface_adapters::stage::HeadlessStage;
use range_sim::interface_adapters::stores::InMemoryTopologyStore;
use range_sim::use_cases::{RangeController, SessionEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub fn moderator() -> UserHandle {
    UserHandle::new(1, "Mod").with_role("moderator")
}

pub fn player() -> UserHandle {
    UserHandle::new(2, "Player")
}

pub struct Range {
    pub controller: RangeController,
    pub stage: Arc<HeadlessStage>,
}

pub fn range(tuning: RangeTuning) -> Range {
    range_with_store(tuning, Arc::new(InMemoryTopologyStore::default()))
}

pub fn range_with_store(tuning: RangeTuning, store: Arc<dyn TopologyStore>) -> Range {
    let stage = Arc::new(HeadlessStage::new());
    let access = Arc::new(RoleAccessPolicy::new(tuning.access.moderator_roles.clone()));
    let controller = RangeController::new(
        stage.clone(),
        store,
        access,
        tuning,
        ChaCha8Rng::seed_from_u64(7),
    );
    Range { controller, stage }
}

// Waypoints one meter apart along +X, linked both ways to their neighbours.
pub async fn line(range: &RangeController, count: usize) -> Vec<NodeId> {
    let user = moderator();
    let nodes: Vec<NodeId> = (0..count)
        .map(|i| {
            range
                .add_waypoint(&user, Pose::at(Vec3::new(i as f32, 0.0, 0.0)))
                .expect("add waypoint")
        })
        .collect();
    for pair in nodes.windows(2) {
        assert!(range.add_path(&user, pair[0], pair[1]).await.expect("add path"));
        assert!(range.add_path(&user, pair[1], pair[0]).await.expect("add path"));
    }
    nodes
}

pub async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(60), events.recv())
        .await
        .expect("event within a minute")
        .expect("event channel open")
}

// Skips events until `wanted` matches, returning everything seen on the way.
pub async fn events_until(
    events: &mut broadcast::Receiver<SessionEvent>,
    wanted: impl Fn(&SessionEvent) -> bool,
) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let done = wanted(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

// Past the spawn animation, so bots accept hits.
pub async fn wait_for_spawn_animation() {
    tokio::time::sleep(Duration::from_millis(1100)).await;
}
