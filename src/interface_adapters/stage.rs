use async_trait::async_trait;
use glam::Vec3;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::hit_region::HitRegion;
use crate::domain::ports::{ActorId, Clip, Stage};
use crate::domain::{EdgeTransform, Pose, WayPointConfig};
use crate::use_cases::sync::lock;

// One recorded render call.
#[derive(Debug, Clone, PartialEq)]
pub enum StageCall {
    SpawnWaypoint { actor: ActorId, name: String, pose: Pose, visible: bool },
    SpawnEdge { actor: ActorId, visible: bool },
    SpawnModel { actor: ActorId, resource_id: String, pose: Pose },
    SpawnHitRegion { actor: ActorId, parent: ActorId, attach_point: String },
    SpawnLabel { actor: ActorId, parent: ActorId, text: String },
    PlaceEdge { actor: ActorId, transform: EdgeTransform },
    AnimateTo { actor: ActorId, pose: Pose, duration: Duration },
    Play { actor: ActorId, clip: Clip },
    SetVisible { actor: ActorId, visible: bool },
    SetText { actor: ActorId, text: String },
    Destroy { actor: ActorId },
}

#[derive(Default)]
struct Scene {
    journal: Vec<StageCall>,
    live: HashSet<ActorId>,
    created_at: HashMap<ActorId, Instant>,
}

/// Stage without a renderer: logs every call, keeps a journal and reports an actor as
/// ready a fixed delay after it was created.
pub struct HeadlessStage {
    next_id: AtomicU64,
    ready_delay: Duration,
    scene: Mutex<Scene>,
}

impl Default for HeadlessStage {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessStage {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ready_delay: Duration::ZERO,
            scene: Mutex::new(Scene::default()),
        }
    }

    pub fn with_ready_delay(mut self, delay: Duration) -> Self {
        self.ready_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<StageCall> {
        lock(&self.scene).journal.clone()
    }

    pub fn live_actor_count(&self) -> usize {
        lock(&self.scene).live.len()
    }

    pub fn is_live(&self, actor: ActorId) -> bool {
        lock(&self.scene).live.contains(&actor)
    }

    fn create(&self, call: impl FnOnce(ActorId) -> StageCall) -> ActorId {
        let actor = ActorId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let call = call(actor);
        debug!(actor = actor.0, ?call, "stage");
        let mut scene = lock(&self.scene);
        scene.live.insert(actor);
        scene.created_at.insert(actor, Instant::now());
        scene.journal.push(call);
        actor
    }

    fn record(&self, call: StageCall) {
        debug!(?call, "stage");
        lock(&self.scene).journal.push(call);
    }
}

#[async_trait]
impl Stage for HeadlessStage {
    fn spawn_waypoint(&self, config: &WayPointConfig, pose: Pose, visible: bool) -> ActorId {
        self.create(|actor| StageCall::SpawnWaypoint {
            actor,
            name: config.name.clone(),
            pose,
            visible,
        })
    }

    fn spawn_edge(&self, _resource_id: &str, visible: bool) -> ActorId {
        self.create(|actor| StageCall::SpawnEdge { actor, visible })
    }

    fn spawn_model(&self, resource_id: &str, pose: Pose) -> ActorId {
        self.create(|actor| StageCall::SpawnModel {
            actor,
            resource_id: resource_id.to_string(),
            pose,
        })
    }

    fn spawn_hit_region(&self, parent: ActorId, region: &HitRegion) -> ActorId {
        self.create(|actor| StageCall::SpawnHitRegion {
            actor,
            parent,
            attach_point: region.attach_point.clone(),
        })
    }

    fn spawn_label(&self, parent: ActorId, _offset: Vec3, text: &str) -> ActorId {
        self.create(|actor| StageCall::SpawnLabel {
            actor,
            parent,
            text: text.to_string(),
        })
    }

    fn place_edge(&self, actor: ActorId, transform: EdgeTransform) {
        self.record(StageCall::PlaceEdge { actor, transform });
    }

    fn animate_to(&self, actor: ActorId, pose: Pose, duration: Duration) {
        self.record(StageCall::AnimateTo {
            actor,
            pose,
            duration,
        });
    }

    fn play(&self, actor: ActorId, clip: Clip) {
        self.record(StageCall::Play { actor, clip });
    }

    fn set_visible(&self, actor: ActorId, visible: bool) {
        self.record(StageCall::SetVisible { actor, visible });
    }

    fn set_text(&self, actor: ActorId, text: &str) {
        self.record(StageCall::SetText {
            actor,
            text: text.to_string(),
        });
    }

    fn destroy(&self, actor: ActorId) {
        let mut scene = lock(&self.scene);
        scene.live.remove(&actor);
        scene.created_at.remove(&actor);
        scene.journal.push(StageCall::Destroy { actor });
        debug!(actor = actor.0, "stage destroy");
    }

    async fn ready(&self, actor: ActorId) {
        // Unknown or destroyed actors never become ready; do not wait for them.
        let created = lock(&self.scene).created_at.get(&actor).copied();
        if let Some(created) = created {
            tokio::time::sleep_until(created + self.ready_delay).await;
        }
    }
}
