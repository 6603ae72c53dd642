use async_trait::async_trait;
use glam::Vec3;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{LevelScope, RangeAction, UserHandle};
use crate::domain::geometry::{EdgeTransform, Pose};
use crate::domain::graph::{TopologyEntry, WayPointConfig};
use crate::domain::hit_region::HitRegion;

// Handle of a visual/collision primitive owned by the render collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

// Canned bot animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clip {
    Spawn,
    Death,
    Missed,
}

// Port for the render/physics collaborator. Calls are fire-and-forget except `ready`.
#[async_trait]
pub trait Stage: Send + Sync {
    fn spawn_waypoint(&self, config: &WayPointConfig, pose: Pose, visible: bool) -> ActorId;
    fn spawn_edge(&self, resource_id: &str, visible: bool) -> ActorId;
    fn spawn_model(&self, resource_id: &str, pose: Pose) -> ActorId;
    fn spawn_hit_region(&self, parent: ActorId, region: &HitRegion) -> ActorId;
    fn spawn_label(&self, parent: ActorId, offset: Vec3, text: &str) -> ActorId;
    fn place_edge(&self, actor: ActorId, transform: EdgeTransform);
    fn animate_to(&self, actor: ActorId, pose: Pose, duration: Duration);
    fn play(&self, actor: ActorId, clip: Clip);
    fn set_visible(&self, actor: ActorId, visible: bool);
    fn set_text(&self, actor: ActorId, text: &str);
    fn destroy(&self, actor: ActorId);
    // Suspends until the actor exists and its app transform is resolved.
    async fn ready(&self, actor: ActorId);
}

// Port for level persistence keyed by scope.
#[async_trait]
pub trait TopologyStore: Send + Sync {
    async fn load(&self, scope: &LevelScope) -> Result<Option<Vec<TopologyEntry>>, String>;
    async fn save(&self, scope: &LevelScope, topology: &[TopologyEntry]) -> Result<(), String>;
}

// Port for role checks against the session/user collaborator.
pub trait AccessPolicy: Send + Sync {
    fn allows(&self, user: &UserHandle, action: RangeAction) -> bool;
}

#[async_trait]
impl<T: TopologyStore + ?Sized> TopologyStore for Arc<T> {
    async fn load(&self, scope: &LevelScope) -> Result<Option<Vec<TopologyEntry>>, String> {
        (**self).load(scope).await
    }

    async fn save(&self, scope: &LevelScope, topology: &[TopologyEntry]) -> Result<(), String> {
        (**self).save(scope, topology).await
    }
}

impl<T: AccessPolicy + ?Sized> AccessPolicy for Arc<T> {
    fn allows(&self, user: &UserHandle, action: RangeAction) -> bool {
        (**self).allows(user, action)
    }
}
