// Gated entry point used by the application layer driving the range.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::domain::entities::{LevelScope, RangeAction, UserHandle};
use crate::domain::errors::RangeError;
use crate::domain::hit_region::default_bot_hit_regions;
use crate::domain::ports::{AccessPolicy, Stage, TopologyStore};
use crate::domain::tuning::RangeTuning;
use crate::domain::{NodeId, Pose};
use crate::use_cases::bot::BotHandle;
use crate::use_cases::graph_editor::GraphEditor;
use crate::use_cases::level::{LoadLevelUseCase, SaveLevelUseCase};
use crate::use_cases::modes::{TargetHandle, build_policy};
use crate::use_cases::session::{GameSession, SessionDeps};
use crate::use_cases::sync::lock;
use crate::use_cases::types::{BotId, GameModeKind, SessionEvent};

/// Owns the graph editor and at most one running game. Every mutating call is checked
/// against the access policy first; denied calls have no effect.
pub struct RangeController {
    editor: GraphEditor,
    store: Arc<dyn TopologyStore>,
    access: Arc<dyn AccessPolicy>,
    deps: SessionDeps,
    tuning: RangeTuning,
    session: Mutex<Option<GameSession>>,
    rng: Mutex<ChaCha8Rng>,
}

impl RangeController {
    pub fn new(
        stage: Arc<dyn Stage>,
        store: Arc<dyn TopologyStore>,
        access: Arc<dyn AccessPolicy>,
        tuning: RangeTuning,
        rng: ChaCha8Rng,
    ) -> Self {
        let editor = GraphEditor::new(Arc::clone(&stage), tuning.graph.clone());
        let deps = SessionDeps {
            graph: editor.graph(),
            stage,
            bot_tuning: tuning.bot.clone(),
            regions: Arc::new(default_bot_hit_regions()),
        };
        Self {
            editor,
            store,
            access,
            deps,
            tuning,
            session: Mutex::new(None),
            rng: Mutex::new(rng),
        }
    }

    pub fn editor(&self) -> &GraphEditor {
        &self.editor
    }

    fn ensure(&self, user: &UserHandle, action: RangeAction) -> Result<(), RangeError> {
        if self.access.allows(user, action) {
            Ok(())
        } else {
            warn!(user_id = user.id, %action, "action denied");
            Err(RangeError::Forbidden { action })
        }
    }

    pub fn add_waypoint(&self, user: &UserHandle, pose: Pose) -> Result<NodeId, RangeError> {
        self.ensure(user, RangeAction::EditGraph)?;
        Ok(self.editor.add_node(self.tuning.graph.waypoint.clone(), pose))
    }

    pub fn remove_waypoint(&self, user: &UserHandle, id: NodeId) -> Result<bool, RangeError> {
        self.ensure(user, RangeAction::EditGraph)?;
        Ok(self.editor.remove_node(id))
    }

    pub fn move_waypoint(&self, user: &UserHandle, id: NodeId, pose: Pose) -> Result<bool, RangeError> {
        self.ensure(user, RangeAction::EditGraph)?;
        Ok(self.editor.move_node(id, pose))
    }

    pub async fn add_path(
        &self,
        user: &UserHandle,
        source: NodeId,
        target: NodeId,
    ) -> Result<bool, RangeError> {
        self.ensure(user, RangeAction::EditGraph)?;
        Ok(self.editor.add_edge(source, target).await)
    }

    pub fn remove_path(&self, user: &UserHandle, source: NodeId, target: NodeId) -> Result<bool, RangeError> {
        self.ensure(user, RangeAction::EditGraph)?;
        Ok(self.editor.remove_edge(source, target))
    }

    pub fn set_edit_mode(&self, user: &UserHandle, edit: bool) -> Result<(), RangeError> {
        self.ensure(user, RangeAction::EditGraph)?;
        self.editor.set_edit_mode(edit);
        Ok(())
    }

    /// Stops any running game, then starts `mode` on the current graph. The returned
    /// receiver already holds the `Started` event.
    pub fn start_game(
        &self,
        user: &UserHandle,
        mode: GameModeKind,
    ) -> Result<broadcast::Receiver<SessionEvent>, RangeError> {
        self.ensure(user, RangeAction::RunGame)?;

        let mut active = lock(&self.session);
        if let Some(previous) = active.take() {
            info!(mode = %previous.kind(), "stopping previous game");
            previous.stop();
        }
        let seed = lock(&self.rng).next_u64();
        let session = GameSession::new(
            build_policy(mode, &self.tuning),
            self.deps.clone(),
            ChaCha8Rng::seed_from_u64(seed),
        );
        let events = session.subscribe();
        session.start();
        info!(user_id = user.id, %mode, "game started");
        *active = Some(session);
        Ok(events)
    }

    pub fn stop_game(&self, user: &UserHandle) -> Result<(), RangeError> {
        self.ensure(user, RangeAction::RunGame)?;
        let session = lock(&self.session).take().ok_or(RangeError::NoActiveSession)?;
        session.stop();
        info!(user_id = user.id, mode = %session.kind(), "game stopped");
        Ok(())
    }

    pub fn active_mode(&self) -> Option<GameModeKind> {
        lock(&self.session)
            .as_ref()
            .filter(|session| session.is_running())
            .map(GameSession::kind)
    }

    pub fn subscribe(&self) -> Result<broadcast::Receiver<SessionEvent>, RangeError> {
        lock(&self.session)
            .as_ref()
            .map(GameSession::subscribe)
            .ok_or(RangeError::NoActiveSession)
    }

    pub fn bots(&self) -> Result<Vec<BotHandle>, RangeError> {
        lock(&self.session)
            .as_ref()
            .map(GameSession::bots)
            .ok_or(RangeError::NoActiveSession)
    }

    /// Hit-region report from the physics collaborator.
    pub fn hit(&self, bot_id: BotId, region: usize) -> Result<bool, RangeError> {
        lock(&self.session)
            .as_ref()
            .map(|session| session.hit(bot_id, region))
            .ok_or(RangeError::NoActiveSession)
    }

    pub fn target(&self) -> Option<TargetHandle> {
        lock(&self.session).as_ref().and_then(GameSession::target)
    }

    pub async fn load_level(&self, user: &UserHandle, scope: &LevelScope) -> Result<bool, RangeError> {
        LoadLevelUseCase {
            store: Arc::clone(&self.store),
            access: Arc::clone(&self.access),
            editor: self.editor.clone(),
        }
        .execute(user, scope)
        .await
    }

    pub async fn save_level(&self, user: &UserHandle, scope: &LevelScope) -> Result<usize, RangeError> {
        SaveLevelUseCase {
            store: Arc::clone(&self.store),
            access: Arc::clone(&self.access),
            editor: self.editor.clone(),
        }
        .execute(user, scope)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface_adapters::access::RoleAccessPolicy;
    use crate::interface_adapters::stage::HeadlessStage;
    use crate::use_cases::sync::read;
    use crate::use_cases::test_support::{RecordingStore, player, scope};
    use glam::Vec3;

    fn controller() -> RangeController {
        let tuning = RangeTuning::default();
        RangeController::new(
            Arc::new(HeadlessStage::new()),
            Arc::new(RecordingStore::new()),
            Arc::new(RoleAccessPolicy::new(tuning.access.moderator_roles.clone())),
            tuning,
            ChaCha8Rng::seed_from_u64(11),
        )
    }

    fn moderator() -> UserHandle {
        UserHandle::new(1, "Mod").with_role("moderator")
    }

    #[tokio::test]
    async fn when_player_edits_the_graph_then_call_is_forbidden_and_graph_is_unchanged() {
        let range = controller();

        let result = range.add_waypoint(&player(), Pose::default());

        assert!(matches!(
            result,
            Err(RangeError::Forbidden {
                action: RangeAction::EditGraph
            })
        ));
        assert!(read(&range.editor().graph()).is_empty());
    }

    #[tokio::test]
    async fn when_moderator_builds_a_path_then_graph_holds_the_edge() {
        let range = controller();
        let user = moderator();
        let a = range.add_waypoint(&user, Pose::at(Vec3::ZERO)).expect("add a");
        let b = range.add_waypoint(&user, Pose::at(Vec3::X)).expect("add b");

        assert!(range.add_path(&user, a, b).await.expect("add path"));

        assert!(read(&range.editor().graph()).edge(a, b).is_some());
        assert!(range.remove_path(&user, a, b).expect("remove path"));
    }

    #[tokio::test]
    async fn when_a_game_starts_over_another_then_the_first_is_stopped() {
        let range = controller();
        let user = player();
        let mut first = range
            .start_game(&user, GameModeKind::Whackamole)
            .expect("start first game");

        range
            .start_game(&user, GameModeKind::SearchAndDestroy)
            .expect("start second game");

        assert_eq!(
            first.recv().await.ok(),
            Some(SessionEvent::Started {
                mode: GameModeKind::Whackamole
            })
        );
        assert_eq!(first.recv().await.ok(), Some(SessionEvent::Stopped));
        assert_eq!(range.active_mode(), Some(GameModeKind::SearchAndDestroy));
    }

    #[tokio::test]
    async fn when_no_game_is_running_then_stop_reports_no_active_session() {
        let range = controller();

        let result = range.stop_game(&player());

        assert!(matches!(result, Err(RangeError::NoActiveSession)));
        assert!(matches!(range.hit(0, 0), Err(RangeError::NoActiveSession)));
    }

    #[tokio::test]
    async fn when_player_saves_a_level_then_call_is_forbidden() {
        let range = controller();

        let result = range.save_level(&player(), &scope()).await;

        assert!(matches!(result, Err(RangeError::Forbidden { .. })));
        assert_eq!(range.save_level(&moderator(), &scope()).await.ok(), Some(0));
    }
}
