// Level persistence workflows: load a saved graph into the editor, save the live one.

use tracing::{error, info};

use crate::domain::entities::{LevelScope, RangeAction, UserHandle};
use crate::domain::errors::RangeError;
use crate::domain::ports::{AccessPolicy, TopologyStore};
use crate::use_cases::graph_editor::GraphEditor;

fn ensure_allowed<A: AccessPolicy>(access: &A, user: &UserHandle) -> Result<(), RangeError> {
    if access.allows(user, RangeAction::ManageLevels) {
        Ok(())
    } else {
        Err(RangeError::Forbidden {
            action: RangeAction::ManageLevels,
        })
    }
}

// Replaces the live graph with the stored level. The graph is untouched when the store
// fails or holds nothing for the scope.
pub struct LoadLevelUseCase<S, A> {
    pub store: S,
    pub access: A,
    pub editor: GraphEditor,
}

impl<S, A> LoadLevelUseCase<S, A>
where
    S: TopologyStore,
    A: AccessPolicy,
{
    /// Returns whether a level existed for the scope.
    pub async fn execute(&self, user: &UserHandle, scope: &LevelScope) -> Result<bool, RangeError> {
        ensure_allowed(&self.access, user)?;

        let stored = self.store.load(scope).await.map_err(|err| {
            error!(%scope, error = %err, "level load failed");
            RangeError::StorageFailure(err)
        })?;
        let Some(topology) = stored else {
            info!(%scope, "no saved level");
            return Ok(false);
        };

        self.editor.clear();
        let imported = self.editor.import(&topology).await;
        info!(%scope, nodes = imported.nodes.len(), "level loaded");
        Ok(true)
    }
}

// Stores the live graph, poses included, under the scope.
pub struct SaveLevelUseCase<S, A> {
    pub store: S,
    pub access: A,
    pub editor: GraphEditor,
}

impl<S, A> SaveLevelUseCase<S, A>
where
    S: TopologyStore,
    A: AccessPolicy,
{
    /// Returns the number of saved waypoints.
    pub async fn execute(&self, user: &UserHandle, scope: &LevelScope) -> Result<usize, RangeError> {
        ensure_allowed(&self.access, user)?;

        let topology = self.editor.export();
        self.store.save(scope, &topology).await.map_err(|err| {
            error!(%scope, error = %err, "level save failed");
            RangeError::StorageFailure(err)
        })?;
        info!(%scope, nodes = topology.len(), "level saved");
        Ok(topology.len())
    }
}
