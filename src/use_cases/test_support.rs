use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::entities::{LevelScope, RangeAction, UserHandle};
use crate::domain::ports::{AccessPolicy, TopologyStore};
use crate::domain::TopologyEntry;

pub(crate) type LevelTable = Arc<Mutex<HashMap<LevelScope, Vec<TopologyEntry>>>>;

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub load: bool,
    pub save: bool,
}

#[derive(Clone)]
pub(crate) struct RecordingStore {
    levels: LevelTable,
    failures: FailureFlags,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            levels: Arc::new(Mutex::new(HashMap::new())),
            failures: FailureFlags::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn insert_test_level(&self, scope: LevelScope, level: Vec<TopologyEntry>) {
        let mut guard = self.levels.lock().expect("levels mutex poisoned");
        guard.insert(scope, level);
    }

    pub(crate) fn get_test_level(&self, scope: &LevelScope) -> Option<Vec<TopologyEntry>> {
        let guard = self.levels.lock().expect("levels mutex poisoned");
        guard.get(scope).cloned()
    }
}

#[async_trait]
impl TopologyStore for RecordingStore {
    async fn load(&self, scope: &LevelScope) -> Result<Option<Vec<TopologyEntry>>, String> {
        if self.failures.load {
            return Err("load failed".to_string());
        }

        let guard = self.levels.lock().expect("levels mutex poisoned");
        Ok(guard.get(scope).cloned())
    }

    async fn save(&self, scope: &LevelScope, topology: &[TopologyEntry]) -> Result<(), String> {
        if self.failures.save {
            return Err("save failed".to_string());
        }

        let mut guard = self.levels.lock().expect("levels mutex poisoned");
        guard.insert(scope.clone(), topology.to_vec());
        Ok(())
    }
}

// Grants or denies every action regardless of roles.
pub(crate) struct FixedPolicy(pub(crate) bool);

impl AccessPolicy for FixedPolicy {
    fn allows(&self, _user: &UserHandle, _action: RangeAction) -> bool {
        self.0
    }
}

pub(crate) fn scope() -> LevelScope {
    LevelScope::new("space-1", "session-1")
}

pub(crate) fn player() -> UserHandle {
    UserHandle::new(7, "Player")
}
