use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::TopologyEntry;
use crate::domain::entities::LevelScope;
use crate::domain::ports::TopologyStore;
use crate::interface_adapters::protocol::{decode_level, encode_level};

// In-memory level store adapter; levels live as long as the process.
#[derive(Clone, Default)]
pub struct InMemoryTopologyStore {
    pub levels: Arc<Mutex<HashMap<LevelScope, Vec<TopologyEntry>>>>,
}

#[async_trait]
impl TopologyStore for InMemoryTopologyStore {
    async fn load(&self, scope: &LevelScope) -> Result<Option<Vec<TopologyEntry>>, String> {
        let levels = self.levels.lock().await;
        Ok(levels.get(scope).cloned())
    }

    async fn save(&self, scope: &LevelScope, topology: &[TopologyEntry]) -> Result<(), String> {
        let mut levels = self.levels.lock().await;
        levels.insert(scope.clone(), topology.to_vec());
        Ok(())
    }
}

// JSON file per scope under a root directory: `<root>/<space>/<session>.json`.
#[derive(Clone)]
pub struct JsonFileTopologyStore {
    pub root: PathBuf,
}

impl JsonFileTopologyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, scope: &LevelScope) -> PathBuf {
        self.root
            .join(sanitize(&scope.space_id))
            .join(format!("{}.json", sanitize(&scope.session_id)))
    }
}

// Keep scope ids from escaping the root directory.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl TopologyStore for JsonFileTopologyStore {
    async fn load(&self, scope: &LevelScope) -> Result<Option<Vec<TopologyEntry>>, String> {
        let path = self.path_for(scope);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(format!("read {}: {err}", path.display())),
        };
        decode_level(&json)
            .map(Some)
            .map_err(|err| format!("parse {}: {err}", path.display()))
    }

    async fn save(&self, scope: &LevelScope, topology: &[TopologyEntry]) -> Result<(), String> {
        let path = self.path_for(scope);
        let json = encode_level(topology).map_err(|err| err.to_string())?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|err| format!("create {}: {err}", dir.display()))?;
        }
        tokio::fs::write(&path, json)
            .await
            .map_err(|err| format!("write {}: {err}", path.display()))
    }
}

// PostgreSQL-backed level store; one row per scope holding the JSON level.
#[derive(Clone)]
pub struct PostgresTopologyStore {
    pub db: PgPool,
}

#[async_trait]
impl TopologyStore for PostgresTopologyStore {
    async fn load(&self, scope: &LevelScope) -> Result<Option<Vec<TopologyEntry>>, String> {
        let row = sqlx::query("SELECT data FROM levels WHERE space_id = $1 AND session_id = $2")
            .bind(&scope.space_id)
            .bind(&scope.session_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|err| err.to_string())?;

        let Some(row) = row else {
            return Ok(None);
        };
        let json: String = row.try_get("data").map_err(|err| err.to_string())?;
        decode_level(&json).map(Some).map_err(|err| err.to_string())
    }

    async fn save(&self, scope: &LevelScope, topology: &[TopologyEntry]) -> Result<(), String> {
        let json = encode_level(topology).map_err(|err| err.to_string())?;
        sqlx::query(
            r#"
            INSERT INTO levels (space_id, session_id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (space_id, session_id) DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = NOW()
            "#,
        )
        .bind(&scope.space_id)
        .bind(&scope.session_id)
        .bind(json)
        .execute(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Pose, WayPointConfig};
    use glam::Vec3;

    fn level() -> Vec<TopologyEntry> {
        vec![
            TopologyEntry {
                config: WayPointConfig::default(),
                pose: Pose::at(Vec3::new(1.0, 0.0, 2.0)),
                adjacency: vec![1],
            },
            TopologyEntry {
                config: WayPointConfig::default(),
                pose: Pose::at(Vec3::new(-1.0, 0.0, 0.5)),
                adjacency: vec![0],
            },
        ]
    }

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "range_sim_{name}_{}",
            crate::interface_adapters::utils::rng::entropy_seed()
        ))
    }

    #[tokio::test]
    async fn when_level_is_saved_to_files_then_it_loads_back() {
        let root = temp_root("roundtrip");
        let store = JsonFileTopologyStore::new(&root);
        let scope = LevelScope::new("space", "session");

        store.save(&scope, &level()).await.expect("save level");
        let loaded = store.load(&scope).await.expect("load level");

        assert_eq!(loaded, Some(level()));
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn when_level_file_is_missing_then_load_returns_none() {
        let store = JsonFileTopologyStore::new(temp_root("missing"));

        let loaded = store
            .load(&LevelScope::new("space", "nothing"))
            .await
            .expect("missing file is not an error");

        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn when_level_file_is_corrupt_then_load_fails() {
        let root = temp_root("corrupt");
        let store = JsonFileTopologyStore::new(&root);
        let scope = LevelScope::new("space", "session");
        let path = store.path_for(&scope);
        tokio::fs::create_dir_all(path.parent().expect("parent dir"))
            .await
            .expect("create dir");
        tokio::fs::write(&path, "not json").await.expect("write file");

        let result = store.load(&scope).await;

        assert!(result.is_err());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[test]
    fn when_scope_contains_path_separators_then_file_stays_under_root() {
        let store = JsonFileTopologyStore::new("/levels");

        let path = store.path_for(&LevelScope::new("../etc", "a/b"));

        assert_eq!(path, PathBuf::from("/levels/___etc/a_b.json"));
    }

    #[tokio::test]
    async fn when_level_is_saved_in_memory_then_it_loads_back() {
        let store = InMemoryTopologyStore::default();
        let scope = LevelScope::new("space", "session");

        store.save(&scope, &level()).await.expect("save level");

        assert_eq!(store.load(&scope).await.expect("load level"), Some(level()));
    }
}
