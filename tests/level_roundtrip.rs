mod support;

use range_sim::domain::entities::LevelScope;
use range_sim::domain::errors::RangeError;
use range_sim::domain::tuning::RangeTuning;
use range_sim::interface_adapters::stores::JsonFileTopologyStore;
use range_sim::interface_adapters::utils::rng::entropy_seed;
use std::sync::Arc;
use support::{line, moderator, player, range_with_store};

fn temp_levels() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("range_sim_levels_{}", entropy_seed()))
}

#[tokio::test]
async fn when_a_saved_level_is_loaded_into_a_fresh_range_then_topology_matches() {
    let dir = temp_levels();
    let store = Arc::new(JsonFileTopologyStore::new(&dir));
    let scope = LevelScope::new("space-1", "session-1");
    let user = moderator();

    let author = range_with_store(RangeTuning::default(), store.clone());
    line(&author.controller, 3).await;
    let saved = author
        .controller
        .save_level(&user, &scope)
        .await
        .expect("save level");
    assert_eq!(saved, 3);

    let visitor = range_with_store(RangeTuning::default(), store);
    let found = visitor
        .controller
        .load_level(&user, &scope)
        .await
        .expect("load level");

    assert!(found);
    assert_eq!(
        visitor.controller.editor().export(),
        author.controller.editor().export()
    );
    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn when_no_level_is_saved_then_load_keeps_the_current_graph() {
    let store = Arc::new(JsonFileTopologyStore::new(temp_levels()));
    let range = range_with_store(RangeTuning::default(), store);
    line(&range.controller, 2).await;

    let found = range
        .controller
        .load_level(&moderator(), &LevelScope::new("space-1", "empty"))
        .await
        .expect("load level");

    assert!(!found);
    assert_eq!(range.controller.editor().export().len(), 2);
}

#[tokio::test]
async fn when_a_player_loads_a_level_then_call_is_forbidden() {
    let store = Arc::new(JsonFileTopologyStore::new(temp_levels()));
    let range = range_with_store(RangeTuning::default(), store);

    let result = range
        .controller
        .load_level(&player(), &LevelScope::new("space-1", "session-1"))
        .await;

    assert!(matches!(result, Err(RangeError::Forbidden { .. })));
}
