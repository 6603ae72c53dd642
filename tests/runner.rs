use glam::Vec3;
use range_sim::domain::entities::LevelScope;
use range_sim::domain::ports::TopologyStore;
use range_sim::domain::tuning::RangeTuning;
use range_sim::domain::{Pose, TopologyEntry, WayPointConfig};
use range_sim::interface_adapters::stores::InMemoryTopologyStore;
use range_sim::use_cases::GameModeKind;
use range_sim::{RunSettings, run};
use std::sync::Arc;
use std::time::Duration;

fn triangle() -> Vec<TopologyEntry> {
    [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 2.0]]
        .into_iter()
        .enumerate()
        .map(|(i, position)| TopologyEntry {
            config: WayPointConfig::default(),
            pose: Pose::at(Vec3::from_array(position)),
            adjacency: (0..3).filter(|j| *j != i).collect(),
        })
        .collect()
}

fn settings(mode: GameModeKind, scope: LevelScope) -> RunSettings {
    RunSettings {
        tuning: RangeTuning::default(),
        mode,
        scope,
        run_for: Some(Duration::from_secs(20)),
        seed: Some(5),
    }
}

#[tokio::test(start_paused = true)]
async fn when_whackamole_runs_headless_then_unshot_bots_miss() {
    let store = InMemoryTopologyStore::default();
    let scope = LevelScope::new("space-1", "session-1");
    store.save(&scope, &triangle()).await.expect("seed level");

    let report = run(Arc::new(store), settings(GameModeKind::Whackamole, scope))
        .await
        .expect("run");

    assert!(report.spawned >= 3);
    assert!(report.missed >= 1);
    assert_eq!(report.died, 0);
    assert!(!report.won);
}

#[tokio::test(start_paused = true)]
async fn when_the_level_is_missing_then_the_run_still_completes_on_an_empty_range() {
    let report = run(
        Arc::new(InMemoryTopologyStore::default()),
        settings(GameModeKind::TargetPractice, LevelScope::new("space-1", "none")),
    )
    .await
    .expect("run");

    assert_eq!(report.spawned, 0);
}
