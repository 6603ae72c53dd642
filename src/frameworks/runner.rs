// Framework bootstrap for the headless range runner.

use std::io::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::domain::entities::{LevelScope, UserHandle};
use crate::domain::ports::TopologyStore;
use crate::domain::tuning::{AccessTuning, RangeTuning};
use crate::frameworks::{config, db};
use crate::interface_adapters::access::RoleAccessPolicy;
use crate::interface_adapters::stage::HeadlessStage;
use crate::interface_adapters::stores::{JsonFileTopologyStore, PostgresTopologyStore};
use crate::interface_adapters::utils::rng::seeded_rng;
use crate::use_cases::{GameModeKind, RangeController, SessionEvent};

const SYSTEM_USER_ID: u64 = 0;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// What one headless run should do.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub tuning: RangeTuning,
    pub mode: GameModeKind,
    pub scope: LevelScope,
    // `None` runs until Ctrl-C.
    pub run_for: Option<Duration>,
    pub seed: Option<u64>,
}

/// Session event counts observed during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub spawned: usize,
    pub died: usize,
    pub missed: usize,
    pub reached: usize,
    pub won: bool,
}

impl RunReport {
    fn record(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::BotSpawned { .. } => self.spawned += 1,
            SessionEvent::BotDied { .. } => self.died += 1,
            SessionEvent::BotMissed { .. } => self.missed += 1,
            SessionEvent::BotReachedTarget { .. } => self.reached += 1,
            SessionEvent::Won => self.won = true,
            SessionEvent::Started { .. } | SessionEvent::TargetHp { .. } | SessionEvent::Stopped => {}
        }
    }
}

// The runner acts as a moderator so it may load levels.
fn system_user(access: &AccessTuning) -> UserHandle {
    let role = access
        .moderator_roles
        .first()
        .cloned()
        .unwrap_or_else(|| "moderator".to_string());
    UserHandle::new(SYSTEM_USER_ID, "system").with_role(role)
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Started { mode } => info!(%mode, "game started"),
        SessionEvent::BotSpawned { bot_id, waypoint } => {
            info!(bot_id, node_id = waypoint, "bot spawned")
        }
        SessionEvent::BotDied { bot_id } => info!(bot_id, "bot died"),
        SessionEvent::BotMissed { bot_id } => info!(bot_id, "bot missed"),
        SessionEvent::BotReachedTarget { bot_id } => info!(bot_id, "bot reached the target"),
        SessionEvent::TargetHp { hp } => info!(hp, "target hp"),
        SessionEvent::Won => info!("game won"),
        SessionEvent::Stopped => info!("game stopped"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

async fn run_deadline(run_for: Option<Duration>) {
    match run_for {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending::<()>().await,
    }
}

/// Loads the level, runs the configured mode and logs every session event until the
/// run time elapses or Ctrl-C arrives.
pub async fn run(store: Arc<dyn TopologyStore>, settings: RunSettings) -> Result<RunReport> {
    let RunSettings {
        tuning,
        mode,
        scope,
        run_for,
        seed,
    } = settings;
    let system = system_user(&tuning.access);
    let access = Arc::new(RoleAccessPolicy::new(tuning.access.moderator_roles.clone()));
    let range = RangeController::new(
        Arc::new(HeadlessStage::new()),
        store,
        access,
        tuning,
        seeded_rng(seed),
    );

    let found = range
        .load_level(&system, &scope)
        .await
        .map_err(|e| std::io::Error::other(format!("failed to load level {scope}: {e}")))?;
    if found {
        info!(%scope, "level loaded");
    } else {
        warn!(%scope, "no saved level; the graph is empty");
    }

    let mut events = range
        .start_game(&system, mode)
        .map_err(|e| std::io::Error::other(format!("failed to start {mode}: {e}")))?;

    let mut report = RunReport::default();
    let deadline = run_deadline(run_for);
    let shutdown = shutdown_signal();
    tokio::pin!(deadline, shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    log_event(&event);
                    report.record(&event);
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "session events dropped"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut deadline => {
                info!("run time elapsed");
                break;
            }
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
        }
    }

    if let Err(e) = range.stop_game(&system) {
        warn!(error = %e, "stop failed");
    }
    // Drain what the stop emitted.
    while let Ok(event) = events.try_recv() {
        log_event(&event);
        report.record(&event);
    }
    info!(?report, "run finished");
    Ok(report)
}

async fn build_store() -> Result<Arc<dyn TopologyStore>> {
    let Some(database_url) = config::database_url() else {
        let dir = config::level_dir();
        info!(dir = %dir.display(), "using json level store");
        return Ok(Arc::new(JsonFileTopologyStore::new(dir)));
    };

    let db = db::connect_pool(&database_url)
        .await
        .map_err(|e| std::io::Error::other(format!("failed to connect to database: {e}")))?;
    db::run_migrations(&db)
        .await
        .map_err(|e| std::io::Error::other(format!("failed to run migrations: {e}")))?;
    info!("using postgres level store");
    Ok(Arc::new(PostgresTopologyStore { db }))
}

pub async fn run_with_config() -> Result<RunReport> {
    init_runtime();

    let path = config::config_path();
    let tuning = config::load_tuning(&path).map_err(std::io::Error::other)?;
    let mode = config::mode().map_err(std::io::Error::other)?;
    let settings = RunSettings {
        tuning,
        mode,
        scope: LevelScope::new(config::space_id(), config::session_id()),
        run_for: config::run_duration(),
        seed: config::seed(),
    };
    tracing::debug!(config = %path.display(), ?settings, "settings loaded");

    let store = build_store().await?;
    run(store, settings).await
}
