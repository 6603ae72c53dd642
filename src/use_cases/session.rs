// Game session orchestration: owns the bots of one mode and serializes their events.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::domain::ports::Stage;
use crate::domain::tuning::BotTuning;
use crate::domain::{HitRegion, NodeId, Outcome};
use crate::use_cases::bot::{BotContext, BotHandle, BotSpec};
use crate::use_cases::graph_editor::SharedGraph;
use crate::use_cases::modes::zombie_horde::TargetHandle;
use crate::use_cases::sync::{lock, read};
use crate::use_cases::types::{BotEvent, BotId, FinishedBot, GameModeKind, SessionEvent};

const EVENT_CAPACITY: usize = 256;

/// Spawn and win/loss rules of one game mode. Every hook runs under the session lock and
/// never awaits.
pub trait ModePolicy: Send {
    fn kind(&self) -> GameModeKind;

    // Period of `on_interval`; `None` disables the spawn ticker.
    fn spawn_interval(&self) -> Option<Duration> {
        None
    }

    fn on_start(&mut self, ctx: &mut SessionCtx<'_>);

    fn on_interval(&mut self, _ctx: &mut SessionCtx<'_>) {}

    // The bot is already out of the session when this runs.
    fn on_bot_finished(&mut self, _ctx: &mut SessionCtx<'_>, _bot: FinishedBot, _outcome: Outcome) {}

    fn on_timer(&mut self, _ctx: &mut SessionCtx<'_>, _key: u64) {}

    fn on_stop(&mut self, _ctx: &mut SessionCtx<'_>) {}

    fn target(&self) -> Option<TargetHandle> {
        None
    }
}

/// Collaborators shared by every session of a range.
#[derive(Clone)]
pub struct SessionDeps {
    pub graph: SharedGraph,
    pub stage: Arc<dyn Stage>,
    pub bot_tuning: BotTuning,
    pub regions: Arc<Vec<HitRegion>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Stopped,
}

struct SessionRuntime {
    bots: HashMap<BotId, BotHandle>,
    timers: Vec<JoinHandle<()>>,
    next_bot_id: BotId,
    rng: ChaCha8Rng,
    bot_tx: Option<mpsc::UnboundedSender<BotEvent>>,
    timer_tx: Option<mpsc::UnboundedSender<u64>>,
}

struct SessionState {
    phase: Phase,
    policy: Box<dyn ModePolicy>,
    runtime: SessionRuntime,
    driver: Option<JoinHandle<()>>,
}

struct SessionShared {
    kind: GameModeKind,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    deps: SessionDeps,
}

/// What a mode policy may do while handling a hook.
pub struct SessionCtx<'a> {
    runtime: &'a mut SessionRuntime,
    deps: &'a SessionDeps,
    events: &'a broadcast::Sender<SessionEvent>,
}

impl SessionCtx<'_> {
    pub fn graph(&self) -> &SharedGraph {
        &self.deps.graph
    }

    pub fn stage(&self) -> &Arc<dyn Stage> {
        &self.deps.stage
    }

    /// Live waypoint ids in ascending order.
    pub fn waypoints(&self) -> Vec<NodeId> {
        read(&self.deps.graph).node_ids().collect()
    }

    /// Waypoints currently held by a bot of this session, including the ones wandering
    /// bots are hopping toward.
    pub fn occupied(&self) -> HashSet<NodeId> {
        self.runtime.bots.values().flat_map(BotHandle::occupied).collect()
    }

    pub fn live_bots(&self) -> usize {
        self.runtime.bots.len()
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.runtime.rng
    }

    pub fn spawn_bot(&mut self, spec: BotSpec) -> Option<BotId> {
        let events = self.runtime.bot_tx.clone()?;
        let id = self.runtime.next_bot_id;
        self.runtime.next_bot_id += 1;
        let waypoint = spec.waypoint;
        let ctx = BotContext {
            graph: Arc::clone(&self.deps.graph),
            stage: Arc::clone(&self.deps.stage),
            tuning: self.deps.bot_tuning.clone(),
            regions: Arc::clone(&self.deps.regions),
            events,
        };
        let rng = ChaCha8Rng::seed_from_u64(self.runtime.rng.next_u64());
        let handle = BotHandle::spawn(id, spec, ctx, rng);
        self.runtime.bots.insert(id, handle);
        self.emit(SessionEvent::BotSpawned {
            bot_id: id,
            waypoint,
        });
        Some(id)
    }

    /// Fires `on_timer(key)` after `delay` unless the session stops first.
    pub fn schedule(&mut self, delay: Duration, key: u64) {
        let Some(timer_tx) = self.runtime.timer_tx.clone() else {
            return;
        };
        self.runtime.timers.retain(|timer| !timer.is_finished());
        self.runtime.timers.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = timer_tx.send(key);
        }));
    }

    pub fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// One run of a game mode over the shared graph. Dropping the session stops it.
pub struct GameSession {
    shared: Arc<SessionShared>,
}

impl GameSession {
    pub fn new(policy: Box<dyn ModePolicy>, deps: SessionDeps, rng: ChaCha8Rng) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let kind = policy.kind();
        Self {
            shared: Arc::new(SessionShared {
                kind,
                state: Mutex::new(SessionState {
                    phase: Phase::Idle,
                    policy,
                    runtime: SessionRuntime {
                        bots: HashMap::new(),
                        timers: Vec::new(),
                        next_bot_id: 0,
                        rng,
                        bot_tx: None,
                        timer_tx: None,
                    },
                    driver: None,
                }),
                events,
                deps,
            }),
        }
    }

    pub fn kind(&self) -> GameModeKind {
        self.shared.kind
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.state).phase == Phase::Running
    }

    /// Starts the spawn policy. A session runs at most once.
    pub fn start(&self) -> bool {
        let shared = &self.shared;
        let mut guard = lock(&shared.state);
        if guard.phase != Phase::Idle {
            return false;
        }
        let state = &mut *guard;
        state.phase = Phase::Running;

        let (bot_tx, bot_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        state.runtime.bot_tx = Some(bot_tx);
        state.runtime.timer_tx = Some(timer_tx);

        let _ = shared.events.send(SessionEvent::Started { mode: shared.kind });
        info!(mode = %shared.kind, "game session started");
        let mut ctx = SessionCtx {
            runtime: &mut state.runtime,
            deps: &shared.deps,
            events: &shared.events,
        };
        state.policy.on_start(&mut ctx);

        let period = state.policy.spawn_interval().filter(|p| !p.is_zero());
        state.driver = Some(tokio::spawn(drive(
            Arc::downgrade(shared),
            bot_rx,
            timer_rx,
            period,
        )));
        true
    }

    /// Removes every bot and cancels every timer before returning. Only the first call
    /// emits `Stopped`.
    pub fn stop(&self) -> bool {
        let shared = &self.shared;
        let mut guard = lock(&shared.state);
        if guard.phase == Phase::Stopped {
            return false;
        }
        let state = &mut *guard;
        state.phase = Phase::Stopped;

        if let Some(driver) = state.driver.take() {
            driver.abort();
        }
        for timer in state.runtime.timers.drain(..) {
            timer.abort();
        }
        for (_, bot) in state.runtime.bots.drain() {
            bot.remove();
        }
        state.runtime.bot_tx = None;
        state.runtime.timer_tx = None;

        let mut ctx = SessionCtx {
            runtime: &mut state.runtime,
            deps: &shared.deps,
            events: &shared.events,
        };
        state.policy.on_stop(&mut ctx);
        let _ = shared.events.send(SessionEvent::Stopped);
        info!(mode = %shared.kind, "game session stopped");
        true
    }

    pub fn bot(&self, id: BotId) -> Option<BotHandle> {
        lock(&self.shared.state).runtime.bots.get(&id).cloned()
    }

    pub fn bots(&self) -> Vec<BotHandle> {
        let mut bots: Vec<BotHandle> = lock(&self.shared.state)
            .runtime
            .bots
            .values()
            .cloned()
            .collect();
        bots.sort_by_key(BotHandle::id);
        bots
    }

    /// Forwards a hit-region report to a bot. False when the bot is not in the session.
    pub fn hit(&self, bot_id: BotId, region: usize) -> bool {
        match self.bot(bot_id) {
            Some(bot) => {
                bot.hit(region);
                true
            }
            None => false,
        }
    }

    pub fn target(&self) -> Option<TargetHandle> {
        lock(&self.shared.state).policy.target()
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl SessionShared {
    fn with_policy(&self, hook: impl FnOnce(&mut dyn ModePolicy, &mut SessionCtx<'_>)) {
        let mut guard = lock(&self.state);
        if guard.phase != Phase::Running {
            return;
        }
        let state = &mut *guard;
        let mut ctx = SessionCtx {
            runtime: &mut state.runtime,
            deps: &self.deps,
            events: &self.events,
        };
        hook(state.policy.as_mut(), &mut ctx);
    }

    fn handle_bot_event(&self, event: BotEvent) {
        self.with_policy(|policy, ctx| {
            let Some(bot) = ctx.runtime.bots.remove(&event.bot_id) else {
                debug!(bot_id = event.bot_id, "event for unknown bot");
                return;
            };
            bot.remove();
            let finished = FinishedBot {
                bot_id: event.bot_id,
                spawn_waypoint: bot.spawn_waypoint(),
                waypoint: bot.waypoint(),
            };
            ctx.emit(match event.outcome {
                Outcome::Dead => SessionEvent::BotDied {
                    bot_id: event.bot_id,
                },
                Outcome::Missed => SessionEvent::BotMissed {
                    bot_id: event.bot_id,
                },
                Outcome::Reached => SessionEvent::BotReachedTarget {
                    bot_id: event.bot_id,
                },
            });
            policy.on_bot_finished(ctx, finished, event.outcome);
        });
    }
}

async fn drive(
    shared: Weak<SessionShared>,
    mut bot_rx: mpsc::UnboundedReceiver<BotEvent>,
    mut timer_rx: mpsc::UnboundedReceiver<u64>,
    period: Option<Duration>,
) {
    // A period past the clock's range never ticks.
    let mut ticker = period.and_then(|period| {
        let start = Instant::now().checked_add(period)?;
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(ticker)
    });

    loop {
        tokio::select! {
            Some(event) = bot_rx.recv() => {
                let Some(shared) = shared.upgrade() else { break };
                shared.handle_bot_event(event);
            }
            Some(key) = timer_rx.recv() => {
                let Some(shared) = shared.upgrade() else { break };
                shared.with_policy(|policy, ctx| policy.on_timer(ctx, key));
            }
            _ = tick(&mut ticker) => {
                let Some(shared) = shared.upgrade() else { break };
                shared.with_policy(|policy, ctx| policy.on_interval(ctx));
            }
        }
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
