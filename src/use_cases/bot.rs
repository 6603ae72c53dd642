// Bot runtime: one lifecycle task per bot driving spawn, ttl and movement.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, info};

use crate::domain::ports::{ActorId, Clip, Stage};
use crate::domain::tuning::BotTuning;
use crate::domain::{BotStatus, BotVitals, HitRegion, NodeId, Outcome, Pose, RoutingTable};
use crate::use_cases::graph_editor::SharedGraph;
use crate::use_cases::sync::{lock, read};
use crate::use_cases::types::{BotEvent, BotId};

pub enum Movement {
    Static,
    // Random walk along outgoing edges.
    Wander,
    // Hop toward the node nearest the target, re-evaluated every hop.
    Chase {
        target: watch::Receiver<Pose>,
        routing: Arc<RoutingTable>,
    },
}

pub struct BotSpec {
    pub waypoint: NodeId,
    pub model: String,
    pub hp: i32,
    pub ttl: Option<Duration>,
    pub movement: Movement,
}

/// Shared collaborators every bot of a session needs.
#[derive(Clone)]
pub struct BotContext {
    pub graph: SharedGraph,
    pub stage: Arc<dyn Stage>,
    pub tuning: BotTuning,
    pub regions: Arc<Vec<HitRegion>>,
    pub events: mpsc::UnboundedSender<BotEvent>,
}

struct BotState {
    vitals: BotVitals,
    waypoint: NodeId,
    // Node of the hop in flight.
    heading: Option<NodeId>,
    deadline: Option<Instant>,
    hit_regions: Vec<ActorId>,
    lifecycle: Option<JoinHandle<()>>,
    teardown: Option<JoinHandle<()>>,
    released: bool,
}

struct BotCore {
    id: BotId,
    spawn_waypoint: NodeId,
    body: ActorId,
    // Every status change is published while `state` is held.
    state: Mutex<BotState>,
    status_tx: watch::Sender<BotStatus>,
    ttl_changed: Notify,
    ctx: BotContext,
}

/// Handle to a running bot. Terminal outcomes are decided under the bot's own lock, so
/// hits, ttl expiry, reaching the target and removal can race in any order and at most
/// one of them wins.
#[derive(Clone)]
pub struct BotHandle(Arc<BotCore>);

impl BotHandle {
    pub fn spawn(id: BotId, spec: BotSpec, ctx: BotContext, rng: ChaCha8Rng) -> Self {
        let pose = read(&ctx.graph).pose(spec.waypoint).unwrap_or_default();
        let body = ctx.stage.spawn_model(&spec.model, pose);
        let (status_tx, _) = watch::channel(BotStatus::Spawning);
        let core = Arc::new(BotCore {
            id,
            spawn_waypoint: spec.waypoint,
            body,
            state: Mutex::new(BotState {
                vitals: BotVitals::new(spec.hp, spec.ttl),
                waypoint: spec.waypoint,
                heading: None,
                deadline: None,
                hit_regions: Vec::new(),
                lifecycle: None,
                teardown: None,
                released: false,
            }),
            status_tx,
            ttl_changed: Notify::new(),
            ctx,
        });

        let task = tokio::spawn(Arc::clone(&core).run(spec.movement, rng));
        lock(&core.state).lifecycle = Some(task);
        debug!(bot_id = id, node_id = spec.waypoint, "bot spawned");
        Self(core)
    }

    pub fn id(&self) -> BotId {
        self.0.id
    }

    pub fn status(&self) -> BotStatus {
        *self.0.status_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<BotStatus> {
        self.0.status_tx.subscribe()
    }

    pub fn hp(&self) -> i32 {
        lock(&self.0.state).vitals.hp()
    }

    pub fn ttl(&self) -> Option<Duration> {
        lock(&self.0.state).vitals.ttl()
    }

    pub fn spawn_waypoint(&self) -> NodeId {
        self.0.spawn_waypoint
    }

    pub fn waypoint(&self) -> NodeId {
        lock(&self.0.state).waypoint
    }

    /// The last reached waypoint plus the one a hop is heading for, if any.
    pub fn occupied(&self) -> Vec<NodeId> {
        let state = lock(&self.0.state);
        std::iter::once(state.waypoint).chain(state.heading).collect()
    }

    /// A hit on one of the bot's regions. Unknown regions are ignored.
    pub fn hit(&self, region: usize) {
        if let Some(damage) = self.0.ctx.regions.get(region).map(|r| r.damage) {
            self.apply_damage(damage);
        }
    }

    pub fn apply_damage(&self, amount: i32) {
        self.0.transition(|state| state.vitals.apply_damage(amount));
    }

    pub fn set_hp(&self, hp: i32) {
        self.0.transition(|state| state.vitals.set_hp(hp));
    }

    /// Restarts the countdown from now; zero is an immediate miss.
    pub fn set_ttl(&self, ttl: Duration) {
        self.0.transition(|state| {
            let outcome = state.vitals.set_ttl(ttl);
            if outcome.is_none() && state.vitals.status().is_alive() {
                // A ttl past the clock's range never expires.
                state.deadline = Instant::now().checked_add(ttl);
            }
            outcome
        });
        self.0.ttl_changed.notify_one();
    }

    /// Owner teardown: cancels every task and releases the actors without an outcome.
    pub fn remove(&self) {
        let core = &self.0;
        let regions = {
            let mut state = lock(&core.state);
            if state.vitals.remove() {
                core.status_tx.send_replace(BotStatus::Removed);
            }
            if let Some(task) = state.lifecycle.take() {
                task.abort();
            }
            if let Some(task) = state.teardown.take() {
                task.abort();
            }
            std::mem::take(&mut state.hit_regions)
        };
        for actor in regions {
            core.ctx.stage.destroy(actor);
        }
        core.release();
    }
}

impl BotCore {
    async fn run(self: Arc<Self>, movement: Movement, mut rng: ChaCha8Rng) {
        self.ctx.stage.play(self.body, Clip::Spawn);
        sleep(self.ctx.tuning.spawn_animation()).await;

        // Hit detection is switched on together with the Alive status.
        let activated = self.transition(|state| {
            if !state.vitals.activate() {
                return None;
            }
            self.status_tx.send_replace(BotStatus::Alive);
            if let Some(outcome) = state.vitals.settle() {
                return Some(outcome);
            }
            state.deadline = state
                .vitals
                .ttl()
                .and_then(|ttl| Instant::now().checked_add(ttl));
            state.hit_regions = self
                .ctx
                .regions
                .iter()
                .map(|region| self.ctx.stage.spawn_hit_region(self.body, region))
                .collect();
            None
        });
        if activated.is_some() || !self.status().is_alive() {
            return;
        }
        debug!(bot_id = self.id, "bot alive");

        tokio::join!(self.ttl_timer(), self.move_along(movement, &mut rng));
    }

    fn status(&self) -> BotStatus {
        *self.status_tx.borrow()
    }

    // Runs `apply` under the state lock; a terminal outcome is published before the lock
    // is released and hit regions go away right after.
    fn transition(
        self: &Arc<Self>,
        apply: impl FnOnce(&mut BotState) -> Option<Outcome>,
    ) -> Option<Outcome> {
        let (outcome, regions) = {
            let mut state = lock(&self.state);
            let Some(outcome) = apply(&mut state) else {
                return None;
            };
            self.status_tx.send_replace(outcome.into());
            state.teardown = Some(tokio::spawn(Arc::clone(self).teardown(outcome)));
            (outcome, std::mem::take(&mut state.hit_regions))
        };
        for actor in regions {
            self.ctx.stage.destroy(actor);
        }
        info!(bot_id = self.id, ?outcome, "bot finished");
        Some(outcome)
    }

    async fn teardown(self: Arc<Self>, outcome: Outcome) {
        let animation = match outcome {
            Outcome::Dead => Some((Clip::Death, self.ctx.tuning.death_animation())),
            Outcome::Missed => Some((Clip::Missed, self.ctx.tuning.missed_animation())),
            Outcome::Reached => None,
        };
        if let Some((clip, duration)) = animation {
            self.ctx.stage.play(self.body, clip);
            sleep(duration).await;
        }
        let _ = self.ctx.events.send(BotEvent {
            bot_id: self.id,
            outcome,
        });
        self.release();
    }

    fn release(&self) {
        let first = {
            let mut state = lock(&self.state);
            !std::mem::replace(&mut state.released, true)
        };
        if first {
            self.ctx.stage.destroy(self.body);
        }
    }

    async fn ttl_timer(self: &Arc<Self>) {
        let mut status = self.status_tx.subscribe();
        loop {
            let deadline = lock(&self.state).deadline;
            let changed = self.ttl_changed.notified();
            match deadline {
                None => {
                    tokio::select! {
                        _ = changed => continue,
                        _ = finished(&mut status) => return,
                    }
                }
                Some(at) => {
                    tokio::select! {
                        _ = sleep_until(at) => {}
                        _ = changed => continue,
                        _ = finished(&mut status) => return,
                    }
                    // A set_ttl racing the timer moves the deadline; only the current one expires.
                    self.transition(|state| {
                        if state.deadline == Some(at) {
                            state.vitals.expire()
                        } else {
                            None
                        }
                    });
                    if self.status().is_finished() {
                        return;
                    }
                }
            }
        }
    }

    async fn move_along(self: &Arc<Self>, movement: Movement, rng: &mut ChaCha8Rng) {
        match movement {
            Movement::Static => {}
            Movement::Wander => self.wander(rng).await,
            Movement::Chase { target, routing } => self.chase(target, routing).await,
        }
    }

    async fn wander(self: &Arc<Self>, rng: &mut ChaCha8Rng) {
        loop {
            let step = {
                let graph = read(&self.ctx.graph);
                let current = lock(&self.state).waypoint;
                let neighbors = graph.neighbors(current);
                if neighbors.is_empty() {
                    None
                } else {
                    let next = neighbors[rng.gen_range(0..neighbors.len())];
                    match (graph.pose(current), graph.pose(next)) {
                        (Some(from), Some(to)) => Some((next, to, from.distance(&to))),
                        _ => None,
                    }
                }
            };
            let Some((next, pose, distance)) = step else {
                return;
            };
            if !self.hop(next, pose, distance).await {
                return;
            }
        }
    }

    async fn chase(self: &Arc<Self>, target: watch::Receiver<Pose>, routing: Arc<RoutingTable>) {
        loop {
            if !self.status().is_alive() {
                return;
            }
            let goal = target.borrow().position;
            let step = {
                let graph = read(&self.ctx.graph);
                let current = lock(&self.state).waypoint;
                match graph.nearest_node(goal) {
                    None => Chase::Stop,
                    Some(nearest) if nearest == current => Chase::Arrived,
                    Some(nearest) => match routing.next_hop(current, nearest) {
                        None => Chase::Stop,
                        Some(next) => match (graph.pose(current), graph.pose(next)) {
                            (Some(from), Some(to)) => Chase::Hop(next, to, from.distance(&to)),
                            _ => Chase::Stop,
                        },
                    },
                }
            };
            match step {
                Chase::Stop => {
                    debug!(bot_id = self.id, "no route to target");
                    return;
                }
                Chase::Arrived => {
                    self.transition(|state| state.vitals.reach_target());
                    return;
                }
                Chase::Hop(next, pose, distance) => {
                    if !self.hop(next, pose, distance).await {
                        return;
                    }
                }
            }
        }
    }

    // Moves one edge at constant speed. Aborts as soon as the bot stops being Alive.
    async fn hop(self: &Arc<Self>, next: NodeId, pose: Pose, distance: f32) -> bool {
        if !self.status().is_alive() {
            return false;
        }
        let duration = self.ctx.tuning.hop_duration(distance);
        lock(&self.state).heading = Some(next);
        self.ctx.stage.animate_to(self.body, pose, duration);
        let mut status = self.status_tx.subscribe();
        tokio::select! {
            _ = sleep(duration) => {}
            _ = finished(&mut status) => return false,
        }

        let mut state = lock(&self.state);
        if !state.vitals.status().is_alive() {
            return false;
        }
        state.waypoint = next;
        state.heading = None;
        true
    }
}

enum Chase {
    Stop,
    Arrived,
    Hop(NodeId, Pose, f32),
}

async fn finished(status: &mut watch::Receiver<BotStatus>) {
    loop {
        let done = status.borrow_and_update().is_finished();
        if done || status.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hit_region::default_bot_hit_regions;
    use crate::domain::{NavGraph, WayPointConfig, WayPointEdge};
    use crate::interface_adapters::stage::{HeadlessStage, StageCall};
    use glam::Vec3;
    use rand::SeedableRng;
    use std::sync::RwLock;

    struct Fixture {
        stage: Arc<HeadlessStage>,
        graph: SharedGraph,
        events: mpsc::UnboundedReceiver<BotEvent>,
        ctx: BotContext,
    }

    fn fixture(positions: &[f32], edges: &[(NodeId, NodeId)]) -> Fixture {
        let mut graph = NavGraph::new();
        for x in positions {
            graph.add_node(WayPointConfig::default(), Pose::at(Vec3::new(*x, 0.0, 0.0)));
        }
        for (source, target) in edges {
            graph.add_edge(*source, *target, WayPointEdge::new(1.0, false));
        }
        let graph = Arc::new(RwLock::new(graph));
        let stage = Arc::new(HeadlessStage::new());
        let (events_tx, events) = mpsc::unbounded_channel();
        let ctx = BotContext {
            graph: Arc::clone(&graph),
            stage: stage.clone(),
            tuning: BotTuning::default(),
            regions: Arc::new(default_bot_hit_regions()),
            events: events_tx,
        };
        Fixture {
            stage,
            graph,
            events,
            ctx,
        }
    }

    fn spec(waypoint: NodeId, hp: i32, ttl: Option<Duration>, movement: Movement) -> BotSpec {
        BotSpec {
            waypoint,
            model: "model".to_string(),
            hp,
            ttl,
            movement,
        }
    }

    fn spawn(fixture: &Fixture, spec: BotSpec) -> BotHandle {
        BotHandle::spawn(1, spec, fixture.ctx.clone(), ChaCha8Rng::seed_from_u64(3))
    }

    async fn wait_alive(bot: &BotHandle) {
        let mut status = bot.subscribe();
        let _ = status.wait_for(|s| *s != BotStatus::Spawning).await;
    }

    #[tokio::test(start_paused = true)]
    async fn when_two_lethal_hits_land_together_then_death_is_reported_once() {
        let mut f = fixture(&[0.0], &[]);
        let bot = spawn(&f, spec(0, 100, None, Movement::Static));
        wait_alive(&bot).await;

        bot.hit(0);
        bot.hit(0);
        let event = f.events.recv().await.expect("death event");
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(event.outcome, Outcome::Dead);
        assert!(f.events.try_recv().is_err());
        assert_eq!(f.stage.live_actor_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn when_bot_is_spawning_then_hits_are_ignored() {
        let f = fixture(&[0.0], &[]);
        let bot = spawn(&f, spec(0, 100, None, Movement::Static));

        bot.hit(0);
        wait_alive(&bot).await;

        assert_eq!(bot.status(), BotStatus::Alive);
        assert_eq!(bot.hp(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn when_bot_dies_then_hit_regions_are_destroyed_before_the_death_clip_ends() {
        let mut f = fixture(&[0.0], &[]);
        let bot = spawn(&f, spec(0, 80, None, Movement::Static));
        wait_alive(&bot).await;
        let regions = default_bot_hit_regions().len();
        assert_eq!(f.stage.live_actor_count(), 1 + regions);

        bot.hit(1);

        assert_eq!(f.stage.live_actor_count(), 1);
        assert_eq!(bot.status(), BotStatus::Dead);
        assert!(f.events.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn when_ttl_elapses_then_bot_misses() {
        let mut f = fixture(&[0.0], &[]);
        let bot = spawn(&f, spec(0, 200, Some(Duration::from_secs(1)), Movement::Static));

        let event = f.events.recv().await.expect("miss event");

        assert_eq!(event.outcome, Outcome::Missed);
        assert_eq!(bot.status(), BotStatus::Missed);
    }

    #[tokio::test(start_paused = true)]
    async fn when_lethal_hit_lands_just_before_ttl_then_exactly_one_outcome_is_reported() {
        let mut f = fixture(&[0.0], &[]);
        let bot = spawn(&f, spec(0, 100, Some(Duration::from_secs(1)), Movement::Static));
        wait_alive(&bot).await;

        tokio::time::sleep(Duration::from_millis(999)).await;
        bot.hit(0);
        let event = f.events.recv().await.expect("terminal event");
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(event.outcome, Outcome::Dead);
        assert!(f.events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn when_ttl_is_extended_then_the_old_deadline_does_not_fire() {
        let mut f = fixture(&[0.0], &[]);
        let bot = spawn(&f, spec(0, 100, Some(Duration::from_secs(1)), Movement::Static));
        wait_alive(&bot).await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        bot.set_ttl(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(bot.status(), BotStatus::Alive);
        assert!(f.events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn when_bot_is_removed_then_no_event_follows_and_actors_are_released() {
        let mut f = fixture(&[0.0], &[]);
        let bot = spawn(&f, spec(0, 100, Some(Duration::from_secs(1)), Movement::Static));
        wait_alive(&bot).await;

        bot.remove();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(bot.status(), BotStatus::Removed);
        assert!(f.events.try_recv().is_err());
        assert_eq!(f.stage.live_actor_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn when_bot_is_removed_during_its_death_clip_then_no_event_follows() {
        let mut f = fixture(&[0.0], &[]);
        let bot = spawn(&f, spec(0, 100, None, Movement::Static));
        wait_alive(&bot).await;

        bot.hit(0);
        bot.remove();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(bot.status(), BotStatus::Dead);
        assert!(f.events.try_recv().is_err());
        assert_eq!(f.stage.live_actor_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn when_bot_wanders_a_loop_then_it_moves_along_edges() {
        let f = fixture(&[0.0, 1.0], &[(0, 1), (1, 0)]);
        let bot = spawn(&f, spec(0, 100, None, Movement::Wander));
        wait_alive(&bot).await;

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(bot.waypoint(), 1);
        let hops = f
            .stage
            .calls()
            .iter()
            .filter(|call| matches!(call, StageCall::AnimateTo { .. }))
            .count();
        assert_eq!(hops, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn when_bot_is_mid_hop_then_both_ends_of_the_edge_are_occupied() {
        let f = fixture(&[0.0, 1.0], &[(0, 1)]);
        let bot = spawn(&f, spec(0, 100, None, Movement::Wander));
        assert_eq!(bot.occupied(), vec![0]);
        wait_alive(&bot).await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(bot.occupied(), vec![0, 1]);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(bot.occupied(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn when_ttl_is_beyond_the_clock_then_the_bot_stays_alive() {
        let f = fixture(&[0.0], &[]);
        let bot = spawn(&f, spec(0, 100, Some(Duration::MAX), Movement::Static));
        wait_alive(&bot).await;

        bot.set_ttl(Duration::MAX);
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(bot.status(), BotStatus::Alive);
    }

    #[tokio::test(start_paused = true)]
    async fn when_waypoint_has_no_neighbours_then_wander_stops_silently() {
        let f = fixture(&[0.0], &[]);
        let bot = spawn(&f, spec(0, 100, None, Movement::Wander));
        wait_alive(&bot).await;

        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(bot.status(), BotStatus::Alive);
        assert_eq!(bot.waypoint(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn when_bot_starts_at_the_node_nearest_the_target_then_it_arrives_without_a_hop() {
        let mut f = fixture(&[0.0, 5.0], &[(1, 0)]);
        let routing = Arc::new(RoutingTable::compute(&read(&f.graph)));
        let (_target_tx, target) = watch::channel(Pose::at(Vec3::new(0.2, 0.0, 0.0)));
        let bot = spawn(&f, spec(0, 100, None, Movement::Chase { target, routing }));

        let event = f.events.recv().await.expect("reach event");

        assert_eq!(event.outcome, Outcome::Reached);
        assert_eq!(bot.status(), BotStatus::Reached);
        assert!(
            !f.stage
                .calls()
                .iter()
                .any(|call| matches!(call, StageCall::AnimateTo { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn when_target_is_two_hops_away_then_bot_walks_the_route_and_arrives() {
        let mut f = fixture(&[0.0, 2.0, 4.0], &[(2, 1), (1, 0)]);
        let routing = Arc::new(RoutingTable::compute(&read(&f.graph)));
        let (_target_tx, target) = watch::channel(Pose::at(Vec3::ZERO));
        let bot = spawn(&f, spec(2, 100, None, Movement::Chase { target, routing }));

        let event = f.events.recv().await.expect("reach event");

        assert_eq!(event.outcome, Outcome::Reached);
        assert_eq!(bot.waypoint(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn when_no_route_leads_to_the_target_then_chase_stops_and_bot_stays_alive() {
        let f = fixture(&[0.0, 5.0], &[]);
        let routing = Arc::new(RoutingTable::compute(&read(&f.graph)));
        let (_target_tx, target) = watch::channel(Pose::at(Vec3::ZERO));
        let bot = spawn(&f, spec(1, 100, None, Movement::Chase { target, routing }));
        wait_alive(&bot).await;

        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(bot.status(), BotStatus::Alive);
        assert_eq!(bot.waypoint(), 1);
    }
}
