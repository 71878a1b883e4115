//! Match state and the frame-driven tick loop

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::game::abilities::{AbilitySystem, BoundaryOutcome, DodgeSide, OpponentView};
use crate::game::ai::AiController;
use crate::game::arena::{Arena, ArenaConfig, ArenaError};
use crate::game::cinematic::{
    BasicDirector, CinematicDirector, CinematicKind, CinematicStatus, BANNER_DURATION,
};
use crate::game::collision::{CollisionOrchestrator, CollisionReport};
use crate::game::combatant::{Combatant, CombatantTally, ControlState};
use crate::game::events::{AbilityKind, MatchEvent};
use crate::game::input::{InputAggregator, InputIntent};
use crate::game::lifecycle::{
    MatchLifecycleController, TimerKind, COUNTDOWN_START, COUNTDOWN_STEP, MATCH_START_DELAY,
};
use crate::game::loadout::{CatalogResolver, CombatantLoadout, LoadoutError, LoadoutResolver};
use crate::game::physics::{
    CollisionModel, DefaultCollisionModel, DefaultIntegrator, Integrator,
};
use crate::game::power::PowerSystem;
use crate::game::snapshot::{MatchSnapshot, SnapshotBuilder};
use crate::game::PlayerSlot;
use crate::sync::protocol::PeerMsg;
use crate::sync::{Reconciler, RemoteHandle};
use crate::util::time::clamp_frame_delta;

/// Spawn distance from arena center along the x axis
const SPAWN_OFFSET: f32 = 60.0;
/// Outbound state sync every N ticks (20 Hz at a 60 Hz frame rate)
const OUTBOUND_SNAPSHOT_EVERY: u32 = 3;

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Created but not started
    Waiting,
    /// Countdown before play
    Countdown,
    /// Play in progress
    InProgress,
    /// Decided (winner or double KO)
    Ended,
}

/// Who simulates each slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Slot one is the human, slot two is the built-in opponent
    SinglePlayer,
    /// Both slots are humans; only `local_slot` is simulated here
    Online { local_slot: PlayerSlot },
}

/// Everything needed to create a match
#[derive(Debug, Clone)]
pub struct MatchSetup {
    pub seed: u64,
    /// `None` uses the default arena. An explicitly requested config must
    /// validate; there is no silent fallback for a bad request.
    pub arena: Option<ArenaConfig>,
    pub player_one: String,
    pub player_two: String,
    pub mode: MatchMode,
}

/// Why a match could not be created
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("loadout unavailable: {0}")]
    Loadout(#[from] LoadoutError),
    #[error("invalid arena: {0}")]
    Arena(#[from] ArenaError),
}

/// Authoritative simulation state, mutated by exactly one writer per tick
pub struct MatchState {
    pub id: Uuid,
    pub seed: u64,
    pub arena: Arena,
    pub combatants: Vec<Combatant>,
    pub is_playing: bool,
    pub countdown_active: bool,
    pub countdown_value: u8,
    /// Match clock in seconds; advances during the countdown too
    pub elapsed: f32,
    pub winner: Option<PlayerSlot>,
    /// Transient cinematic announcement, auto-hidden by a deferred timer
    pub banner: Option<CinematicKind>,
    pub concluded: bool,
    pub tick: u64,
    pub rng: ChaCha8Rng,
}

impl MatchState {
    pub fn new(seed: u64, arena: Arena, combatants: Vec<Combatant>) -> Self {
        Self {
            id: Uuid::new_v4(),
            seed,
            arena,
            combatants,
            is_playing: false,
            countdown_active: false,
            countdown_value: COUNTDOWN_START,
            elapsed: 0.0,
            winner: None,
            banner: None,
            concluded: false,
            tick: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn phase(&self) -> MatchPhase {
        if self.concluded {
            MatchPhase::Ended
        } else if self.countdown_active {
            MatchPhase::Countdown
        } else if self.is_playing {
            MatchPhase::InProgress
        } else {
            MatchPhase::Waiting
        }
    }

    /// Neither dead nor out of bounds
    pub fn active_count(&self) -> usize {
        self.combatants.iter().filter(|c| c.is_active()).count()
    }
}

/// End-of-match report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub seed: u64,
    pub duration_secs: f32,
    pub ticks: u64,
    pub winner: Option<PlayerSlot>,
    pub combatants: Vec<CombatantSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantSummary {
    pub name: String,
    pub loadout_id: String,
    pub survived: bool,
    pub spin_remaining: f32,
    #[serde(flatten)]
    pub tally: CombatantTally,
}

/// The battle engine. Driven by the embedder's frame callback: call
/// [`BattleMatch::start`] once and [`BattleMatch::frame`] with a monotonic
/// seconds clock every render frame. A tick is fully synchronous; consumers
/// read the returned snapshot between frames.
pub struct BattleMatch {
    state: MatchState,
    mode: MatchMode,
    loadouts: [CombatantLoadout; 2],
    input: InputAggregator,
    lifecycle: MatchLifecycleController,
    director: Box<dyn CinematicDirector>,
    integrator: Box<dyn Integrator>,
    collision_model: Box<dyn CollisionModel>,
    reconciler: Option<Reconciler>,
    outbound: Vec<PeerMsg>,
    outbound_cadence: SnapshotBuilder,
    events: Vec<MatchEvent>,
    running: bool,
    last_frame: Option<f64>,
    on_match_end: Option<Box<dyn FnMut(Option<PlayerSlot>)>>,
    on_collision: Option<Box<dyn FnMut(&CollisionReport)>>,
}

impl BattleMatch {
    pub fn new(setup: MatchSetup, resolver: &dyn LoadoutResolver) -> Result<Self, SetupError> {
        let arena = match &setup.arena {
            Some(config) => Arena::from_config(config)?,
            None => Arena::default(),
        };
        let loadouts = [
            resolver.resolve(&setup.player_one)?,
            resolver.resolve(&setup.player_two)?,
        ];
        let combatants = Self::spawn_combatants(&loadouts, setup.mode, &arena);
        let reconciler = match setup.mode {
            MatchMode::Online { local_slot } => Some(Reconciler::new(local_slot)),
            MatchMode::SinglePlayer => None,
        };
        let state = MatchState::new(setup.seed, arena, combatants);
        info!(
            match_id = %state.id,
            seed = setup.seed,
            mode = ?setup.mode,
            "match created"
        );

        Ok(Self {
            state,
            mode: setup.mode,
            loadouts,
            input: InputAggregator::new(),
            lifecycle: MatchLifecycleController::new(),
            director: Box::new(BasicDirector::default()),
            integrator: Box::new(DefaultIntegrator),
            collision_model: Box::new(DefaultCollisionModel),
            reconciler,
            outbound: Vec::new(),
            outbound_cadence: SnapshotBuilder::new(OUTBOUND_SNAPSHOT_EVERY),
            events: Vec::new(),
            running: false,
            last_frame: None,
            on_match_end: None,
            on_collision: None,
        })
    }

    /// `new` against the built-in loadout catalog
    pub fn with_catalog(setup: MatchSetup) -> Result<Self, SetupError> {
        Self::new(setup, &CatalogResolver)
    }

    /// Swap in a different scripted-move collaborator
    pub fn with_director(mut self, director: Box<dyn CinematicDirector>) -> Self {
        self.director = director;
        self
    }

    /// Swap in a different integration collaborator
    pub fn with_integrator(mut self, integrator: Box<dyn Integrator>) -> Self {
        self.integrator = integrator;
        self
    }

    /// Swap in a different contact collaborator
    pub fn with_collision_model(mut self, model: Box<dyn CollisionModel>) -> Self {
        self.collision_model = model;
        self
    }

    pub fn on_match_end(&mut self, callback: impl FnMut(Option<PlayerSlot>) + 'static) {
        self.on_match_end = Some(Box::new(callback));
    }

    pub fn on_collision(&mut self, callback: impl FnMut(&CollisionReport) + 'static) {
        self.on_collision = Some(Box::new(callback));
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Platform input events land here
    pub fn input_mut(&mut self) -> &mut InputAggregator {
        &mut self.input
    }

    /// Inbox for the peer transport, online mode only
    pub fn remote_handle(&self) -> Option<RemoteHandle> {
        self.reconciler.as_ref().map(|r| r.handle())
    }

    /// Drain messages queued for the peer
    pub fn take_outbound(&mut self) -> Vec<PeerMsg> {
        std::mem::take(&mut self.outbound)
    }

    /// Begin the countdown. `now` is the embedder's monotonic clock in
    /// seconds; every subsequent `frame` call must use the same clock.
    pub fn start(&mut self, now: f64) {
        self.lifecycle.reset();
        self.running = true;
        self.last_frame = Some(now);
        self.state.countdown_active = true;
        self.state.countdown_value = COUNTDOWN_START;
        self.state.is_playing = false;
        self.events.push(MatchEvent::CountdownTick {
            value: COUNTDOWN_START,
        });
        self.lifecycle
            .schedule(TimerKind::CountdownAdvance, now + COUNTDOWN_STEP);
        if let Some(reconciler) = &self.reconciler {
            let slot = reconciler.local_slot();
            if let Some(c) = self.state.combatants.get(slot.index()) {
                self.outbound.push(PeerMsg::Hello {
                    player: slot.index() as u8 + 1,
                    display_name: c.name.clone(),
                    loadout_id: c.loadout_id.clone(),
                });
            }
        }
        info!(match_id = %self.state.id, "countdown started");
    }

    /// Fresh match with the same setup. Timers left over from the previous
    /// run are invalidated by the lifecycle generation bump.
    pub fn restart(&mut self, now: f64) {
        self.director.cancel();
        self.input = InputAggregator::new();
        self.outbound.clear();
        self.events.clear();

        let state = &mut self.state;
        state.combatants = Self::spawn_combatants(&self.loadouts, self.mode, &state.arena);
        state.elapsed = 0.0;
        state.tick = 0;
        state.winner = None;
        state.banner = None;
        state.concluded = false;
        state.rng = ChaCha8Rng::seed_from_u64(state.seed);
        info!(match_id = %state.id, "match restarted");

        self.start(now);
    }

    /// Stop rescheduling. Safe to call any number of times; no tick runs
    /// after this returns and pending timers are invalidated.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.director.cancel();
        self.lifecycle.reset();
        if self.reconciler.is_some() {
            self.outbound.push(PeerMsg::Bye);
        }
        info!(match_id = %self.state.id, "match loop stopped");
    }

    /// One render-frame callback. Returns the committed snapshot, or `None`
    /// once the loop has stopped.
    pub fn frame(&mut self, now: f64) -> Option<MatchSnapshot> {
        if !self.running {
            return None;
        }
        let last = self.last_frame.unwrap_or(now);
        let dt = clamp_frame_delta(last, now);
        self.last_frame = Some(now);

        self.tick(now, dt);

        let events = std::mem::take(&mut self.events);
        Some(MatchSnapshot::capture(&self.state, events))
    }

    /// Capture the current state for rendering without advancing the loop.
    /// Event delivery stays with [`BattleMatch::frame`]; this view carries none.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::capture(&self.state, Vec::new())
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            match_id: self.state.id,
            seed: self.state.seed,
            duration_secs: self.state.elapsed,
            ticks: self.state.tick,
            winner: self.state.winner,
            combatants: self
                .state
                .combatants
                .iter()
                .map(|c| CombatantSummary {
                    name: c.name.clone(),
                    loadout_id: c.loadout_id.clone(),
                    survived: c.is_active(),
                    spin_remaining: c.spin,
                    tally: c.tally,
                })
                .collect(),
        }
    }

    fn spawn_combatants(
        loadouts: &[CombatantLoadout; 2],
        mode: MatchMode,
        arena: &Arena,
    ) -> Vec<Combatant> {
        let local = match mode {
            MatchMode::SinglePlayer => PlayerSlot::One,
            MatchMode::Online { local_slot } => local_slot,
        };
        vec![
            Combatant::new(
                &loadouts[0],
                arena.center + Vec2::new(-SPAWN_OFFSET, 0.0),
                local == PlayerSlot::One,
            ),
            Combatant::new(
                &loadouts[1],
                arena.center + Vec2::new(SPAWN_OFFSET, 0.0),
                local == PlayerSlot::Two,
            ),
        ]
    }

    fn human_slot(&self) -> PlayerSlot {
        match self.mode {
            MatchMode::SinglePlayer => PlayerSlot::One,
            MatchMode::Online { local_slot } => local_slot,
        }
    }

    fn is_remote_index(&self, index: usize) -> bool {
        match self.mode {
            MatchMode::SinglePlayer => false,
            MatchMode::Online { local_slot } => index != local_slot.index(),
        }
    }

    fn tick(&mut self, now: f64, dt: f32) {
        self.state.tick += 1;

        for kind in self.lifecycle.poll(now) {
            self.apply_timer(kind, now);
        }

        if self.state.countdown_active {
            // velocities stay frozen; only the clock runs
            self.state.elapsed += dt;
            self.input.discard_triggers();
            return;
        }
        if !self.state.is_playing {
            return;
        }

        self.state.elapsed += dt;
        let elapsed = self.state.elapsed;

        let alive_before: Vec<bool> = self.state.combatants.iter().map(|c| c.is_active()).collect();

        let human = self.human_slot();
        let origin = self
            .state
            .combatants
            .get(human.index())
            .map(|c| c.position)
            .unwrap_or(Vec2::ZERO);
        let intent = self.input.take_intent(origin);

        // an active script suspends both sides' control input; a remote
        // peer's script shows up here through its synced control state
        let cinematic_actor = self.director.actor();
        let suspended = cinematic_actor.is_some()
            || self
                .state
                .combatants
                .iter()
                .any(|c| matches!(c.control, ControlState::Cinematic { .. }));
        if !suspended {
            self.drive_human(human, intent, elapsed, dt, now);
            if self.mode == MatchMode::SinglePlayer {
                self.drive_ai(PlayerSlot::Two, elapsed, dt);
            }
        }

        let status =
            self.director
                .advance(&mut self.state.combatants, &self.state.arena, elapsed, dt);
        if status == CinematicStatus::Finished {
            if let Some(slot) = cinematic_actor {
                if let Some(actor) = self.state.combatants.get_mut(slot.index()) {
                    AbilitySystem::finish_cinematic(actor, elapsed);
                }
            }
        }

        // physics, power, and background rules for locally-simulated slots
        for index in 0..self.state.combatants.len() {
            if self.is_remote_index(index) {
                continue;
            }
            let c = &mut self.state.combatants[index];
            self.integrator.integrate(c, dt, &self.state.arena);
            PowerSystem::regen(c, dt);
            c.apply_background(dt, elapsed);
        }

        // outer boundary: bounce or exit
        for index in 0..self.state.combatants.len() {
            if self.is_remote_index(index) {
                continue;
            }
            let Some(slot) = PlayerSlot::from_index(index) else {
                continue;
            };
            let c = &mut self.state.combatants[index];
            if let Some(BoundaryOutcome::Bounced { spin_cost }) =
                AbilitySystem::resolve_boundary(c, &self.state.arena, &mut self.state.rng)
            {
                self.events.push(MatchEvent::WallBounce { slot, spin_cost });
            }
        }

        // contacts resolve locally on both sides for responsiveness
        CollisionOrchestrator::run(
            &mut self.state.combatants,
            self.collision_model.as_ref(),
            self.on_collision.as_deref_mut(),
            &mut self.events,
        );

        // network merge runs last so fresh remote data survives the tick
        if let Some(reconciler) = self.reconciler.as_mut() {
            reconciler.apply_inbound(&mut self.state.combatants, elapsed);
            self.outbound.push(reconciler.extract_local_input(&intent));
            if self.outbound_cadence.should_send() {
                if let Some(msg) = reconciler.extract_local_state(&self.state.combatants) {
                    self.outbound.push(msg);
                }
            }
        }

        for (index, was_alive) in alive_before.iter().enumerate() {
            let c = &self.state.combatants[index];
            if *was_alive && !c.is_active() {
                if let Some(slot) = PlayerSlot::from_index(index) {
                    self.events.push(MatchEvent::Eliminated {
                        slot,
                        rang_out: c.is_out_of_bounds,
                    });
                }
            }
        }

        if let Some(winner) = self.lifecycle.resolve_end(&self.state.combatants) {
            self.conclude(winner);
        }
    }

    fn apply_timer(&mut self, kind: TimerKind, now: f64) {
        match kind {
            TimerKind::CountdownAdvance => {
                if !self.state.countdown_active {
                    return;
                }
                self.state.countdown_value = self.state.countdown_value.saturating_sub(1);
                self.events.push(MatchEvent::CountdownTick {
                    value: self.state.countdown_value,
                });
                if self.state.countdown_value == 0 {
                    self.lifecycle
                        .schedule(TimerKind::MatchStart, now + MATCH_START_DELAY);
                } else {
                    self.lifecycle
                        .schedule(TimerKind::CountdownAdvance, now + COUNTDOWN_STEP);
                }
            }
            TimerKind::MatchStart => {
                self.state.countdown_active = false;
                self.state.is_playing = true;
                self.events.push(MatchEvent::MatchStarted);
                info!(match_id = %self.state.id, "play started");
            }
            TimerKind::BannerHide => {
                if self.state.banner.take().is_some() {
                    self.events.push(MatchEvent::BannerCleared);
                }
            }
        }
    }

    fn drive_human(
        &mut self,
        slot: PlayerSlot,
        intent: InputIntent,
        elapsed: f32,
        dt: f32,
        now: f64,
    ) {
        // a missing combatant is a no-op for this tick
        let Some(opponent) = self
            .state
            .combatants
            .get(slot.other().index())
            .map(OpponentView::of)
        else {
            return;
        };
        let Some(c) = self.state.combatants.get_mut(slot.index()) else {
            return;
        };
        if c.is_dead {
            return;
        }

        let triggers = intent.triggers;
        if triggers.dodge_left && AbilitySystem::try_dodge(c, DodgeSide::Left, elapsed) {
            self.events.push(MatchEvent::AbilityActivated {
                slot,
                ability: AbilityKind::DodgeLeft,
            });
        }
        if triggers.dodge_right && AbilitySystem::try_dodge(c, DodgeSide::Right, elapsed) {
            self.events.push(MatchEvent::AbilityActivated {
                slot,
                ability: AbilityKind::DodgeRight,
            });
        }
        if triggers.heavy_attack
            && AbilitySystem::try_heavy_attack(c, intent.direction, &opponent, elapsed)
        {
            self.events.push(MatchEvent::AbilityActivated {
                slot,
                ability: AbilityKind::HeavyAttack,
            });
        }
        if triggers.cinematic_move {
            if let Some(kind) =
                AbilitySystem::try_cinematic(c, &opponent, elapsed, &mut self.state.rng)
            {
                self.events.push(MatchEvent::AbilityActivated {
                    slot,
                    ability: AbilityKind::CinematicMove,
                });
                self.events.push(MatchEvent::CinematicStarted { slot, kind });
                self.state.banner = Some(kind);
                self.director.begin(kind, slot, elapsed);
                self.lifecycle
                    .schedule(TimerKind::BannerHide, now + BANNER_DURATION as f64);
                self.outbound_cadence.force_next();
            }
        }

        let c = &mut self.state.combatants[slot.index()];
        if !c.control.owns_control() {
            AbilitySystem::steer_free(c, intent.direction, dt);
            if let Some(kind) = AbilitySystem::maybe_enter_loop(
                c,
                &self.state.arena,
                true,
                elapsed,
                &mut self.state.rng,
            ) {
                self.events.push(MatchEvent::LoopEntered { slot, kind });
            }
        }

        AbilitySystem::advance(
            c,
            slot,
            &self.state.arena,
            intent.direction,
            true,
            elapsed,
            dt,
            &mut self.state.rng,
            &mut self.events,
        );
    }

    fn drive_ai(&mut self, slot: PlayerSlot, elapsed: f32, dt: f32) {
        let Some(opponent) = self
            .state
            .combatants
            .get(slot.other().index())
            .map(OpponentView::of)
        else {
            return;
        };
        let Some(c) = self.state.combatants.get_mut(slot.index()) else {
            return;
        };
        if c.is_dead {
            return;
        }

        if let Some(ability) = AiController::act(c, &opponent, elapsed, dt, &mut self.state.rng) {
            debug!(?ability, "opponent ability");
            self.events.push(MatchEvent::AbilityActivated { slot, ability });
        }

        if !c.control.owns_control() {
            if let Some(kind) = AbilitySystem::maybe_enter_loop(
                c,
                &self.state.arena,
                false,
                elapsed,
                &mut self.state.rng,
            ) {
                self.events.push(MatchEvent::LoopEntered { slot, kind });
                if let Some(point) = c.charge_point() {
                    self.events.push(MatchEvent::ChargePointAssigned {
                        slot,
                        angle_deg: point.to_degrees(),
                        auto: true,
                    });
                }
            }
        }

        AbilitySystem::advance(
            c,
            slot,
            &self.state.arena,
            Vec2::ZERO,
            false,
            elapsed,
            dt,
            &mut self.state.rng,
            &mut self.events,
        );
    }

    fn conclude(&mut self, winner: Option<PlayerSlot>) {
        self.state.winner = winner;
        self.state.is_playing = false;
        self.state.concluded = true;
        self.running = false;
        self.events.push(MatchEvent::MatchEnded { winner });
        if let Some(callback) = self.on_match_end.as_mut() {
            callback(winner);
        }
        info!(
            match_id = %self.state.id,
            ?winner,
            elapsed = self.state.elapsed,
            ticks = self.state.tick,
            "match ended"
        );
    }
}
