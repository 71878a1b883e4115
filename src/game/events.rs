//! Domain events emitted during a tick, consumed by UI layers and the
//! headless runner's event log

use serde::{Deserialize, Serialize};

use crate::game::cinematic::CinematicKind;
use crate::game::PlayerSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    DodgeLeft,
    DodgeRight,
    HeavyAttack,
    UltimateAttack,
    CinematicMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    Normal,
    Blue,
}

/// One discrete thing that happened inside a tick. The engine appends these
/// in occurrence order; consumers drain them after each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    CountdownTick { value: u8 },
    MatchStarted,
    AbilityActivated { slot: PlayerSlot, ability: AbilityKind },
    LoopEntered { slot: PlayerSlot, kind: LoopKind },
    ChargePointAssigned { slot: PlayerSlot, angle_deg: f32, auto: bool },
    CinematicStarted { slot: PlayerSlot, kind: CinematicKind },
    BannerCleared,
    WallBounce { slot: PlayerSlot, spin_cost: f32 },
    Collision { force: f32 },
    Eliminated { slot: PlayerSlot, rang_out: bool },
    MatchEnded { winner: Option<PlayerSlot> },
}
