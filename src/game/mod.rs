//! Battle simulation modules

pub mod abilities;
pub mod ai;
pub mod arena;
pub mod cinematic;
pub mod collision;
pub mod combatant;
pub mod events;
pub mod input;
pub mod lifecycle;
pub mod loadout;
pub mod r#match;
pub mod physics;
pub mod power;
pub mod snapshot;

pub use r#match::{
    BattleMatch, MatchMode, MatchPhase, MatchSetup, MatchState, MatchSummary, SetupError,
};

use serde::{Deserialize, Serialize};

/// Which of the two combatant slots a value refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    pub fn other(self) -> PlayerSlot {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }

    pub fn from_index(index: usize) -> Option<PlayerSlot> {
        match index {
            0 => Some(PlayerSlot::One),
            1 => Some(PlayerSlot::Two),
            _ => None,
        }
    }
}
