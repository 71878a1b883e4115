//! Combatant loadouts: resolver contract plus the built-in catalog

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction a top is launched spinning in. Affects the rotation sign and
/// the traversal sense of the loop rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinDirection {
    #[default]
    Right,
    Left,
}

impl SpinDirection {
    /// Angular sign: left-spinning tops advance counterclockwise
    pub fn sign(self) -> f32 {
        match self {
            SpinDirection::Right => -1.0,
            SpinDirection::Left => 1.0,
        }
    }
}

/// Built-in top archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopArchetype {
    Attack,
    Defense,
    Stamina,
    Balance,
}

/// Static per-top stats resolved at match start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopStats {
    pub max_spin: f32,
    pub mass: f32,
    pub radius: f32,
    /// Top speed that free-movement steering eases toward
    pub move_speed: f32,
    pub spin_direction: SpinDirection,
}

impl TopStats {
    /// Stat table for the built-in archetypes
    pub fn for_archetype(archetype: TopArchetype) -> Self {
        match archetype {
            TopArchetype::Attack => Self {
                max_spin: 90.0,
                mass: 1.1,
                radius: 14.0,
                move_speed: 320.0,
                spin_direction: SpinDirection::Right,
            },
            TopArchetype::Defense => Self {
                max_spin: 110.0,
                mass: 1.6,
                radius: 16.0,
                move_speed: 240.0,
                spin_direction: SpinDirection::Right,
            },
            TopArchetype::Stamina => Self {
                max_spin: 130.0,
                mass: 1.2,
                radius: 13.0,
                move_speed: 260.0,
                spin_direction: SpinDirection::Left,
            },
            TopArchetype::Balance => Self {
                max_spin: 100.0,
                mass: 1.3,
                radius: 14.0,
                move_speed: 280.0,
                spin_direction: SpinDirection::Right,
            },
        }
    }
}

/// Fully-resolved loadout used to construct a combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantLoadout {
    pub loadout_id: String,
    pub display_name: String,
    pub stats: TopStats,
}

/// Loadout fetch failure
#[derive(Debug, Error)]
pub enum LoadoutError {
    #[error("unknown loadout id: {0}")]
    UnknownLoadout(String),
    #[error("loadout fetch failed: {0}")]
    FetchFailed(String),
}

/// Opaque loadout data-fetch contract; transport lives with the embedder
pub trait LoadoutResolver {
    fn resolve(&self, id: &str) -> Result<CombatantLoadout, LoadoutError>;
}

/// Resolver over the built-in archetype catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogResolver;

impl CatalogResolver {
    fn archetype_for(id: &str) -> Option<TopArchetype> {
        match id {
            "attack" => Some(TopArchetype::Attack),
            "defense" => Some(TopArchetype::Defense),
            "stamina" => Some(TopArchetype::Stamina),
            "balance" => Some(TopArchetype::Balance),
            _ => None,
        }
    }

    fn display_name(archetype: TopArchetype) -> &'static str {
        match archetype {
            TopArchetype::Attack => "Crimson Fang",
            TopArchetype::Defense => "Iron Aegis",
            TopArchetype::Stamina => "Gale Runner",
            TopArchetype::Balance => "Gyro Sentinel",
        }
    }
}

impl LoadoutResolver for CatalogResolver {
    fn resolve(&self, id: &str) -> Result<CombatantLoadout, LoadoutError> {
        let archetype = Self::archetype_for(id)
            .ok_or_else(|| LoadoutError::UnknownLoadout(id.to_string()))?;
        Ok(CombatantLoadout {
            loadout_id: id.to_string(),
            display_name: Self::display_name(archetype).to_string(),
            stats: TopStats::for_archetype(archetype),
        })
    }
}
