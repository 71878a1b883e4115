//! Client-side battle simulation core for a two-player spinning-top arena
//! game.
//!
//! The embedder owns the render loop: construct a [`game::BattleMatch`],
//! call [`game::BattleMatch::start`] once, then feed every render frame to
//! [`game::BattleMatch::frame`] with a monotonic seconds clock. Each call
//! advances the simulation exactly one tick and returns a committed
//! [`game::snapshot::MatchSnapshot`] to draw from. Platform input events
//! land in [`game::input::InputAggregator`] between frames; online play
//! exchanges [`sync::protocol::PeerMsg`] values over a transport the
//! embedder provides.

pub mod config;
pub mod game;
pub mod sync;
pub mod util;
