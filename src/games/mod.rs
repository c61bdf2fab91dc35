//! Game Engines
//!
//! Shared odds calculator and outcome generator, plus the per-game
//! configuration shapes and step semantics.

pub mod dragon_tower;
pub mod lucky_draw;
pub mod mines;
pub mod odds;
pub mod plinko;
pub mod rng;
pub mod roulette;
pub mod settings;
pub mod shuffle;
pub mod slots;
pub mod spin;
pub mod types;

pub use rng::GameRng;
pub use settings::{BetLimits, CasinoSettings, GameConfiguration, Variant, MAX_STAKE};
pub use types::*;
