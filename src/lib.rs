//! Wager Engine - session state machine and payout calculator for casino games
//!
//! Mines, Dragon Tower, Plinko, Roulette, Spin, Slots, Shuffle and Lucky Draw
//! share one odds calculator, one outcome generator and one session lifecycle.
//! Money moves only through the ledger gateway's atomic unit of work.

pub mod api;
pub mod clock;
pub mod config;
pub mod config_store;
pub mod engine;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod metrics;
pub mod notifications;

pub use config::{AppConfig, ConfigLoader, EngineSettings, ServerConfig};
pub use config_store::{ConfigStore, MemoryConfigStore};
pub use engine::{EngineBuilder, WagerEngine};
pub use errors::{ConfigurationError, WagerError, WagerResult};
pub use ledger::{LedgerGateway, MemoryLedger, SessionStore};
pub use notifications::{Notification, NotificationSink};
