//! Config Store
//!
//! Source of the game configuration snapshots frozen into each session.

use crate::errors::{WagerError, WagerResult};
use crate::games::settings::{CasinoSettings, GameConfiguration, Variant};
use crate::games::types::GameKind;
use async_trait::async_trait;
use std::sync::RwLock;
use tracing::info;

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Current configuration of one game variant
    async fn get_config(&self, kind: GameKind, variant: &Variant) -> WagerResult<GameConfiguration>;

    /// Full admin settings
    async fn settings(&self) -> WagerResult<CasinoSettings>;

    /// Replace the settings. Sessions already started keep their snapshot.
    async fn update_settings(&self, settings: CasinoSettings) -> WagerResult<()>;
}

/// Settings held in process memory
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    settings: RwLock<CasinoSettings>,
}

impl MemoryConfigStore {
    pub fn new(settings: CasinoSettings) -> WagerResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings: RwLock::new(settings),
        })
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get_config(&self, kind: GameKind, variant: &Variant) -> WagerResult<GameConfiguration> {
        let settings = self
            .settings
            .read()
            .map_err(|_| WagerError::ConfigurationUnavailable("settings lock poisoned".into()))?;
        settings.resolve(kind, variant)
    }

    async fn settings(&self) -> WagerResult<CasinoSettings> {
        self.settings
            .read()
            .map(|s| s.clone())
            .map_err(|_| WagerError::ConfigurationUnavailable("settings lock poisoned".into()))
    }

    async fn update_settings(&self, settings: CasinoSettings) -> WagerResult<()> {
        settings.validate()?;
        let mut current = self
            .settings
            .write()
            .map_err(|_| WagerError::ConfigurationUnavailable("settings lock poisoned".into()))?;
        *current = settings;
        info!("casino settings updated");
        Ok(())
    }
}
