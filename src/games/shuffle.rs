//! 3-Cup Shuffle
//!
//! Two-phase commit/reveal: starting a round fixes the winning cup and
//! publishes only a SHA-256 commitment over `salt:cup`. The reveal step takes
//! the player's pick, settles the round and discloses cup and salt so the
//! commitment can be checked.

use super::odds;
use super::rng::GameRng;
use super::settings::BetLimits;
use super::types::StepResult;
use crate::errors::{WagerError, WagerResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleSettings {
    pub limits: BetLimits,
    pub cups: u8,
    pub multiplier: f64,
}

impl Default for ShuffleSettings {
    fn default() -> Self {
        Self {
            limits: BetLimits::with_min(1_000),
            cups: 3,
            multiplier: 2.90,
        }
    }
}

impl ShuffleSettings {
    pub fn validate(&self) -> WagerResult<()> {
        self.limits.validate("shuffle")?;
        if self.cups < 2 {
            return Err(WagerError::InvalidConfiguration(format!(
                "shuffle needs at least 2 cups, got {}",
                self.cups
            )));
        }
        if !(self.multiplier.is_finite() && self.multiplier > 1.0) {
            return Err(WagerError::InvalidConfiguration(format!(
                "shuffle multiplier must exceed 1.0, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }

    pub fn resolve(&self) -> ShuffleConfig {
        ShuffleConfig {
            limits: self.limits.clone(),
            cups: self.cups,
            multiplier: self.multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleConfig {
    pub limits: BetLimits,
    pub cups: u8,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleRound {
    pub config: ShuffleConfig,
    pub winning_cup: u8,
    pub salt: String,
    pub commitment: String,
    pub selected: Option<u8>,
}

impl ShuffleRound {
    pub fn deal(config: ShuffleConfig, rng: &mut GameRng) -> Self {
        let winning_cup = rng.next_below(u32::from(config.cups)) as u8;
        let salt = rng.salt_hex();
        let commitment = commitment_for(&salt, winning_cup);
        Self {
            config,
            winning_cup,
            salt,
            commitment,
            selected: None,
        }
    }

    pub fn pick(&mut self, cup: u32) -> WagerResult<StepResult> {
        if self.selected.is_some() {
            return Err(WagerError::InvalidSessionState("cup already revealed".into()));
        }
        let limit = u32::from(self.config.cups);
        if cup >= limit {
            return Err(WagerError::OutOfRange { position: cup, limit });
        }
        let cup = cup as u8;
        self.selected = Some(cup);

        let multiplier = odds::binary_multiplier(cup == self.winning_cup, self.config.multiplier);
        if multiplier > 0.0 {
            Ok(StepResult::Won { multiplier })
        } else {
            Ok(StepResult::Lost)
        }
    }

    pub fn view(&self, disclose: bool) -> ShuffleView {
        ShuffleView {
            cups: self.config.cups,
            multiplier: self.config.multiplier,
            commitment: self.commitment.clone(),
            selected: self.selected,
            winning_cup: disclose.then_some(self.winning_cup),
            salt: disclose.then(|| self.salt.clone()),
        }
    }
}

/// Hex SHA-256 of `salt:cup`
pub fn commitment_for(salt: &str, cup: u8) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(cup.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a disclosed cup and salt against the published commitment
pub fn verify_commitment(commitment: &str, salt: &str, cup: u8) -> bool {
    commitment_for(salt, cup) == commitment
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffleView {
    pub cups: u8,
    pub multiplier: f64,
    pub commitment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_cup: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}
