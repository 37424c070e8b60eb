//! Game tunables
//!
//! Every key is optional; a missing file section or key falls back to the
//! classic rules (26 players, 250 nuggets in 10 to 30 piles).

use log::warn;
use serde::Deserialize;
use shared::MAX_PLAYER_IDS;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Players allowed to join over the life of the game
    pub max_players: usize,
    pub max_name_length: usize,
    pub gold_total: u32,
    pub gold_min_piles: usize,
    pub gold_max_piles: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYER_IDS,
            max_name_length: 50,
            gold_total: 250,
            gold_min_piles: 10,
            gold_max_piles: 30,
        }
    }
}

impl GameConfig {
    /// Parses a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text)?;
        Ok(config.validated())
    }

    /// Reads a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Clamps values that the rules cannot honour.
    pub fn validated(mut self) -> Self {
        if self.max_players == 0 || self.max_players > MAX_PLAYER_IDS {
            warn!(
                "max_players must be 1-{}, using {}",
                MAX_PLAYER_IDS, MAX_PLAYER_IDS
            );
            self.max_players = MAX_PLAYER_IDS;
        }
        if self.gold_min_piles == 0 {
            warn!("gold_min_piles must be at least 1");
            self.gold_min_piles = 1;
        }
        if self.gold_max_piles < self.gold_min_piles {
            warn!(
                "gold_max_piles {} is below gold_min_piles, using {}",
                self.gold_max_piles, self.gold_min_piles
            );
            self.gold_max_piles = self.gold_min_piles;
        }
        self
    }
}
