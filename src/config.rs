use std::time::Duration;

use thiserror::Error;

use crate::GridInt;

/// Settings fixed for the whole session. Every replacement game is built
/// from the same values.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub width: GridInt,
    pub height: GridInt,
    /// Simulation steps per second
    pub tick_rate: u32,
    pub wrap: bool,
    /// Edge length of one cell, in terminal rows
    pub tile_size: u16,
    pub seed: Option<u64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    NonPositiveSize { width: GridInt, height: GridInt },
    #[error("grid of {width}x{height} cells is too large")]
    TooLarge { width: GridInt, height: GridInt },
    #[error("tick rate must be at least 1 per second")]
    ZeroTickRate,
    #[error("tile size must be at least 1")]
    ZeroTileSize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig { width: 10, height: 10, tick_rate: 5, wrap: true, tile_size: 1, seed: None }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = (self.width, self.height);
        if width <= 0 || height <= 0 {
            return Err(ConfigError::NonPositiveSize { width, height });
        }
        if width.checked_mul(height).is_none() {
            return Err(ConfigError::TooLarge { width, height });
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.tile_size == 0 {
            return Err(ConfigError::ZeroTileSize);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_classic_board() {
        let config = GameConfig::default();
        assert_eq!((config.width, config.height), (10, 10));
        assert!(config.wrap);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_rates() {
        let config = GameConfig { tick_rate: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickRate));

        let config = GameConfig { tile_size: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTileSize));
    }

    #[test]
    fn rejects_bad_dimensions() {
        for &(width, height) in &[(-5, 10), (10, -5), (0, 10), (10, 0), (0, 0)] {
            let config = GameConfig { width, height, ..Default::default() };
            assert_eq!(config.validate(), Err(ConfigError::NonPositiveSize { width, height }));
        }

        let config = GameConfig { width: 100_000, height: 100_000, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::TooLarge { width: 100_000, height: 100_000 }));
    }

    #[test]
    fn tick_interval_follows_rate() {
        let config = GameConfig { tick_rate: 5, ..Default::default() };
        assert_eq!(config.tick_interval(), Duration::from_millis(200));

        let config = GameConfig { tick_rate: 8, ..Default::default() };
        assert_eq!(config.tick_interval(), Duration::from_millis(125));
    }
}
