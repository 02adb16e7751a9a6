use crate::domain::{Amount, SeasonCode};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub season_code: SeasonCode,
    pub seed_path: Option<PathBuf>,
    pub draw_seed: Option<u64>,
    pub amount_step: Amount,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let season_code = env_map
            .get("SEASON_CODE")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(SeasonCode::new)
            .ok_or_else(|| ConfigError::MissingEnv("SEASON_CODE".to_string()))?;

        let seed_path = env_map
            .get("SEED_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let draw_seed = env_map
            .get("DRAW_SEED")
            .map(|s| {
                s.parse::<u64>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "DRAW_SEED".to_string(),
                        "must be a valid u64".to_string(),
                    )
                })
            })
            .transpose()?;

        let amount_step = env_map
            .get("AMOUNT_STEP")
            .map(|s| s.as_str())
            .unwrap_or("0.25")
            .parse::<Amount>()
            .ok()
            .filter(|a| !a.is_zero() && !a.is_negative())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "AMOUNT_STEP".to_string(),
                    "must be a positive decimal".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_path,
            season_code,
            seed_path,
            draw_seed,
            amount_step,
        })
    }
}
