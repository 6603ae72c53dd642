use std::path::{Path, PathBuf};
use std::{env, io, time::Duration};
use thiserror::Error;

use crate::domain::tuning::RangeTuning;
use crate::use_cases::GameModeKind;

// Runtime settings (not gameplay tuning; that lives in the toml file).

pub fn config_path() -> PathBuf {
    env::var("RANGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("range.toml"))
}

pub fn database_url() -> Option<String> {
    env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())
}

pub fn level_dir() -> PathBuf {
    env::var("LEVEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("levels"))
}

pub fn space_id() -> String {
    env::var("RANGE_SPACE_ID").unwrap_or_else(|_| "default".to_string())
}

pub fn session_id() -> String {
    env::var("RANGE_SESSION_ID").unwrap_or_else(|_| "default".to_string())
}

pub fn mode() -> Result<GameModeKind, ConfigError> {
    match env::var("RANGE_MODE") {
        Ok(value) => value.parse().map_err(ConfigError::UnknownMode),
        Err(_) => Ok(GameModeKind::TargetPractice),
    }
}

// Unset or 0 runs until Ctrl-C.
pub fn run_duration() -> Option<Duration> {
    env::var("RANGE_RUN_SECONDS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

pub fn seed() -> Option<u64> {
    env::var("RANGE_SEED").ok().and_then(|value| value.parse().ok())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0}")]
    UnknownMode(String),
}

/// Reads gameplay tuning from a toml file. A missing file yields the defaults.
pub fn load_tuning(path: &Path) -> Result<RangeTuning, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(RangeTuning::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    parse_tuning(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_tuning(text: &str) -> Result<RangeTuning, toml::de::Error> {
    toml::from_str(text)
}
