//! Server configuration from environment variables
//!
//! - `MODEL_PATH`            tree-ensemble artifact (default `model/yield_model.json`)
//! - `CANDIDATE_ITEMS_PATH`  candidate vocabulary (default `inputs/candidate_items.json`)
//! - `PORT`                  listen port (default 8000)
//! - `INFERENCE_TIMEOUT_MS`  per-request inference deadline (default 10000)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL_PATH: &str = "model/yield_model.json";
pub const DEFAULT_CANDIDATE_ITEMS_PATH: &str = "inputs/candidate_items.json";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_INFERENCE_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub model_path: PathBuf,
    pub candidate_items_path: PathBuf,
    pub port: u16,
    pub inference_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            candidate_items_path: PathBuf::from(DEFAULT_CANDIDATE_ITEMS_PATH),
            port: DEFAULT_PORT,
            inference_timeout: Duration::from_millis(DEFAULT_INFERENCE_TIMEOUT_MS),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment, test map, ...)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let model_path = lookup("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let candidate_items_path = lookup("CANDIDATE_ITEMS_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.candidate_items_path);

        let port = parse_or_default(&lookup, "PORT", DEFAULT_PORT);
        let timeout_ms =
            parse_or_default(&lookup, "INFERENCE_TIMEOUT_MS", DEFAULT_INFERENCE_TIMEOUT_MS);

        Self {
            model_path,
            candidate_items_path,
            port,
            inference_timeout: Duration::from_millis(timeout_ms),
        }
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}='{}', using default {}", key, raw, default);
            default
        }),
    }
}
