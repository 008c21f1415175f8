//! Runtime configuration, loaded from the environment.

use std::env;

/// Load a `.env` file if present (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// DPQ client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection string, e.g. `redis://127.0.0.1:6379`.
    pub redis_url: String,
    /// Default visibility window applied on `pop`, in seconds.
    pub default_visibility_secs: u64,
    /// Default remaining-attempt count applied on `push` when none is given.
    pub default_retries: u32,
    /// Scheduler tick interval, in seconds.
    pub scheduler_tick_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            default_visibility_secs: 10,
            default_retries: 5,
            scheduler_tick_secs: 1,
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognised variables: `DPQ_REDIS_URL`, `DPQ_DEFAULT_VISIBILITY`,
    /// `DPQ_DEFAULT_RETRIES`, `DPQ_SCHEDULER_TICK`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env_or("DPQ_REDIS_URL", &defaults.redis_url),
            default_visibility_secs: env_u64(
                "DPQ_DEFAULT_VISIBILITY",
                defaults.default_visibility_secs,
            ),
            default_retries: env_u32("DPQ_DEFAULT_RETRIES", defaults.default_retries),
            scheduler_tick_secs: env_u64("DPQ_SCHEDULER_TICK", defaults.scheduler_tick_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_implementation() {
        let cfg = Config::default();
        assert_eq!(cfg.default_visibility_secs, 10);
        assert_eq!(cfg.default_retries, 5);
    }
}
