//! Application-level configuration loading, including the game rule set.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "COURTSIDE_BACK_CONFIG_PATH";

/// Policy applied when a second mutation arrives for a game that already has
/// one in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPolicy {
    /// Wait for the in-flight mutation to commit, then proceed.
    Block,
    /// Fail immediately with a concurrent-modification error.
    Reject,
}

#[derive(Debug, Clone)]
/// Immutable rule set governing every game handled by this backend.
pub struct GameRules {
    /// Number of regulation periods (quarters).
    pub regulation_periods: u8,
    /// Length of a regulation period, in seconds.
    pub period_seconds: u32,
    /// Length of an overtime period, in seconds.
    pub overtime_seconds: u32,
    /// Timeouts granted to each team for the whole game.
    pub timeouts_per_team: u8,
    /// Full shot clock value, in seconds.
    pub shot_clock_seconds: u8,
    /// Personal fouls after which a player may no longer enter the court.
    pub foul_limit: u8,
    /// Timeout duration used when the scorer does not specify one.
    pub default_timeout_seconds: u32,
    /// Contention policy of the per-game mutation serializer.
    pub mutation_policy: MutationPolicy,
}

impl GameRules {
    /// Load the game rules from disk, falling back to the baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let rules: Self = raw.into();
                    info!(path = %path.display(), ?rules, "loaded game rules from config");
                    rules
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Clock value a fresh period starts with, depending on whether the game
    /// is already past regulation.
    pub fn period_clock(&self, period: u8) -> u32 {
        if period > self.regulation_periods {
            self.overtime_seconds
        } else {
            self.period_seconds
        }
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            regulation_periods: 4,
            period_seconds: 600,
            overtime_seconds: 300,
            timeouts_per_team: 5,
            shot_clock_seconds: 24,
            foul_limit: 5,
            default_timeout_seconds: 60,
            mutation_policy: MutationPolicy::Block,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
///
/// Every field is optional so deployments only override what they need.
struct RawConfig {
    regulation_periods: Option<u8>,
    period_seconds: Option<u32>,
    overtime_seconds: Option<u32>,
    timeouts_per_team: Option<u8>,
    shot_clock_seconds: Option<u8>,
    foul_limit: Option<u8>,
    default_timeout_seconds: Option<u32>,
    mutation_policy: Option<MutationPolicy>,
}

impl From<RawConfig> for GameRules {
    fn from(raw: RawConfig) -> Self {
        let defaults = GameRules::default();
        Self {
            regulation_periods: raw.regulation_periods.unwrap_or(defaults.regulation_periods),
            period_seconds: raw.period_seconds.unwrap_or(defaults.period_seconds),
            overtime_seconds: raw.overtime_seconds.unwrap_or(defaults.overtime_seconds),
            timeouts_per_team: raw.timeouts_per_team.unwrap_or(defaults.timeouts_per_team),
            shot_clock_seconds: raw.shot_clock_seconds.unwrap_or(defaults.shot_clock_seconds),
            foul_limit: raw.foul_limit.unwrap_or(defaults.foul_limit),
            default_timeout_seconds: raw
                .default_timeout_seconds
                .unwrap_or(defaults.default_timeout_seconds),
            mutation_policy: raw.mutation_policy.unwrap_or(defaults.mutation_policy),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_rules() {
        let rules = GameRules::default();
        assert_eq!(rules.regulation_periods, 4);
        assert_eq!(rules.period_seconds, 600);
        assert_eq!(rules.shot_clock_seconds, 24);
        assert_eq!(rules.mutation_policy, MutationPolicy::Block);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"period_seconds": 480, "mutation_policy": "reject"}"#)
                .unwrap();
        let rules: GameRules = raw.into();
        assert_eq!(rules.period_seconds, 480);
        assert_eq!(rules.mutation_policy, MutationPolicy::Reject);
        assert_eq!(rules.regulation_periods, 4);
    }

    #[test]
    fn overtime_clock_used_past_regulation() {
        let rules = GameRules::default();
        assert_eq!(rules.period_clock(4), 600);
        assert_eq!(rules.period_clock(5), 300);
    }
}
