use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub recurrence: RecurrenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Resolution policy for wall-clock start times that fall inside a DST
/// spring-forward gap (a nonexistent local hour).
///
/// Ambiguous fall-back times are always resolved to the earlier instant;
/// only the gap side is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstGapPolicy {
    /// Shift forward to the first valid instant after the gap.
    ShiftForward,
    /// Shift backward to the last valid instant before the gap.
    ShiftBackward,
    /// Reject the occurrence with an error.
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecurrenceConfig {
    pub dst_gap_policy: DstGapPolicy,
    /// Hard cap on the number of occurrences any single expansion may emit.
    pub max_occurrences: u32,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            dst_gap_policy: DstGapPolicy::ShiftForward,
            max_occurrences: 1000,
        }
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file, environment variables and an
    /// optional `config.toml`. Environment variables take precedence over
    /// `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("logging.level", "debug")?
            .set_default("recurrence.dst_gap_policy", "shift_forward")?
            .set_default("recurrence.max_occurrences", 1000)?
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recurrence_defaults() {
        let cfg = RecurrenceConfig::default();
        assert_eq!(cfg.dst_gap_policy, DstGapPolicy::ShiftForward);
        assert_eq!(cfg.max_occurrences, 1000);
    }

    #[test]
    fn test_gap_policy_deserializes_snake_case() {
        let policy: DstGapPolicy = serde_json::from_str("\"shift_backward\"").unwrap();
        assert_eq!(policy, DstGapPolicy::ShiftBackward);
    }
}
