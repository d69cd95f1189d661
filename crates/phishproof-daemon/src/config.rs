//! Configuration file management.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use phishproof_ingest::{PipelineConfig, RetryPolicy};
use phishproof_match::{MatchConfig, ParallelConfig, PhoneticToggles};
use phishproof_state::DenyPolicy;

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Matching-engine settings.
    #[serde(default)]
    pub matching: MatchingConfig,
    /// Ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Decision-state settings.
    #[serde(default)]
    pub state: StateConfig,
    /// Background-task cadences.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Matching-engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Maximum edit distance that still counts as a match.
    #[serde(default = "default_edit_distance_threshold")]
    pub edit_distance_threshold: usize,
    /// Phonetic matching on/off.
    #[serde(default = "default_true")]
    pub phonetic_matching: bool,
    #[serde(default = "default_true")]
    pub soundex: bool,
    #[serde(default = "default_true")]
    pub metaphone: bool,
    #[serde(default = "default_true")]
    pub double_metaphone: bool,
    /// Parallel batch checking on/off.
    #[serde(default = "default_true")]
    pub parallel_enabled: bool,
    /// Worker-pool size for large batches.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Batches at or below this size run sequentially.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Base URL of the ranked-list provider.
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Object-store bucket directory. Empty = $data_dir/lists.
    #[serde(default)]
    pub bucket_dir: String,
    /// Object-key prefix for stored CSVs.
    #[serde(default = "default_object_prefix")]
    pub object_prefix: String,
    /// Rows per bulk insert.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Total provider attempts per cycle, including the first.
    #[serde(default = "default_retry_attempts")]
    pub retry_max_attempts: u32,
    /// Initial backoff in milliseconds; doubles per attempt.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

/// Decision-state configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// State lifetime in compact notation: "5d", "2h", "30m", "15s".
    #[serde(default = "default_state_ttl")]
    pub ttl: String,
    /// How verdicts map to access decisions.
    #[serde(default)]
    pub deny_policy: DenyPolicy,
}

/// Background-task cadences, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_metadata_refresh_secs")]
    pub metadata_refresh_secs: u64,
    #[serde(default = "default_process_secs")]
    pub process_secs: u64,
    #[serde(default = "default_sweep_secs")]
    pub sweep_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_edit_distance_threshold() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_max_workers() -> usize {
    8
}

fn default_parallel_threshold() -> usize {
    16
}

fn default_provider_base_url() -> String {
    "https://tranco-list.eu".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_object_prefix() -> String {
    "tranco-full".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_base_delay() -> u64 {
    500
}

fn default_state_ttl() -> String {
    "1h".to_string()
}

fn default_metadata_refresh_secs() -> u64 {
    86_400
}

fn default_process_secs() -> u64 {
    3_600
}

fn default_sweep_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            edit_distance_threshold: default_edit_distance_threshold(),
            phonetic_matching: true,
            soundex: true,
            metaphone: true,
            double_metaphone: true,
            parallel_enabled: true,
            max_workers: default_max_workers(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            provider_base_url: default_provider_base_url(),
            request_timeout_secs: default_request_timeout(),
            bucket_dir: String::new(),
            object_prefix: default_object_prefix(),
            batch_size: default_batch_size(),
            retry_max_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            ttl: default_state_ttl(),
            deny_policy: DenyPolicy::default(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            metadata_refresh_secs: default_metadata_refresh_secs(),
            process_secs: default_process_secs(),
            sweep_secs: default_sweep_secs(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist. Validation
    /// failures — including an unparseable state TTL — are fatal here,
    /// at startup, never at runtime.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<DaemonConfig>(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the daemon cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ingest.batch_size == 0 {
            anyhow::bail!("ingest.batch_size must be greater than 0");
        }
        if self.matching.max_workers == 0 {
            anyhow::bail!("matching.max_workers must be greater than 0");
        }
        self.state_ttl()?;
        Ok(())
    }

    /// The parsed state TTL.
    pub fn state_ttl(&self) -> anyhow::Result<Duration> {
        phishproof_state::parse_ttl(&self.state.ttl)
            .map_err(|e| anyhow::anyhow!("state.ttl: {e}"))
    }

    /// Matching-engine view of this configuration.
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            edit_distance_threshold: self.matching.edit_distance_threshold,
            phonetic: PhoneticToggles {
                enabled: self.matching.phonetic_matching,
                soundex: self.matching.soundex,
                metaphone: self.matching.metaphone,
                double_metaphone: self.matching.double_metaphone,
            },
            parallel: ParallelConfig {
                enabled: self.matching.parallel_enabled,
                max_workers: self.matching.max_workers,
                batch_threshold: self.matching.parallel_threshold,
            },
        }
    }

    /// Ingestion-pipeline view of this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            object_prefix: self.ingest.object_prefix.clone(),
            batch_size: self.ingest.batch_size,
        }
    }

    /// Provider retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.ingest.retry_max_attempts,
            base_delay: Duration::from_millis(self.ingest.retry_base_delay_ms),
            ..RetryPolicy::default()
        }
    }

    /// Provider request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ingest.request_timeout_secs)
    }

    /// Object-store bucket directory.
    pub fn bucket_dir(&self) -> PathBuf {
        if self.ingest.bucket_dir.is_empty() {
            Self::data_dir().join("lists")
        } else {
            PathBuf::from(&self.ingest.bucket_dir)
        }
    }

    /// Get the data directory path.
    pub fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("PHISHPROOF_DATA_DIR") {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".phishproof"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/phishproof"))
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.matching.edit_distance_threshold, 2);
        assert!(config.matching.phonetic_matching);
        assert_eq!(config.ingest.batch_size, 1000);
        assert_eq!(config.state.ttl, "1h");
        assert_eq!(config.schedule.sweep_secs, 300);
        config.validate().expect("defaults validate");
    }

    #[test]
    fn test_config_serialization() {
        let config = DaemonConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed: DaemonConfig = toml::from_str(&toml_str).expect("parse");
        assert_eq!(
            parsed.matching.edit_distance_threshold,
            config.matching.edit_distance_threshold
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: DaemonConfig = toml::from_str(
            r#"
            [matching]
            edit_distance_threshold = 3

            [state]
            ttl = "30m"
            deny_policy = "edit-distance"
            "#,
        )
        .expect("parse");

        assert_eq!(parsed.matching.edit_distance_threshold, 3);
        assert!(parsed.matching.phonetic_matching, "untouched default");
        assert_eq!(parsed.state.ttl, "30m");
        assert_eq!(parsed.state.deny_policy, DenyPolicy::EditDistanceAlone);
        assert_eq!(parsed.ingest.batch_size, 1000);
    }

    #[test]
    fn test_invalid_ttl_is_fatal() {
        let mut config = DaemonConfig::default();
        config.state.ttl = "soon".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = DaemonConfig::default();
        config.ingest.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_match_config_view() {
        let mut config = DaemonConfig::default();
        config.matching.parallel_enabled = false;
        config.matching.soundex = false;

        let mc = config.match_config();
        assert!(!mc.parallel.enabled);
        assert!(!mc.phonetic.soundex);
        assert!(mc.phonetic.metaphone);
    }
}
