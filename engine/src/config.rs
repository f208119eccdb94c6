//! Engine configuration with TOML file support.

use crate::EngineError;
use acta_types::Priority;
use serde::{Deserialize, Serialize};

/// Configuration for the acta engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Missing keys fall back to the
/// [`Default`] values.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size used when scanning the store for queries and sweeps.
    pub query_page_size: usize,
    /// How often the expiry sweep walks the store.
    pub expiry_sweep_secs: u64,
    /// How often the reconcile sweep re-queues approved actions whose
    /// ledger write is still outstanding.
    pub reconcile_secs: u64,
    /// Base delay for ledger retry backoff (doubles per attempt).
    pub ledger_retry_base_ms: u64,
    /// Transient-failure retries per ledger job before giving the action
    /// back to the reconcile sweep.
    pub ledger_max_retries: u32,
    /// Actions at or above this priority are ledger-recorded regardless of
    /// their audit level.
    pub ledger_priority_threshold: Priority,
    /// Domains whose actions are always ledger-recorded.
    pub ledger_domains: Vec<String>,
    /// Tags that force ledger recording.
    pub ledger_tags: Vec<String>,
    /// Domains whose completed actions trigger the reward hook.
    pub reward_domains: Vec<String>,
    /// Tags that make a completed action reward-eligible.
    pub reward_tags: Vec<String>,
    /// An `amount` parameter at or above this makes a completed action
    /// reward-eligible.
    pub reward_min_amount: Option<f64>,
    /// Log format: "human" or "json".
    pub log_format: String,
    /// Log level filter: "trace", "debug", "info", "warn", "error".
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_page_size: 64,
            expiry_sweep_secs: 60,
            reconcile_secs: 300,
            ledger_retry_base_ms: 200,
            ledger_max_retries: 5,
            ledger_priority_threshold: Priority::Critical,
            ledger_domains: vec!["financial".to_string()],
            ledger_tags: vec!["compliance".to_string()],
            reward_domains: Vec::new(),
            reward_tags: Vec::new(),
            reward_min_amount: None,
            log_format: "human".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("EngineConfig is always serializable to TOML")
    }
}
