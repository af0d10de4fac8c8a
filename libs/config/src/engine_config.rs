//! Engine Configuration Module
//!
//! Loads engine settings from a TOML file with an optional
//! environment-specific overlay, then `LP_` environment variables.
//! Nested keys use a double underscore: `LP_RETRY__MAX_ATTEMPTS=6`.

use crate::contracts::{ContractOverrides, ContractRegistry};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";
pub const ENV_PREFIX: &str = "LP";

/// Main engine configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub chain_id: u64,

    /// JSON-RPC endpoint; `${VAR}` references are expanded after loading
    pub rpc_url: String,

    /// Name of the environment variable holding the signer's private key.
    /// The key itself never lives in configuration.
    pub signer_key_env: String,

    /// Slippage tolerance in basis points applied to mint, decrease and swap minimums
    pub slippage_bps: u32,

    /// Seconds added to the current time for on-chain deadlines
    pub deadline_secs: u64,

    /// Width of single-sided ranges in tick-spacing units
    pub single_sided_width: u32,

    pub log_level: String,

    pub retry: RetrySettings,

    pub receipts: ReceiptSettings,

    /// Per-chain contract overrides keyed by chain id
    pub contracts: HashMap<String, ContractOverrides>,
}

/// Retry behaviour for RPC reads and submissions
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub use_exponential_backoff: bool,
    /// Randomize each delay within [delay/2, delay]
    pub jitter: bool,
}

/// Receipt polling for submitted transactions
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReceiptSettings {
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            signer_key_env: "LP_SIGNER_KEY".to_string(),
            slippage_bps: 50,
            deadline_secs: 1_200,
            single_sided_width: 10,
            log_level: "info".to_string(),
            retry: RetrySettings::default(),
            receipts: ReceiptSettings::default(),
            contracts: HashMap::new(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 250,
            max_delay_ms: 5_000,
            use_exponential_backoff: true,
            jitter: true,
        }
    }
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            timeout_secs: 180,
        }
    }
}

impl EngineConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        Self::load_with_env(base_path, environment, None)
    }

    /// As `load`, with an explicit variable map instead of the process
    /// environment
    pub fn load_with_env(
        base_path: Option<&Path>,
        environment: Option<&str>,
        env_source: Option<Map<String, String>>,
    ) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        // An explicitly named file must exist; the default path is optional
        let mut builder = Config::builder().add_source(File::from(base).required(base_path.is_some()));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (LP_ prefix)
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env_source),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut engine: EngineConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        engine.expand_env_vars()?;
        engine.validate()?;
        Ok(engine)
    }

    /// Expand environment variables in the RPC URL
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let expanded = shellexpand::env(&self.rpc_url).context("Failed to expand RPC URL")?;
        self.rpc_url = expanded.to_string();
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            bail!("rpc_url must not be empty");
        }
        if self.slippage_bps >= 10_000 {
            bail!("slippage_bps must be below 10000, got {}", self.slippage_bps);
        }
        if self.deadline_secs == 0 {
            bail!("deadline_secs must be positive");
        }
        if self.single_sided_width == 0 {
            bail!("single_sided_width must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            bail!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms,
                self.retry.max_delay_ms
            );
        }
        if self.receipts.poll_interval_ms == 0 {
            bail!("receipts.poll_interval_ms must be positive");
        }
        Ok(())
    }

    /// Built-in contract registry with this configuration's overrides applied
    pub fn registry(&self) -> Result<ContractRegistry> {
        ContractRegistry::from_overrides(&self.contracts)
    }

    /// Private key read from the configured environment variable
    pub fn signer_key(&self) -> Result<String> {
        std::env::var(&self.signer_key_env).with_context(|| {
            format!(
                "Signer key variable {} is not set",
                self.signer_key_env
            )
        })
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<PathBuf>, environment: Option<&str>) -> Result<EngineConfig> {
    EngineConfig::load(path.as_deref(), environment)
}
