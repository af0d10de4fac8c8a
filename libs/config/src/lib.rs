//! # Liquidity Engine Configuration
//!
//! Engine settings and the per-chain contract registry, shared by the
//! engine library and its binary.
//!
//! ## Features
//!
//! - **Contract Registry**: factory, position manager, router, quoter and
//!   wrapped-native addresses per chain id, with built-in Uniswap V3
//!   deployments for Ethereum, Polygon and Arbitrum
//! - **Engine Settings**: slippage, deadlines, retry and receipt polling
//! - **Layered Loading**: TOML file, optional environment overlay file, then
//!   `LP_`-prefixed environment variables
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lp_config::{load_config, ContractRegistry};
//!
//! let config = load_config(None, Some("production"))?;
//! let registry = config.registry()?;
//! let contracts = registry.require(config.chain_id)?;
//! println!("position manager: {:?}", contracts.position_manager);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod contracts;
pub mod engine_config;

// Re-export commonly used types
pub use contracts::{ChainContracts, ContractOverrides, ContractRegistry};
pub use engine_config::{load_config, EngineConfig, ReceiptSettings, RetrySettings};
