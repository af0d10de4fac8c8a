//! # lp-dex - Contract Bindings for Concentrated-Liquidity DEXes
//!
//! ## Purpose
//!
//! ABI definitions, calldata encoders and output decoders for the factory,
//! pool, position manager, swap router, quoter and ERC-20/wrapped-native
//! contracts the liquidity engine talks to. Also derives pool addresses
//! offline and identifies tokens and pools canonically.
//!
//! ## Integration Points
//!
//! - **Input**: typed parameter structs built by the liquidity engine
//! - **Output**: raw calldata handed to a chain client, and typed results
//!   decoded from `eth_call` responses and receipt logs
//! - **Math**: fee tiers and tick spacing come from `lp-amm`
//!
//! ## Architecture Role
//!
//! ```text
//! liquidity-engine ──> lp-dex::abi ──> calldata ──> RPC
//!        │                                           │
//!        └──────< typed results <── lp-dex::abi <────┘
//! ```
//!
//! Nothing in this crate performs I/O.

pub mod abi;
pub mod error;
pub mod event_signatures;
pub mod pool_address;
pub mod receipt;
pub mod token;

pub use abi::decode_revert_reason;
pub use error::{AbiError, Result};
pub use pool_address::{compute_pool_address, keccak256, POOL_INIT_CODE_HASH};
pub use receipt::LogEntry;
pub use token::{sort_tokens, PoolKey, Token};
