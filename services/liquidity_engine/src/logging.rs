//! Standardized emoji logging for engine steps
//!
//! Keeps step-level messages recognizable in mixed service logs.

/// Standard emoji set for liquidity engine logging
pub struct LogEmoji;

impl LogEmoji {
    // Status indicators
    pub const SUCCESS: &'static str = "✅"; // Step confirmed
    pub const ERROR: &'static str = "❌"; // Step reverted or failed
    pub const WARNING: &'static str = "⚠️"; // Fallback or degraded path
    pub const RETRY: &'static str = "🔁"; // Transient failure, retrying

    // Module-specific
    pub const SEARCH: &'static str = "🔍"; // Reads and quotes
    pub const EXECUTE: &'static str = "⚡"; // Transaction submitted
    pub const POOL: &'static str = "🏊"; // Pool create/initialize
    pub const CLOCK: &'static str = "⏱️"; // Waiting on a receipt

    // Position lifecycle
    pub const SWAP: &'static str = "🔄"; // Swap
    pub const MINT: &'static str = "➕"; // Mint/liquidity add
    pub const BURN: &'static str = "➖"; // Decrease/burn
    pub const COLLECT: &'static str = "💰"; // Fee collection
    pub const APPROVE: &'static str = "🔓"; // Allowance
    pub const WRAP: &'static str = "🎁"; // Native wrap/unwrap
}

// Convenience macros for standardized logging
#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SUCCESS, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!("{} {}", $crate::logging::LogEmoji::ERROR, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        tracing::warn!("{} {}", $crate::logging::LogEmoji::WARNING, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_retry {
    ($($arg:tt)*) => {
        tracing::warn!("{} {}", $crate::logging::LogEmoji::RETRY, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_search {
    ($($arg:tt)*) => {
        tracing::debug!("{} {}", $crate::logging::LogEmoji::SEARCH, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_execution {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::EXECUTE, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_pool {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::POOL, format!($($arg)*))
    };
}

/// Step-specific emoji for submitted/confirmed messages
pub fn step_emoji(step: crate::executor::StepKind) -> &'static str {
    use crate::executor::StepKind;
    match step {
        StepKind::Wrap | StepKind::Unwrap => LogEmoji::WRAP,
        StepKind::Approve => LogEmoji::APPROVE,
        StepKind::CreatePool | StepKind::InitializePool => LogEmoji::POOL,
        StepKind::Mint => LogEmoji::MINT,
        StepKind::DecreaseLiquidity | StepKind::Burn => LogEmoji::BURN,
        StepKind::Collect => LogEmoji::COLLECT,
        StepKind::Swap => LogEmoji::SWAP,
    }
}
