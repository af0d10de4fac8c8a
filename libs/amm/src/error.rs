//! Validation and arithmetic errors for AMM math
//!
//! Every variant is raised before any network call is made, so callers can
//! surface them directly as input-validation failures.

use thiserror::Error;

/// Errors produced by tick, price, liquidity and position calculations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AmmError {
    /// Price is zero, negative, NaN or infinite
    #[error("Invalid price {price}: must be finite and greater than zero")]
    InvalidPrice { price: f64 },

    /// Tick falls outside [MIN_TICK, MAX_TICK]
    #[error("Tick {tick} is outside protocol bounds [{min}, {max}]")]
    TickOutOfBounds { tick: i64, min: i32, max: i32 },

    /// sqrtPriceX96 falls outside [MIN_SQRT_RATIO, MAX_SQRT_RATIO)
    #[error("sqrtPriceX96 {value} is outside protocol bounds")]
    SqrtPriceOutOfBounds { value: String },

    /// Range bounds are inverted or empty
    #[error("Invalid tick range: lower {lower} must be below upper {upper}")]
    InvertedRange { lower: i32, upper: i32 },

    /// A bound is not a multiple of the pool's tick spacing
    #[error("Tick {tick} is not a multiple of tick spacing {spacing}")]
    MisalignedTick { tick: i32, spacing: i32 },

    /// A single-sided range would contain the current tick
    #[error("Range [{lower}, {upper}) straddles current tick {current_tick}")]
    RangeStraddlesCurrentTick {
        lower: i32,
        upper: i32,
        current_tick: i32,
    },

    /// Fee value does not correspond to a deployed fee tier
    #[error("Unsupported fee tier: {fee}")]
    UnsupportedFeeTier { fee: u32 },

    /// Amounts that must be positive are zero
    #[error("Zero amount: {context}")]
    ZeroAmount { context: String },

    /// Band or width parameter is out of its valid domain
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Slippage fraction is not in [0, 1)
    #[error("Invalid slippage tolerance {numerator}/{denominator}")]
    InvalidSlippage { numerator: u64, denominator: u64 },

    /// Intermediate or final value does not fit its target width
    #[error("Arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },

    /// Division by zero in fixed-point arithmetic
    #[error("Division by zero in {operation}")]
    DivisionByZero { operation: &'static str },
}

/// Result alias for AMM math
pub type Result<T> = std::result::Result<T, AmmError>;
