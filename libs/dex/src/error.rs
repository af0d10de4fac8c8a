//! ABI encoding and decoding errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AbiError {
    #[error("ABI encoding failed for {function}: {message}")]
    Encode { function: String, message: String },

    #[error("ABI parsing failed for {function}: {message}")]
    Decode { function: String, message: String },

    /// `0x` returned by a call, typically an address without code
    #[error("Empty response from {function}")]
    EmptyResponse { function: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Value overflow: {field} = {value} does not fit")]
    ValueOverflow { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, AbiError>;
