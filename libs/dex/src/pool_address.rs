//! Deterministic pool address derivation
//!
//! Pools are deployed with CREATE2 by the factory, salted with the ABI
//! encoding of `(token0, token1, fee)`, so the address is known before the
//! pool exists.

use crate::token::PoolKey;
use ethabi::Token;
use ethereum_types::{Address, H256};
use sha3::{Digest, Keccak256};

/// keccak256 of the canonical pool creation code
pub const POOL_INIT_CODE_HASH: H256 = H256([
    0xe3, 0x4f, 0x19, 0x9b, 0x19, 0xb2, 0xb4, 0xf4, 0x7f, 0x68, 0x44, 0x26, 0x19, 0xd5, 0x55, 0x52,
    0x7d, 0x24, 0x4f, 0x78, 0xa3, 0x29, 0x7e, 0xa8, 0x93, 0x25, 0xf8, 0x43, 0xf8, 0x7b, 0x8b, 0x54,
]);

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// `keccak256(0xff ++ factory ++ salt ++ init_code_hash)[12..]`
pub fn compute_pool_address(factory: Address, key: &PoolKey, init_code_hash: H256) -> Address {
    let salt = keccak256(&ethabi::encode(&[
        Token::Address(key.token0),
        Token::Address(key.token1),
        Token::Uint(key.fee.fee().into()),
    ]));

    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(factory.as_bytes());
    preimage.extend_from_slice(&salt);
    preimage.extend_from_slice(init_code_hash.as_bytes());

    Address::from_slice(&keccak256(&preimage)[12..])
}
