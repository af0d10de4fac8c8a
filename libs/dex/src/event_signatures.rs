//! Event signature constants used when reading transaction receipts
//!
//! keccak256 of the canonical Solidity event definitions. Verified against
//! ethabi's own hashing in the tests below.

use ethereum_types::H256;

/// Position manager `IncreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1)`
/// keccak256("IncreaseLiquidity(uint256,uint128,uint256,uint256)")
pub const INCREASE_LIQUIDITY: H256 = H256([
    0x30, 0x67, 0x04, 0x8b, 0xee, 0xe3, 0x1b, 0x25, 0xb2, 0xf1, 0x68, 0x1f, 0x88, 0xda, 0xc8, 0x38,
    0xc8, 0xbb, 0xa3, 0x6a, 0xf2, 0x5b, 0xfb, 0x2b, 0x7c, 0xf7, 0x47, 0x3a, 0x58, 0x47, 0xe3, 0x5f,
]);

/// ERC-20 / ERC-721 `Transfer(address indexed from, address indexed to, uint256 value)`
/// keccak256("Transfer(address,address,uint256)")
pub const TRANSFER: H256 = H256([
    0xdd, 0xf2, 0x52, 0xad, 0x1b, 0xe2, 0xc8, 0x9b, 0x69, 0xc2, 0xb0, 0x68, 0xfc, 0x37, 0x8d, 0xaa,
    0x95, 0x2b, 0xa7, 0xf1, 0x63, 0xc4, 0xa1, 0x16, 0x28, 0xf5, 0x5a, 0x4d, 0xf5, 0x23, 0xb3, 0xef,
]);

#[cfg(test)]
mod tests {
    use super::*;
    use ethabi::{Event, EventParam, ParamType};

    fn event(name: &str, kinds: Vec<ParamType>) -> Event {
        Event {
            name: name.to_string(),
            inputs: kinds
                .into_iter()
                .enumerate()
                .map(|(i, kind)| EventParam {
                    name: format!("p{}", i),
                    kind,
                    indexed: false,
                })
                .collect(),
            anonymous: false,
        }
    }

    #[test]
    fn test_increase_liquidity_signature() {
        let e = event(
            "IncreaseLiquidity",
            vec![
                ParamType::Uint(256),
                ParamType::Uint(128),
                ParamType::Uint(256),
                ParamType::Uint(256),
            ],
        );
        assert_eq!(e.signature(), INCREASE_LIQUIDITY);
    }

    #[test]
    fn test_transfer_signature() {
        let e = event(
            "Transfer",
            vec![ParamType::Address, ParamType::Address, ParamType::Uint(256)],
        );
        assert_eq!(e.signature(), TRANSFER);
        assert_eq!(
            format!("{:?}", TRANSFER),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }
}
