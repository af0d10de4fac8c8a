//! Non-fungible position manager: mint, decrease, collect, burn and reads

use super::{decode_output, encode_call, function, int24, narrow_u128, param, TokenReader};
use crate::error::{AbiError, Result};
use crate::event_signatures::INCREASE_LIQUIDITY;
use crate::receipt::LogEntry;
use ethabi::{Function, ParamType, StateMutability, Token};
use ethereum_types::{Address, U256};
use lp_amm::FeeTier;
use serde::{Deserialize, Serialize};

/// Arguments of `mint(MintParams)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintParams {
    pub token0: Address,
    pub token1: Address,
    pub fee: FeeTier,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: U256,
    pub amount1_desired: U256,
    pub amount0_min: U256,
    pub amount1_min: U256,
    pub recipient: Address,
    pub deadline: U256,
}

/// Return values of `mint`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOutput {
    pub token_id: U256,
    pub liquidity: u128,
    pub amount0: U256,
    pub amount1: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecreaseLiquidityParams {
    pub token_id: U256,
    pub liquidity: u128,
    pub amount0_min: U256,
    pub amount1_min: U256,
    pub deadline: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectParams {
    pub token_id: U256,
    pub recipient: Address,
    pub amount0_max: u128,
    pub amount1_max: u128,
}

impl CollectParams {
    /// Collect everything owed on both sides
    pub fn all(token_id: U256, recipient: Address) -> Self {
        Self {
            token_id,
            recipient,
            amount0_max: u128::MAX,
            amount1_max: u128::MAX,
        }
    }
}

/// Decoded `positions(tokenId)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub nonce: U256,
    pub operator: Address,
    pub token0: Address,
    pub token1: Address,
    /// Raw fee; positions on unknown tiers are still readable
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

/// `IncreaseLiquidity` as emitted by mint and increaseLiquidity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncreaseLiquidityEvent {
    pub token_id: U256,
    pub liquidity: u128,
    pub amount0: U256,
    pub amount1: U256,
}

fn mint_params_type() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Address,
        ParamType::Address,
        ParamType::Uint(24),
        ParamType::Int(24),
        ParamType::Int(24),
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Address,
        ParamType::Uint(256),
    ])
}

pub fn mint() -> Function {
    function(
        "mint",
        vec![param("params", mint_params_type())],
        vec![
            param("tokenId", ParamType::Uint(256)),
            param("liquidity", ParamType::Uint(128)),
            param("amount0", ParamType::Uint(256)),
            param("amount1", ParamType::Uint(256)),
        ],
        StateMutability::Payable,
    )
}

pub fn decrease_liquidity() -> Function {
    function(
        "decreaseLiquidity",
        vec![param(
            "params",
            ParamType::Tuple(vec![
                ParamType::Uint(256),
                ParamType::Uint(128),
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Uint(256),
            ]),
        )],
        vec![
            param("amount0", ParamType::Uint(256)),
            param("amount1", ParamType::Uint(256)),
        ],
        StateMutability::Payable,
    )
}

pub fn collect() -> Function {
    function(
        "collect",
        vec![param(
            "params",
            ParamType::Tuple(vec![
                ParamType::Uint(256),
                ParamType::Address,
                ParamType::Uint(128),
                ParamType::Uint(128),
            ]),
        )],
        vec![
            param("amount0", ParamType::Uint(256)),
            param("amount1", ParamType::Uint(256)),
        ],
        StateMutability::Payable,
    )
}

pub fn burn() -> Function {
    function(
        "burn",
        vec![param("tokenId", ParamType::Uint(256))],
        vec![],
        StateMutability::Payable,
    )
}

pub fn positions() -> Function {
    function(
        "positions",
        vec![param("tokenId", ParamType::Uint(256))],
        vec![
            param("nonce", ParamType::Uint(96)),
            param("operator", ParamType::Address),
            param("token0", ParamType::Address),
            param("token1", ParamType::Address),
            param("fee", ParamType::Uint(24)),
            param("tickLower", ParamType::Int(24)),
            param("tickUpper", ParamType::Int(24)),
            param("liquidity", ParamType::Uint(128)),
            param("feeGrowthInside0LastX128", ParamType::Uint(256)),
            param("feeGrowthInside1LastX128", ParamType::Uint(256)),
            param("tokensOwed0", ParamType::Uint(128)),
            param("tokensOwed1", ParamType::Uint(128)),
        ],
        StateMutability::View,
    )
}

pub fn token_of_owner_by_index() -> Function {
    function(
        "tokenOfOwnerByIndex",
        vec![
            param("owner", ParamType::Address),
            param("index", ParamType::Uint(256)),
        ],
        vec![param("tokenId", ParamType::Uint(256))],
        StateMutability::View,
    )
}

pub fn encode_mint(params: &MintParams) -> Result<Vec<u8>> {
    encode_call(
        &mint(),
        &[Token::Tuple(vec![
            Token::Address(params.token0),
            Token::Address(params.token1),
            Token::Uint(params.fee.fee().into()),
            int24(params.tick_lower),
            int24(params.tick_upper),
            Token::Uint(params.amount0_desired),
            Token::Uint(params.amount1_desired),
            Token::Uint(params.amount0_min),
            Token::Uint(params.amount1_min),
            Token::Address(params.recipient),
            Token::Uint(params.deadline),
        ])],
    )
}

pub fn decode_mint(data: &[u8]) -> Result<MintOutput> {
    let tokens = decode_output(&mint(), data)?;
    let mut reader = TokenReader::new("mint", tokens);
    Ok(MintOutput {
        token_id: reader.uint("tokenId")?,
        liquidity: reader.u128("liquidity")?,
        amount0: reader.uint("amount0")?,
        amount1: reader.uint("amount1")?,
    })
}

pub fn encode_decrease_liquidity(params: &DecreaseLiquidityParams) -> Result<Vec<u8>> {
    encode_call(
        &decrease_liquidity(),
        &[Token::Tuple(vec![
            Token::Uint(params.token_id),
            Token::Uint(params.liquidity.into()),
            Token::Uint(params.amount0_min),
            Token::Uint(params.amount1_min),
            Token::Uint(params.deadline),
        ])],
    )
}

pub fn encode_collect(params: &CollectParams) -> Result<Vec<u8>> {
    encode_call(
        &collect(),
        &[Token::Tuple(vec![
            Token::Uint(params.token_id),
            Token::Address(params.recipient),
            Token::Uint(params.amount0_max.into()),
            Token::Uint(params.amount1_max.into()),
        ])],
    )
}

/// `(amount0, amount1)` returned by collect
pub fn decode_collect(data: &[u8]) -> Result<(U256, U256)> {
    let tokens = decode_output(&collect(), data)?;
    let mut reader = TokenReader::new("collect", tokens);
    Ok((reader.uint("amount0")?, reader.uint("amount1")?))
}

pub fn encode_burn(token_id: U256) -> Result<Vec<u8>> {
    encode_call(&burn(), &[Token::Uint(token_id)])
}

pub fn encode_positions(token_id: U256) -> Result<Vec<u8>> {
    encode_call(&positions(), &[Token::Uint(token_id)])
}

pub fn decode_positions(data: &[u8]) -> Result<PositionInfo> {
    let tokens = decode_output(&positions(), data)?;
    let mut reader = TokenReader::new("positions", tokens);
    Ok(PositionInfo {
        nonce: reader.uint("nonce")?,
        operator: reader.address("operator")?,
        token0: reader.address("token0")?,
        token1: reader.address("token1")?,
        fee: reader.small("fee")?,
        tick_lower: reader.int24("tickLower")?,
        tick_upper: reader.int24("tickUpper")?,
        liquidity: reader.u128("liquidity")?,
        fee_growth_inside0_last_x128: reader.uint("feeGrowthInside0LastX128")?,
        fee_growth_inside1_last_x128: reader.uint("feeGrowthInside1LastX128")?,
        tokens_owed0: reader.u128("tokensOwed0")?,
        tokens_owed1: reader.u128("tokensOwed1")?,
    })
}

pub fn encode_token_of_owner_by_index(owner: Address, index: u64) -> Result<Vec<u8>> {
    encode_call(
        &token_of_owner_by_index(),
        &[Token::Address(owner), Token::Uint(index.into())],
    )
}

pub fn decode_token_of_owner_by_index(data: &[u8]) -> Result<U256> {
    let tokens = decode_output(&token_of_owner_by_index(), data)?;
    TokenReader::new("tokenOfOwnerByIndex", tokens).uint("tokenId")
}

/// Parse an `IncreaseLiquidity` log. Returns `None` for any other event.
pub fn parse_increase_liquidity(log: &LogEntry) -> Result<Option<IncreaseLiquidityEvent>> {
    if log.topics.first() != Some(&INCREASE_LIQUIDITY) {
        return Ok(None);
    }
    let token_id = log
        .topics
        .get(1)
        .map(|topic| U256::from_big_endian(topic.as_bytes()))
        .ok_or_else(|| AbiError::MissingField("IncreaseLiquidity.tokenId".to_string()))?;

    let values = ethabi::decode(
        &[ParamType::Uint(128), ParamType::Uint(256), ParamType::Uint(256)],
        &log.data,
    )
    .map_err(|e| AbiError::Decode {
        function: "IncreaseLiquidity".to_string(),
        message: e.to_string(),
    })?;
    let mut reader = TokenReader::new("IncreaseLiquidity", values);
    let liquidity = reader.uint("liquidity")?;

    Ok(Some(IncreaseLiquidityEvent {
        token_id,
        liquidity: narrow_u128(liquidity, "liquidity")?,
        amount0: reader.uint("amount0")?,
        amount1: reader.uint("amount1")?,
    }))
}

/// The first `IncreaseLiquidity` emitted by `position_manager` in a receipt
pub fn find_minted_position(
    position_manager: Address,
    logs: &[LogEntry],
) -> Result<Option<IncreaseLiquidityEvent>> {
    for log in logs.iter().filter(|log| log.address == position_manager) {
        if let Some(event) = parse_increase_liquidity(log)? {
            return Ok(Some(event));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_signatures::TRANSFER;
    use ethereum_types::H256;

    #[test]
    fn test_position_manager_selectors() {
        assert_eq!(mint().short_signature(), [0x88, 0x31, 0x64, 0x56]);
        assert_eq!(collect().short_signature(), [0xfc, 0x6f, 0x78, 0x65]);
        assert_eq!(decrease_liquidity().short_signature(), [0x0c, 0x49, 0xcc, 0xbe]);
        assert_eq!(burn().short_signature(), [0x42, 0x96, 0x6c, 0x68]);
        assert_eq!(positions().short_signature(), [0x99, 0xfb, 0xab, 0x88]);
        assert_eq!(
            token_of_owner_by_index().short_signature(),
            [0x2f, 0x74, 0x5c, 0x59]
        );
    }

    #[test]
    fn test_mint_encodes_negative_ticks() {
        let params = MintParams {
            token0: Address::from_low_u64_be(1),
            token1: Address::from_low_u64_be(2),
            fee: FeeTier::Medium,
            tick_lower: -600,
            tick_upper: 600,
            amount0_desired: U256::from(1_000u64),
            amount1_desired: U256::from(2_000u64),
            amount0_min: U256::zero(),
            amount1_min: U256::zero(),
            recipient: Address::from_low_u64_be(9),
            deadline: U256::from(1_700_000_000u64),
        };
        let data = encode_mint(&params).unwrap();
        assert_eq!(data.len(), 4 + 11 * 32);

        let decoded = mint().decode_input(&data[4..]).unwrap();
        let fields = decoded[0].clone().into_tuple().unwrap();
        assert_eq!(fields[3].clone().into_int().map(crate::abi::u256_to_i32), Some(-600));
        assert_eq!(fields[4].clone().into_int().map(crate::abi::u256_to_i32), Some(600));
    }

    #[test]
    fn test_collect_all_uses_max() {
        let params = CollectParams::all(U256::from(7u64), Address::from_low_u64_be(3));
        let data = encode_collect(&params).unwrap();
        // amount0Max occupies word 2 and is 16 bytes of 0xff
        let word = &data[4 + 64..4 + 96];
        assert!(word[..16].iter().all(|b| *b == 0));
        assert!(word[16..].iter().all(|b| *b == 0xff));
    }

    #[test]
    fn test_decode_positions() {
        let encoded = ethabi::encode(&[
            Token::Uint(U256::zero()),
            Token::Address(Address::zero()),
            Token::Address(Address::from_low_u64_be(1)),
            Token::Address(Address::from_low_u64_be(2)),
            Token::Uint(U256::from(500u64)),
            int24(-887270),
            int24(887270),
            Token::Uint(U256::from(42u64)),
            Token::Uint(U256::zero()),
            Token::Uint(U256::zero()),
            Token::Uint(U256::from(5u64)),
            Token::Uint(U256::from(6u64)),
        ]);
        let info = decode_positions(&encoded).unwrap();
        assert_eq!(info.fee, 500);
        assert_eq!(info.tick_lower, -887270);
        assert_eq!(info.tick_upper, 887270);
        assert_eq!(info.liquidity, 42);
        assert_eq!((info.tokens_owed0, info.tokens_owed1), (5, 6));
    }

    #[test]
    fn test_find_minted_position_from_logs() {
        let manager = Address::from_low_u64_be(0xabc);
        let token_id = U256::from(4242u64);
        let mut topic = [0u8; 32];
        token_id.to_big_endian(&mut topic);

        let logs = vec![
            LogEntry {
                address: manager,
                topics: vec![TRANSFER, H256::zero(), H256::zero(), H256::from(topic)],
                data: vec![],
            },
            // same event from an unrelated contract is ignored
            LogEntry {
                address: Address::from_low_u64_be(1),
                topics: vec![INCREASE_LIQUIDITY, H256::zero()],
                data: ethabi::encode(&[
                    Token::Uint(U256::one()),
                    Token::Uint(U256::one()),
                    Token::Uint(U256::one()),
                ]),
            },
            LogEntry {
                address: manager,
                topics: vec![INCREASE_LIQUIDITY, H256::from(topic)],
                data: ethabi::encode(&[
                    Token::Uint(U256::from(1_000u64)),
                    Token::Uint(U256::from(10u64)),
                    Token::Uint(U256::from(20u64)),
                ]),
            },
        ];

        let event = find_minted_position(manager, &logs).unwrap().unwrap();
        assert_eq!(event.token_id, token_id);
        assert_eq!(event.liquidity, 1_000);
        assert_eq!(event.amount1, U256::from(20u64));

        assert!(find_minted_position(manager, &logs[..1]).unwrap().is_none());
    }
}
