//! In-memory chain for orchestration tests
//!
//! Simulates the factory, pools, position manager, router, quoter and
//! ERC-20/WETH contracts closely enough for the engine's flows. Calls are
//! dispatched on target address and selector; transactions take effect at
//! submission and their receipts are served afterwards. Failures can be
//! scripted per read, submission, receipt and selector.

#![allow(dead_code)]

use async_trait::async_trait;
use ethabi::Token as AbiToken;
use ethereum_types::{Address, H256, U256};
use liquidity_engine::{
    ChainReader, EngineSettings, LiquidityEngine, RetryPolicy, RpcError, TransactionSigner,
    TxReceipt, TxRequest,
};
use lp_amm::liquidity_math::{get_amounts_for_liquidity, get_liquidity_for_amounts};
use lp_amm::tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio};
use lp_amm::{FeeTier, SlippageTolerance};
use lp_config::ChainContracts;
use lp_dex::abi::{erc20, factory, pool, position_manager, router, u256_to_i32};
use lp_dex::event_signatures::{INCREASE_LIQUIDITY, TRANSFER};
use lp_dex::{compute_pool_address, LogEntry, PoolKey, Token};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

pub const OWNER: u64 = 0xA11CE;

pub fn owner() -> Address {
    Address::from_low_u64_be(OWNER)
}

pub fn mainnet() -> ChainContracts {
    ChainContracts::builtin(1).unwrap().unwrap()
}

pub fn erc20_token(address: u64, symbol: &str) -> Token {
    Token::new(1, Address::from_low_u64_be(address), 18, symbol)
}

pub fn weth() -> Token {
    Token::new(1, mainnet().wrapped_native, 18, "WETH")
}

pub fn eth() -> Token {
    Token::native(1, mainnet().wrapped_native, 18, "ETH")
}

pub fn e18(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub fn test_settings() -> EngineSettings {
    EngineSettings {
        slippage: SlippageTolerance::from_bps(50).unwrap(),
        deadline_secs: 1_200,
        single_sided_width: 10,
        retry: RetryPolicy::immediate(3),
    }
}

pub fn engine(chain: &Arc<MockChain>) -> LiquidityEngine {
    LiquidityEngine::new(chain.clone(), chain.clone(), mainnet(), test_settings())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockPool {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPosition {
    pub owner: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

#[derive(Debug, Clone)]
pub enum QuoterResponse {
    Amount(U256),
    Revert(String),
    Empty,
}

#[derive(Default)]
pub struct ChainState {
    pub pools: HashMap<Address, MockPool>,
    /// Answer every getPool with this address instead of the real one
    pub registry_override: Option<Address>,
    pub balances: HashMap<(Address, Address), U256>,
    pub allowances: HashMap<(Address, Address, Address), U256>,
    pub positions: BTreeMap<U256, MockPosition>,
    pub next_token_id: u64,
    pub quoter: Option<QuoterResponse>,
    pub quoter_calls: usize,
    /// Credited to the collect recipient on each successful collect
    pub collect_payout: Option<(Address, U256)>,

    pub call_failures: VecDeque<RpcError>,
    pub submit_failures: VecDeque<RpcError>,
    pub receipt_failures: VecDeque<RpcError>,
    /// One-shot reverts keyed by selector
    pub revert_next: HashMap<[u8; 4], String>,

    pub submitted: Vec<TxRequest>,
    pub receipts: HashMap<H256, TxReceipt>,
    next_hash: u64,
}

pub struct MockChain {
    contracts: ChainContracts,
    owner: Address,
    state: Mutex<ChainState>,
}

fn uint(token: &AbiToken) -> U256 {
    token.clone().into_uint().unwrap_or_default()
}

fn address(token: &AbiToken) -> Address {
    token.clone().into_address().unwrap_or_default()
}

fn int24(token: &AbiToken) -> i32 {
    u256_to_i32(token.clone().into_int().unwrap_or_default())
}

fn tuple(mut tokens: Vec<AbiToken>) -> Vec<AbiToken> {
    match tokens.pop() {
        Some(AbiToken::Tuple(fields)) => fields,
        _ => Vec::new(),
    }
}

fn selector(data: &[u8]) -> [u8; 4] {
    let mut selector = [0u8; 4];
    if data.len() >= 4 {
        selector.copy_from_slice(&data[..4]);
    }
    selector
}

fn decode_args(function: &ethabi::Function, data: &[u8]) -> Result<Vec<AbiToken>, String> {
    function
        .decode_input(&data[4..])
        .map_err(|e| format!("bad calldata for {}: {}", function.name, e))
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            contracts: mainnet(),
            owner: owner(),
            state: Mutex::new(ChainState {
                next_token_id: 1,
                ..ChainState::default()
            }),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    pub fn pool_address(&self, key: &PoolKey) -> Address {
        compute_pool_address(self.contracts.factory, key, self.contracts.pool_init_code_hash)
    }

    /// Deployed and initialized at `tick`
    pub fn add_pool(&self, key: &PoolKey, tick: i32, liquidity: u128) -> Address {
        let address = self.pool_address(key);
        self.state().pools.insert(
            address,
            MockPool {
                sqrt_price_x96: get_sqrt_ratio_at_tick(tick).unwrap(),
                tick,
                liquidity,
            },
        );
        address
    }

    /// Deployed but never initialized
    pub fn add_uninitialized_pool(&self, key: &PoolKey) -> Address {
        let address = self.pool_address(key);
        self.state().pools.insert(address, MockPool::default());
        address
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state().balances.insert((token, owner), amount);
    }

    pub fn balance(&self, token: Address, owner: Address) -> U256 {
        self.state().balances.get(&(token, owner)).copied().unwrap_or_default()
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state().allowances.insert((token, owner, spender), amount);
    }

    pub fn add_position(&self, position: MockPosition) -> U256 {
        let mut state = self.state();
        let token_id = U256::from(state.next_token_id);
        state.next_token_id += 1;
        state.positions.insert(token_id, position);
        token_id
    }

    pub fn position(&self, token_id: U256) -> Option<MockPosition> {
        self.state().positions.get(&token_id).cloned()
    }

    pub fn set_quote(&self, response: QuoterResponse) {
        self.state().quoter = Some(response);
    }

    pub fn revert_next(&self, function: &ethabi::Function, reason: &str) {
        self.state()
            .revert_next
            .insert(function.short_signature(), reason.to_string());
    }

    pub fn fail_calls(&self, errors: impl IntoIterator<Item = RpcError>) {
        self.state().call_failures.extend(errors);
    }

    pub fn fail_receipts(&self, errors: impl IntoIterator<Item = RpcError>) {
        self.state().receipt_failures.extend(errors);
    }

    pub fn submitted(&self) -> Vec<TxRequest> {
        self.state().submitted.clone()
    }

    /// Submissions whose calldata starts with `function`'s selector
    pub fn submissions_of(&self, function: &ethabi::Function) -> Vec<TxRequest> {
        let wanted = function.short_signature();
        self.submitted()
            .into_iter()
            .filter(|tx| selector(&tx.data) == wanted)
            .collect()
    }

    fn owned_by(state: &ChainState, owner: Address) -> Vec<U256> {
        state
            .positions
            .iter()
            .filter(|(_, position)| position.owner == owner)
            .map(|(id, _)| *id)
            .collect()
    }

    fn read(&self, state: &mut ChainState, to: Address, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let sel = selector(data);
        let bad = |e: String| RpcError::UnsupportedMethod(e);

        if to == self.contracts.quoter && sel == router::quote_exact_input_single().short_signature() {
            state.quoter_calls += 1;
            return match state.quoter.clone() {
                Some(QuoterResponse::Amount(amount_out)) => Ok(ethabi::encode(&[
                    AbiToken::Uint(amount_out),
                    AbiToken::Uint(U256::zero()),
                    AbiToken::Uint(U256::one()),
                    AbiToken::Uint(U256::from(90_000u64)),
                ])),
                Some(QuoterResponse::Revert(reason)) => Err(RpcError::Reverted {
                    reason: Some(reason),
                }),
                Some(QuoterResponse::Empty) | None => Ok(Vec::new()),
            };
        }

        if to == self.contracts.factory && sel == factory::get_pool().short_signature() {
            let args = decode_args(&factory::get_pool(), data).map_err(bad)?;
            let fee = FeeTier::from_fee(uint(&args[2]).as_u32())
                .map_err(|e| RpcError::Reverted { reason: Some(e.to_string()) })?;
            let key = PoolKey::new(address(&args[0]), address(&args[1]), fee)
                .map_err(|e| RpcError::Reverted { reason: Some(e.to_string()) })?;
            let derived = self.pool_address(&key);
            let registered = if state.pools.contains_key(&derived) {
                state.registry_override.unwrap_or(derived)
            } else {
                Address::zero()
            };
            return Ok(ethabi::encode(&[AbiToken::Address(registered)]));
        }

        if to == self.contracts.position_manager {
            if sel == erc20::balance_of().short_signature() {
                let args = decode_args(&erc20::balance_of(), data).map_err(bad)?;
                let count = Self::owned_by(state, address(&args[0])).len();
                return Ok(ethabi::encode(&[AbiToken::Uint(U256::from(count))]));
            }
            if sel == position_manager::token_of_owner_by_index().short_signature() {
                let args = decode_args(&position_manager::token_of_owner_by_index(), data).map_err(bad)?;
                let owned = Self::owned_by(state, address(&args[0]));
                let index = uint(&args[1]).as_usize();
                return owned
                    .get(index)
                    .map(|id| ethabi::encode(&[AbiToken::Uint(*id)]))
                    .ok_or(RpcError::Reverted {
                        reason: Some("ERC721Enumerable: owner index out of bounds".into()),
                    });
            }
            if sel == position_manager::positions().short_signature() {
                let args = decode_args(&position_manager::positions(), data).map_err(bad)?;
                let Some(p) = state.positions.get(&uint(&args[0])) else {
                    return Err(RpcError::Reverted {
                        reason: Some("Invalid token ID".into()),
                    });
                };
                return Ok(ethabi::encode(&[
                    AbiToken::Uint(U256::zero()),
                    AbiToken::Address(Address::zero()),
                    AbiToken::Address(p.token0),
                    AbiToken::Address(p.token1),
                    AbiToken::Uint(U256::from(p.fee)),
                    lp_dex::abi::int24(p.tick_lower),
                    lp_dex::abi::int24(p.tick_upper),
                    AbiToken::Uint(U256::from(p.liquidity)),
                    AbiToken::Uint(U256::zero()),
                    AbiToken::Uint(U256::zero()),
                    AbiToken::Uint(U256::from(p.tokens_owed0)),
                    AbiToken::Uint(U256::from(p.tokens_owed1)),
                ]));
            }
        }

        if let Some(p) = state.pools.get(&to) {
            if sel == pool::slot0().short_signature() {
                return Ok(ethabi::encode(&[
                    AbiToken::Uint(p.sqrt_price_x96),
                    lp_dex::abi::int24(p.tick),
                    AbiToken::Uint(U256::zero()),
                    AbiToken::Uint(U256::one()),
                    AbiToken::Uint(U256::one()),
                    AbiToken::Uint(U256::zero()),
                    AbiToken::Bool(!p.sqrt_price_x96.is_zero()),
                ]));
            }
            if sel == pool::liquidity().short_signature() {
                return Ok(ethabi::encode(&[AbiToken::Uint(U256::from(p.liquidity))]));
            }
        }

        if sel == erc20::balance_of().short_signature() {
            let args = decode_args(&erc20::balance_of(), data).map_err(bad)?;
            let balance = state.balances.get(&(to, address(&args[0]))).copied().unwrap_or_default();
            return Ok(ethabi::encode(&[AbiToken::Uint(balance)]));
        }
        if sel == erc20::allowance().short_signature() {
            let args = decode_args(&erc20::allowance(), data).map_err(bad)?;
            let allowance = state
                .allowances
                .get(&(to, address(&args[0]), address(&args[1])))
                .copied()
                .unwrap_or_default();
            return Ok(ethabi::encode(&[AbiToken::Uint(allowance)]));
        }

        // No contract code at the address
        Ok(Vec::new())
    }

    /// Apply a transaction; `Err` is the revert reason
    fn apply(&self, state: &mut ChainState, tx: &TxRequest) -> Result<Vec<LogEntry>, String> {
        let sel = selector(&tx.data);
        let sender = self.owner;
        let c = &self.contracts;

        if tx.to == c.factory && sel == factory::create_pool().short_signature() {
            let args = decode_args(&factory::create_pool(), &tx.data)?;
            let fee = FeeTier::from_fee(uint(&args[2]).as_u32()).map_err(|e| e.to_string())?;
            let key = PoolKey::new(address(&args[0]), address(&args[1]), fee).map_err(|e| e.to_string())?;
            let pool = self.pool_address(&key);
            if state.pools.contains_key(&pool) {
                return Err("pool exists".into());
            }
            state.pools.insert(pool, MockPool::default());
            return Ok(Vec::new());
        }

        if sel == pool::initialize().short_signature() {
            let args = decode_args(&pool::initialize(), &tx.data)?;
            let pool = state.pools.get_mut(&tx.to).ok_or("no pool")?;
            if !pool.sqrt_price_x96.is_zero() {
                return Err("AI".into());
            }
            pool.sqrt_price_x96 = uint(&args[0]);
            pool.tick = get_tick_at_sqrt_ratio(pool.sqrt_price_x96).map_err(|e| e.to_string())?;
            return Ok(Vec::new());
        }

        if tx.to == c.position_manager {
            return self.apply_position_manager(state, sel, tx);
        }

        if tx.to == c.swap_router && sel == router::exact_input_single().short_signature() {
            let args = tuple(decode_args(&router::exact_input_single(), &tx.data)?);
            let token_in = address(&args[0]);
            let amount_in = uint(&args[5]);
            if tx.value.is_zero() {
                let allowance = state
                    .allowances
                    .get(&(token_in, sender, c.swap_router))
                    .copied()
                    .unwrap_or_default();
                if allowance < amount_in {
                    return Err("STF".into());
                }
            } else if tx.value != amount_in {
                return Err("value mismatch".into());
            }
            return Ok(Vec::new());
        }

        if sel == erc20::approve().short_signature() {
            let args = decode_args(&erc20::approve(), &tx.data)?;
            state
                .allowances
                .insert((tx.to, sender, address(&args[0])), uint(&args[1]));
            return Ok(Vec::new());
        }
        if sel == erc20::deposit().short_signature() {
            *state.balances.entry((tx.to, sender)).or_default() += tx.value;
            return Ok(Vec::new());
        }
        if sel == erc20::withdraw().short_signature() {
            let amount = uint(&decode_args(&erc20::withdraw(), &tx.data)?[0]);
            let balance = state.balances.entry((tx.to, sender)).or_default();
            if *balance < amount {
                return Err("insufficient balance".into());
            }
            *balance -= amount;
            return Ok(Vec::new());
        }

        Err(format!("unexpected call to {:?}", tx.to))
    }

    fn apply_position_manager(
        &self,
        state: &mut ChainState,
        sel: [u8; 4],
        tx: &TxRequest,
    ) -> Result<Vec<LogEntry>, String> {
        let manager = self.contracts.position_manager;

        if sel == position_manager::mint().short_signature() {
            let args = tuple(decode_args(&position_manager::mint(), &tx.data)?);
            let (token0, token1) = (address(&args[0]), address(&args[1]));
            let fee = uint(&args[2]).as_u32();
            let (tick_lower, tick_upper) = (int24(&args[3]), int24(&args[4]));
            let (desired0, desired1) = (uint(&args[5]), uint(&args[6]));
            let (min0, min1) = (uint(&args[7]), uint(&args[8]));
            let recipient = address(&args[9]);

            let key = PoolKey::new(token0, token1, FeeTier::from_fee(fee).map_err(|e| e.to_string())?)
                .map_err(|e| e.to_string())?;
            let pool_address = self.pool_address(&key);
            let pool = *state.pools.get(&pool_address).ok_or("no pool")?;
            let sqrt_lower = get_sqrt_ratio_at_tick(tick_lower).map_err(|e| e.to_string())?;
            let sqrt_upper = get_sqrt_ratio_at_tick(tick_upper).map_err(|e| e.to_string())?;
            let liquidity =
                get_liquidity_for_amounts(pool.sqrt_price_x96, sqrt_lower, sqrt_upper, desired0, desired1)
                    .map_err(|e| e.to_string())?;
            let (amount0, amount1) =
                get_amounts_for_liquidity(pool.sqrt_price_x96, sqrt_lower, sqrt_upper, liquidity, true)
                    .map_err(|e| e.to_string())?;
            if amount0 < min0 || amount1 < min1 {
                return Err("Price slippage check".into());
            }
            for (token, amount) in [(token0, amount0), (token1, amount1)] {
                let allowance = state
                    .allowances
                    .get(&(token, self.owner, manager))
                    .copied()
                    .unwrap_or_default();
                if allowance < amount {
                    return Err("STF".into());
                }
            }

            let token_id = U256::from(state.next_token_id);
            state.next_token_id += 1;
            state.positions.insert(
                token_id,
                MockPosition {
                    owner: recipient,
                    token0,
                    token1,
                    fee,
                    tick_lower,
                    tick_upper,
                    liquidity,
                    tokens_owed0: 0,
                    tokens_owed1: 0,
                },
            );
            if let Some(pool) = state.pools.get_mut(&pool_address) {
                if tick_lower <= pool.tick && pool.tick < tick_upper {
                    pool.liquidity += liquidity;
                }
            }

            let mut id_topic = [0u8; 32];
            token_id.to_big_endian(&mut id_topic);
            return Ok(vec![
                LogEntry {
                    address: manager,
                    topics: vec![
                        TRANSFER,
                        H256::zero(),
                        H256::from(recipient),
                        H256::from(id_topic),
                    ],
                    data: Vec::new(),
                },
                LogEntry {
                    address: manager,
                    topics: vec![INCREASE_LIQUIDITY, H256::from(id_topic)],
                    data: ethabi::encode(&[
                        AbiToken::Uint(U256::from(liquidity)),
                        AbiToken::Uint(amount0),
                        AbiToken::Uint(amount1),
                    ]),
                },
            ]);
        }

        if sel == position_manager::decrease_liquidity().short_signature() {
            let args = tuple(decode_args(&position_manager::decrease_liquidity(), &tx.data)?);
            let token_id = uint(&args[0]);
            let liquidity = uint(&args[1]).as_u128();
            let (min0, min1) = (uint(&args[2]), uint(&args[3]));

            let position = state.positions.get(&token_id).cloned().ok_or("Invalid token ID")?;
            if position.liquidity < liquidity {
                return Err("insufficient liquidity".into());
            }
            let key = PoolKey::new(
                position.token0,
                position.token1,
                FeeTier::from_fee(position.fee).map_err(|e| e.to_string())?,
            )
            .map_err(|e| e.to_string())?;
            let pool = *state.pools.get(&self.pool_address(&key)).ok_or("no pool")?;
            let (amount0, amount1) = get_amounts_for_liquidity(
                pool.sqrt_price_x96,
                get_sqrt_ratio_at_tick(position.tick_lower).map_err(|e| e.to_string())?,
                get_sqrt_ratio_at_tick(position.tick_upper).map_err(|e| e.to_string())?,
                liquidity,
                false,
            )
            .map_err(|e| e.to_string())?;
            if amount0 < min0 || amount1 < min1 {
                return Err("Price slippage check".into());
            }

            if let Some(position) = state.positions.get_mut(&token_id) {
                position.liquidity -= liquidity;
                position.tokens_owed0 += amount0.as_u128();
                position.tokens_owed1 += amount1.as_u128();
            }
            return Ok(Vec::new());
        }

        if sel == position_manager::collect().short_signature() {
            let args = tuple(decode_args(&position_manager::collect(), &tx.data)?);
            let token_id = uint(&args[0]);
            let recipient = address(&args[1]);
            let position = state.positions.get_mut(&token_id).ok_or("Invalid token ID")?;
            position.tokens_owed0 = 0;
            position.tokens_owed1 = 0;
            if let Some((token, amount)) = state.collect_payout {
                *state.balances.entry((token, recipient)).or_default() += amount;
            }
            return Ok(Vec::new());
        }

        if sel == position_manager::burn().short_signature() {
            let token_id = uint(&decode_args(&position_manager::burn(), &tx.data)?[0]);
            let position = state.positions.get(&token_id).ok_or("Invalid token ID")?;
            if position.liquidity != 0 || position.tokens_owed0 != 0 || position.tokens_owed1 != 0 {
                return Err("Not cleared".into());
            }
            state.positions.remove(&token_id);
            return Ok(Vec::new());
        }

        Err("unknown position manager call".into())
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let mut state = self.state();
        if let Some(err) = state.call_failures.pop_front() {
            return Err(err);
        }
        self.read(&mut state, to, &data)
    }
}

#[async_trait]
impl TransactionSigner for MockChain {
    fn address(&self) -> Address {
        self.owner
    }

    async fn submit(&self, tx: TxRequest) -> Result<H256, RpcError> {
        let mut state = self.state();
        if let Some(err) = state.submit_failures.pop_front() {
            return Err(err);
        }

        state.next_hash += 1;
        let tx_hash = H256::from_low_u64_be(state.next_hash);
        state.submitted.push(tx.clone());

        let scripted = state.revert_next.remove(&selector(&tx.data));
        let receipt = match scripted {
            Some(reason) => TxReceipt::reverted(tx_hash, Some(reason)),
            None => match self.apply(&mut state, &tx) {
                Ok(logs) => TxReceipt::succeeded(tx_hash, logs),
                Err(reason) => TxReceipt::reverted(tx_hash, Some(reason)),
            },
        };
        state.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }

    async fn await_receipt(&self, tx_hash: H256) -> Result<TxReceipt, RpcError> {
        let mut state = self.state();
        if let Some(err) = state.receipt_failures.pop_front() {
            return Err(err);
        }
        state
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| RpcError::Timeout(format!("unknown transaction {:?}", tx_hash)))
    }
}
