// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// VeChainThor network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Thor REST endpoint URL
    pub node_url: &'static str,
    /// Fee delegation (sponsor) endpoint URL
    pub delegate_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// VeChainThor testnet configuration.
pub const THOR_TESTNET: NetworkConfig = NetworkConfig {
    name: "VeChainThor Testnet",
    node_url: "https://testnet.veblocks.net",
    delegate_url: "https://sponsor-testnet.vechain.energy/by/90",
    explorer_url: "https://explore-testnet.vechain.org",
};

/// Default transaction expiration, in blocks.
pub const DEFAULT_EXPIRATION: u32 = 32;

/// Default gas price coefficient.
pub const DEFAULT_GAS_PRICE_COEF: u8 = 128;

/// Reserved feature bit enabling fee delegation (VIP-191).
pub const FEATURE_DELEGATION: u32 = 1;

/// Snapshot of the chain parameters a transaction is built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    /// Last byte of the genesis block id
    pub chain_tag: u8,
    /// First 8 bytes of the head block id
    pub block_ref: u64,
    /// Gas limit applied to the whole transaction
    pub gas: u64,
}

impl ChainParams {
    /// Derive chain parameters from the genesis and head blocks.
    pub fn from_blocks(genesis: &BlockSummary, head: &BlockSummary) -> Self {
        let mut block_ref = [0u8; 8];
        block_ref.copy_from_slice(&head.id[..8]);
        Self {
            chain_tag: genesis.id[31],
            block_ref: u64::from_be_bytes(block_ref),
            gas: genesis.gas_limit,
        }
    }
}

/// Minimal block header as returned by `GET /blocks/{revision}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    pub id: B256,
    pub number: u32,
    pub gas_limit: u64,
    #[serde(default)]
    pub timestamp: u64,
}

/// A clause as exchanged with the Thor REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseJson {
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
}

/// Transaction detail as returned by `GET /transactions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    pub id: B256,
    pub origin: Address,
    #[serde(default)]
    pub delegator: Option<Address>,
    pub clauses: Vec<ClauseJson>,
}

/// Metadata attached to receipts and event logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMeta {
    #[serde(rename = "blockID")]
    pub block_id: B256,
    pub block_number: u32,
    #[serde(default)]
    pub block_timestamp: u64,
    #[serde(rename = "txID")]
    pub tx_id: B256,
    pub tx_origin: Address,
}

/// Transaction receipt as returned by `GET /transactions/{id}/receipt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub gas_used: u64,
    #[serde(default)]
    pub gas_payer: Option<Address>,
    pub reverted: bool,
    pub meta: ReceiptMeta,
}

/// Receipt metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptMeta {
    #[serde(rename = "blockID")]
    pub block_id: B256,
    pub block_number: u32,
    #[serde(rename = "txID")]
    pub tx_id: B256,
    pub tx_origin: Address,
}

/// One decoded event log from `POST /logs/event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub meta: LogMeta,
}

/// Ordering of an event query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOrder {
    Asc,
    Desc,
}

/// Event query: one contract, one event signature, optional indexed topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub address: Address,
    pub topic0: B256,
    pub topic1: Option<B256>,
    pub topic2: Option<B256>,
    pub topic3: Option<B256>,
    pub order: LogOrder,
    pub offset: u64,
    pub limit: u64,
}

impl EventFilter {
    /// Newest-first query for a single matching log.
    pub fn latest(address: Address, topic0: B256) -> Self {
        Self {
            address,
            topic0,
            topic1: None,
            topic2: None,
            topic3: None,
            order: LogOrder::Desc,
            offset: 0,
            limit: 1,
        }
    }

    /// Check whether a log satisfies this filter's address and topics.
    pub fn matches(&self, log: &EventLog) -> bool {
        let topic_ok = |index: usize, wanted: &Option<B256>| match wanted {
            Some(topic) => log.topics.get(index) == Some(topic),
            None => true,
        };
        log.address == self.address
            && log.topics.first() == Some(&self.topic0)
            && topic_ok(1, &self.topic1)
            && topic_ok(2, &self.topic2)
            && topic_ok(3, &self.topic3)
    }
}

/// Output of a read-only clause execution (`POST /accounts/*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    pub data: Bytes,
    pub reverted: bool,
    #[serde(default)]
    pub vm_error: String,
}

/// Left-pad an address into a 32-byte indexed topic.
pub fn address_topic(address: Address) -> B256 {
    address.into_word()
}

/// Encode a uint256 into a 32-byte indexed topic.
pub fn uint_topic(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}
