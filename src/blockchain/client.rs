// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! VeChainThor node client.
//!
//! [`ThorNode`] is the seam between the messaging core and the chain: every
//! read, simulation, log query and broadcast goes through it. [`ThorClient`]
//! implements it over the Thor REST API.

use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tokio::sync::OnceCell;

use super::codec::Clause;
use super::types::*;

/// Interval between head checks while waiting for the next block.
const DEFAULT_HEAD_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Per-request HTTP timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Chain node operations used by the messaging core.
#[async_trait]
pub trait ThorNode: Send + Sync {
    /// Genesis block (chain tag and default gas limit).
    async fn genesis(&self) -> Result<BlockSummary, ThorClientError>;

    /// Current head block.
    async fn best_block(&self) -> Result<BlockSummary, ThorClientError>;

    /// Resolve once the head has advanced past block number `after`.
    async fn next_block(&self, after: u32) -> Result<BlockSummary, ThorClientError>;

    /// Execute clauses read-only, optionally as `caller`.
    async fn simulate(
        &self,
        clauses: &[Clause],
        caller: Option<Address>,
    ) -> Result<Vec<CallResult>, ThorClientError>;

    /// Query event logs.
    async fn filter_events(&self, filter: &EventFilter) -> Result<Vec<EventLog>, ThorClientError>;

    /// Raw encoded transaction, `None` when the node does not know the id.
    async fn raw_transaction(&self, id: B256) -> Result<Option<Bytes>, ThorClientError>;

    /// Decoded transaction (origin and clauses), `None` when unknown.
    async fn transaction(&self, id: B256) -> Result<Option<TransactionDetail>, ThorClientError>;

    /// Receipt, `None` while the transaction is still pending.
    async fn receipt(&self, id: B256) -> Result<Option<Receipt>, ThorClientError>;

    /// Broadcast a fully signed transaction and return its id.
    async fn broadcast(&self, raw: &[u8]) -> Result<B256, ThorClientError>;

    /// Snapshot of the parameters needed to build a transaction.
    async fn chain_params(&self) -> Result<ChainParams, ThorClientError> {
        let genesis = self.genesis().await?;
        let head = self.best_block().await?;
        Ok(ChainParams::from_blocks(&genesis, &head))
    }
}

#[async_trait]
impl<T: ThorNode + ?Sized> ThorNode for Box<T> {
    async fn genesis(&self) -> Result<BlockSummary, ThorClientError> {
        (**self).genesis().await
    }

    async fn best_block(&self) -> Result<BlockSummary, ThorClientError> {
        (**self).best_block().await
    }

    async fn next_block(&self, after: u32) -> Result<BlockSummary, ThorClientError> {
        (**self).next_block(after).await
    }

    async fn simulate(
        &self,
        clauses: &[Clause],
        caller: Option<Address>,
    ) -> Result<Vec<CallResult>, ThorClientError> {
        (**self).simulate(clauses, caller).await
    }

    async fn filter_events(&self, filter: &EventFilter) -> Result<Vec<EventLog>, ThorClientError> {
        (**self).filter_events(filter).await
    }

    async fn raw_transaction(&self, id: B256) -> Result<Option<Bytes>, ThorClientError> {
        (**self).raw_transaction(id).await
    }

    async fn transaction(&self, id: B256) -> Result<Option<TransactionDetail>, ThorClientError> {
        (**self).transaction(id).await
    }

    async fn receipt(&self, id: B256) -> Result<Option<Receipt>, ThorClientError> {
        (**self).receipt(id).await
    }

    async fn broadcast(&self, raw: &[u8]) -> Result<B256, ThorClientError> {
        (**self).broadcast(raw).await
    }
}

#[derive(Debug, Deserialize)]
struct RawTransactionResponse {
    raw: Bytes,
}

#[derive(Debug, Deserialize)]
struct BroadcastResponse {
    id: B256,
}

#[derive(Debug, Serialize)]
struct CriteriaJson {
    address: Address,
    topic0: B256,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic1: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic2: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic3: Option<B256>,
}

/// VeChainThor REST client.
pub struct ThorClient {
    /// Node base URL without trailing slash
    base_url: String,
    http: Client,
    genesis: OnceCell<BlockSummary>,
    head_poll_interval: Duration,
}

impl ThorClient {
    /// Create a new client for the given node URL.
    pub fn new(node_url: &str) -> Result<Self, ThorClientError> {
        let url: url::Url = node_url
            .parse()
            .map_err(|e: url::ParseError| ThorClientError::InvalidNodeUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ThorClientError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: url.as_str().trim_end_matches('/').to_string(),
            http,
            genesis: OnceCell::new(),
            head_poll_interval: DEFAULT_HEAD_POLL_INTERVAL,
        })
    }

    /// Create a client for the VeChainThor testnet.
    pub fn testnet() -> Result<Self, ThorClientError> {
        Self::new(THOR_TESTNET.node_url)
    }

    /// Override how often the head is checked while waiting for a block.
    pub fn with_head_poll_interval(mut self, interval: Duration) -> Self {
        self.head_poll_interval = interval;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ThorClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ThorClientError::Http(format!("GET {path}: {e}")))?;
        Self::read_json(path, response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ThorClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ThorClientError::Http(format!("POST {path}: {e}")))?;
        Self::read_json(path, response).await
    }

    async fn read_json<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ThorClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ThorClientError::Rpc {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ThorClientError::Decode(format!("{path}: {e}")))
    }
}

#[async_trait]
impl ThorNode for ThorClient {
    async fn genesis(&self) -> Result<BlockSummary, ThorClientError> {
        self.genesis
            .get_or_try_init(|| self.get_json::<BlockSummary>("/blocks/0"))
            .await
            .cloned()
    }

    async fn best_block(&self) -> Result<BlockSummary, ThorClientError> {
        self.get_json("/blocks/best").await
    }

    async fn next_block(&self, after: u32) -> Result<BlockSummary, ThorClientError> {
        loop {
            let head = self.best_block().await?;
            if head.number > after {
                return Ok(head);
            }
            tokio::time::sleep(self.head_poll_interval).await;
        }
    }

    async fn simulate(
        &self,
        clauses: &[Clause],
        caller: Option<Address>,
    ) -> Result<Vec<CallResult>, ThorClientError> {
        let clauses: Vec<ClauseJson> = clauses.iter().cloned().map(ClauseJson::from).collect();
        let mut body = json!({ "clauses": clauses });
        if let Some(caller) = caller {
            body["caller"] = json!(caller);
        }
        self.post_json("/accounts/*", &body).await
    }

    async fn filter_events(&self, filter: &EventFilter) -> Result<Vec<EventLog>, ThorClientError> {
        let body = json!({
            "options": { "offset": filter.offset, "limit": filter.limit },
            "criteriaSet": [CriteriaJson {
                address: filter.address,
                topic0: filter.topic0,
                topic1: filter.topic1,
                topic2: filter.topic2,
                topic3: filter.topic3,
            }],
            "order": filter.order,
        });
        self.post_json("/logs/event", &body).await
    }

    async fn raw_transaction(&self, id: B256) -> Result<Option<Bytes>, ThorClientError> {
        let response: Option<RawTransactionResponse> = self
            .get_json(&format!("/transactions/{id:#x}?raw=true"))
            .await?;
        Ok(response.map(|r| r.raw))
    }

    async fn transaction(&self, id: B256) -> Result<Option<TransactionDetail>, ThorClientError> {
        self.get_json(&format!("/transactions/{id:#x}")).await
    }

    async fn receipt(&self, id: B256) -> Result<Option<Receipt>, ThorClientError> {
        self.get_json(&format!("/transactions/{id:#x}/receipt"))
            .await
    }

    async fn broadcast(&self, raw: &[u8]) -> Result<B256, ThorClientError> {
        let body = json!({ "raw": format!("0x{}", alloy::primitives::hex::encode(raw)) });
        let response: BroadcastResponse = self.post_json("/transactions", &body).await?;
        Ok(response.id)
    }
}

/// Errors that can occur while talking to a Thor node.
#[derive(Debug, thiserror::Error)]
pub enum ThorClientError {
    #[error("Invalid node URL: {0}")]
    InvalidNodeUrl(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Node returned {status}: {body}")]
    Rpc { status: u16, body: String },

    #[error("Invalid node response: {0}")]
    Decode(String),

    #[error("Contract error: {0}")]
    ContractError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_trailing_slash() {
        let client = ThorClient::new("https://testnet.veblocks.net/").unwrap();
        assert_eq!(client.base_url(), "https://testnet.veblocks.net");
    }

    #[test]
    fn new_rejects_invalid_url() {
        assert!(matches!(
            ThorClient::new("not a url"),
            Err(ThorClientError::InvalidNodeUrl(_))
        ));
    }

    #[test]
    fn criteria_omits_unset_topics() {
        let criteria = CriteriaJson {
            address: Address::repeat_byte(0x11),
            topic0: B256::repeat_byte(0x22),
            topic1: None,
            topic2: None,
            topic3: Some(B256::ZERO),
        };
        let value = serde_json::to_value(&criteria).unwrap();
        assert!(value.get("topic1").is_none());
        assert!(value.get("topic2").is_none());
        assert!(value.get("topic3").is_some());
    }

    #[test]
    fn event_log_deserializes_from_node_json() {
        let json = r#"[{
            "address": "0x0000000000000000000000000000456e65726779",
            "topics": [
                "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
                "0x0000000000000000000000006d95e6dca01d109882fe1726a2fb9865fa41e7aa"
            ],
            "data": "0x4be94d4e4b3b4c0000",
            "meta": {
                "blockID": "0x0004f6cc88bb4626a92907718e82f255b8fa511453a78e8797eb8cea3393b215",
                "blockNumber": 325324,
                "blockTimestamp": 1533267180,
                "txID": "0x284bba50ef777889ff1a367ed0b38d5e5626714477c40de38d71cedd6f9fa477",
                "txOrigin": "0x6d95e6dca01d109882fe1726a2fb9865fa41e7aa",
                "clauseIndex": 0
            }
        }]"#;

        let logs: Vec<EventLog> = serde_json::from_str(json).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].topics.len(), 2);
        assert_eq!(logs[0].meta.block_number, 325324);
    }

    #[test]
    fn missing_transaction_deserializes_as_none() {
        let response: Option<RawTransactionResponse> = serde_json::from_str("null").unwrap();
        assert!(response.is_none());
    }
}
