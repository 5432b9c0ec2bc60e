// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee delegation (VIP-191) write path.
//!
//! The origin never pays gas. Each transaction is built with the delegation
//! feature bit, sent unsigned to a sponsor that returns its signature over
//! `blake2b(signing_hash ‖ origin)`, then signed by the origin and submitted
//! with both signatures (origin first).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::client::{ThorClientError, ThorNode};
use super::codec::{Clause, Transaction};
use super::signing::{compose_signature, Account, Signature, SigningError};
use super::types::THOR_TESTNET;

/// Per-request HTTP timeout for the sponsor endpoint.
const SPONSOR_TIMEOUT: Duration = Duration::from_secs(15);

/// A fee sponsor that co-signs delegated transactions.
#[async_trait]
pub trait Sponsor: Send + Sync {
    /// Ask the sponsor to pay for `raw_unsigned` sent by `origin`.
    async fn request_sponsorship(
        &self,
        raw_unsigned: &[u8],
        origin: Address,
    ) -> Result<Signature, DelegationError>;
}

#[async_trait]
impl<T: Sponsor + ?Sized> Sponsor for Box<T> {
    async fn request_sponsorship(
        &self,
        raw_unsigned: &[u8],
        origin: Address,
    ) -> Result<Signature, DelegationError> {
        (**self).request_sponsorship(raw_unsigned, origin).await
    }
}

#[derive(Debug, Serialize)]
struct SponsorRequest {
    origin: Address,
    raw: String,
}

#[derive(Debug, Deserialize)]
struct SponsorResponse {
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for a sponsor endpoint (`POST {origin, raw} -> {signature} | {error}`).
#[derive(Debug, Clone)]
pub struct SponsorClient {
    url: String,
    http: Client,
}

impl SponsorClient {
    pub fn new(url: &str) -> Result<Self, DelegationError> {
        let parsed: url::Url = url
            .parse()
            .map_err(|e: url::ParseError| DelegationError::InvalidSponsorUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(SPONSOR_TIMEOUT)
            .build()
            .map_err(|e| DelegationError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: parsed.to_string(),
            http,
        })
    }

    /// Sponsor for the VeChainThor testnet.
    pub fn testnet() -> Result<Self, DelegationError> {
        Self::new(THOR_TESTNET.delegate_url)
    }
}

#[async_trait]
impl Sponsor for SponsorClient {
    async fn request_sponsorship(
        &self,
        raw_unsigned: &[u8],
        origin: Address,
    ) -> Result<Signature, DelegationError> {
        let request = SponsorRequest {
            origin,
            raw: format!("0x{}", alloy::primitives::hex::encode(raw_unsigned)),
        };

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DelegationError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DelegationError::Http(e.to_string()))?;

        parse_sponsor_response(status.is_success(), &body)
    }
}

/// Interpret a sponsor reply. An `error` field always wins and is surfaced verbatim.
fn parse_sponsor_response(success: bool, body: &str) -> Result<Signature, DelegationError> {
    let parsed: Option<SponsorResponse> = serde_json::from_str(body).ok();

    if let Some(error) = parsed.as_ref().and_then(|r| r.error.as_deref()) {
        return Err(DelegationError::SponsorshipRejected(error.to_string()));
    }
    if !success {
        return Err(DelegationError::Http(format!("sponsor returned {}", body.trim())));
    }

    let signature = parsed
        .and_then(|r| r.signature)
        .ok_or_else(|| DelegationError::InvalidSponsorResponse("missing signature".to_string()))?;
    let bytes = alloy::primitives::hex::decode(signature.trim())
        .map_err(|e| DelegationError::InvalidSponsorResponse(e.to_string()))?;
    Ok(Signature::from_slice(&bytes)?)
}

/// Nonce generator: wall-clock milliseconds, bumped to stay strictly increasing.
///
/// The node remains the final arbiter of nonce validity.
#[derive(Debug, Default)]
pub struct NonceSource {
    last: AtomicU64,
}

impl NonceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }
}

/// Signs, delegates and submits transactions on behalf of local accounts.
pub struct FeeDelegation<S> {
    sponsor: S,
    nonces: NonceSource,
}

impl<S: Sponsor> FeeDelegation<S> {
    pub fn new(sponsor: S) -> Self {
        Self {
            sponsor,
            nonces: NonceSource::new(),
        }
    }

    pub fn sponsor(&self) -> &S {
        &self.sponsor
    }

    /// Build and sign a delegated transaction carrying `clauses`.
    pub async fn sign_delegated<N: ThorNode + ?Sized>(
        &self,
        node: &N,
        account: &Account,
        clauses: Vec<Clause>,
    ) -> Result<Transaction, DelegationError> {
        let params = node.chain_params().await?;
        let mut tx = Transaction::build(clauses, params, self.nonces.next());

        let sponsor_signature = self
            .sponsor
            .request_sponsorship(&tx.encode_unsigned(), account.address())
            .await?;

        let sponsor = sponsor_signature.recover_address(&tx.delegator_signing_hash(account.address()))?;
        tracing::debug!(
            origin = %account.address(),
            sponsor = %sponsor,
            clauses = tx.clauses.len(),
            "Transaction sponsored"
        );

        let origin_signature = account.sign(&tx.signing_hash())?;
        tx.signature = Some(Bytes::from(compose_signature(
            &origin_signature,
            &sponsor_signature,
        )));
        Ok(tx)
    }

    /// Broadcast a fully signed transaction. This is irreversible; never resubmit.
    pub async fn submit<N: ThorNode + ?Sized>(
        &self,
        node: &N,
        tx: &Transaction,
    ) -> Result<B256, DelegationError> {
        if tx.signature.is_none() {
            return Err(DelegationError::Unsigned);
        }
        Ok(node.broadcast(&tx.encode_signed()).await?)
    }

    /// Full write path: build, sponsor, sign, submit.
    pub async fn send_clauses<N: ThorNode + ?Sized>(
        &self,
        node: &N,
        account: &Account,
        clauses: Vec<Clause>,
    ) -> Result<B256, DelegationError> {
        let tx = self.sign_delegated(node, account, clauses).await?;
        let id = self.submit(node, &tx).await?;

        let expected = tx.id(account.address());
        if id != expected {
            tracing::warn!(tx_id = %id, expected = %expected, "Node returned unexpected transaction id");
        }
        Ok(id)
    }
}

/// Errors that can occur on the delegated write path.
#[derive(Debug, thiserror::Error)]
pub enum DelegationError {
    #[error("Sponsorship rejected: {0}")]
    SponsorshipRejected(String),

    #[error("Invalid sponsor URL: {0}")]
    InvalidSponsorUrl(String),

    #[error("Sponsor request failed: {0}")]
    Http(String),

    #[error("Invalid sponsor response: {0}")]
    InvalidSponsorResponse(String),

    #[error("Transaction must be signed before submission")]
    Unsigned,

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Node(#[from] ThorClientError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::{MockSponsor, MockThor};

    #[test]
    fn sponsor_error_is_surfaced_verbatim() {
        let err = parse_sponsor_response(false, r#"{"error":"origin is not whitelisted"}"#)
            .unwrap_err();
        match err {
            DelegationError::SponsorshipRejected(reason) => {
                assert_eq!(reason, "origin is not whitelisted")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // An error field wins even on a 2xx reply.
        assert!(matches!(
            parse_sponsor_response(true, r#"{"error":"quota exceeded"}"#),
            Err(DelegationError::SponsorshipRejected(_))
        ));
    }

    #[test]
    fn sponsor_signature_is_parsed() {
        let account = Account::random();
        let signature = account.sign(&B256::repeat_byte(7)).unwrap();
        let body = format!(
            r#"{{"signature":"0x{}"}}"#,
            alloy::primitives::hex::encode(signature.as_bytes())
        );
        assert_eq!(parse_sponsor_response(true, &body).unwrap(), signature);
    }

    #[test]
    fn sponsor_reply_without_signature_is_invalid() {
        assert!(matches!(
            parse_sponsor_response(true, "{}"),
            Err(DelegationError::InvalidSponsorResponse(_))
        ));
        assert!(matches!(
            parse_sponsor_response(true, r#"{"signature":"0x1234"}"#),
            Err(DelegationError::Signing(SigningError::MalformedSignature(2)))
        ));
        assert!(matches!(
            parse_sponsor_response(false, "bad gateway"),
            Err(DelegationError::Http(_))
        ));
    }

    #[test]
    fn nonces_strictly_increase() {
        let nonces = NonceSource::new();
        let mut previous = nonces.next();
        for _ in 0..1000 {
            let next = nonces.next();
            assert!(next > previous);
            previous = next;
        }
    }

    #[tokio::test]
    async fn signed_transaction_carries_origin_then_sponsor() {
        let node = MockThor::new();
        let sponsor = MockSponsor::new();
        let sponsor_address = sponsor.address();
        let delegation = FeeDelegation::new(sponsor);
        let account = Account::random();

        let clause = Clause::call(Address::repeat_byte(0xcc), vec![1, 2, 3]);
        let tx = delegation
            .sign_delegated(&node, &account, vec![clause])
            .await
            .unwrap();

        assert!(tx.is_delegated());
        let signature = tx.signature.as_ref().unwrap();
        assert_eq!(signature.len(), 130);

        let origin = Signature::from_slice(&signature[..65]).unwrap();
        let sponsor = Signature::from_slice(&signature[65..]).unwrap();
        assert_eq!(
            origin.recover_address(&tx.signing_hash()).unwrap(),
            account.address()
        );
        assert_eq!(
            sponsor
                .recover_address(&tx.delegator_signing_hash(account.address()))
                .unwrap(),
            sponsor_address
        );
    }

    #[tokio::test]
    async fn send_clauses_returns_node_id() {
        let node = MockThor::new();
        let delegation = FeeDelegation::new(MockSponsor::new());
        let account = Account::random();

        let id = delegation
            .send_clauses(&node, &account, vec![])
            .await
            .unwrap();

        let raw = node.raw_transaction(id).await.unwrap().unwrap();
        let tx = Transaction::decode(&raw).unwrap();
        assert_eq!(tx.id(account.address()), id);
    }

    #[tokio::test]
    async fn rejected_sponsorship_submits_nothing() {
        let node = MockThor::new();
        let delegation = FeeDelegation::new(MockSponsor::rejecting("insufficient credit"));
        let account = Account::random();

        let err = delegation
            .send_clauses(&node, &account, vec![])
            .await
            .unwrap_err();

        assert!(matches!(err, DelegationError::SponsorshipRejected(ref r) if r == "insufficient credit"));
        assert_eq!(node.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn submit_refuses_unsigned_transaction() {
        let node = MockThor::new();
        let delegation = FeeDelegation::new(MockSponsor::new());
        let params = node.chain_params().await.unwrap();
        let tx = Transaction::build(vec![], params, 1);

        assert!(matches!(
            delegation.submit(&node, &tx).await,
            Err(DelegationError::Unsigned)
        ));
    }
}
