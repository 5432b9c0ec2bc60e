// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory Thor node and sponsor for tests.
//!
//! [`MockThor`] decodes real transactions, checks the origin and sponsor
//! signatures, and executes the Messages contract against an in-memory
//! ledger. Broadcast transactions stay pending until a block is produced,
//! which happens whenever someone waits on [`ThorNode::next_block`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    sol_types::{Revert, SolError, SolEvent, SolInterface, SolValue},
};
use async_trait::async_trait;

use super::client::{ThorClientError, ThorNode};
use super::codec::{blake2b256, Clause, Transaction};
use super::contract::IMessages;
use super::delegation::{DelegationError, Sponsor};
use super::signing::{split_signatures, Account, Signature};
use super::types::*;

const CHAIN_TAG: u8 = 0x27;
const GAS_LIMIT: u64 = 10_000_000;

#[derive(Debug, Clone, Default)]
struct Ledger {
    names: HashMap<Address, String>,
    owners: HashMap<U256, Address>,
    uris: HashMap<U256, String>,
    tokens: HashMap<Address, Vec<U256>>,
    revoked: HashSet<Address>,
    next_token: u64,
}

impl Ledger {
    fn mint(&mut self, to: Address, uri: String) -> U256 {
        self.next_token += 1;
        let token_id = U256::from(self.next_token);
        self.owners.insert(token_id, to);
        self.uris.insert(token_id, uri);
        self.tokens.entry(to).or_default().push(token_id);
        token_id
    }

    fn burn(&mut self, token_id: U256) -> Option<Address> {
        let owner = self.owners.remove(&token_id)?;
        self.uris.remove(&token_id);
        if let Some(tokens) = self.tokens.get_mut(&owner) {
            if let Some(index) = tokens.iter().position(|t| *t == token_id) {
                tokens.swap_remove(index);
            }
        }
        Some(owner)
    }
}

/// An event emitted by a clause, before block metadata is attached.
struct PendingLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
}

struct PendingTx {
    id: B256,
    origin: Address,
    delegator: Option<Address>,
    clauses: Vec<Clause>,
}

struct ChainState {
    genesis: BlockSummary,
    head: BlockSummary,
    ledger: Ledger,
    pending: Vec<PendingTx>,
    raw: HashMap<B256, Bytes>,
    details: HashMap<B256, TransactionDetail>,
    receipts: HashMap<B256, Receipt>,
    logs: Vec<EventLog>,
}

impl ChainState {
    fn produce_block(&mut self) {
        let number = self.head.number + 1;
        let mut id = blake2b256(&[b"block", &number.to_be_bytes()]);
        id.0[..4].copy_from_slice(&number.to_be_bytes());
        self.head = BlockSummary {
            id,
            number,
            gas_limit: GAS_LIMIT,
            timestamp: self.head.timestamp + 10,
        };

        for tx in std::mem::take(&mut self.pending) {
            self.execute(tx);
        }
    }

    fn execute(&mut self, tx: PendingTx) {
        let mut ledger = self.ledger.clone();
        let mut emitted = Vec::new();
        let mut reverted = false;
        for clause in &tx.clauses {
            if execute_clause(&mut ledger, tx.origin, clause, &mut emitted).is_err() {
                reverted = true;
                break;
            }
        }

        if !reverted {
            self.ledger = ledger;
            let meta = LogMeta {
                block_id: self.head.id,
                block_number: self.head.number,
                block_timestamp: self.head.timestamp,
                tx_id: tx.id,
                tx_origin: tx.origin,
            };
            self.logs.extend(emitted.into_iter().map(|log| EventLog {
                address: log.address,
                topics: log.topics,
                data: log.data,
                meta: meta.clone(),
            }));
        }

        self.receipts.insert(
            tx.id,
            Receipt {
                gas_used: 21_000 * tx.clauses.len().max(1) as u64,
                gas_payer: tx.delegator.or(Some(tx.origin)),
                reverted,
                meta: ReceiptMeta {
                    block_id: self.head.id,
                    block_number: self.head.number,
                    tx_id: tx.id,
                    tx_origin: tx.origin,
                },
            },
        );
    }
}

/// Run one clause against `ledger`. Errors carry the revert reason.
fn execute_clause(
    ledger: &mut Ledger,
    caller: Address,
    clause: &Clause,
    emitted: &mut Vec<PendingLog>,
) -> Result<Bytes, String> {
    let contract = clause.to.ok_or_else(String::new)?;
    let call = IMessages::IMessagesCalls::abi_decode(&clause.data).map_err(|_| String::new())?;

    let output = match call {
        IMessages::IMessagesCalls::nameByAddress(c) => ledger
            .names
            .get(&c.userAddress)
            .cloned()
            .unwrap_or_default()
            .abi_encode(),
        IMessages::IMessagesCalls::balanceOf(c) => {
            let count = ledger.tokens.get(&c.owner).map_or(0, Vec::len);
            U256::from(count).abi_encode()
        }
        IMessages::IMessagesCalls::tokenOfOwnerByIndex(c) => ledger
            .tokens
            .get(&c.owner)
            .and_then(|tokens| tokens.get(usize::try_from(c.index).ok()?))
            .ok_or("ERC721Enumerable: owner index out of bounds")?
            .abi_encode(),
        IMessages::IMessagesCalls::tokenURI(c) => ledger
            .uris
            .get(&c.tokenId)
            .ok_or("ERC721: invalid token ID")?
            .abi_encode(),
        IMessages::IMessagesCalls::setName(c) => {
            if caller.is_zero() {
                return Err("Messages: caller is the zero address".to_string());
            }
            ledger.names.insert(caller, c.name.clone());
            let event = IMessages::SetName {
                userAddress: caller,
                name: c.name,
            };
            emitted.push(PendingLog {
                address: contract,
                topics: vec![IMessages::SetName::SIGNATURE_HASH, address_topic(caller)],
                data: event.encode_data().into(),
            });
            Vec::new()
        }
        IMessages::IMessagesCalls::safeMint(c) => {
            if ledger.revoked.contains(&c.to) {
                return Err("Messages: recipient registration revoked".to_string());
            }
            let token_id = ledger.mint(c.to, c.uri);
            emitted.push(transfer_log(contract, Address::ZERO, c.to, token_id));
            Vec::new()
        }
        IMessages::IMessagesCalls::burn(c) => {
            let owner = *ledger
                .owners
                .get(&c.tokenId)
                .ok_or("ERC721: invalid token ID")?;
            if owner != caller {
                return Err("Messages: caller is not token owner".to_string());
            }
            ledger.burn(c.tokenId);
            emitted.push(transfer_log(contract, owner, Address::ZERO, c.tokenId));
            Vec::new()
        }
    };
    Ok(output.into())
}

fn transfer_log(contract: Address, from: Address, to: Address, token_id: U256) -> PendingLog {
    PendingLog {
        address: contract,
        topics: vec![
            IMessages::Transfer::SIGNATURE_HASH,
            address_topic(from),
            address_topic(to),
            uint_topic(token_id),
        ],
        data: Bytes::new(),
    }
}

fn rejected(body: impl Into<String>) -> ThorClientError {
    ThorClientError::Rpc {
        status: 400,
        body: body.into(),
    }
}

/// In-memory Thor node running the Messages contract.
pub struct MockThor {
    state: Mutex<ChainState>,
    broadcasts: AtomicUsize,
}

impl MockThor {
    pub fn new() -> Self {
        let mut genesis_id = blake2b256(&[b"genesis"]);
        genesis_id.0[31] = CHAIN_TAG;
        let genesis = BlockSummary {
            id: genesis_id,
            number: 0,
            gas_limit: GAS_LIMIT,
            timestamp: 1_700_000_000,
        };

        Self {
            state: Mutex::new(ChainState {
                head: genesis.clone(),
                genesis,
                ledger: Ledger::default(),
                pending: Vec::new(),
                raw: HashMap::new(),
                details: HashMap::new(),
                receipts: HashMap::new(),
                logs: Vec::new(),
            }),
            broadcasts: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    /// Number of transactions accepted by [`ThorNode::broadcast`].
    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.load(Ordering::SeqCst)
    }

    /// Produce a block, executing every pending transaction.
    pub fn produce_block(&self) {
        self.state().produce_block();
    }

    /// Clear a registration and refuse further mints to `user`.
    /// The `SetName` event history is left untouched.
    pub fn revoke_registration(&self, user: Address) {
        let mut state = self.state();
        state.ledger.names.remove(&user);
        state.ledger.revoked.insert(user);
    }

    /// Mint a token straight into the ledger, bypassing transactions.
    pub fn mint_unchecked(&self, contract: Address, to: Address, uri: &str) -> U256 {
        let mut state = self.state();
        let token_id = state.ledger.mint(to, uri.to_string());
        let log = transfer_log(contract, Address::ZERO, to, token_id);
        let meta = LogMeta {
            block_id: state.head.id,
            block_number: state.head.number,
            block_timestamp: state.head.timestamp,
            tx_id: blake2b256(&[b"unchecked", &token_id.to_be_bytes::<32>()]),
            tx_origin: Address::ZERO,
        };
        state.logs.push(EventLog {
            address: log.address,
            topics: log.topics,
            data: log.data,
            meta,
        });
        token_id
    }

    /// Store an arbitrary raw transaction under `id`.
    pub fn insert_raw_transaction(&self, id: B256, raw: Vec<u8>) {
        self.state().raw.insert(id, raw.into());
    }

    /// Tokens currently owned by `owner`.
    pub fn tokens_of(&self, owner: Address) -> Vec<U256> {
        self.state()
            .ledger
            .tokens
            .get(&owner)
            .cloned()
            .unwrap_or_default()
    }

    fn verify(tx: &Transaction) -> Result<(Address, Option<Address>), ThorClientError> {
        let signature = tx
            .signature
            .as_ref()
            .ok_or_else(|| rejected("tx rejected: unsigned"))?;
        let signatures =
            split_signatures(signature).map_err(|e| rejected(format!("tx rejected: {e}")))?;

        let origin = signatures[0]
            .recover_address(&tx.signing_hash())
            .map_err(|e| rejected(format!("tx rejected: {e}")))?;

        match (tx.is_delegated(), signatures.len()) {
            (false, 1) => Ok((origin, None)),
            (true, 2) => {
                let sponsor = signatures[1]
                    .recover_address(&tx.delegator_signing_hash(origin))
                    .map_err(|e| rejected(format!("tx rejected: {e}")))?;
                Ok((origin, Some(sponsor)))
            }
            _ => Err(rejected("tx rejected: invalid signature length")),
        }
    }
}

impl Default for MockThor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThorNode for MockThor {
    async fn genesis(&self) -> Result<BlockSummary, ThorClientError> {
        Ok(self.state().genesis.clone())
    }

    async fn best_block(&self) -> Result<BlockSummary, ThorClientError> {
        Ok(self.state().head.clone())
    }

    async fn next_block(&self, after: u32) -> Result<BlockSummary, ThorClientError> {
        let mut state = self.state();
        while state.head.number <= after {
            state.produce_block();
        }
        Ok(state.head.clone())
    }

    async fn simulate(
        &self,
        clauses: &[Clause],
        caller: Option<Address>,
    ) -> Result<Vec<CallResult>, ThorClientError> {
        let mut ledger = self.state().ledger.clone();
        let caller = caller.unwrap_or(Address::ZERO);

        let mut results = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let mut emitted = Vec::new();
            match execute_clause(&mut ledger, caller, clause, &mut emitted) {
                Ok(data) => results.push(CallResult {
                    data,
                    reverted: false,
                    vm_error: String::new(),
                }),
                Err(reason) => {
                    let data = if reason.is_empty() {
                        Bytes::new()
                    } else {
                        Revert { reason }.abi_encode().into()
                    };
                    results.push(CallResult {
                        data,
                        reverted: true,
                        vm_error: "execution reverted".to_string(),
                    });
                    break;
                }
            }
        }
        Ok(results)
    }

    async fn filter_events(&self, filter: &EventFilter) -> Result<Vec<EventLog>, ThorClientError> {
        let state = self.state();
        let mut logs: Vec<EventLog> = state
            .logs
            .iter()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect();
        if filter.order == LogOrder::Desc {
            logs.reverse();
        }
        Ok(logs
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn raw_transaction(&self, id: B256) -> Result<Option<Bytes>, ThorClientError> {
        Ok(self.state().raw.get(&id).cloned())
    }

    async fn transaction(&self, id: B256) -> Result<Option<TransactionDetail>, ThorClientError> {
        Ok(self.state().details.get(&id).cloned())
    }

    async fn receipt(&self, id: B256) -> Result<Option<Receipt>, ThorClientError> {
        Ok(self.state().receipts.get(&id).cloned())
    }

    async fn broadcast(&self, raw: &[u8]) -> Result<B256, ThorClientError> {
        let tx = Transaction::decode(raw).map_err(|e| rejected(format!("bad tx: {e}")))?;
        let (origin, delegator) = Self::verify(&tx)?;
        let id = tx.id(origin);

        let mut state = self.state();
        if tx.chain_tag != state.genesis.id[31] {
            return Err(rejected("tx rejected: chain tag mismatch"));
        }
        if state.raw.contains_key(&id) {
            return Err(rejected("tx rejected: known tx"));
        }

        state.raw.insert(id, Bytes::copy_from_slice(raw));
        state.details.insert(
            id,
            TransactionDetail {
                id,
                origin,
                delegator,
                clauses: tx.clauses.iter().cloned().map(ClauseJson::from).collect(),
            },
        );
        state.pending.push(PendingTx {
            id,
            origin,
            delegator,
            clauses: tx.clauses,
        });
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }
}

/// Sponsor that co-signs everything with its own key, or rejects with a fixed reason.
pub struct MockSponsor {
    account: Account,
    rejection: Option<String>,
    requests: AtomicUsize,
}

impl MockSponsor {
    pub fn new() -> Self {
        Self {
            account: Account::random(),
            rejection: None,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            rejection: Some(reason.to_string()),
            ..Self::new()
        }
    }

    pub fn address(&self) -> Address {
        self.account.address()
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Default for MockSponsor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sponsor for MockSponsor {
    async fn request_sponsorship(
        &self,
        raw_unsigned: &[u8],
        origin: Address,
    ) -> Result<Signature, DelegationError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.rejection {
            return Err(DelegationError::SponsorshipRejected(reason.clone()));
        }
        let tx = Transaction::decode(raw_unsigned)
            .map_err(|e| DelegationError::InvalidSponsorResponse(e.to_string()))?;
        Ok(self.account.sign(&tx.delegator_signing_hash(origin))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::contract::MessagesContract;
    use crate::blockchain::delegation::FeeDelegation;

    #[tokio::test]
    async fn broadcast_stays_pending_until_next_block() {
        let node = MockThor::new();
        let contract = MessagesContract::new(Address::repeat_byte(0xcc));
        let delegation = FeeDelegation::new(MockSponsor::new());
        let alice = Account::random();

        let id = delegation
            .send_clauses(&node, &alice, vec![contract.set_name_clause("alice")])
            .await
            .unwrap();
        assert!(node.receipt(id).await.unwrap().is_none());

        let head = node.best_block().await.unwrap();
        node.next_block(head.number).await.unwrap();

        let receipt = node.receipt(id).await.unwrap().unwrap();
        assert!(!receipt.reverted);
        assert_eq!(receipt.meta.tx_origin, alice.address());
        assert_eq!(
            contract.name_by_address(&node, alice.address()).await.unwrap(),
            "alice"
        );
    }

    #[tokio::test]
    async fn broadcast_rejects_missing_sponsor_signature() {
        let node = MockThor::new();
        let alice = Account::random();
        let params = node.chain_params().await.unwrap();
        let mut tx = Transaction::build(vec![], params, 1);
        tx.signature = Some(Bytes::copy_from_slice(
            alice.sign(&tx.signing_hash()).unwrap().as_bytes(),
        ));

        assert!(matches!(
            node.broadcast(&tx.encode_signed()).await,
            Err(ThorClientError::Rpc { status: 400, .. })
        ));
        assert_eq!(node.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn simulate_reports_revert_reason() {
        let node = MockThor::new();
        let contract = MessagesContract::new(Address::repeat_byte(0xcc));
        let clause = contract.burn_clause(U256::from(42u64));

        let results = node
            .simulate(&[clause], Some(Address::repeat_byte(1)))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].reverted);
        assert_eq!(
            crate::blockchain::contract::revert_reason(&results[0].data).as_deref(),
            Some("ERC721: invalid token ID")
        );
    }
}
