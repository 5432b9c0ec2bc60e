// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Messaging protocol on top of the Messages contract.
//!
//! Every message is an ERC-721 token whose URI holds an envelope encrypted
//! to its owner. Sending mints one token for the recipient and, unless the
//! sender writes to themselves, a second copy encrypted to the sender so
//! the conversation stays readable from both sides. Recipient keys come
//! from the signature of their `SetName` registration transaction.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use k256::ecdsa::VerifyingKey;

use crate::blockchain::codec::Clause;
use crate::blockchain::contract::MessagesContract;
use crate::blockchain::delegation::{DelegationError, FeeDelegation, Sponsor};
use crate::blockchain::receipt::{await_receipt, ReceiptError, TxObserver};
use crate::blockchain::recovery::{recover_public_keys, RecoveryError};
use crate::blockchain::signing::{public_key_to_address, Account};
use crate::blockchain::{Receipt, ThorClientError, ThorNode};
use crate::envelope::{self, EnvelopeError};
use crate::key_cache::PublicKeyCache;

/// Observer for transaction lifecycle and inbox events.
pub trait MessengerObserver: TxObserver {
    /// An inbox item could not be read and was skipped.
    fn message_unreadable(&self, owner: Address, token_id: Option<U256>, error: &MessengerError) {
        tracing::warn!(
            owner = %owner,
            token_id = ?token_id,
            error = %error,
            "Skipping unreadable message"
        );
    }
}

/// Observer that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TxObserver for TracingObserver {}
impl MessengerObserver for TracingObserver {}

/// A decrypted inbox item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub token_id: U256,
    pub payload: String,
    pub sender_address: Address,
    pub sender_name: Option<String>,
    pub tx_id: Option<B256>,
    pub encrypted_message: String,
}

/// Register, send, read and delete messages for local accounts.
pub struct Messenger<N, S> {
    node: N,
    delegation: FeeDelegation<S>,
    contract: MessagesContract,
    keys: PublicKeyCache,
    observer: Arc<dyn MessengerObserver>,
}

impl<N: ThorNode, S: Sponsor> Messenger<N, S> {
    pub fn new(node: N, sponsor: S, contract: Address) -> Self {
        Self {
            node,
            delegation: FeeDelegation::new(sponsor),
            contract: MessagesContract::new(contract),
            keys: PublicKeyCache::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn MessengerObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_key_cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.keys = PublicKeyCache::new(capacity, ttl);
        self
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn sponsor(&self) -> &S {
        self.delegation.sponsor()
    }

    pub fn contract(&self) -> &MessagesContract {
        &self.contract
    }

    /// Record `name` for the account. Re-registering replaces the name.
    pub async fn register(&self, account: &Account, name: &str) -> Result<Receipt, MessengerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MessengerError::InvalidName);
        }
        let receipt = self
            .execute(account, vec![self.contract.set_name_clause(name)])
            .await?;
        self.keys.invalidate(&account.address());

        tracing::info!(address = %account.address(), name = %name, "Registered name");
        Ok(receipt)
    }

    /// Registered name of `address`, `None` when it never registered.
    pub async fn name_of(&self, address: Address) -> Result<Option<String>, MessengerError> {
        let name = self.contract.name_by_address(&self.node, address).await?;
        Ok(Some(name).filter(|n| !n.is_empty()))
    }

    /// Public key of a registered address, recovered from its newest registration.
    pub async fn recipient_key(&self, address: Address) -> Result<VerifyingKey, MessengerError> {
        if let Some(key) = self.keys.get(&address) {
            return Ok(key);
        }

        let registration = self
            .contract
            .latest_registration(&self.node, address)
            .await?
            .ok_or(MessengerError::NoRegistrationFound(address))?;

        let key = recover_public_keys(&self.node, registration.meta.tx_id)
            .await?
            .into_iter()
            .next()
            .ok_or(MessengerError::NoRegistrationFound(address))?;

        let recovered = public_key_to_address(&key);
        if recovered != address {
            return Err(MessengerError::KeyMismatch {
                expected: address,
                recovered,
            });
        }

        self.keys.put(address, key.clone());
        Ok(key)
    }

    /// Encrypt `text` for `to` and mint it, plus a self-copy when `to` is someone else.
    ///
    /// Fails with [`MessengerError::NoRegistrationFound`] before anything is
    /// signed when the recipient never registered.
    pub async fn send_message(
        &self,
        account: &Account,
        to: Address,
        text: &str,
    ) -> Result<Receipt, MessengerError> {
        let recipient_key = self.recipient_key(to).await?;

        let mut clauses = vec![self
            .contract
            .safe_mint_clause(to, envelope::encrypt_for(text, &recipient_key, account)?)];
        if to != account.address() {
            let own_copy = envelope::encrypt_for(text, account.public_key(), account)?;
            clauses.push(self.contract.safe_mint_clause(account.address(), own_copy));
        }

        let receipt = self.execute(account, clauses).await?;
        tracing::info!(
            from = %account.address(),
            to = %to,
            tx_id = %receipt.meta.tx_id,
            "Message sent"
        );
        Ok(receipt)
    }

    /// Every readable message owned by the account. Unreadable items are
    /// reported to the observer and skipped.
    pub async fn fetch_messages(&self, account: &Account) -> Result<Vec<Message>, MessengerError> {
        let owner = account.address();
        let balance = self.contract.balance_of(&self.node, owner).await?;
        let count = u64::try_from(balance).map_err(|_| {
            ThorClientError::ContractError(format!("implausible token balance {balance}"))
        })?;

        let mut messages = Vec::new();
        for index in 0..count {
            let token_id = match self
                .contract
                .token_of_owner_by_index(&self.node, owner, U256::from(index))
                .await
            {
                Ok(token_id) => token_id,
                Err(e) => {
                    self.observer.message_unreadable(owner, None, &e.into());
                    continue;
                }
            };

            match self.read_message(account, token_id).await {
                Ok(message) => messages.push(message),
                Err(e) => self.observer.message_unreadable(owner, Some(token_id), &e),
            }
        }

        tracing::debug!(owner = %owner, total = count, readable = messages.len(), "Fetched inbox");
        Ok(messages)
    }

    /// Burn one message token owned by the account.
    pub async fn delete_message(
        &self,
        account: &Account,
        token_id: U256,
    ) -> Result<Receipt, MessengerError> {
        self.execute(account, vec![self.contract.burn_clause(token_id)])
            .await
    }

    async fn read_message(
        &self,
        account: &Account,
        token_id: U256,
    ) -> Result<Message, MessengerError> {
        let encrypted_message = self.contract.token_uri(&self.node, token_id).await?;
        let (envelope, sender_address) = envelope::decrypt(&encrypted_message, account)?;

        let tx_id = match self.contract.latest_transfer(&self.node, token_id).await {
            Ok(log) => log.map(|log| log.meta.tx_id),
            Err(e) => {
                tracing::debug!(token_id = %token_id, error = %e, "Message transaction lookup failed");
                None
            }
        };
        let sender_name = match self.name_of(sender_address).await {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!(sender = %sender_address, error = %e, "Sender name lookup failed");
                None
            }
        };

        Ok(Message {
            token_id,
            payload: envelope.message,
            sender_address,
            sender_name,
            tx_id,
            encrypted_message,
        })
    }

    async fn execute(&self, account: &Account, clauses: Vec<Clause>) -> Result<Receipt, MessengerError> {
        let tx_id = self
            .delegation
            .send_clauses(&self.node, account, clauses)
            .await?;
        self.observer.submitted(tx_id);
        Ok(await_receipt(&self.node, tx_id, self.observer.as_ref()).await?)
    }
}

/// Errors surfaced by messaging operations.
#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    #[error("No registration found for {0}")]
    NoRegistrationFound(Address),

    #[error("Name must not be empty")]
    InvalidName,

    #[error("Registration of {expected} was signed by {recovered}")]
    KeyMismatch { expected: Address, recovered: Address },

    #[error(transparent)]
    Node(#[from] ThorClientError),

    #[error(transparent)]
    Delegation(#[from] DelegationError),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}
