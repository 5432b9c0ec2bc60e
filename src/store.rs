// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory account keyring.
//!
//! Accounts are seeded from a comma-delimited list of hex private keys and
//! can be exported back to the same format. Nothing is written to disk.

use alloy::primitives::Address;

use crate::blockchain::signing::{Account, SigningError};

#[derive(Default)]
pub struct InMemoryStore {
    accounts: Vec<Account>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-delimited private key list. Empty entries are skipped.
    pub fn from_delimited(keys: &str) -> Result<Self, SigningError> {
        let mut store = Self::new();
        for key in keys.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            store.insert(key)?;
        }
        Ok(store)
    }

    /// Generate and keep a fresh account.
    pub fn add_random(&mut self) -> Account {
        let account = Account::random();
        self.accounts.push(account.clone());
        account
    }

    /// Import a hex private key. Importing a known key returns the existing account.
    pub fn insert(&mut self, private_key_hex: &str) -> Result<Account, SigningError> {
        let account = Account::from_private_key_hex(private_key_hex)?;
        if let Some(existing) = self.get(&account.address()) {
            return Ok(existing);
        }
        self.accounts.push(account.clone());
        Ok(account)
    }

    pub fn remove(&mut self, address: &Address) -> Option<Account> {
        let index = self
            .accounts
            .iter()
            .position(|account| &account.address() == address)?;
        Some(self.accounts.remove(index))
    }

    pub fn get(&self, address: &Address) -> Option<Account> {
        self.accounts
            .iter()
            .find(|account| &account.address() == address)
            .cloned()
    }

    /// Addresses in insertion order.
    pub fn list(&self) -> Vec<Address> {
        self.accounts.iter().map(Account::address).collect()
    }

    /// Export as the comma-delimited private key list accepted by [`Self::from_delimited`].
    pub fn to_delimited(&self) -> String {
        self.accounts
            .iter()
            .map(Account::private_key_hex)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
