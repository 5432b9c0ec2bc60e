// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::RwLock;

use crate::blockchain::signing::Account;
use crate::blockchain::{Sponsor, ThorNode};
use crate::error::ApiError;
use crate::messenger::Messenger;
use crate::store::InMemoryStore;

/// Messenger over boxed chain and sponsor backends.
pub type SharedMessenger = Messenger<Box<dyn ThorNode>, Box<dyn Sponsor>>;

#[derive(Clone)]
pub struct AppState {
    pub messenger: Arc<SharedMessenger>,
    pub store: Arc<RwLock<InMemoryStore>>,
    /// Explorer base URL without trailing slash.
    pub explorer_url: Arc<str>,
}

impl AppState {
    pub fn new(messenger: SharedMessenger, store: InMemoryStore, explorer_url: &str) -> Self {
        Self {
            messenger: Arc::new(messenger),
            store: Arc::new(RwLock::new(store)),
            explorer_url: Arc::from(explorer_url.trim_end_matches('/')),
        }
    }

    /// Look up a keyring account, 404 when unknown.
    pub async fn account(&self, address: &Address) -> Result<Account, ApiError> {
        self.store
            .read()
            .await
            .get(address)
            .ok_or_else(|| ApiError::not_found(format!("Account {address} is not in the keyring")))
    }

    pub fn account_url(&self, address: &Address) -> String {
        format!("{}/accounts/{}", self.explorer_url, address.to_checksum(None))
    }
}
