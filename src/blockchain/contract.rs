// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Messages contract bindings.
//!
//! The contract is an ERC-721 where every token is one encrypted message
//! (the token URI holds the ciphertext) plus a simple name registry.

use alloy::{
    primitives::{Address, B256, U256},
    sol,
    sol_types::{Revert, SolCall, SolError, SolEvent},
};

use super::client::{ThorClientError, ThorNode};
use super::codec::Clause;
use super::types::{address_topic, uint_topic, EventFilter, EventLog};

// Define the Messages interface using alloy's sol! macro
sol! {
    #[sol(all_derives)]
    interface IMessages {
        event SetName(address indexed userAddress, string name);
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        function nameByAddress(address userAddress) external view returns (string);
        function setName(string name) external;
        function balanceOf(address owner) external view returns (uint256);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
        function tokenURI(uint256 tokenId) external view returns (string);
        function safeMint(address to, string uri) external;
        function burn(uint256 tokenId) external;
    }
}

/// Messages contract wrapper: clause builders, read calls and event queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagesContract {
    address: Address,
}

impl MessagesContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn set_name_clause(&self, name: &str) -> Clause {
        let call = IMessages::setNameCall {
            name: name.to_string(),
        };
        Clause::call(self.address, call.abi_encode())
    }

    pub fn safe_mint_clause(&self, to: Address, uri: String) -> Clause {
        let call = IMessages::safeMintCall { to, uri };
        Clause::call(self.address, call.abi_encode())
    }

    pub fn burn_clause(&self, token_id: U256) -> Clause {
        let call = IMessages::burnCall { tokenId: token_id };
        Clause::call(self.address, call.abi_encode())
    }

    /// Current registered name for an address (empty when unregistered).
    pub async fn name_by_address<N: ThorNode + ?Sized>(
        &self,
        node: &N,
        user: Address,
    ) -> Result<String, ThorClientError> {
        self.call(node, IMessages::nameByAddressCall { userAddress: user })
            .await
    }

    pub async fn balance_of<N: ThorNode + ?Sized>(
        &self,
        node: &N,
        owner: Address,
    ) -> Result<U256, ThorClientError> {
        self.call(node, IMessages::balanceOfCall { owner }).await
    }

    pub async fn token_of_owner_by_index<N: ThorNode + ?Sized>(
        &self,
        node: &N,
        owner: Address,
        index: U256,
    ) -> Result<U256, ThorClientError> {
        self.call(node, IMessages::tokenOfOwnerByIndexCall { owner, index })
            .await
    }

    pub async fn token_uri<N: ThorNode + ?Sized>(
        &self,
        node: &N,
        token_id: U256,
    ) -> Result<String, ThorClientError> {
        self.call(node, IMessages::tokenURICall { tokenId: token_id })
            .await
    }

    /// Newest `SetName` event emitted for `user`.
    pub async fn latest_registration<N: ThorNode + ?Sized>(
        &self,
        node: &N,
        user: Address,
    ) -> Result<Option<EventLog>, ThorClientError> {
        let mut filter = EventFilter::latest(self.address, IMessages::SetName::SIGNATURE_HASH);
        filter.topic1 = Some(address_topic(user));
        Ok(node.filter_events(&filter).await?.into_iter().next())
    }

    /// Newest `Transfer` event touching `token_id` (its mint while the token exists).
    pub async fn latest_transfer<N: ThorNode + ?Sized>(
        &self,
        node: &N,
        token_id: U256,
    ) -> Result<Option<EventLog>, ThorClientError> {
        let mut filter = EventFilter::latest(self.address, IMessages::Transfer::SIGNATURE_HASH);
        filter.topic3 = Some(uint_topic(token_id));
        Ok(node.filter_events(&filter).await?.into_iter().next())
    }

    async fn call<N, C>(&self, node: &N, call: C) -> Result<C::Return, ThorClientError>
    where
        N: ThorNode + ?Sized,
        C: SolCall,
    {
        let clause = Clause::call(self.address, call.abi_encode());
        let mut results = node.simulate(&[clause], None).await?;
        let result = results
            .pop()
            .ok_or_else(|| ThorClientError::ContractError("empty call result".to_string()))?;

        if result.reverted {
            return Err(ThorClientError::ContractError(format!(
                "{} reverted: {}",
                C::SIGNATURE,
                revert_reason(&result.data).unwrap_or(result.vm_error)
            )));
        }

        C::abi_decode_returns(&result.data)
            .map_err(|e| ThorClientError::ContractError(format!("{}: {}", C::SIGNATURE, e)))
    }
}

/// Decode an `Error(string)` revert payload into its reason.
pub fn revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data)
        .ok()
        .map(|revert| revert.reason)
        .filter(|reason| !reason.is_empty())
}

/// Topic hash of the `SetName` event.
pub fn set_name_topic() -> B256 {
    IMessages::SetName::SIGNATURE_HASH
}

/// Topic hash of the `Transfer` event.
pub fn transfer_topic() -> B256 {
    IMessages::Transfer::SIGNATURE_HASH
}
