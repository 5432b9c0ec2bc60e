// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! Addresses, token ids and transaction ids travel as `0x`-prefixed hex
//! strings.
//!
//! ## Model Categories
//!
//! - **Accounts**: Keyring entries and their registered names
//! - **Messages**: Inbox items and send requests
//! - **Transactions**: Confirmed write results with explorer links

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::Receipt;
use crate::messenger::Message;

// =============================================================================
// Accounts
// =============================================================================

/// Request to add an account to the keyring.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Hex private key to import. A random account is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// A keyring account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AccountResponse {
    pub address: String,
    /// Explorer page of the account.
    pub explorer_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountListResponse {
    pub accounts: Vec<AccountResponse>,
    pub total: usize,
}

/// Registered name of an address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NameResponse {
    pub address: String,
    /// `null` when the address never registered.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterNameRequest {
    pub name: String,
}

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Recipient address.
    pub to: String,
    pub message: String,
}

/// A decrypted inbox item.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Token id as a decimal string.
    pub token_id: String,
    pub payload: String,
    pub sender_address: String,
    pub sender_name: Option<String>,
    pub tx_id: Option<String>,
    /// Explorer page of the minting transaction.
    pub tx_explorer_url: Option<String>,
    pub encrypted_message: String,
}

impl MessageResponse {
    pub fn from_message(message: Message, explorer_url: &str) -> Self {
        Self {
            token_id: message.token_id.to_string(),
            payload: message.payload,
            sender_address: message.sender_address.to_checksum(None),
            sender_name: message.sender_name,
            tx_id: message.tx_id.map(|id| format!("{id:#x}")),
            tx_explorer_url: message
                .tx_id
                .map(|id| format!("{explorer_url}/transactions/{id:#x}#clauses")),
            encrypted_message: message.encrypted_message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageListResponse {
    pub messages: Vec<MessageResponse>,
    pub total: usize,
}

// =============================================================================
// Transactions
// =============================================================================

/// Result of a confirmed write.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub tx_id: String,
    pub block_number: u32,
    /// Address that paid the fee.
    pub gas_payer: Option<String>,
    pub explorer_url: String,
}

impl TransactionResponse {
    pub fn from_receipt(receipt: &Receipt, explorer_url: &str) -> Self {
        let tx_id = format!("{:#x}", receipt.meta.tx_id);
        Self {
            explorer_url: format!("{explorer_url}/transactions/{tx_id}"),
            tx_id,
            block_number: receipt.meta.block_number,
            gas_payer: receipt.gas_payer.map(|payer| payer.to_checksum(None)),
        }
    }
}
