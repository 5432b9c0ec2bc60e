// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Messenger - encrypted messaging on VeChainThor
//!
//! Messages are ECIES-encrypted to the recipient's public key and minted as
//! NFTs on a Messages contract. Every write is fee-delegated (VIP-191) so
//! local accounts never hold VTHO.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Thor REST client, transaction codec, fee delegation
//! - `envelope` - signed and encrypted message payloads
//! - `messenger` - registration, send, inbox and delete workflows
//! - `store` - in-memory keyring

pub mod api;
pub mod blockchain;
pub mod config;
pub mod envelope;
pub mod error;
pub mod key_cache;
pub mod messenger;
pub mod models;
pub mod state;
pub mod store;
