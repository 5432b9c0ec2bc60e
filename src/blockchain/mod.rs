// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! VeChainThor integration.
//!
//! This module provides functionality for:
//! - Encoding and signing Thor transactions
//! - Fee delegation through a sponsor
//! - Waiting for receipts and diagnosing reverts
//! - Recovering public keys from past transactions
//! - Calling the Messages contract

pub mod client;
pub mod codec;
pub mod contract;
pub mod delegation;
pub mod receipt;
pub mod recovery;
pub mod signing;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use client::{ThorClient, ThorClientError, ThorNode};
pub use delegation::{DelegationError, FeeDelegation, Sponsor, SponsorClient};
pub use types::*;
