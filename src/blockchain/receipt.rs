// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Receipt resolution and revert diagnosis.
//!
//! A submitted transaction is `Pending` until a receipt shows up, then either
//! confirmed or reverted. The resolver checks once per block and never gives
//! up on its own.

use alloy::primitives::B256;

use super::client::{ThorClientError, ThorNode};
use super::codec::Clause;
use super::contract::revert_reason;
use super::types::Receipt;

/// Reported when a reverted transaction carries no decodable reason.
pub const DEFAULT_REVERT_REASON: &str = "Transaction was reverted";

/// Hook notified as transactions move through their lifecycle.
pub trait TxObserver: Send + Sync {
    fn submitted(&self, tx_id: B256) {
        tracing::info!(tx_id = %tx_id, "Transaction submitted");
    }

    fn confirmed(&self, receipt: &Receipt) {
        tracing::info!(
            tx_id = %receipt.meta.tx_id,
            block = receipt.meta.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
    }

    fn reverted(&self, tx_id: B256, reason: &str) {
        tracing::warn!(tx_id = %tx_id, reason = %reason, "Transaction reverted");
    }
}

/// Wait for the receipt of `tx_id`, checking once per new block.
///
/// Returns the receipt when the transaction succeeded and
/// [`ReceiptError::TransactionReverted`] with the decoded reasons otherwise.
pub async fn await_receipt<N, O>(
    node: &N,
    tx_id: B256,
    observer: &O,
) -> Result<Receipt, ReceiptError>
where
    N: ThorNode + ?Sized,
    O: TxObserver + ?Sized,
{
    let mut head = node.best_block().await?.number;
    let receipt = loop {
        head = node.next_block(head).await?.number;
        if let Some(receipt) = node.receipt(tx_id).await? {
            break receipt;
        }
        tracing::debug!(tx_id = %tx_id, block = head, "Transaction still pending");
    };

    if !receipt.reverted {
        observer.confirmed(&receipt);
        return Ok(receipt);
    }

    let reason = match explain_revert(node, tx_id).await {
        Ok(reason) => reason,
        Err(e) => {
            tracing::warn!(tx_id = %tx_id, error = %e, "Failed to diagnose revert");
            DEFAULT_REVERT_REASON.to_string()
        }
    };
    observer.reverted(tx_id, &reason);
    Err(ReceiptError::TransactionReverted { tx_id, reason })
}

/// Replay a reverted transaction read-only as its origin and collect the
/// `Error(string)` reasons, joined with `", "`.
pub async fn explain_revert<N: ThorNode + ?Sized>(
    node: &N,
    tx_id: B256,
) -> Result<String, ThorClientError> {
    let Some(detail) = node.transaction(tx_id).await? else {
        return Ok(DEFAULT_REVERT_REASON.to_string());
    };

    let clauses: Vec<Clause> = detail.clauses.into_iter().map(Clause::from).collect();
    let results = node.simulate(&clauses, Some(detail.origin)).await?;

    let reasons: Vec<String> = results
        .iter()
        .filter(|result| result.reverted)
        .filter_map(|result| revert_reason(&result.data))
        .collect();

    if reasons.is_empty() {
        Ok(DEFAULT_REVERT_REASON.to_string())
    } else {
        Ok(reasons.join(", "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    #[error("Transaction reverted: {reason}")]
    TransactionReverted { tx_id: B256, reason: String },

    #[error(transparent)]
    Node(#[from] ThorClientError),
}
