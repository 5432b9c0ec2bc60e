// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public key recovery from historical transactions.
//!
//! Anyone who has sent a transaction has published their public key: it can
//! be recovered from the signature. The origin share is recovered against
//! the signing hash; a sponsor share against the delegator hash it signed.

use alloy::primitives::B256;
use k256::ecdsa::VerifyingKey;

use super::client::{ThorClientError, ThorNode};
use super::codec::{CodecError, Transaction};
use super::signing::{public_key_to_address, split_signatures, SigningError};

/// Recover every signer key of transaction `tx_id`, origin first.
pub async fn recover_public_keys<N: ThorNode + ?Sized>(
    node: &N,
    tx_id: B256,
) -> Result<Vec<VerifyingKey>, RecoveryError> {
    let raw = node
        .raw_transaction(tx_id)
        .await?
        .ok_or(RecoveryError::NoSuchTransaction(tx_id))?;
    recover_from_raw(&raw)
}

/// Recover the signer keys of an encoded, signed transaction.
pub fn recover_from_raw(raw: &[u8]) -> Result<Vec<VerifyingKey>, RecoveryError> {
    let tx = Transaction::decode(raw)?;
    let signature = tx
        .signature
        .as_ref()
        .ok_or(RecoveryError::MalformedSignature(0))?;
    let shares = split_signatures(signature).map_err(|e| match e {
        SigningError::MalformedSignature(len) => RecoveryError::MalformedSignature(len),
        other => RecoveryError::Signing(other),
    })?;

    let signing_hash = tx.signing_hash();
    let origin = shares[0].recover(&signing_hash)?;
    let mut keys = vec![origin];

    if shares.len() > 1 {
        let origin_address = public_key_to_address(&origin);
        let delegator_hash = tx.delegator_signing_hash(origin_address);
        for share in &shares[1..] {
            keys.push(share.recover(&delegator_hash)?);
        }
    }
    Ok(keys)
}

#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("No such transaction: {0}")]
    NoSuchTransaction(B256),

    #[error("Malformed signature: {0} bytes is not a multiple of 65")]
    MalformedSignature(usize),

    #[error("Invalid transaction: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Node(#[from] ThorClientError),
}
