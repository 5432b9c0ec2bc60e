// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key handling and recoverable secp256k1 signatures.
//!
//! Signatures are the 65-byte `r ‖ s ‖ v` form used by VeChainThor, with
//! `v ∈ {0, 1}`. A fee-delegated transaction carries two of them back to
//! back: the origin's first, the sponsor's second.

use std::fmt;

use alloy::primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};

/// Width of one recoverable signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// A 65-byte recoverable signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Parse a 65-byte signature whose recovery byte is 0/1 (or 27/28).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SigningError> {
        let mut raw: [u8; SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| SigningError::MalformedSignature(bytes.len()))?;
        raw[64] = match raw[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            v => return Err(SigningError::InvalidRecoveryId(v)),
        };
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn recovery_id(&self) -> u8 {
        self.0[64]
    }

    /// Recover the signer's public key from this signature and `hash`.
    pub fn recover(&self, hash: &B256) -> Result<VerifyingKey, SigningError> {
        let signature = EcdsaSignature::from_slice(&self.0[..64])
            .map_err(|e| SigningError::RecoveryFailed(e.to_string()))?;
        let recovery_id = RecoveryId::from_byte(self.recovery_id())
            .ok_or(SigningError::InvalidRecoveryId(self.recovery_id()))?;
        VerifyingKey::recover_from_prehash(hash.as_slice(), &signature, recovery_id)
            .map_err(|e| SigningError::RecoveryFailed(e.to_string()))
    }

    /// Recover the signer's address from this signature and `hash`.
    pub fn recover_address(&self, hash: &B256) -> Result<Address, SigningError> {
        self.recover(hash).map(|key| public_key_to_address(&key))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{})", alloy::primitives::hex::encode(self.0))
    }
}

/// Sign a 32-byte prehash with `key`.
pub fn sign(hash: &B256, key: &SigningKey) -> Result<Signature, SigningError> {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(hash.as_slice())
        .map_err(|e| SigningError::SigningFailed(e.to_string()))?;

    let mut raw = [0u8; SIGNATURE_LENGTH];
    raw[..64].copy_from_slice(&signature.to_bytes());
    raw[64] = recovery_id.to_byte();
    Ok(Signature(raw))
}

/// Concatenate origin and sponsor signatures. Origin always comes first.
pub fn compose_signature(origin: &Signature, sponsor: &Signature) -> Vec<u8> {
    let mut composed = Vec::with_capacity(SIGNATURE_LENGTH * 2);
    composed.extend_from_slice(origin.as_bytes());
    composed.extend_from_slice(sponsor.as_bytes());
    composed
}

/// Split a concatenated signature field into its fixed-width shares.
pub fn split_signatures(bytes: &[u8]) -> Result<Vec<Signature>, SigningError> {
    if bytes.is_empty() || bytes.len() % SIGNATURE_LENGTH != 0 {
        return Err(SigningError::MalformedSignature(bytes.len()));
    }
    bytes
        .chunks_exact(SIGNATURE_LENGTH)
        .map(Signature::from_slice)
        .collect()
}

/// Derive the 20-byte account address of a public key.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Parse an uncompressed (65 or 64 byte) or compressed (33 byte) public key.
pub fn parse_public_key(bytes: &[u8]) -> Result<VerifyingKey, SigningError> {
    let key = if bytes.len() == 64 {
        let mut prefixed = [0u8; 65];
        prefixed[0] = 0x04;
        prefixed[1..].copy_from_slice(bytes);
        VerifyingKey::from_sec1_bytes(&prefixed)
    } else {
        VerifyingKey::from_sec1_bytes(bytes)
    };
    key.map_err(|e| SigningError::InvalidPublicKey(e.to_string()))
}

/// A locally held account: private key plus derived address.
#[derive(Clone)]
pub struct Account {
    key: SigningKey,
    address: Address,
}

impl Account {
    /// Generate a fresh random account.
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::rngs::OsRng))
    }

    /// Create an account from a hex private key (with or without `0x`).
    pub fn from_private_key_hex(private_key_hex: &str) -> Result<Self, SigningError> {
        let key_bytes = alloy::primitives::hex::decode(private_key_hex.trim())
            .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;
        let key = SigningKey::from_slice(&key_bytes)
            .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_signing_key(key))
    }

    pub fn from_signing_key(key: SigningKey) -> Self {
        let address = public_key_to_address(key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    pub fn public_key(&self) -> &VerifyingKey {
        self.key.verifying_key()
    }

    /// `0x`-prefixed hex private key, the keyring persistence format.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", alloy::primitives::hex::encode(self.key.to_bytes()))
    }

    pub fn sign(&self, hash: &B256) -> Result<Signature, SigningError> {
        sign(hash, &self.key)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur while handling keys and signatures.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Malformed signature: {0} bytes is not a multiple of 65")]
    MalformedSignature(usize),

    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Public key recovery failed: {0}")]
    RecoveryFailed(String),
}
