// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-then-encrypt message envelope.
//!
//! The sender signs `keccak256(message)` and wraps message and signature in
//! a small JSON document. That document is encrypted to the recipient's
//! secp256k1 public key with ECIES:
//!
//! ```text
//! hex( ephemeral_pubkey_compressed(33) ‖ nonce(12) ‖ aes256gcm(ciphertext ‖ tag) )
//! ```
//!
//! The AES key is HKDF-SHA256 over the ECDH shared secret, salted with the
//! ephemeral public key. Decryption fails closed on any malformed or altered
//! byte, and the sender is authenticated by recovering the signer address.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use alloy::primitives::{keccak256, Address};
use hkdf::Hkdf;
use k256::{
    ecdh::diffie_hellman,
    ecdsa::VerifyingKey,
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey, SecretKey,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::blockchain::signing::{Account, Signature, SigningError};

const EPHEMERAL_KEY_LENGTH: usize = 33;
const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;
const HKDF_INFO: &[u8] = b"relational-messenger/envelope/v1";

/// A message together with its author's signature, as carried inside the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub message: String,
    /// `0x`-prefixed 65-byte signature with `v ∈ {27, 28}`
    pub signature: String,
}

impl SignedEnvelope {
    /// Sign `message` with `sender`'s key.
    pub fn sign(message: &str, sender: &Account) -> Result<Self, EnvelopeError> {
        let signature = sender.sign(&keccak256(message.as_bytes()))?;
        let mut bytes = *signature.as_bytes();
        bytes[64] += 27;
        Ok(Self {
            message: message.to_string(),
            signature: format!("0x{}", alloy::primitives::hex::encode(bytes)),
        })
    }

    /// Recover the address that signed this envelope.
    pub fn signer(&self) -> Result<Address, EnvelopeError> {
        let bytes = alloy::primitives::hex::decode(self.signature.trim())
            .map_err(|e| EnvelopeError::InvalidPayload(format!("signature: {e}")))?;
        let signature = Signature::from_slice(&bytes)?;
        Ok(signature.recover_address(&keccak256(self.message.as_bytes()))?)
    }
}

/// Sign `plaintext` as `sender` and encrypt it for `recipient`.
pub fn encrypt_for(
    plaintext: &str,
    recipient: &VerifyingKey,
    sender: &Account,
) -> Result<String, EnvelopeError> {
    let envelope = SignedEnvelope::sign(plaintext, sender)?;
    let payload = serde_json::to_vec(&envelope)
        .map_err(|e| EnvelopeError::InvalidPayload(e.to_string()))?;

    let ephemeral = SecretKey::random(&mut OsRng);
    let ephemeral_public = ephemeral.public_key().to_encoded_point(true);
    let shared = diffie_hellman(ephemeral.to_nonzero_scalar(), recipient.as_affine());
    let cipher = derive_cipher(shared.raw_secret_bytes(), ephemeral_public.as_bytes())?;

    let mut nonce = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), payload.as_slice())
        .map_err(|_| EnvelopeError::Encryption)?;

    let mut out = Vec::with_capacity(EPHEMERAL_KEY_LENGTH + NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(alloy::primitives::hex::encode(out))
}

/// Decrypt a message addressed to `recipient` and authenticate its sender.
pub fn decrypt(
    encrypted: &str,
    recipient: &Account,
) -> Result<(SignedEnvelope, Address), EnvelopeError> {
    let bytes = alloy::primitives::hex::decode(encrypted.trim())
        .map_err(|e| EnvelopeError::InvalidEncoding(e.to_string()))?;
    if bytes.len() < EPHEMERAL_KEY_LENGTH + NONCE_LENGTH + TAG_LENGTH {
        return Err(EnvelopeError::Truncated(bytes.len()));
    }

    let (ephemeral_public, rest) = bytes.split_at(EPHEMERAL_KEY_LENGTH);
    let (nonce, ciphertext) = rest.split_at(NONCE_LENGTH);

    let ephemeral =
        PublicKey::from_sec1_bytes(ephemeral_public).map_err(|_| EnvelopeError::InvalidEphemeralKey)?;
    let shared = diffie_hellman(
        recipient.signing_key().as_nonzero_scalar(),
        ephemeral.as_affine(),
    );
    let cipher = derive_cipher(shared.raw_secret_bytes(), ephemeral_public)?;

    let payload = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| EnvelopeError::Decryption)?;
    let envelope: SignedEnvelope = serde_json::from_slice(&payload)
        .map_err(|e| EnvelopeError::InvalidPayload(e.to_string()))?;
    let sender = envelope.signer()?;

    Ok((envelope, sender))
}

fn derive_cipher(shared_secret: &[u8], salt: &[u8]) -> Result<Aes256Gcm, EnvelopeError> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), shared_secret);
    let mut key = [0u8; 32];
    hkdf.expand(HKDF_INFO, &mut key)
        .map_err(|_| EnvelopeError::Encryption)?;
    Aes256Gcm::new_from_slice(&key).map_err(|_| EnvelopeError::Encryption)
}

/// Errors raised while sealing or opening an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Invalid ciphertext encoding: {0}")]
    InvalidEncoding(String),

    #[error("Ciphertext too short: {0} bytes")]
    Truncated(usize),

    #[error("Invalid ephemeral public key")]
    InvalidEphemeralKey,

    #[error("Encryption failed")]
    Encryption,

    #[error("Decryption failed")]
    Decryption,

    #[error("Invalid envelope payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid envelope signature: {0}")]
    Signature(#[from] SigningError),
}
