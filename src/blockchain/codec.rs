// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! VeChainThor transaction wire format.
//!
//! A Thor transaction is the RLP list
//!
//! ```text
//! [chainTag, blockRef, expiration, [[to, value, data], ...],
//!  gasPriceCoef, gas, dependsOn, nonce, reserved (, signature)]
//! ```
//!
//! Integers are encoded as minimal big-endian strings, an absent `to` or
//! `dependsOn` is the empty string and `reserved` is `[features]` with
//! trailing zero entries trimmed. The signing hash is blake2b-256 over the
//! list without the signature.

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    rlp::{BufMut, Decodable, Encodable, Header, EMPTY_STRING_CODE},
};
use blake2::{digest::consts::U32, Blake2b, Digest};

use super::types::{
    ChainParams, ClauseJson, DEFAULT_EXPIRATION, DEFAULT_GAS_PRICE_COEF, FEATURE_DELEGATION,
};

type Blake2b256 = Blake2b<U32>;

/// blake2b-256 over the concatenation of `parts`.
pub fn blake2b256(parts: &[&[u8]]) -> B256 {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    B256::from_slice(&hasher.finalize()[..])
}

/// One call or value transfer inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
}

impl Clause {
    /// A zero-value contract call.
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to: Some(to),
            value: U256::ZERO,
            data: data.into(),
        }
    }

    fn payload_length(&self) -> usize {
        let to_len = self.to.as_ref().map_or(1, |to| to.as_slice().length());
        to_len + self.value.length() + self.data.length()
    }
}

impl Encodable for Clause {
    fn encode(&self, out: &mut dyn BufMut) {
        Header {
            list: true,
            payload_length: self.payload_length(),
        }
        .encode(out);
        encode_optional(self.to.as_ref().map(|to| to.as_slice()), out);
        self.value.encode(out);
        self.data.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        payload_length + alloy::rlp::length_of_length(payload_length)
    }
}

impl Decodable for Clause {
    fn decode(buf: &mut &[u8]) -> alloy::rlp::Result<Self> {
        let mut body = take_list(buf)?;
        let to = match Bytes::decode(&mut body)? {
            raw if raw.is_empty() => None,
            raw if raw.len() == 20 => Some(Address::from_slice(&raw)),
            _ => return Err(alloy::rlp::Error::UnexpectedLength),
        };
        let value = U256::decode(&mut body)?;
        let data = Bytes::decode(&mut body)?;
        if !body.is_empty() {
            return Err(alloy::rlp::Error::ListLengthMismatch {
                expected: 0,
                got: body.len(),
            });
        }
        Ok(Self { to, value, data })
    }
}

impl From<Clause> for ClauseJson {
    fn from(clause: Clause) -> Self {
        Self {
            to: clause.to,
            value: clause.value,
            data: clause.data,
        }
    }
}

impl From<ClauseJson> for Clause {
    fn from(clause: ClauseJson) -> Self {
        Self {
            to: clause.to,
            value: clause.value,
            data: clause.data,
        }
    }
}

/// A VeChainThor transaction body with an optional signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub chain_tag: u8,
    pub block_ref: u64,
    pub expiration: u32,
    pub clauses: Vec<Clause>,
    pub gas_price_coef: u8,
    pub gas: u64,
    pub depends_on: Option<B256>,
    pub nonce: u64,
    pub features: u32,
    pub signature: Option<Bytes>,
}

impl Transaction {
    /// Assemble an unsigned, fee-delegated transaction.
    pub fn build(clauses: Vec<Clause>, params: ChainParams, nonce: u64) -> Self {
        Self {
            chain_tag: params.chain_tag,
            block_ref: params.block_ref,
            expiration: DEFAULT_EXPIRATION,
            clauses,
            gas_price_coef: DEFAULT_GAS_PRICE_COEF,
            gas: params.gas,
            depends_on: None,
            nonce,
            features: FEATURE_DELEGATION,
            signature: None,
        }
    }

    pub fn is_delegated(&self) -> bool {
        self.features & FEATURE_DELEGATION == FEATURE_DELEGATION
    }

    /// blake2b-256 over the unsigned body.
    pub fn signing_hash(&self) -> B256 {
        blake2b256(&[&self.encode_unsigned()])
    }

    /// The hash a fee sponsor signs: `blake2b(signing_hash ‖ origin)`.
    pub fn delegator_signing_hash(&self, origin: Address) -> B256 {
        blake2b256(&[self.signing_hash().as_slice(), origin.as_slice()])
    }

    /// Transaction id as assigned by the node for the given origin.
    pub fn id(&self, origin: Address) -> B256 {
        self.delegator_signing_hash(origin)
    }

    /// Encode without the signature (the form sent to the sponsor).
    pub fn encode_unsigned(&self) -> Vec<u8> {
        self.encode_with(false)
    }

    /// Encode including the signature when one is present.
    pub fn encode_signed(&self) -> Vec<u8> {
        self.encode_with(true)
    }

    /// Decode a raw transaction in signed or unsigned form.
    pub fn decode(raw: &[u8]) -> Result<Self, CodecError> {
        let mut buf = raw;
        let mut body = take_list(&mut buf)?;
        if !buf.is_empty() {
            return Err(CodecError::TrailingBytes(buf.len()));
        }

        let chain_tag = u8::decode(&mut body)?;
        let block_ref = u64::decode(&mut body)?;
        let expiration = u32::decode(&mut body)?;

        let mut clause_body = take_list(&mut body)?;
        let mut clauses = Vec::new();
        while !clause_body.is_empty() {
            clauses.push(Clause::decode(&mut clause_body)?);
        }

        let gas_price_coef = u8::decode(&mut body)?;
        let gas = u64::decode(&mut body)?;
        let depends_on = match Bytes::decode(&mut body)? {
            raw if raw.is_empty() => None,
            raw if raw.len() == 32 => Some(B256::from_slice(&raw)),
            raw => {
                return Err(CodecError::InvalidLength {
                    field: "dependsOn",
                    len: raw.len(),
                })
            }
        };
        let nonce = u64::decode(&mut body)?;

        let mut reserved = take_list(&mut body)?;
        let features = if reserved.is_empty() {
            0
        } else {
            u32::decode(&mut reserved)?
        };

        let signature = if body.is_empty() {
            None
        } else {
            Some(Bytes::decode(&mut body)?)
        };
        if !body.is_empty() {
            return Err(CodecError::TrailingBytes(body.len()));
        }

        Ok(Self {
            chain_tag,
            block_ref,
            expiration,
            clauses,
            gas_price_coef,
            gas,
            depends_on,
            nonce,
            features,
            signature,
        })
    }

    fn reserved_payload_length(&self) -> usize {
        if self.features == 0 {
            0
        } else {
            self.features.length()
        }
    }

    fn clauses_payload_length(&self) -> usize {
        self.clauses.iter().map(Encodable::length).sum()
    }

    fn payload_length(&self, with_signature: bool) -> usize {
        let clauses = self.clauses_payload_length();
        let reserved = self.reserved_payload_length();
        let mut len = self.chain_tag.length()
            + self.block_ref.length()
            + self.expiration.length()
            + clauses
            + alloy::rlp::length_of_length(clauses)
            + self.gas_price_coef.length()
            + self.gas.length()
            + self.depends_on.as_ref().map_or(1, |id| id.as_slice().length())
            + self.nonce.length()
            + reserved
            + alloy::rlp::length_of_length(reserved);
        if with_signature {
            if let Some(signature) = &self.signature {
                len += signature.length();
            }
        }
        len
    }

    fn encode_with(&self, with_signature: bool) -> Vec<u8> {
        let payload_length = self.payload_length(with_signature);
        let mut out = Vec::with_capacity(payload_length + 4);

        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.chain_tag.encode(&mut out);
        self.block_ref.encode(&mut out);
        self.expiration.encode(&mut out);

        Header {
            list: true,
            payload_length: self.clauses_payload_length(),
        }
        .encode(&mut out);
        for clause in &self.clauses {
            clause.encode(&mut out);
        }

        self.gas_price_coef.encode(&mut out);
        self.gas.encode(&mut out);
        encode_optional(self.depends_on.as_ref().map(|id| id.as_slice()), &mut out);
        self.nonce.encode(&mut out);

        Header {
            list: true,
            payload_length: self.reserved_payload_length(),
        }
        .encode(&mut out);
        if self.features != 0 {
            self.features.encode(&mut out);
        }

        if with_signature {
            if let Some(signature) = &self.signature {
                signature.encode(&mut out);
            }
        }
        out
    }
}

fn encode_optional(value: Option<&[u8]>, out: &mut dyn BufMut) {
    match value {
        Some(bytes) => bytes.encode(out),
        None => out.put_u8(EMPTY_STRING_CODE),
    }
}

/// Split one RLP list off the front of `buf`, returning its payload.
fn take_list<'a>(buf: &mut &'a [u8]) -> alloy::rlp::Result<&'a [u8]> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy::rlp::Error::UnexpectedString);
    }
    if buf.len() < header.payload_length {
        return Err(alloy::rlp::Error::InputTooShort);
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    Ok(payload)
}

/// Errors raised while decoding a raw transaction.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("RLP error: {0}")]
    Rlp(#[from] alloy::rlp::Error),

    #[error("Invalid {field} length: {len} bytes")]
    InvalidLength { field: &'static str, len: usize },

    #[error("Unexpected {0} trailing bytes")]
    TrailingBytes(usize),
}
