// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `NETWORK_URL` | Thor node REST endpoint | testnet node |
//! | `DELEGATE_URL` | Fee sponsor endpoint | testnet sponsor |
//! | `EXPLORER_URL` | Block explorer base URL | testnet explorer |
//! | `CONTRACT_ADDRESS` | Messages contract address | Required |
//! | `PRIVATE_KEYS` | Comma-delimited hex private keys seeding the keyring | empty |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use alloy::primitives::Address;

use crate::blockchain::THOR_TESTNET;

/// Environment variable name for the Thor node URL.
pub const NETWORK_URL_ENV: &str = "NETWORK_URL";

/// Environment variable name for the fee delegation endpoint.
pub const DELEGATE_URL_ENV: &str = "DELEGATE_URL";

/// Environment variable name for the block explorer base URL.
///
/// Only used to build links in API responses.
pub const EXPLORER_URL_ENV: &str = "EXPLORER_URL";

/// Environment variable name for the Messages contract address.
pub const CONTRACT_ADDRESS_ENV: &str = "CONTRACT_ADDRESS";

/// Environment variable name for the keyring seed.
///
/// Comma-delimited hex private keys; empty entries are skipped.
pub const PRIVATE_KEYS_ENV: &str = "PRIVATE_KEYS";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Settings needed to run the messenger service.
#[derive(Debug, Clone)]
pub struct MessengerConfig {
    pub node_url: String,
    pub delegate_url: String,
    pub explorer_url: String,
    pub contract_address: Address,
    pub private_keys: String,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl MessengerConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration from an arbitrary variable source.
    ///
    /// Values are trimmed; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let or_default = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let contract_address = get(CONTRACT_ADDRESS_ENV)
            .ok_or(ConfigError::Missing(CONTRACT_ADDRESS_ENV))?
            .parse()
            .map_err(|e| ConfigError::Invalid {
                name: CONTRACT_ADDRESS_ENV,
                reason: format!("{e}"),
            })?;

        let port = match get(PORT_ENV) {
            Some(port) => port.parse().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            node_url: or_default(NETWORK_URL_ENV, THOR_TESTNET.node_url),
            delegate_url: or_default(DELEGATE_URL_ENV, THOR_TESTNET.delegate_url),
            explorer_url: or_default(EXPLORER_URL_ENV, THOR_TESTNET.explorer_url)
                .trim_end_matches('/')
                .to_string(),
            contract_address,
            private_keys: get(PRIVATE_KEYS_ENV).unwrap_or_default(),
            host: or_default(HOST_ENV, DEFAULT_HOST),
            port,
            log_format,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
