// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keyring and name registration endpoints.
//!
//! Accounts live only in the in-memory keyring. Private keys are accepted on
//! import but never returned.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::parse_address;
use crate::{
    error::ApiError,
    models::{
        AccountListResponse, AccountResponse, CreateAccountRequest, NameResponse,
        RegisterNameRequest, TransactionResponse,
    },
    state::AppState,
};

/// List keyring accounts.
#[utoipa::path(
    get,
    path = "/v1/accounts",
    tag = "Accounts",
    responses(
        (status = 200, description = "Keyring accounts", body = AccountListResponse)
    )
)]
pub async fn list_accounts(State(state): State<AppState>) -> Json<AccountListResponse> {
    let addresses = state.store.read().await.list();
    let accounts: Vec<AccountResponse> = addresses
        .iter()
        .map(|address| AccountResponse {
            address: address.to_checksum(None),
            explorer_url: state.account_url(address),
        })
        .collect();

    Json(AccountListResponse {
        total: accounts.len(),
        accounts,
    })
}

/// Add an account: import a private key or generate a new one.
#[utoipa::path(
    post,
    path = "/v1/accounts",
    tag = "Accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account added", body = AccountResponse),
        (status = 400, description = "Invalid private key")
    )
)]
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let account = {
        let mut store = state.store.write().await;
        match request.private_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => store.insert(key)?,
            _ => store.add_random(),
        }
    };

    tracing::info!(address = %account.address(), "Account added to keyring");

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            address: account.address().to_checksum(None),
            explorer_url: state.account_url(&account.address()),
        }),
    ))
}

/// Remove an account from the keyring.
#[utoipa::path(
    delete,
    path = "/v1/accounts/{address}",
    tag = "Accounts",
    params(("address" = String, Path, description = "Account address")),
    responses(
        (status = 204, description = "Account removed"),
        (status = 404, description = "Account not in keyring")
    )
)]
pub async fn delete_account(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<StatusCode, ApiError> {
    let address = parse_address(&address)?;
    state
        .store
        .write()
        .await
        .remove(&address)
        .ok_or_else(|| ApiError::not_found(format!("Account {address} is not in the keyring")))?;

    tracing::info!(address = %address, "Account removed from keyring");
    Ok(StatusCode::NO_CONTENT)
}

/// Registered name of any address.
#[utoipa::path(
    get,
    path = "/v1/accounts/{address}/name",
    tag = "Accounts",
    params(("address" = String, Path, description = "Any address")),
    responses(
        (status = 200, description = "Registered name, null when unregistered", body = NameResponse),
        (status = 400, description = "Invalid address"),
        (status = 502, description = "Node unavailable")
    )
)]
pub async fn get_name(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<NameResponse>, ApiError> {
    let address = parse_address(&address)?;
    let name = state.messenger.name_of(address).await?;
    Ok(Json(NameResponse {
        address: address.to_checksum(None),
        name,
    }))
}

/// Register (or rename) a keyring account.
#[utoipa::path(
    put,
    path = "/v1/accounts/{address}/name",
    tag = "Accounts",
    params(("address" = String, Path, description = "Keyring account address")),
    request_body = RegisterNameRequest,
    responses(
        (status = 200, description = "Registration confirmed", body = TransactionResponse),
        (status = 400, description = "Invalid name"),
        (status = 404, description = "Account not in keyring"),
        (status = 422, description = "Transaction reverted"),
        (status = 502, description = "Sponsor or node failure")
    )
)]
pub async fn register_name(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(request): Json<RegisterNameRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let account = state.account(&parse_address(&address)?).await?;
    let receipt = state.messenger.register(&account, &request.name).await?;
    Ok(Json(TransactionResponse::from_receipt(
        &receipt,
        &state.explorer_url,
    )))
}
