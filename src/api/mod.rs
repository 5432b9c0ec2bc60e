// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::{Address, U256};
use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{
        AccountListResponse, AccountResponse, CreateAccountRequest, MessageListResponse,
        MessageResponse, NameResponse, RegisterNameRequest, SendMessageRequest,
        TransactionResponse,
    },
    state::AppState,
};

pub mod accounts;
pub mod health;
pub mod messages;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route("/accounts/{address}", delete(accounts::delete_account))
        .route(
            "/accounts/{address}/name",
            get(accounts::get_name).put(accounts::register_name),
        )
        .route(
            "/accounts/{address}/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route(
            "/accounts/{address}/messages/{token_id}",
            delete(messages::delete_message),
        )
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Parse a path or body address.
pub(crate) fn parse_address(raw: &str) -> Result<Address, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid address: {raw}")))
}

/// Parse a decimal or `0x`-hex token id.
pub(crate) fn parse_token_id(raw: &str) -> Result<U256, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid token id: {raw}")))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        accounts::list_accounts,
        accounts::create_account,
        accounts::delete_account,
        accounts::get_name,
        accounts::register_name,
        messages::list_messages,
        messages::send_message,
        messages::delete_message
    ),
    components(
        schemas(
            AccountResponse,
            AccountListResponse,
            CreateAccountRequest,
            NameResponse,
            RegisterNameRequest,
            SendMessageRequest,
            MessageResponse,
            MessageListResponse,
            TransactionResponse,
            health::HealthResponse,
            health::ReadyResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Accounts", description = "Keyring accounts and name registration"),
        (name = "Messages", description = "Encrypted messages")
    )
)]
struct ApiDoc;
