// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{parse_address, parse_token_id};
use crate::{
    error::ApiError,
    models::{MessageListResponse, MessageResponse, SendMessageRequest, TransactionResponse},
    state::AppState,
};

/// Decrypt the account's inbox.
///
/// Tokens that cannot be read are skipped, so `total` may be lower than the
/// on-chain balance.
#[utoipa::path(
    get,
    path = "/v1/accounts/{address}/messages",
    tag = "Messages",
    params(("address" = String, Path, description = "Keyring account address")),
    responses(
        (status = 200, description = "Readable messages", body = MessageListResponse),
        (status = 404, description = "Account not in keyring"),
        (status = 502, description = "Node unavailable")
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let account = state.account(&parse_address(&address)?).await?;
    let messages: Vec<MessageResponse> = state
        .messenger
        .fetch_messages(&account)
        .await?
        .into_iter()
        .map(|message| MessageResponse::from_message(message, &state.explorer_url))
        .collect();

    Ok(Json(MessageListResponse {
        total: messages.len(),
        messages,
    }))
}

/// Encrypt and send a message from a keyring account.
#[utoipa::path(
    post,
    path = "/v1/accounts/{address}/messages",
    tag = "Messages",
    params(("address" = String, Path, description = "Sender keyring address")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message minted", body = TransactionResponse),
        (status = 400, description = "Invalid recipient"),
        (status = 404, description = "Sender not in keyring or recipient not registered"),
        (status = 422, description = "Transaction reverted"),
        (status = 502, description = "Sponsor or node failure")
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let account = state.account(&parse_address(&address)?).await?;
    let to = parse_address(&request.to)?;

    let receipt = state
        .messenger
        .send_message(&account, to, &request.message)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse::from_receipt(
            &receipt,
            &state.explorer_url,
        )),
    ))
}

/// Burn a message token owned by the account.
#[utoipa::path(
    delete,
    path = "/v1/accounts/{address}/messages/{token_id}",
    tag = "Messages",
    params(
        ("address" = String, Path, description = "Owner keyring address"),
        ("token_id" = String, Path, description = "Token id, decimal or 0x-hex")
    ),
    responses(
        (status = 200, description = "Message burned", body = TransactionResponse),
        (status = 404, description = "Account not in keyring"),
        (status = 422, description = "Transaction reverted"),
        (status = 502, description = "Sponsor or node failure")
    )
)]
pub async fn delete_message(
    State(state): State<AppState>,
    Path((address, token_id)): Path<(String, String)>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let account = state.account(&parse_address(&address)?).await?;
    let token_id = parse_token_id(&token_id)?;

    let receipt = state.messenger.delete_message(&account, token_id).await?;
    tracing::info!(owner = %account.address(), token_id = %token_id, "Message deleted");

    Ok(Json(TransactionResponse::from_receipt(
        &receipt,
        &state.explorer_url,
    )))
}
