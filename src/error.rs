// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::delegation::DelegationError;
use crate::blockchain::receipt::ReceiptError;
use crate::blockchain::recovery::RecoveryError;
use crate::blockchain::signing::SigningError;
use crate::blockchain::ThorClientError;
use crate::messenger::MessengerError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<SigningError> for ApiError {
    fn from(err: SigningError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<MessengerError> for ApiError {
    fn from(err: MessengerError) -> Self {
        let message = err.to_string();
        match err {
            MessengerError::NoRegistrationFound(_)
            | MessengerError::Recovery(RecoveryError::NoSuchTransaction(_)) => {
                Self::not_found(message)
            }
            MessengerError::InvalidName => Self::bad_request(message),
            MessengerError::Receipt(ReceiptError::TransactionReverted { .. }) => {
                Self::unprocessable(message)
            }
            MessengerError::Delegation(DelegationError::Signing(_)) => Self::internal(message),
            MessengerError::Delegation(_)
            | MessengerError::Node(_)
            | MessengerError::Receipt(ReceiptError::Node(_))
            | MessengerError::Recovery(RecoveryError::Node(_)) => Self::bad_gateway(message),
            MessengerError::KeyMismatch { .. }
            | MessengerError::Recovery(_)
            | MessengerError::Envelope(_) => Self::internal(message),
        }
    }
}

impl From<ThorClientError> for ApiError {
    fn from(err: ThorClientError) -> Self {
        MessengerError::from(err).into()
    }
}
