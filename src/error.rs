// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::sweep::SweepError;
use crate::storage::KeyStoreError;

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

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<SweepError> for ApiError {
    fn from(e: SweepError) -> Self {
        let message = e.to_string();
        match e {
            SweepError::KeyNotFound(_) => Self::not_found(message),
            SweepError::InsufficientFunds { .. } => Self::unprocessable(message),
            SweepError::NoQuote(_) | SweepError::Network(_) => Self::service_unavailable(message),
            SweepError::SubmissionRejected(_) => Self::bad_gateway(message),
            SweepError::Signing(_) => Self::internal(message),
        }
    }
}

impl From<KeyStoreError> for ApiError {
    fn from(e: KeyStoreError) -> Self {
        let message = e.to_string();
        match e {
            KeyStoreError::InvalidUserId(_) => Self::bad_request(message),
            KeyStoreError::AlreadyExists(_) => Self::conflict(message),
            KeyStoreError::NotFound(_) => Self::not_found(message),
            KeyStoreError::Corrupted(_) | KeyStoreError::Key(_) | KeyStoreError::Storage(_) => {
                tracing::error!(error = %message, "Key store failure");
                Self::internal("Key store failure")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
