// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodial wallet endpoints.
//!
//! Each user has at most one wallet. Private keys are never returned.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::ApiError, state::AppState};

/// Deposit address of a user's wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    pub user_id: String,
    /// Checksummed address
    pub address: String,
}

/// Create the user's custodial wallet.
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/wallet",
    tag = "Wallets",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 201, description = "Wallet created", body = WalletResponse),
        (status = 400, description = "Invalid user ID"),
        (status = 409, description = "Wallet already exists")
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    let address = state.keys.generate(&user_id)?;

    Ok((
        StatusCode::CREATED,
        Json(WalletResponse {
            user_id,
            address: address.to_checksum(None),
        }),
    ))
}

/// Get the deposit address of the user's wallet.
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/wallet",
    tag = "Wallets",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Wallet found", body = WalletResponse),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<WalletResponse>, ApiError> {
    let address = state.keys.address(&user_id)?;

    Ok(Json(WalletResponse {
        user_id,
        address: address.to_checksum(None),
    }))
}
