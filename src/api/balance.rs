// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balance query endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{blockchain::WalletBalanceResponse, error::ApiError, state::AppState};

/// Balance response.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub user_id: String,
    /// Balance information
    #[serde(flatten)]
    pub balance: WalletBalanceResponse,
}

/// Get the ETH and token balances of the user's wallet.
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/balance",
    tag = "Wallets",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Balance retrieved successfully", body = BalanceResponse),
        (status = 404, description = "Wallet not found"),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let address = state.keys.address(&user_id)?;

    let balance = state
        .balances
        .wallet_balances(address, &[state.token_contract])
        .await
        .map_err(|e| ApiError::service_unavailable(format!("Failed to query balance: {e}")))?;

    Ok(Json(BalanceResponse { user_id, balance }))
}
