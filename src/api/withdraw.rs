// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Withdraw-all endpoints.
//!
//! Both handlers hold the account's lock from the balance pre-check until the
//! node has answered the submission, so one account never has two sweeps
//! reading the same nonce.

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    blockchain::{Account, SweepAsset, SweepError, SweepReceipt},
    error::ApiError,
    state::AppState,
    storage::validate_user_id,
};

/// Withdraw request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    /// Destination address (0x + 40 hex characters)
    pub destination: String,
}

/// Submitted sweep.
#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawResponse {
    pub tx_hash: String,
    pub explorer_url: String,
    pub asset: SweepAsset,
    /// Amount moved, wei for ETH and base units for tokens
    pub amount: String,
    /// Nonce the transaction was signed with
    pub nonce: u64,
    /// Fee-rate paid, wei per gas
    pub fee_rate: String,
}

impl From<SweepReceipt> for WithdrawResponse {
    fn from(receipt: SweepReceipt) -> Self {
        Self {
            tx_hash: receipt.tx_hash.to_string(),
            explorer_url: receipt.explorer_url,
            asset: receipt.asset,
            amount: receipt.amount.to_string(),
            nonce: receipt.nonce,
            fee_rate: receipt.fee_rate.to_string(),
        }
    }
}

/// Validate and parse a destination address.
fn parse_destination(address: &str) -> Result<Address, ApiError> {
    let address = address.trim();
    if !address.starts_with("0x") {
        return Err(ApiError::bad_request("Address must start with 0x"));
    }
    if address.len() != 42 {
        return Err(ApiError::bad_request(
            "Address must be 42 characters (0x + 40 hex)",
        ));
    }
    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::bad_request("Address must contain only hex characters"));
    }
    Address::from_str(address).map_err(|e| ApiError::bad_request(format!("Invalid address: {e}")))
}

/// Resolve the signing account; a missing key surfaces as `KeyNotFound`.
fn load_account(state: &AppState, user_id: &str) -> Result<Account, ApiError> {
    validate_user_id(user_id)?;
    Ok(state.keys.load_account(user_id).map_err(SweepError::from)?)
}

/// Withdraw the whole ETH balance, less the reserved network fee.
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/withdraw/eth",
    tag = "Withdrawals",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Transaction submitted", body = WithdrawResponse),
        (status = 400, description = "Invalid destination or empty balance"),
        (status = 404, description = "Wallet not found"),
        (status = 422, description = "Balance does not cover the network fee"),
        (status = 502, description = "Node rejected the transaction"),
        (status = 503, description = "Gas oracle or network unavailable")
    )
)]
pub async fn withdraw_eth(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<WithdrawRequest>,
) -> Result<Json<WithdrawResponse>, ApiError> {
    let destination = parse_destination(&request.destination)?;
    let account = load_account(&state, &user_id)?;

    let _guard = state.locks.acquire(&user_id).await;

    let balance = state
        .chain
        .native_balance(account.address())
        .await
        .map_err(|e| ApiError::from(SweepError::Network(e.to_string())))?;
    if balance == U256::ZERO {
        return Err(ApiError::bad_request("This address has no ETH!"));
    }

    let receipt = state
        .sweeper
        .sweep_native(&account, destination)
        .await
        .inspect_err(|e| tracing::warn!(user_id = %user_id, error = %e, "ETH withdraw failed"))?;

    tracing::info!(
        user_id = %user_id,
        tx_hash = %receipt.tx_hash,
        amount = %receipt.amount,
        "ETH withdraw submitted"
    );
    Ok(Json(receipt.into()))
}

/// Withdraw the whole balance of the configured token.
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/withdraw/token",
    tag = "Withdrawals",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Transaction submitted", body = WithdrawResponse),
        (status = 400, description = "Invalid destination or empty balance"),
        (status = 404, description = "Wallet not found"),
        (status = 502, description = "Node rejected the transaction"),
        (status = 503, description = "Gas oracle or network unavailable")
    )
)]
pub async fn withdraw_token(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<WithdrawRequest>,
) -> Result<Json<WithdrawResponse>, ApiError> {
    let destination = parse_destination(&request.destination)?;
    let account = load_account(&state, &user_id)?;

    let _guard = state.locks.acquire(&user_id).await;

    let balance = state
        .chain
        .token_balance(state.token_contract, account.address())
        .await
        .map_err(|e| ApiError::from(SweepError::Network(e.to_string())))?;
    if balance == U256::ZERO {
        return Err(ApiError::bad_request("This address has no tokens!"));
    }

    let receipt = state
        .sweeper
        .sweep_token(&account, destination, state.token_contract)
        .await
        .inspect_err(|e| tracing::warn!(user_id = %user_id, error = %e, "Token withdraw failed"))?;

    tracing::info!(
        user_id = %user_id,
        tx_hash = %receipt.tx_hash,
        token = %state.token_contract,
        amount = %receipt.amount,
        "Token withdraw submitted"
    );
    Ok(Json(receipt.into()))
}
