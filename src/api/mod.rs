// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::{SweepAsset, TokenBalance, WalletBalanceResponse},
    state::AppState,
};

pub mod balance;
pub mod health;
pub mod wallets;
pub mod withdraw;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/users/{user_id}/wallet",
            get(wallets::get_wallet).post(wallets::create_wallet),
        )
        .route("/users/{user_id}/balance", get(balance::get_balance))
        .route("/users/{user_id}/withdraw/eth", post(withdraw::withdraw_eth))
        .route(
            "/users/{user_id}/withdraw/token",
            post(withdraw::withdraw_token),
        );

    Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        wallets::create_wallet,
        wallets::get_wallet,
        balance::get_balance,
        withdraw::withdraw_eth,
        withdraw::withdraw_token
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ReadyResponse,
            wallets::WalletResponse,
            balance::BalanceResponse,
            withdraw::WithdrawRequest,
            withdraw::WithdrawResponse,
            SweepAsset,
            TokenBalance,
            WalletBalanceResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Wallets", description = "Custodial wallets and balances"),
        (name = "Withdrawals", description = "Withdraw-all sweeps")
    )
)]
struct ApiDoc;
