// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas price quotes from the Etherscan gas oracle.
//!
//! ## Contract
//!
//! - One HTTP GET per call; no retries, no caching
//! - Any failure yields [`FeeError::NoQuote`]; there is no fallback price
//! - The oracle reports gwei as a decimal string; quotes are exact integer wei

use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::units::{parse_amount, GWEI_DECIMALS};

/// Default Etherscan API endpoint.
pub const DEFAULT_ORACLE_URL: &str = "https://api.etherscan.io/api";

/// Field of the oracle result holding the "fast" recommendation.
const FAST_PRICE_FIELD: &str = "FastGasPrice";

/// A point-in-time fee-rate estimate.
///
/// Valid only for the transaction built right after it was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    /// Fee-rate in wei per gas unit.
    pub fee_rate: u128,
    /// When the oracle answered.
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    #[error("No gas price quote available: {0}")]
    NoQuote(String),
}

/// Source of fee-rate quotes.
#[async_trait]
pub trait FeeEstimator: Send + Sync {
    async fn estimate_fee(&self) -> Result<FeeQuote, FeeError>;
}

/// Etherscan `gastracker/gasoracle` envelope.
#[derive(Debug, Deserialize)]
struct OracleResponse {
    status: String,
    #[serde(default)]
    message: String,
    /// An object on success, an error string otherwise
    result: Value,
}

/// Gas oracle client.
#[derive(Debug, Clone)]
pub struct EtherscanGasOracle {
    url: String,
    api_key: String,
    http: Client,
}

impl EtherscanGasOracle {
    /// Create an oracle client for the given endpoint.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, FeeError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FeeError::NoQuote(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            api_key: api_key.into(),
            http,
        })
    }

    async fn fetch(&self) -> Result<u128, FeeError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("module", "gastracker"),
                ("action", "gasoracle"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FeeError::NoQuote(format!("oracle unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(FeeError::NoQuote(format!(
                "HTTP {} from gas oracle",
                response.status()
            )));
        }

        let body: OracleResponse = response
            .json()
            .await
            .map_err(|e| FeeError::NoQuote(format!("malformed oracle body: {e}")))?;

        fast_fee_rate(&body)
    }
}

#[async_trait]
impl FeeEstimator for EtherscanGasOracle {
    async fn estimate_fee(&self) -> Result<FeeQuote, FeeError> {
        match self.fetch().await {
            Ok(fee_rate) => {
                tracing::debug!(fee_rate, "Gas oracle quote");
                Ok(FeeQuote {
                    fee_rate,
                    fetched_at: Utc::now(),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Gas oracle returned no quote");
                Err(e)
            }
        }
    }
}

/// Extract the fast fee-rate (wei) from an oracle body.
fn fast_fee_rate(body: &OracleResponse) -> Result<u128, FeeError> {
    if body.status != "1" {
        let detail = body.result.as_str().unwrap_or(body.message.as_str());
        return Err(FeeError::NoQuote(format!(
            "oracle status {}: {}",
            body.status, detail
        )));
    }

    let gwei = body
        .result
        .get(FAST_PRICE_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| FeeError::NoQuote(format!("missing {FAST_PRICE_FIELD}")))?;

    let wei: U256 = parse_amount(gwei, GWEI_DECIMALS)
        .map_err(|e| FeeError::NoQuote(format!("bad {FAST_PRICE_FIELD} `{gwei}`: {e}")))?;

    u128::try_from(wei).map_err(|_| FeeError::NoQuote(format!("{FAST_PRICE_FIELD} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    fn body(value: Value) -> OracleResponse {
        serde_json::from_value(value).unwrap()
    }

    /// Serve a single canned oracle response on an ephemeral port.
    async fn spawn_oracle(status: StatusCode, payload: Value) -> String {
        let app = Router::new().route(
            "/api",
            get(move || {
                let payload = payload.clone();
                async move { (status, Json(payload)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn ok_payload(fast: &str) -> Value {
        json!({
            "status": "1",
            "message": "OK",
            "result": {
                "LastBlock": "19000000",
                "SafeGasPrice": "10",
                "ProposeGasPrice": "12",
                "FastGasPrice": fast,
                "suggestBaseFee": "9.5",
                "gasUsedRatio": "0.4,0.5"
            }
        })
    }

    #[test]
    fn whole_gwei_to_wei() {
        assert_eq!(fast_fee_rate(&body(ok_payload("50"))), Ok(50_000_000_000));
    }

    #[test]
    fn fractional_gwei_is_exact() {
        assert_eq!(
            fast_fee_rate(&body(ok_payload("1.000000001"))),
            Ok(1_000_000_001)
        );
    }

    #[test]
    fn error_status_is_no_quote() {
        let err = fast_fee_rate(&body(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Invalid API Key"
        })))
        .unwrap_err();
        assert_eq!(
            err,
            FeeError::NoQuote("oracle status 0: Invalid API Key".to_string())
        );
    }

    #[test]
    fn missing_field_is_no_quote() {
        let err = fast_fee_rate(&body(json!({
            "status": "1",
            "message": "OK",
            "result": { "ProposeGasPrice": "12" }
        })))
        .unwrap_err();
        assert!(matches!(err, FeeError::NoQuote(msg) if msg.contains("FastGasPrice")));
    }

    #[test]
    fn non_numeric_field_is_no_quote() {
        assert!(fast_fee_rate(&body(ok_payload("fast"))).is_err());
    }

    #[tokio::test]
    async fn live_quote_from_oracle() {
        let url = spawn_oracle(StatusCode::OK, ok_payload("23.5")).await;
        let oracle = EtherscanGasOracle::new(url, "test-key").unwrap();

        let quote = oracle.estimate_fee().await.unwrap();
        assert_eq!(quote.fee_rate, 23_500_000_000);
    }

    #[tokio::test]
    async fn http_500_is_no_quote() {
        let url = spawn_oracle(StatusCode::INTERNAL_SERVER_ERROR, ok_payload("50")).await;
        let oracle = EtherscanGasOracle::new(url, "test-key").unwrap();

        let err = oracle.estimate_fee().await.unwrap_err();
        assert!(matches!(err, FeeError::NoQuote(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn unreachable_oracle_is_no_quote() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let oracle = EtherscanGasOracle::new(format!("http://{addr}/api"), "k").unwrap();
        assert!(matches!(
            oracle.estimate_fee().await,
            Err(FeeError::NoQuote(_))
        ));
    }
}
