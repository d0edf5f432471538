// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into
//! [`AppConfig`] and passed to constructors from there.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RPC_URL` | Ethereum JSON-RPC endpoint | Infura URL if `INFURA_API_KEY` is set, else required |
//! | `INFURA_API_KEY` | Project key used to build the default `RPC_URL` | Optional |
//! | `ETHERSCAN_API_KEY` | Gas oracle API key | Required |
//! | `GAS_ORACLE_URL` | Gas oracle endpoint | `https://api.etherscan.io/api` |
//! | `NETWORK` | `mainnet` or `sepolia` | `mainnet` |
//! | `TOKEN_CONTRACT` | ERC-20 swept by the token withdraw | USDT on mainnet |
//! | `DATA_DIR` | Root directory for keys and logs | `./data` |
//! | `KEY_ENCRYPTION_SECRET` | Secret the key-file cipher key is derived from | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::blockchain::fee::DEFAULT_ORACLE_URL;
use crate::blockchain::types::{network_by_name, NetworkConfig, USDT_TOKEN};
use crate::storage::paths::DATA_ROOT;

pub const RPC_URL_ENV: &str = "RPC_URL";
pub const INFURA_API_KEY_ENV: &str = "INFURA_API_KEY";
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";
pub const GAS_ORACLE_URL_ENV: &str = "GAS_ORACLE_URL";
pub const NETWORK_ENV: &str = "NETWORK";
pub const TOKEN_CONTRACT_ENV: &str = "TOKEN_CONTRACT";

/// Environment variable name for the data directory path.
///
/// Holds encrypted user keys and the sweep error log.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const KEY_ENCRYPTION_SECRET_ENV: &str = "KEY_ENCRYPTION_SECRET";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

/// Process-wide settings.
#[derive(Clone)]
pub struct AppConfig {
    pub rpc_endpoint: String,
    pub oracle_api_key: String,
    pub oracle_url: String,
    pub network: NetworkConfig,
    pub token_contract: Address,
    pub data_dir: PathBuf,
    pub key_encryption_secret: String,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("network", &self.network.name)
            .field("oracle_url", &self.oracle_url)
            .field("token_contract", &self.token_contract)
            .field("data_dir", &self.data_dir)
            .field("bind_addr", &self.bind_addr)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let network = match get(NETWORK_ENV) {
            Some(raw) => network_by_name(&raw).map_err(|reason| ConfigError::Invalid {
                var: NETWORK_ENV,
                reason,
            })?,
            None => crate::blockchain::types::ETH_MAINNET,
        };

        let rpc_endpoint = match (get(RPC_URL_ENV), get(INFURA_API_KEY_ENV)) {
            (Some(url), _) => url,
            (None, Some(key)) => infura_url(&network, &key),
            (None, None) => return Err(ConfigError::Missing(RPC_URL_ENV)),
        };

        let oracle_api_key =
            get(ETHERSCAN_API_KEY_ENV).ok_or(ConfigError::Missing(ETHERSCAN_API_KEY_ENV))?;
        let key_encryption_secret = get(KEY_ENCRYPTION_SECRET_ENV)
            .ok_or(ConfigError::Missing(KEY_ENCRYPTION_SECRET_ENV))?;

        let token_raw = get(TOKEN_CONTRACT_ENV)
            .or_else(|| USDT_TOKEN.address_on(&network).map(str::to_string))
            .ok_or(ConfigError::Missing(TOKEN_CONTRACT_ENV))?;
        let token_contract = Address::from_str(token_raw.trim()).map_err(|e| {
            ConfigError::Invalid {
                var: TOKEN_CONTRACT_ENV,
                reason: e.to_string(),
            }
        })?;

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match get(PORT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                reason: format!("`{raw}` is not a port number"),
            })?,
            None => 8080,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    var: HOST_ENV,
                    reason: format!("`{host}` is not a bind address"),
                })?;

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                var: LOG_FORMAT_ENV,
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            rpc_endpoint,
            oracle_api_key,
            oracle_url: get(GAS_ORACLE_URL_ENV).unwrap_or_else(|| DEFAULT_ORACLE_URL.to_string()),
            network,
            token_contract,
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DATA_ROOT.to_string())),
            key_encryption_secret,
            bind_addr,
            log_format,
        })
    }
}

fn infura_url(network: &NetworkConfig, key: &str) -> String {
    let host = match network.chain_id {
        11_155_111 => "sepolia",
        _ => "mainnet",
    };
    format!("https://{host}.infura.io/v3/{key}")
}
