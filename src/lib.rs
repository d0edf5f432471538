// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Sweep - Custodial Ethereum Wallet Service
//!
//! Holds one encrypted secp256k1 key per user and offers withdraw-all sweeps
//! of ETH and a configured ERC-20 token to a destination address.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Ethereum RPC, gas oracle, signing and the sweep flows
//! - `sequencer` - Per-account serialization of sweeps
//! - `storage` - Encrypted key store and the sweep error log

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod sequencer;
pub mod state;
pub mod storage;
