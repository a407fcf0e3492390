// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Core of an expected-consensus blockchain node.
//!
//! Tipsets of sibling blocks are validated structurally, then accepted or
//! rejected by an all-or-nothing state transition: each block must carry a
//! winning, power-weighted leader election for its round, and the tipset's
//! replayed messages must produce exactly the state root every block
//! committed to. Around that core sit miner-ledger accounting, deal-to-sector
//! staging and an asynchronous mining worker.
//!
//! Cryptography (tickets, seals), message execution and the storage market
//! stay behind capability traits; this crate sequences them and owns the
//! consensus rules.

pub mod actor;
pub mod address;
pub mod blocks;
pub mod config;
pub mod consensus;
pub mod db;
pub mod message;
pub mod mining;
pub mod proofs;
pub mod sector_builder;
pub mod types;
pub mod utils;
