// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Actor-side state kept by the node: miner ledgers and the storage market
//! seam they settle against.

pub mod market;
pub mod miner;
