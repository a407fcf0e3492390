// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Scalar types shared across consensus, accounting and mining.

use std::fmt;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// Quantity of committed storage, in bytes. Unbounded; consensus math never
/// truncates.
pub type StoragePower = BigInt;

/// Token quantity used for collateral and ask pricing. Unbounded.
pub type TokenAmount = BigInt;

/// An epoch (or height) of the chain.
pub type ChainEpoch = i64;

/// Duration of each epoch, in seconds.
pub const EPOCH_DURATION_SECONDS: i64 = 30;

/// Identifier of a storage deal admitted into a sector.
pub type DealId = u64;

/// Index of a sector within one miner ledger.
pub type SectorId = u64;

/// Identifier the storage market assigns to a published ask.
pub type AskId = u64;

/// Outcome code reported back from an actor-space capability call. Anything
/// non-zero is a revert of the call, distinct from a transport fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExitCode(pub u8);

impl ExitCode {
    pub const OK: ExitCode = ExitCode(0);

    pub fn is_success(self) -> bool {
        self == Self::OK
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
