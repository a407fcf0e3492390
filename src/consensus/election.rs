// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Challenge derivation and the power-weighted leader election.

use cid::Cid;
use num_bigint::{BigInt, Sign};
use num_traits::One;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::address::Address;
use crate::blocks::{Ticket, Tipset};
use crate::consensus::PowerTableView;
use crate::types::StoragePower;

/// Bytes in a round challenge.
pub const CHALLENGE_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("couldn't get total power: {0}")]
    TotalPowerLookup(String),
    #[error("couldn't get miner power: {0}")]
    MinerPowerLookup(String),
}

/// Derives the election challenge for the round following `parents`.
///
/// Only the minimum ticket of the parent tipset seeds the hash. The
/// null-round count is appended as an unsigned varint so each empty round
/// re-rolls the challenge deterministically.
pub fn create_challenge(parents: &Tipset, null_count: u64) -> [u8; CHALLENGE_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(parents.min_ticket().as_bytes());
    let mut buf = unsigned_varint::encode::u64_buffer();
    hasher.update(unsigned_varint::encode::u64(null_count, &mut buf));
    hasher.finalize().into()
}

/// Decides the election for a ticket under the given power distribution.
///
/// A ticket of `n` bytes read as a big-endian integer `T` wins when
/// `T * total_power < my_power * 2^(8n)`: a uniformly random ticket then
/// wins with probability equal to the miner's share of total power. Exact
/// integer arithmetic; a powerless miner never wins, a miner holding all
/// power always does.
pub fn is_winning_ticket(
    ticket: &Ticket,
    my_power: &StoragePower,
    total_power: &StoragePower,
) -> bool {
    let lottery_ticket = BigInt::from_bytes_be(Sign::Plus, ticket.as_bytes());
    let ticket_space = BigInt::one() << (8 * ticket.len());
    lottery_ticket * total_power < ticket_space * my_power
}

/// [`is_winning_ticket`] lifted over the power table at `state_root`,
/// wrapping lookup faults distinctly for the total and per-miner queries.
pub fn wins_election(
    table: &impl PowerTableView,
    state_root: &Cid,
    miner: &Address,
    ticket: &Ticket,
) -> Result<bool, Error> {
    let total = table
        .total_power(state_root)
        .map_err(|e| Error::TotalPowerLookup(e.to_string()))?;
    let mine = table
        .miner_power(state_root, miner)
        .map_err(|e| Error::MinerPowerLookup(e.to_string()))?;
    Ok(is_winning_ticket(ticket, &mine, &total))
}
