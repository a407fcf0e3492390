// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Ledger persistence: the get/put-by-address contract miner accounting
//! writes through. Backends store canonical CBOR; anything honoring this
//! trait can sit behind accounting.

mod memory;

pub use memory::MemoryLedgerStore;
use thiserror::Error;

use crate::actor::miner::State;
use crate::address::Address;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid ledger encoding: {0}")]
    Encoding(String),
    #[error("ledger store: {0}")]
    Backend(String),
}

/// Keyed storage of miner ledgers.
///
/// `put` must replace the stored ledger in one step; readers never observe a
/// partially written value.
pub trait LedgerStore {
    fn get(&self, miner: &Address) -> Result<Option<State>, Error>;
    fn put(&self, miner: &Address, state: &State) -> Result<(), Error>;

    fn exists(&self, miner: &Address) -> Result<bool, Error> {
        Ok(self.get(miner)?.is_some())
    }
}
