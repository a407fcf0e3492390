// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::address::Address;
use crate::types::{AskId, DealId, ExitCode, StoragePower, TokenAmount};

/// The storage-market capability miner accounting settles against.
///
/// Both calls separate transport faults (`Err`) from the market reverting
/// the request (`Ok` with a non-zero exit code). Callers treat the former as
/// infrastructure failure and the latter as a normal rejection.
pub trait StorageMarket: Send + Sync {
    /// Publishes an ask on the orderbook. Returns the ask id the market
    /// assigned together with its exit code.
    fn add_ask(
        &self,
        miner: &Address,
        price: &TokenAmount,
        size: &StoragePower,
    ) -> anyhow::Result<(AskId, ExitCode)>;

    /// Settles the given deals into committed storage. Returns the power the
    /// deals are worth together with the market's exit code.
    fn commit_deals(
        &self,
        miner: &Address,
        deals: &[DealId],
    ) -> anyhow::Result<(StoragePower, ExitCode)>;
}

impl<T: StorageMarket + ?Sized> StorageMarket for std::sync::Arc<T> {
    fn add_ask(
        &self,
        miner: &Address,
        price: &TokenAmount,
        size: &StoragePower,
    ) -> anyhow::Result<(AskId, ExitCode)> {
        (**self).add_ask(miner, price, size)
    }

    fn commit_deals(
        &self,
        miner: &Address,
        deals: &[DealId],
    ) -> anyhow::Result<(StoragePower, ExitCode)> {
        (**self).commit_deals(miner, deals)
    }
}
