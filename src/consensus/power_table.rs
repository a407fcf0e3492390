// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use num_traits::Signed;

use crate::address::Address;
use crate::types::StoragePower;

/// Read-only view of the storage power distribution at a given state root.
///
/// Zero is a legitimate answer for a miner that exists without committed
/// power. A failed lookup (unknown root, backend fault) is an error and must
/// never be reported as zero.
pub trait PowerTableView: Send + Sync {
    /// Total power committed to the chain at `state_root`.
    fn total_power(&self, state_root: &Cid) -> anyhow::Result<StoragePower>;

    /// Power committed by `miner` at `state_root`.
    fn miner_power(&self, state_root: &Cid, miner: &Address) -> anyhow::Result<StoragePower>;

    /// Whether `miner` holds strictly positive power at `state_root`. Zero
    /// power is a legitimate `false`; a lookup fault stays an error.
    fn has_power(&self, state_root: &Cid, miner: &Address) -> anyhow::Result<bool> {
        Ok(self.miner_power(state_root, miner)?.is_positive())
    }
}

impl<T: PowerTableView + ?Sized> PowerTableView for std::sync::Arc<T> {
    fn total_power(&self, state_root: &Cid) -> anyhow::Result<StoragePower> {
        (**self).total_power(state_root)
    }

    fn miner_power(&self, state_root: &Cid, miner: &Address) -> anyhow::Result<StoragePower> {
        (**self).miner_power(state_root, miner)
    }

    fn has_power(&self, state_root: &Cid, miner: &Address) -> anyhow::Result<bool> {
        (**self).has_power(state_root, miner)
    }
}
