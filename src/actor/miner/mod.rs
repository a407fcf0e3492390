// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Miner accounting: per-miner ledgers tracking pledge, locked storage,
//! sectors and accumulated power.
//!
//! Every mutation is copy-modify-swap: the full successor ledger is computed
//! and validated first, then swapped into the store in a single `put`.
//! Failures of any kind leave the stored ledger as it was. Mutations on one
//! ledger are serialized; distinct miners proceed concurrently.

mod state;

use std::sync::Arc;

use ahash::{HashMap, HashMapExt};
use cid::Cid;
use parking_lot::{Mutex, RwLock};
pub use state::{Sector, State};
use thiserror::Error;
use tracing::debug;

use crate::actor::market::StorageMarket;
use crate::address::Address;
use crate::consensus::PowerTableView;
use crate::db::{self, LedgerStore};
use crate::proofs::Commitment;
use crate::types::{AskId, DealId, ExitCode, SectorId, StoragePower, TokenAmount};

/// Sentinel sector id directing deal admission to allocate the next free
/// sector.
pub const NEW_SECTOR: SectorId = SectorId::MAX;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("miner {0} has no ledger")]
    UnknownMiner(Address),
    #[error("miner {0} already has a ledger")]
    AlreadyRegistered(Address),
    #[error("not authorized to call the method")]
    Unauthorized,
    #[error("not enough pledged")]
    InsufficientPledge,
    #[error("sector id {0} out of range")]
    SectorOutOfRange(SectorId),
    #[error("sector {0} is already committed")]
    SectorCommitted(SectorId),
    #[error("storage market rejected the ask with exit code {0}")]
    AskRejected(ExitCode),
    #[error("storage market rejected the deal commitment with exit code {0}")]
    CommitRejected(ExitCode),
    #[error(transparent)]
    Store(#[from] db::Error),
    #[error("storage market unavailable: {0}")]
    Market(String),
}

struct PowerSnapshot {
    total: StoragePower,
    by_miner: HashMap<Address, StoragePower>,
}

/// Ledger accounting for all local miners, plus the power-table view sealed
/// from those ledgers per state root.
pub struct MinerAccounting<S, M> {
    store: S,
    market: M,
    /// Registered miners in registration order; snapshot sealing scans this.
    miners: RwLock<Vec<Address>>,
    /// One mutation guard per ledger.
    locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
    /// Immutable power snapshots keyed by state root.
    snapshots: RwLock<HashMap<Cid, PowerSnapshot>>,
}

impl<S: LedgerStore, M: StorageMarket> MinerAccounting<S, M> {
    pub fn new(store: S, market: M) -> Self {
        Self {
            store,
            market,
            miners: RwLock::default(),
            locks: Mutex::default(),
            snapshots: RwLock::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn market(&self) -> &M {
        &self.market
    }

    /// Registers an empty ledger for `miner`.
    pub fn create_ledger(
        &self,
        miner: &Address,
        owner: Address,
        pledge: StoragePower,
        collateral: TokenAmount,
    ) -> Result<(), Error> {
        let guard = self.ledger_lock(miner);
        let _lock = guard.lock();
        if self.store.exists(miner)? {
            return Err(Error::AlreadyRegistered(*miner));
        }
        self.store.put(miner, &State::new(owner, pledge, collateral))?;
        self.miners.write().push(*miner);
        debug!(%miner, "ledger registered");
        Ok(())
    }

    /// Appends deals to a sector, allocating one when `sector_id` is
    /// [`NEW_SECTOR`]. Returns the sector the deals landed in.
    pub fn admit_deals(
        &self,
        miner: &Address,
        sector_id: SectorId,
        deals: &[DealId],
    ) -> Result<SectorId, Error> {
        let guard = self.ledger_lock(miner);
        let _lock = guard.lock();
        let (next, id) = self.ledger(miner)?.with_deals(sector_id, deals)?;
        self.store.put(miner, &next)?;
        Ok(id)
    }

    /// Admits any new deals, settles the sector's full deal list with the
    /// storage market and attaches the proof, crediting the granted power.
    ///
    /// A market rejection (non-zero exit) and a market transport failure
    /// both leave the stored ledger untouched.
    pub fn commit_sector(
        &self,
        miner: &Address,
        sector_id: SectorId,
        proof: Commitment,
        deals: &[DealId],
    ) -> Result<SectorId, Error> {
        let guard = self.ledger_lock(miner);
        let _lock = guard.lock();
        let state = self.ledger(miner)?;

        let (staged, id) = if deals.is_empty() && sector_id != NEW_SECTOR {
            (state, sector_id)
        } else {
            state.with_deals(sector_id, deals)?
        };

        let Some(sector) = usize::try_from(id)
            .ok()
            .and_then(|i| staged.sectors().get(i))
        else {
            return Err(Error::SectorOutOfRange(id));
        };
        if sector.is_committed() {
            return Err(Error::SectorCommitted(id));
        }

        let (power_delta, exit) = self
            .market
            .commit_deals(miner, sector.deals())
            .map_err(|e| Error::Market(e.to_string()))?;
        if !exit.is_success() {
            return Err(Error::CommitRejected(exit));
        }

        let next = staged.with_commitment(id, proof, &power_delta)?;
        self.store.put(miner, &next)?;
        debug!(%miner, sector = id, power = %next.power(), "sector committed");
        Ok(id)
    }

    /// Locks storage for the ask and forwards it to the market orderbook.
    ///
    /// Only the ledger owner may ask. Every failure, including a market
    /// rejection, leaves locked storage unchanged.
    pub fn add_ask(
        &self,
        miner: &Address,
        caller: &Address,
        price: &TokenAmount,
        size: &StoragePower,
    ) -> Result<AskId, Error> {
        let guard = self.ledger_lock(miner);
        let _lock = guard.lock();
        let state = self.ledger(miner)?;
        if *caller != state.owner() {
            return Err(Error::Unauthorized);
        }
        let next = state.with_locked(size)?;
        let (ask_id, exit) = self
            .market
            .add_ask(miner, price, size)
            .map_err(|e| Error::Market(e.to_string()))?;
        if !exit.is_success() {
            return Err(Error::AskRejected(exit));
        }
        self.store.put(miner, &next)?;
        debug!(%miner, ask = ask_id, locked = %next.locked_storage(), "ask published");
        Ok(ask_id)
    }

    pub fn owner(&self, miner: &Address) -> Result<Address, Error> {
        Ok(self.ledger(miner)?.owner())
    }

    pub fn power(&self, miner: &Address) -> Result<StoragePower, Error> {
        Ok(self.ledger(miner)?.power().clone())
    }

    /// Seals the current per-miner powers under `state_root` for the power
    /// table. A sealed snapshot never changes, regardless of later ledger
    /// mutation; sealing the same root again keeps the first snapshot.
    pub fn seal_snapshot(&self, state_root: Cid) -> Result<(), Error> {
        let miners = self.miners.read().clone();
        let mut by_miner = HashMap::with_capacity(miners.len());
        let mut total = StoragePower::default();
        for miner in miners {
            let power = self.ledger(&miner)?.power().clone();
            total += &power;
            by_miner.insert(miner, power);
        }
        self.snapshots
            .write()
            .entry(state_root)
            .or_insert(PowerSnapshot { total, by_miner });
        Ok(())
    }

    fn ledger(&self, miner: &Address) -> Result<State, Error> {
        self.store.get(miner)?.ok_or(Error::UnknownMiner(*miner))
    }

    fn ledger_lock(&self, miner: &Address) -> Arc<Mutex<()>> {
        self.locks.lock().entry(*miner).or_default().clone()
    }
}

impl<S, M> PowerTableView for MinerAccounting<S, M>
where
    S: Send + Sync,
    M: Send + Sync,
{
    fn total_power(&self, state_root: &Cid) -> anyhow::Result<StoragePower> {
        let snapshots = self.snapshots.read();
        let snapshot = snapshots
            .get(state_root)
            .ok_or_else(|| anyhow::anyhow!("no power snapshot for state root {state_root}"))?;
        Ok(snapshot.total.clone())
    }

    fn miner_power(&self, state_root: &Cid, miner: &Address) -> anyhow::Result<StoragePower> {
        let snapshots = self.snapshots.read();
        let snapshot = snapshots
            .get(state_root)
            .ok_or_else(|| anyhow::anyhow!("no power snapshot for state root {state_root}"))?;
        Ok(snapshot.by_miner.get(miner).cloned().unwrap_or_default())
    }
}
