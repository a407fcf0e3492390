// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Stages deal-backed pieces into capacity-bounded sectors.
//!
//! The builder is a [`Binner`] driven by the first-fit packer: the open
//! staged sector is the current bin, and closing a bin admits its deals into
//! the miner ledger, seals them through the prover and commits the sector.

use std::sync::Arc;

use tracing::debug;

use crate::actor::market::StorageMarket;
use crate::actor::miner::{MinerAccounting, NEW_SECTOR};
use crate::address::Address;
use crate::db::LedgerStore;
use crate::proofs::Prover;
use crate::types::DealId;
use crate::utils::binpack::{Binner, Error, NaivePacker, PackResult, Space};

/// A deal-backed piece of data waiting for a sector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    pub deal: DealId,
    pub size: Space,
}

/// An open sector accumulating pieces before sealing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedSector {
    seq: u64,
    deals: Vec<DealId>,
    used: Space,
}

impl StagedSector {
    /// Builder-local staging sequence number. Assigned when the sector is
    /// opened, before the ledger allocates an id at commit time.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn deals(&self) -> &[DealId] {
        &self.deals
    }

    pub fn used(&self) -> Space {
        self.used
    }
}

struct PieceBinner<S, M, P> {
    accounting: Arc<MinerAccounting<S, M>>,
    prover: P,
    miner: Address,
    sector_bytes: Space,
    next_seq: u64,
}

impl<S: LedgerStore, M: StorageMarket, P: Prover> Binner for PieceBinner<S, M, P> {
    type Item = Piece;
    type Bin = StagedSector;

    fn bin_size(&self) -> Space {
        self.sector_bytes
    }

    fn item_size(&self, item: &Piece) -> Space {
        item.size
    }

    fn space_available(&self, bin: &StagedSector) -> Space {
        self.sector_bytes - bin.used
    }

    fn add_item(&mut self, item: Piece, bin: &mut StagedSector) -> anyhow::Result<()> {
        bin.deals.push(item.deal);
        bin.used += item.size;
        Ok(())
    }

    fn close_bin(&mut self, bin: StagedSector) -> anyhow::Result<()> {
        let id = self
            .accounting
            .admit_deals(&self.miner, NEW_SECTOR, &bin.deals)?;
        let commitment = self.prover.seal_sector(&self.miner, &bin.deals)?;
        self.accounting
            .commit_sector(&self.miner, id, commitment, &[])?;
        debug!(miner = %self.miner, sector = id, deals = bin.deals.len(), "sector sealed");
        Ok(())
    }

    fn new_bin(&mut self) -> anyhow::Result<StagedSector> {
        let seq = self.next_seq;
        self.next_seq += 1;
        Ok(StagedSector {
            seq,
            deals: Vec::new(),
            used: 0,
        })
    }
}

/// Piece-to-sector staging for one miner.
pub struct SectorBuilder<S, M, P>
where
    S: LedgerStore,
    M: StorageMarket,
    P: Prover,
{
    packer: NaivePacker<PieceBinner<S, M, P>>,
}

impl<S, M, P> SectorBuilder<S, M, P>
where
    S: LedgerStore,
    M: StorageMarket,
    P: Prover,
{
    pub fn new(
        accounting: Arc<MinerAccounting<S, M>>,
        prover: P,
        miner: Address,
        sector_bytes: Space,
    ) -> Result<Self, Error> {
        let packer = NaivePacker::new(PieceBinner {
            accounting,
            prover,
            miner,
            sector_bytes,
            next_seq: 0,
        })?;
        Ok(Self { packer })
    }

    /// The sector currently accepting pieces.
    pub fn staged(&self) -> &StagedSector {
        self.packer.current_bin()
    }

    /// Stages one piece, sealing and committing a sector whenever one
    /// closes. Returns the staging sequence number the piece landed in.
    pub fn add_piece(&mut self, piece: Piece) -> Result<u64, Error> {
        let current = self.packer.current_bin().seq;
        let staged_into = match self.packer.pack(piece)? {
            PackResult::Added => current,
            // The piece completed the bin that just closed.
            PackResult::Filled => current,
            // The piece rolled into the fresh bin.
            PackResult::Spilled => self.packer.current_bin().seq,
        };
        Ok(staged_into)
    }
}
