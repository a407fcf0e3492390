// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

use crate::actor::miner::{Error, NEW_SECTOR};
use crate::address::Address;
use crate::proofs::Commitment;
use crate::types::{DealId, SectorId, StoragePower, TokenAmount};

/// One sector in a miner ledger: the deals staged into it and, once
/// committed, the commitment proof.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    deals: Vec<DealId>,
    commitment: Option<Commitment>,
}

impl Sector {
    pub fn deals(&self) -> &[DealId] {
        &self.deals
    }

    pub fn commitment(&self) -> Option<&[u8]> {
        self.commitment.as_deref()
    }

    /// A sector is committed exactly when its proof is present.
    pub fn is_committed(&self) -> bool {
        self.commitment.is_some()
    }
}

/// One miner's ledger value.
///
/// Mutations return the successor ledger and leave `self` untouched, so
/// accounting can validate the whole change before swapping it into the
/// store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    owner: Address,
    /// Storage the miner pledged to offer, in bytes.
    pledge: StoragePower,
    /// Tokens held against the pledge.
    collateral: TokenAmount,
    /// Portion of the pledge locked by published asks.
    locked_storage: StoragePower,
    /// Power credited for committed sectors.
    power: StoragePower,
    sectors: Vec<Sector>,
}

impl State {
    pub fn new(owner: Address, pledge: StoragePower, collateral: TokenAmount) -> Self {
        Self {
            owner,
            pledge,
            collateral,
            locked_storage: StoragePower::default(),
            power: StoragePower::default(),
            sectors: Vec::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn pledge(&self) -> &StoragePower {
        &self.pledge
    }

    pub fn collateral(&self) -> &TokenAmount {
        &self.collateral
    }

    pub fn locked_storage(&self) -> &StoragePower {
        &self.locked_storage
    }

    pub fn power(&self) -> &StoragePower {
        &self.power
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Appends `deals` to the addressed sector, allocating a fresh one when
    /// `sector_id` is [`NEW_SECTOR`]. Returns the successor ledger and the
    /// sector actually written.
    pub fn with_deals(
        &self,
        sector_id: SectorId,
        deals: &[DealId],
    ) -> Result<(Self, SectorId), Error> {
        let mut next = self.clone();
        let id = if sector_id == NEW_SECTOR {
            let id = next.sectors.len() as SectorId;
            next.sectors.push(Sector::default());
            id
        } else {
            sector_id
        };
        let Some(sector) = usize::try_from(id)
            .ok()
            .and_then(|i| next.sectors.get_mut(i))
        else {
            return Err(Error::SectorOutOfRange(id));
        };
        if sector.is_committed() {
            return Err(Error::SectorCommitted(id));
        }
        sector.deals.extend_from_slice(deals);
        Ok((next, id))
    }

    /// Attaches a commitment proof to the sector and credits the power the
    /// market granted for it.
    pub fn with_commitment(
        &self,
        sector_id: SectorId,
        proof: Commitment,
        power_delta: &StoragePower,
    ) -> Result<Self, Error> {
        let mut next = self.clone();
        let Some(sector) = usize::try_from(sector_id)
            .ok()
            .and_then(|i| next.sectors.get_mut(i))
        else {
            return Err(Error::SectorOutOfRange(sector_id));
        };
        if sector.is_committed() {
            return Err(Error::SectorCommitted(sector_id));
        }
        sector.commitment = Some(proof);
        next.power += power_delta;
        Ok(next)
    }

    /// Locks `size` more storage for an ask, bounded by the pledge.
    pub fn with_locked(&self, size: &StoragePower) -> Result<Self, Error> {
        let mut next = self.clone();
        next.locked_storage += size;
        if next.locked_storage > next.pledge {
            return Err(Error::InsufficientPledge);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> State {
        State::new(Address::new_id(1), StoragePower::from(100), 0.into())
    }

    #[test]
    fn allocates_sector_indices_in_order() {
        let (state, first) = ledger().with_deals(NEW_SECTOR, &[1]).unwrap();
        let (state, second) = state.with_deals(NEW_SECTOR, &[2, 3]).unwrap();
        assert_eq!((first, second), (0, 1));
        assert_eq!(state.sectors()[0].deals(), [1]);
        assert_eq!(state.sectors()[1].deals(), [2, 3]);
    }

    #[test]
    fn rejects_out_of_range_sectors() {
        assert_eq!(
            ledger().with_deals(3, &[1]).unwrap_err(),
            Error::SectorOutOfRange(3)
        );
        // Ids past usize::MAX must not alias a low index on 32-bit targets.
        let (state, _) = ledger().with_deals(NEW_SECTOR, &[1]).unwrap();
        assert_eq!(
            state.with_deals(1 << 32, &[2]).unwrap_err(),
            Error::SectorOutOfRange(1 << 32)
        );
        assert_eq!(
            state
                .with_commitment(1 << 32, b"proof".to_vec(), &0.into())
                .unwrap_err(),
            Error::SectorOutOfRange(1 << 32)
        );
    }

    #[test]
    fn locking_respects_the_pledge_bound() {
        let state = ledger().with_locked(&StoragePower::from(100)).unwrap();
        assert_eq!(state.locked_storage(), &StoragePower::from(100));
        assert_eq!(
            state.with_locked(&1.into()).unwrap_err(),
            Error::InsufficientPledge
        );
    }

    #[test]
    fn committed_sectors_are_frozen() {
        let (state, id) = ledger().with_deals(NEW_SECTOR, &[7]).unwrap();
        let state = state
            .with_commitment(id, b"proof".to_vec(), &StoragePower::from(7))
            .unwrap();
        assert!(state.sectors()[0].is_committed());
        assert_eq!(state.power(), &StoragePower::from(7));
        assert_eq!(
            state.with_deals(id, &[8]).unwrap_err(),
            Error::SectorCommitted(id)
        );
        assert_eq!(
            state
                .with_commitment(id, b"again".to_vec(), &0.into())
                .unwrap_err(),
            Error::SectorCommitted(id)
        );
    }
}
