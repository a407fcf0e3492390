// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The proving boundary: ticket derivation and sector sealing are
//! cryptographic services this crate consumes but never implements.

use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::blocks::Ticket;
use crate::types::DealId;

/// Commitment bytes a sealed sector carries.
pub type Commitment = Vec<u8>;

/// Opaque proving capability.
pub trait Prover: Send + Sync {
    /// Derive `miner`'s ticket for a round challenge.
    fn create_ticket(&self, challenge: &[u8], miner: &Address) -> anyhow::Result<Ticket>;

    /// Check that `ticket` is a valid derivation of `challenge` for `miner`.
    fn verify_ticket(
        &self,
        challenge: &[u8],
        miner: &Address,
        ticket: &Ticket,
    ) -> anyhow::Result<bool>;

    /// Seal a sector's deal payload, producing its commitment.
    fn seal_sector(&self, miner: &Address, deals: &[DealId]) -> anyhow::Result<Commitment>;
}

impl<T: Prover + ?Sized> Prover for std::sync::Arc<T> {
    fn create_ticket(&self, challenge: &[u8], miner: &Address) -> anyhow::Result<Ticket> {
        (**self).create_ticket(challenge, miner)
    }

    fn verify_ticket(
        &self,
        challenge: &[u8],
        miner: &Address,
        ticket: &Ticket,
    ) -> anyhow::Result<bool> {
        (**self).verify_ticket(challenge, miner, ticket)
    }

    fn seal_sector(&self, miner: &Address, deals: &[DealId]) -> anyhow::Result<Commitment> {
        (**self).seal_sector(miner, deals)
    }
}

/// Deterministic prover for tests and devnets. Tickets are a plain hash of
/// challenge and miner, so verification is re-derivation; no key material is
/// involved anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeProver;

impl Prover for FakeProver {
    fn create_ticket(&self, challenge: &[u8], miner: &Address) -> anyhow::Result<Ticket> {
        let mut hasher = Sha256::new();
        hasher.update(challenge);
        hasher.update(miner.to_bytes());
        Ok(Ticket::new(hasher.finalize().to_vec()))
    }

    fn verify_ticket(
        &self,
        challenge: &[u8],
        miner: &Address,
        ticket: &Ticket,
    ) -> anyhow::Result<bool> {
        Ok(self.create_ticket(challenge, miner)?.as_bytes() == ticket.as_bytes())
    }

    fn seal_sector(&self, miner: &Address, deals: &[DealId]) -> anyhow::Result<Commitment> {
        let mut hasher = Sha256::new();
        hasher.update(miner.to_bytes());
        for deal in deals {
            hasher.update(deal.to_be_bytes());
        }
        Ok(hasher.finalize().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_tickets_verify_and_bind_to_miner() {
        let prover = FakeProver;
        let miner = Address::new_id(33);
        let other = Address::new_id(34);
        let ticket = prover.create_ticket(b"challenge", &miner).unwrap();

        assert!(prover.verify_ticket(b"challenge", &miner, &ticket).unwrap());
        assert!(!prover.verify_ticket(b"challenge", &other, &ticket).unwrap());
        assert!(!prover.verify_ticket(b"other", &miner, &ticket).unwrap());
    }

    #[test]
    fn seals_depend_on_deal_set() {
        let prover = FakeProver;
        let miner = Address::new_id(33);
        let a = prover.seal_sector(&miner, &[1, 2]).unwrap();
        let b = prover.seal_sector(&miner, &[2, 1]).unwrap();
        assert_ne!(a, b);
    }
}
