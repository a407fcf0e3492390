// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::blocks::{Ticket, TipsetKey};
use crate::message::{Receipt, SignedMessage};
use crate::types::ChainEpoch;
use crate::utils::cid::CidCborExt;

/// A full block: header fields plus the messages and receipts it carries.
///
/// Block identity is the [`Cid`] of the block's canonical encoding, never a
/// field of the block itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Miner claiming the election win for this round.
    pub miner_address: Address,
    /// Election ticket the miner's prover derived from the round challenge.
    pub ticket: Ticket,
    /// Key of the parent tipset.
    pub parents: TipsetKey,
    /// Rounds since genesis, counting null rounds.
    pub epoch: ChainEpoch,
    /// Commitment to the state root this tipset's execution produces.
    pub state_root: Cid,
    /// Messages carried by this block, in execution order.
    pub messages: Vec<SignedMessage>,
    /// Receipts matching `messages` one to one.
    pub receipts: Vec<Receipt>,
}

impl Block {
    pub fn cid(&self) -> Cid {
        Cid::from_cbor_blake2b256(self).expect("block serialization cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::tests::block_fixture;

    #[test]
    fn identity_tracks_content() {
        let blk = block_fixture(b"t".to_vec(), 3);
        let mut other = blk.clone();
        assert_eq!(blk.cid(), other.cid());

        other.epoch += 1;
        assert_ne!(blk.cid(), other.cid());
    }
}
