// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use cid::Cid;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::blocks::{Block, Error, Ticket};
use crate::message::SignedMessage;
use crate::types::ChainEpoch;

/// Canonicalized set of block CIDs identifying a tipset. Construction sorts
/// and deduplicates, so equal sets compare equal regardless of input order.
/// The empty key is legal: the genesis tipset has no parents.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TipsetKey(Vec<Cid>);

impl TipsetKey {
    pub fn new(cids: impl IntoIterator<Item = Cid>) -> Self {
        Self(cids.into_iter().sorted().dedup().collect())
    }

    pub fn cids(&self) -> &[Cid] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Cid> for TipsetKey {
    fn from_iter<I: IntoIterator<Item = Cid>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for TipsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}

/// A non-empty set of sibling blocks at one epoch sharing identical parents.
///
/// Blocks are held in canonical order, ticket bytes first and block CID as
/// the tie break, so equality, message ordering and min-ticket selection are
/// deterministic. Construction validates the set; an instance of this type
/// always satisfies the tipset invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tipset {
    /// Invariant: non-empty and canonically sorted.
    blocks: Vec<Block>,
    key: TipsetKey,
}

impl Tipset {
    /// Canonicalizes `blocks` into a tipset, rejecting empty input, epoch or
    /// parent disagreement and duplicate block identities.
    ///
    /// Feeding a tipset's own blocks back in reproduces the tipset exactly.
    pub fn new(blocks: Vec<Block>) -> Result<Self, Error> {
        let Some(first) = blocks.first() else {
            return Err(Error::NoBlocks);
        };
        let epoch = first.epoch;
        let parents = first.parents.clone();
        for block in &blocks {
            if block.epoch != epoch {
                return Err(Error::UnequalEpochs(block.epoch, epoch));
            }
            if block.parents != parents {
                return Err(Error::UnequalParents);
            }
        }

        let mut keyed: Vec<(Cid, Block)> = blocks.into_iter().map(|b| (b.cid(), b)).collect();
        keyed.sort_by(|(a_cid, a), (b_cid, b)| {
            a.ticket.cmp(&b.ticket).then_with(|| a_cid.cmp(b_cid))
        });
        if let Some(((dup, _), _)) = keyed
            .iter()
            .tuple_windows()
            .find(|((a_cid, _), (b_cid, _))| a_cid == b_cid)
        {
            return Err(Error::DuplicateBlock(*dup));
        }

        let key = keyed.iter().map(|(cid, _)| *cid).collect();
        let blocks = keyed.into_iter().map(|(_, block)| block).collect();
        Ok(Self { blocks, key })
    }

    /// Member blocks in canonical order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Block identities in canonical key form; children reference this
    /// tipset through it.
    pub fn key(&self) -> &TipsetKey {
        &self.key
    }

    pub fn epoch(&self) -> ChainEpoch {
        self.first_block().epoch
    }

    /// Parent key shared by every member block.
    pub fn parents(&self) -> &TipsetKey {
        &self.first_block().parents
    }

    /// State commitment declared by the member blocks. Agreement between
    /// members is enforced when the tipset goes through the state
    /// transition, not here.
    pub fn state_root(&self) -> &Cid {
        &self.first_block().state_root
    }

    /// The lexicographically smallest ticket; seeds the next round's
    /// challenge.
    pub fn min_ticket(&self) -> &Ticket {
        &self.first_block().ticket
    }

    /// All messages carried by the tipset: canonical block order outermost,
    /// per-block order preserved within.
    pub fn messages(&self) -> impl Iterator<Item = &SignedMessage> {
        self.blocks.iter().flat_map(|block| block.messages.iter())
    }

    fn first_block(&self) -> &Block {
        &self.blocks[0]
    }
}
