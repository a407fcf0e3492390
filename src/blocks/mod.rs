// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Blocks, tickets and tipsets: the chain's structural layer.

mod block;
mod ticket;
mod tipset;

pub use block::Block;
use cid::Cid;
use thiserror::Error;
pub use ticket::Ticket;
pub use tipset::{Tipset, TipsetKey};

use crate::types::ChainEpoch;

/// Structural failures raised while assembling blocks into tipsets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("no blocks for tipset")]
    NoBlocks,
    #[error("block epoch {0} does not match tipset epoch {1}")]
    UnequalEpochs(ChainEpoch, ChainEpoch),
    #[error("block parents do not match tipset parents")]
    UnequalParents,
    #[error("duplicate block in tipset: {0}")]
    DuplicateBlock(Cid),
    #[error("block has an empty ticket")]
    BlockWithoutTicket,
}
