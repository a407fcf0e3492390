// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Expected consensus: storage-power-weighted leader election over tipsets
//! and an all-or-nothing state transition.
//!
//! Rejections split into three families. Structural problems surface as
//! [`crate::blocks::Error`]; a block whose miner fails its election is a
//! mining rejection naming that miner; a tipset whose declared state root
//! disagrees with the computed one is a state mismatch. Capability faults
//! (power lookups, ticket verification, message execution) propagate as
//! their own variants and are never folded into a rejection.

mod election;
mod expected;
mod power_table;

use cid::Cid;
pub use election::{
    CHALLENGE_LEN, Error as ElectionError, create_challenge, is_winning_ticket, wins_election,
};
pub use expected::{Expected, MessageExecutor};
pub use power_table::PowerTableView;
use thiserror::Error;

#[cfg(test)]
pub(crate) use power_table::testing;

use crate::address::Address;
use crate::blocks::{self, TipsetKey};
use crate::types::ChainEpoch;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("invalid tipset: {0}")]
    Structural(#[from] blocks::Error),
    #[error("tipset parents {0} do not match the supplied parents {1}")]
    UnlinkedParents(TipsetKey, TipsetKey),
    #[error("tipset epoch {0} does not advance on parent epoch {1}")]
    EpochNotAfterParents(ChainEpoch, ChainEpoch),
    #[error("miner {0} is not in the power table")]
    MinerWithoutPower(Address),
    #[error("ticket from miner {0} does not derive from the round challenge")]
    InvalidTicket(Address),
    #[error("ticket verification failed: {0}")]
    TicketVerification(String),
    #[error("couldn't check election: {0}")]
    Election(#[from] election::Error),
    #[error("miner {0} did not win the leader election")]
    FailedElection(Address),
    #[error("message execution failed: {0}")]
    MessageExecution(String),
    #[error("block state root does not match computed result (declared {declared}, computed {computed})")]
    StateRootMismatch { declared: Cid, computed: Cid },
}

impl ConsensusError {
    /// Whether this is an ordinary rejection of the tipset rather than a
    /// fault in one of the engine's capabilities.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            ConsensusError::Election(_)
                | ConsensusError::TicketVerification(_)
                | ConsensusError::MessageExecution(_)
        )
    }
}
