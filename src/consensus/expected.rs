// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use tracing::{debug, trace};

use crate::blocks::{self, Block, Tipset};
use crate::consensus::{
    ConsensusError, ElectionError, PowerTableView, create_challenge, wins_election,
};
use crate::message::SignedMessage;
use crate::proofs::Prover;

/// Applies messages on top of a parent state and returns the new state
/// root. The executor owns all actor semantics; the engine only sequences
/// calls and compares roots.
#[async_trait::async_trait]
pub trait MessageExecutor: Send + Sync {
    async fn apply_messages(
        &self,
        parent_state_root: &Cid,
        messages: &[SignedMessage],
    ) -> anyhow::Result<Cid>;
}

/// The expected-consensus engine.
///
/// The engine owns no mutable state. Power is read through a view keyed by
/// state root, so an in-flight transition is immune to concurrent ledger
/// mutation, and abandoning a transition at any point leaves nothing to
/// roll back.
pub struct Expected<V, P, E> {
    power_table: V,
    prover: P,
    executor: E,
}

impl<V, P, E> Expected<V, P, E>
where
    V: PowerTableView,
    P: Prover,
    E: MessageExecutor,
{
    pub fn new(power_table: V, prover: P, executor: E) -> Self {
        Self {
            power_table,
            prover,
            executor,
        }
    }

    pub fn power_table(&self) -> &V {
        &self.power_table
    }

    pub fn prover(&self) -> &P {
        &self.prover
    }

    /// Runs per-block sanity checks and assembles the canonical tipset.
    ///
    /// Purely structural: no state access, and feeding an existing tipset's
    /// blocks back through yields the identical tipset.
    pub fn validate_tipset(&self, blocks: Vec<Block>) -> Result<Tipset, blocks::Error> {
        for block in &blocks {
            block_sanity_checks(block)?;
        }
        Tipset::new(blocks)
    }

    /// Validates `tipset` against its parents and applies its messages,
    /// returning the computed state root.
    ///
    /// All or nothing: every block must carry a winning election for the
    /// round and the computed root must match every declared commitment,
    /// otherwise the whole tipset is rejected.
    pub async fn run_state_transition(
        &self,
        tipset: &Tipset,
        parents: &Tipset,
        parent_state_root: &Cid,
    ) -> Result<Cid, ConsensusError> {
        // 1. The tipset must link to the parents it is judged against.
        if tipset.parents() != parents.key() {
            return Err(ConsensusError::UnlinkedParents(
                tipset.parents().clone(),
                parents.key().clone(),
            ));
        }
        if tipset.epoch() <= parents.epoch() {
            return Err(ConsensusError::EpochNotAfterParents(
                tipset.epoch(),
                parents.epoch(),
            ));
        }

        // 2. Rounds nobody won between the parents and this tipset.
        let null_count = (tipset.epoch() - parents.epoch() - 1).unsigned_abs();
        let challenge = create_challenge(parents, null_count);

        // 3. Every block must prove a winning election for this round.
        for block in tipset.blocks() {
            self.validate_mining(block, &challenge, parent_state_root)?;
        }

        // 4. Replay all messages, canonical block order outermost, on top of
        //    the parent state.
        let messages: Vec<SignedMessage> = tipset.messages().cloned().collect();
        let computed = self
            .executor
            .apply_messages(parent_state_root, &messages)
            .await
            .map_err(|e| ConsensusError::MessageExecution(e.to_string()))?;

        // 5. Each block committed to the execution result up front.
        for block in tipset.blocks() {
            if block.state_root != computed {
                return Err(ConsensusError::StateRootMismatch {
                    declared: block.state_root,
                    computed,
                });
            }
        }

        debug!(epoch = tipset.epoch(), root = %computed, "tipset accepted");
        Ok(computed)
    }

    fn validate_mining(
        &self,
        block: &Block,
        challenge: &[u8],
        state_root: &Cid,
    ) -> Result<(), ConsensusError> {
        let miner = block.miner_address;
        match self.power_table.has_power(state_root, &miner) {
            Ok(true) => {}
            Ok(false) => return Err(ConsensusError::MinerWithoutPower(miner)),
            Err(e) => return Err(ElectionError::MinerPowerLookup(e.to_string()).into()),
        }
        match self.prover.verify_ticket(challenge, &miner, &block.ticket) {
            Ok(true) => {}
            Ok(false) => return Err(ConsensusError::InvalidTicket(miner)),
            Err(e) => return Err(ConsensusError::TicketVerification(e.to_string())),
        }
        if !wins_election(&self.power_table, state_root, &miner, &block.ticket)? {
            return Err(ConsensusError::FailedElection(miner));
        }
        trace!(%miner, "election verified");
        Ok(())
    }
}

fn block_sanity_checks(block: &Block) -> Result<(), blocks::Error> {
    if block.ticket.is_empty() {
        return Err(blocks::Error::BlockWithoutTicket);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::address::Address;
    use crate::blocks::tests::{block_fixture, sibling_fixture, state_root_fixture};
    use crate::blocks::{Ticket, TipsetKey};
    use crate::consensus::testing::{
        FailingMinerPowerView, FailingTotalPowerView, TestPowerTableView,
    };
    use crate::message::Receipt;
    use crate::proofs::FakeProver;
    use crate::types::StoragePower;
    use crate::utils::cid::CidCborExt;

    /// Deterministic executor: the new root hashes the parent root together
    /// with the applied messages.
    struct StubExecutor;

    #[async_trait::async_trait]
    impl MessageExecutor for StubExecutor {
        async fn apply_messages(
            &self,
            parent_state_root: &Cid,
            messages: &[SignedMessage],
        ) -> anyhow::Result<Cid> {
            Cid::from_cbor_blake2b256(&(parent_state_root, messages))
        }
    }

    struct FailingExecutor;

    #[async_trait::async_trait]
    impl MessageExecutor for FailingExecutor {
        async fn apply_messages(
            &self,
            _parent_state_root: &Cid,
            _messages: &[SignedMessage],
        ) -> anyhow::Result<Cid> {
            Err(anyhow!("executor offline"))
        }
    }

    fn parents_fixture() -> (Tipset, Cid) {
        let parents = Tipset::new(sibling_fixture(&[b"pa".to_vec(), b"pb".to_vec()], 1)).unwrap();
        (parents, state_root_fixture("parent-state"))
    }

    /// A child tipset whose single block carries a properly derived ticket
    /// and commits to the root the stub executor will compute.
    async fn winning_child(
        parents: &Tipset,
        parent_root: &Cid,
        epoch: i64,
        miner: Address,
    ) -> Tipset {
        let null_count = (epoch - parents.epoch() - 1).unsigned_abs();
        let challenge = create_challenge(parents, null_count);
        let ticket = FakeProver.create_ticket(&challenge, &miner).unwrap();
        let mut block = block_fixture(ticket.as_bytes().to_vec(), epoch);
        block.miner_address = miner;
        block.parents = parents.key().clone();
        block.receipts = vec![Receipt::empty_ok()];
        let computed = StubExecutor
            .apply_messages(parent_root, &block.messages)
            .await
            .unwrap();
        block.state_root = computed;
        Tipset::new(vec![block]).unwrap()
    }

    fn engine(
        view: TestPowerTableView,
    ) -> Expected<TestPowerTableView, FakeProver, StubExecutor> {
        Expected::new(view, FakeProver, StubExecutor)
    }

    #[test]
    fn validate_tipset_rejects_missing_tickets() {
        let engine = engine(TestPowerTableView::new(1, 1));
        let mut blocks = sibling_fixture(&[b"a".to_vec(), b"b".to_vec()], 2);
        blocks[1].ticket = Ticket::new(Vec::new());
        assert_eq!(
            engine.validate_tipset(blocks).unwrap_err(),
            blocks::Error::BlockWithoutTicket
        );
        assert_eq!(
            engine.validate_tipset(Vec::new()).unwrap_err(),
            blocks::Error::NoBlocks
        );
    }

    #[test]
    fn validate_tipset_is_idempotent() {
        let engine = engine(TestPowerTableView::new(1, 1));
        let ts = engine
            .validate_tipset(sibling_fixture(&[b"b".to_vec(), b"a".to_vec()], 2))
            .unwrap();
        let again = engine.validate_tipset(ts.blocks().to_vec()).unwrap();
        assert_eq!(ts, again);
    }

    #[tokio::test]
    async fn accepts_valid_tipsets_deterministically() {
        let (parents, parent_root) = parents_fixture();
        let miner = Address::new_id(1000);
        let child = winning_child(&parents, &parent_root, 2, miner).await;
        let engine = engine(TestPowerTableView::new(5, 5));

        let first = engine
            .run_state_transition(&child, &parents, &parent_root)
            .await
            .unwrap();
        let second = engine
            .run_state_transition(&child, &parents, &parent_root)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(&first, child.state_root());
    }

    #[tokio::test]
    async fn accepts_after_null_rounds() {
        let (parents, parent_root) = parents_fixture();
        let miner = Address::new_id(1000);
        // Epoch 4 on parents at epoch 1 means two empty rounds in between.
        let child = winning_child(&parents, &parent_root, 4, miner).await;
        let engine = engine(TestPowerTableView::new(5, 5));
        engine
            .run_state_transition(&child, &parents, &parent_root)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejects_miners_without_power() {
        let (parents, parent_root) = parents_fixture();
        let miner = Address::new_id(1000);
        let child = winning_child(&parents, &parent_root, 2, miner).await;
        let engine = engine(TestPowerTableView::new(0, 5));

        let err = engine
            .run_state_transition(&child, &parents, &parent_root)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::MinerWithoutPower(m) if m == miner));
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn rejects_lost_elections() {
        let (parents, parent_root) = parents_fixture();
        let miner = Address::new_id(1000);
        let child = winning_child(&parents, &parent_root, 2, miner).await;
        // One unit in an astronomically large total: positive power, so the
        // miner passes the membership check, but the election is hopeless.
        let engine = engine(TestPowerTableView::new(
            1,
            StoragePower::from(1u8) << 300,
        ));

        let err = engine
            .run_state_transition(&child, &parents, &parent_root)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::FailedElection(m) if m == miner));
    }

    #[tokio::test]
    async fn rejects_tickets_not_derived_from_the_challenge() {
        let (parents, parent_root) = parents_fixture();
        let miner = Address::new_id(1000);
        let child = winning_child(&parents, &parent_root, 2, miner).await;
        let mut bent = child.blocks().to_vec();
        let mut bytes = bent[0].ticket.as_bytes().to_vec();
        bytes[0] ^= 0xFF;
        bent[0].ticket = Ticket::new(bytes);
        let child = Tipset::new(bent).unwrap();
        let engine = engine(TestPowerTableView::new(5, 5));

        let err = engine
            .run_state_transition(&child, &parents, &parent_root)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidTicket(m) if m == miner));
    }

    #[tokio::test]
    async fn power_lookup_faults_propagate_as_faults() {
        let (parents, parent_root) = parents_fixture();
        let child = winning_child(&parents, &parent_root, 2, Address::new_id(1000)).await;
        let engine = Expected::new(FailingTotalPowerView, FakeProver, StubExecutor);

        let err = engine
            .run_state_transition(&child, &parents, &parent_root)
            .await
            .unwrap_err();
        assert!(
            err.to_string()
                .contains("couldn't get total power: something went wrong with the total power")
        );
        assert!(!err.is_rejection());
    }

    #[tokio::test]
    async fn miner_power_lookup_faults_propagate_as_faults() {
        let (parents, parent_root) = parents_fixture();
        let child = winning_child(&parents, &parent_root, 2, Address::new_id(1000)).await;
        let engine = Expected::new(FailingMinerPowerView, FakeProver, StubExecutor);

        // The fault must not be mistaken for a powerless miner.
        let err = engine
            .run_state_transition(&child, &parents, &parent_root)
            .await
            .unwrap_err();
        assert!(
            err.to_string()
                .contains("couldn't get miner power: something went wrong with the miner power")
        );
        assert!(!err.is_rejection());
    }

    #[tokio::test]
    async fn rejects_mismatched_state_roots() {
        let (parents, parent_root) = parents_fixture();
        let child = winning_child(&parents, &parent_root, 2, Address::new_id(1000)).await;
        let mut blocks = child.blocks().to_vec();
        blocks[0].state_root = state_root_fixture("not-the-computed-root");
        let child = Tipset::new(blocks).unwrap();
        let engine = engine(TestPowerTableView::new(5, 5));

        let err = engine
            .run_state_transition(&child, &parents, &parent_root)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::StateRootMismatch { .. }));
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn rejects_unlinked_parents_and_stale_epochs() {
        let (parents, parent_root) = parents_fixture();
        let engine = engine(TestPowerTableView::new(5, 5));

        let mut stray = winning_child(&parents, &parent_root, 2, Address::new_id(1000))
            .await
            .blocks()
            .to_vec();
        stray[0].parents = TipsetKey::new([block_fixture(b"zz".to_vec(), 0).cid()]);
        let stray = Tipset::new(stray).unwrap();
        let err = engine
            .run_state_transition(&stray, &parents, &parent_root)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::UnlinkedParents(..)));

        let mut stale = winning_child(&parents, &parent_root, 2, Address::new_id(1000))
            .await
            .blocks()
            .to_vec();
        stale[0].epoch = parents.epoch();
        let stale = Tipset::new(stale).unwrap();
        let err = engine
            .run_state_transition(&stale, &parents, &parent_root)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::EpochNotAfterParents(..)));
    }

    #[tokio::test]
    async fn executor_faults_propagate() {
        let (parents, parent_root) = parents_fixture();
        let child = winning_child(&parents, &parent_root, 2, Address::new_id(1000)).await;
        let engine = Expected::new(TestPowerTableView::new(5, 5), FakeProver, FailingExecutor);

        let err = engine
            .run_state_transition(&child, &parents, &parent_root)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::MessageExecution(_)));
        assert!(!err.is_rejection());
    }
}
