// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Block production: an async worker that turns newly observed heaviest
//! tipsets into mining attempts.
//!
//! The worker owns no chain state. It derives challenges from the base
//! tipset it was handed, rolls tickets through the prover until one wins,
//! has the generator assemble a candidate block and self-checks the
//! candidate through the same engine path peers will validate it with.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::address::Address;
use crate::blocks::{Block, Ticket, Tipset};
use crate::config::MiningConfig;
use crate::consensus::{Expected, MessageExecutor, PowerTableView, create_challenge, wins_election};
use crate::proofs::Prover;

/// Assembles a candidate block for a won election: chooses messages, fills
/// the header and computes the state-root commitment.
#[async_trait::async_trait]
pub trait BlockGenerator: Send + Sync {
    async fn generate(
        &self,
        base: &Tipset,
        ticket: Ticket,
        null_count: u64,
        miner: Address,
    ) -> anyhow::Result<Block>;
}

/// Mines on top of whichever base tipset arrived last.
///
/// At most one attempt runs at a time; a newer base replaces the running
/// attempt. Attempt outcomes, including faults, surface on the outbound
/// channel; the worker itself only stops on cancellation or when the
/// inbound channel closes.
pub struct Worker<V, P, E, G> {
    engine: Arc<Expected<V, P, E>>,
    generator: G,
    miner: Address,
    config: MiningConfig,
}

impl<V, P, E, G> Worker<V, P, E, G>
where
    V: PowerTableView + 'static,
    P: Prover + 'static,
    E: MessageExecutor + 'static,
    G: BlockGenerator + 'static,
{
    pub fn new(
        engine: Arc<Expected<V, P, E>>,
        generator: G,
        miner: Address,
        config: MiningConfig,
    ) -> Self {
        Self {
            engine,
            generator,
            miner,
            config,
        }
    }

    /// Starts the worker task. Returns the base sender, the result receiver
    /// and the handle to join for shutdown.
    pub fn spawn(
        self,
        token: CancellationToken,
    ) -> (
        flume::Sender<Arc<Tipset>>,
        flume::Receiver<anyhow::Result<Block>>,
        JoinHandle<()>,
    ) {
        let (base_tx, base_rx) = flume::bounded(self.config.channel_capacity);
        let (result_tx, result_rx) = flume::bounded(self.config.channel_capacity);
        let handle = tokio::spawn(self.run(token, base_rx, result_tx));
        (base_tx, result_rx, handle)
    }

    async fn run(
        self,
        token: CancellationToken,
        bases: flume::Receiver<Arc<Tipset>>,
        results: flume::Sender<anyhow::Result<Block>>,
    ) {
        let mut attempt: Option<BoxFuture<'_, anyhow::Result<Block>>> = None;
        loop {
            tokio::select! {
                () = token.cancelled() => {
                    debug!(miner = %self.miner, "mining worker cancelled");
                    break;
                }
                base = bases.recv_async() => match base {
                    Ok(base) => {
                        if attempt.is_some() {
                            debug!(epoch = base.epoch(), "new head preempts the running attempt");
                        }
                        attempt = Some(self.attempt(base).boxed());
                    }
                    // Inbound closed: no further bases will arrive.
                    Err(_) => break,
                },
                result = poll_attempt(&mut attempt) => {
                    attempt = None;
                    if let Err(e) = &result {
                        warn!(miner = %self.miner, "mining attempt failed: {e:#}");
                    }
                    // The outbound channel is bounded; a stalled consumer
                    // must not make the worker deaf to cancellation.
                    tokio::select! {
                        () = token.cancelled() => break,
                        sent = results.send_async(result) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    /// One production attempt on `base`, rerolling through null rounds until
    /// the election is won.
    async fn attempt(&self, base: Arc<Tipset>) -> anyhow::Result<Block> {
        let parent_state_root = *base.state_root();
        let mut null_count: u64 = 0;
        loop {
            let challenge = create_challenge(&base, null_count);
            let ticket = self
                .engine
                .prover()
                .create_ticket(&challenge, &self.miner)?;
            if !wins_election(
                self.engine.power_table(),
                &parent_state_root,
                &self.miner,
                &ticket,
            )? {
                trace!(miner = %self.miner, null_count, "election lost, waiting out the round");
                tokio::time::sleep(self.config.null_round_delay()).await;
                null_count += 1;
                continue;
            }

            debug!(miner = %self.miner, null_count, "election won");
            let block = self
                .generator
                .generate(&base, ticket, null_count, self.miner)
                .await?;
            // The candidate must survive the same validation peers will run.
            let tipset = self.engine.validate_tipset(vec![block.clone()])?;
            self.engine
                .run_state_transition(&tipset, &base, &parent_state_root)
                .await?;
            return Ok(block);
        }
    }
}

/// Drives the in-flight attempt; dormant when there is none.
async fn poll_attempt<T>(attempt: &mut Option<BoxFuture<'_, T>>) -> T {
    match attempt {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}
