// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! End-to-end flow over the public API: register a miner, publish an ask,
//! stage deals into a sealed sector, snapshot power, mine blocks on top of
//! the snapshot and replay them through consensus validation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cid::Cid;
use taiga::actor::market::StorageMarket;
use taiga::actor::miner::MinerAccounting;
use taiga::address::Address;
use taiga::blocks::{Block, Ticket, Tipset, TipsetKey};
use taiga::config::Config;
use taiga::consensus::{Expected, MessageExecutor, PowerTableView, create_challenge};
use taiga::db::{LedgerStore, MemoryLedgerStore};
use taiga::message::SignedMessage;
use taiga::mining::{BlockGenerator, Worker};
use taiga::proofs::{FakeProver, Prover};
use taiga::sector_builder::{Piece, SectorBuilder};
use taiga::types::{AskId, DealId, ExitCode, StoragePower, TokenAmount};
use taiga::utils::cid::CidCborExt;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const MINER: Address = Address::new_id(100);
const OWNER: Address = Address::new_id(1);

/// Market that accepts everything and grants ten units of power per deal.
struct FlatMarket {
    next_ask: AtomicU64,
}

impl StorageMarket for FlatMarket {
    fn add_ask(
        &self,
        _miner: &Address,
        _price: &TokenAmount,
        _size: &StoragePower,
    ) -> anyhow::Result<(AskId, ExitCode)> {
        Ok((self.next_ask.fetch_add(1, Ordering::SeqCst), ExitCode::OK))
    }

    fn commit_deals(
        &self,
        _miner: &Address,
        deals: &[DealId],
    ) -> anyhow::Result<(StoragePower, ExitCode)> {
        Ok((StoragePower::from(10 * deals.len() as u64), ExitCode::OK))
    }
}

struct HashingExecutor;

#[async_trait::async_trait]
impl MessageExecutor for HashingExecutor {
    async fn apply_messages(
        &self,
        parent_state_root: &Cid,
        messages: &[SignedMessage],
    ) -> anyhow::Result<Cid> {
        Cid::from_cbor_blake2b256(&(parent_state_root, messages))
    }
}

/// Builds empty candidate blocks committing to the root the executor will
/// compute for them.
struct EmptyBlockGenerator;

#[async_trait::async_trait]
impl BlockGenerator for EmptyBlockGenerator {
    async fn generate(
        &self,
        base: &Tipset,
        ticket: Ticket,
        null_count: u64,
        miner: Address,
    ) -> anyhow::Result<Block> {
        let no_messages: Vec<SignedMessage> = Vec::new();
        let state_root = Cid::from_cbor_blake2b256(&(base.state_root(), &no_messages))?;
        Ok(Block {
            miner_address: miner,
            ticket,
            parents: base.key().clone(),
            epoch: base.epoch() + 1 + null_count as i64,
            state_root,
            messages: no_messages,
            receipts: Vec::new(),
        })
    }
}

fn genesis_tipset() -> Tipset {
    let genesis = Block {
        miner_address: Address::new_id(0),
        ticket: Ticket::new(b"genesis".to_vec()),
        parents: TipsetKey::default(),
        epoch: 0,
        state_root: Cid::from_cbor_blake2b256(&"genesis-state").unwrap(),
        messages: Vec::new(),
        receipts: Vec::new(),
    };
    Tipset::new(vec![genesis]).unwrap()
}

#[tokio::test]
async fn deals_become_power_and_power_mines_blocks() {
    let config = Config::from_toml(
        "[mining]\n\
         null_round_seconds = 1\n\
         [sectors]\n\
         sector_bytes = 32\n",
    )
    .unwrap();

    let accounting = Arc::new(MinerAccounting::new(
        MemoryLedgerStore::default(),
        FlatMarket {
            next_ask: AtomicU64::new(0),
        },
    ));
    accounting
        .create_ledger(&MINER, OWNER, StoragePower::from(1u64 << 20), 100.into())
        .unwrap();

    // The owner locks capacity on the orderbook.
    let ask = accounting
        .add_ask(&MINER, &OWNER, &TokenAmount::from(5), &StoragePower::from(64))
        .unwrap();
    assert_eq!(ask, 0);

    // Two 16-byte pieces fill the 32-byte staged sector exactly, triggering
    // seal and commit.
    let mut builder = SectorBuilder::new(
        accounting.clone(),
        FakeProver,
        MINER,
        config.sectors.sector_bytes,
    )
    .unwrap();
    builder.add_piece(Piece { deal: 1, size: 16 }).unwrap();
    builder.add_piece(Piece { deal: 2, size: 16 }).unwrap();

    let ledger = accounting.store().get(&MINER).unwrap().unwrap();
    assert_eq!(ledger.locked_storage(), &StoragePower::from(64));
    assert_eq!(ledger.sectors().len(), 1);
    assert!(ledger.sectors()[0].is_committed());
    assert_eq!(accounting.power(&MINER).unwrap(), StoragePower::from(20));

    // Power becomes visible to consensus once sealed under a state root.
    let genesis = Arc::new(genesis_tipset());
    let genesis_root = *genesis.state_root();
    accounting.seal_snapshot(genesis_root).unwrap();
    assert!(accounting.has_power(&genesis_root, &MINER).unwrap());

    let engine = Arc::new(Expected::new(
        accounting.clone(),
        FakeProver,
        HashingExecutor,
    ));
    let token = CancellationToken::new();
    let (bases, results, handle) = Worker::new(
        engine.clone(),
        EmptyBlockGenerator,
        MINER,
        config.mining.clone(),
    )
    .spawn(token.clone());

    // The sole power holder wins the first round outright.
    bases.send_async(genesis.clone()).await.unwrap();
    let block = timeout(Duration::from_secs(30), results.recv_async())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(block.parents, *genesis.key());
    assert_eq!(block.epoch, 1);
    let challenge = create_challenge(&genesis, 0);
    assert!(
        FakeProver
            .verify_ticket(&challenge, &MINER, &block.ticket)
            .unwrap()
    );

    // Peers replay the block through the same engine and land on the root it
    // declared.
    let mined = engine.validate_tipset(vec![block.clone()]).unwrap();
    let computed = engine
        .run_state_transition(&mined, &genesis, &genesis_root)
        .await
        .unwrap();
    assert_eq!(&computed, mined.state_root());

    // The mined tipset becomes the next base once its power is sealed.
    accounting.seal_snapshot(computed).unwrap();
    let mined = Arc::new(mined);
    bases.send_async(mined.clone()).await.unwrap();
    let next = timeout(Duration::from_secs(30), results.recv_async())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(next.parents, *mined.key());
    assert_eq!(next.epoch, 2);

    token.cancel();
    handle.await.unwrap();
}
