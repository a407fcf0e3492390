// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use ahash::HashMap;
use parking_lot::RwLock;

use crate::actor::miner::State;
use crate::address::Address;
use crate::db::{Error, LedgerStore};

/// A thread-safe `HashMap` implementation of the ledger store, holding the
/// same canonical CBOR a persistent backend would.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    db: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl LedgerStore for MemoryLedgerStore {
    fn get(&self, miner: &Address) -> Result<Option<State>, Error> {
        self.db
            .read()
            .get(&miner.to_bytes())
            .map(|bytes| {
                serde_ipld_dagcbor::from_slice(bytes).map_err(|e| Error::Encoding(e.to_string()))
            })
            .transpose()
    }

    fn put(&self, miner: &Address, state: &State) -> Result<(), Error> {
        let bytes =
            serde_ipld_dagcbor::to_vec(state).map_err(|e| Error::Encoding(e.to_string()))?;
        self.db.write().insert(miner.to_bytes(), bytes);
        Ok(())
    }

    fn exists(&self, miner: &Address) -> Result<bool, Error> {
        Ok(self.db.read().contains_key(&miner.to_bytes()))
    }
}
