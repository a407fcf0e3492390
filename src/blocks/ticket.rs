// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use serde::{Deserialize, Serialize};

/// A ticket is a marker of a tick of the blockchain's clock: the chain's
/// source of randomness for leader election. The winning miner's prover
/// derives it from the challenge of the round, and the next round's
/// challenge is in turn seeded by the minimum ticket of the tipset.
///
/// Tickets order lexicographically over their raw bytes; that order decides
/// both the canonical block order inside a tipset and which ticket seeds the
/// next challenge.
#[derive(Clone, PartialEq, Eq, Default, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket(Vec<u8>);

impl Ticket {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket({})", hex::encode(&self.0))
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Ticket {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let mut bytes = Vec::<u8>::arbitrary(g);
        bytes.truncate(32);
        if bytes.is_empty() {
            bytes.push(u8::arbitrary(g));
        }
        Ticket::new(bytes)
    }
}
