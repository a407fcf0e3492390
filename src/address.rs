// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use serde::{Deserialize, Serialize};

/// Network prefix rendered ahead of every address.
pub const NETWORK_PREFIX: &str = "t";

/// Protocol tag for ID addressing.
const ID_PROTOCOL: u8 = 0;

/// Identity of an on-chain actor.
///
/// Only ID addressing is carried here; key-hash protocols resolve to IDs
/// behind the signing boundary and never reach consensus or accounting.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Address(u64);

impl Address {
    pub const fn new_id(id: u64) -> Self {
        Address(id)
    }

    /// Canonical byte form: protocol tag followed by the varint payload.
    /// Used as the ledger-store key for this actor.
    pub fn to_bytes(self) -> Vec<u8> {
        let mut buf = unsigned_varint::encode::u64_buffer();
        let payload = unsigned_varint::encode::u64(self.0, &mut buf);
        let mut bytes = Vec::with_capacity(1 + payload.len());
        bytes.push(ID_PROTOCOL);
        bytes.extend_from_slice(payload);
        bytes
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NETWORK_PREFIX}{ID_PROTOCOL}{}", self.0)
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Address {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Address::new_id(u64::arbitrary(g))
    }
}
