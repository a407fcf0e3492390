// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use multihash_codetable::{Code, MultihashDigest};

/// Multicodec for `dag-cbor` payloads.
pub const DAG_CBOR: u64 = 0x71;

/// Extension methods for constructing `dag-cbor` [`Cid`]s.
pub trait CidCborExt {
    /// Default CID builder for chain objects: `dag-cbor` codec over a 256 bit
    /// BLAKE2b digest of the canonical encoding.
    fn from_cbor_blake2b256<S: serde::ser::Serialize>(obj: &S) -> anyhow::Result<Cid> {
        let bytes = serde_ipld_dagcbor::to_vec(obj)?;
        Ok(Cid::new_v1(DAG_CBOR, Code::Blake2b256.digest(&bytes)))
    }
}

impl CidCborExt for Cid {}
