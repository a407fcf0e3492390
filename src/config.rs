// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Node configuration, TOML-loadable with every field defaulted so partial
//! files work.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::EPOCH_DURATION_SECONDS;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mining: MiningConfig,
    pub sectors: SectorConfig,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Seconds to wait after a lost election before rerolling with the next
    /// null-round count.
    pub null_round_seconds: u64,
    /// Bound on the mining worker's inbound and outbound channels.
    pub channel_capacity: usize,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            null_round_seconds: EPOCH_DURATION_SECONDS.unsigned_abs(),
            channel_capacity: 20,
        }
    }
}

impl MiningConfig {
    pub fn null_round_delay(&self) -> Duration {
        Duration::from_secs(self.null_round_seconds)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorConfig {
    /// Capacity of a staged sector, in bytes.
    pub sector_bytes: u64,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            sector_bytes: 256 * 1024 * 1024,
        }
    }
}
