// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Chain messages and their receipts. Consensus treats both as opaque
//! payloads for the message-execution capability; nothing here carries fee
//! or gas accounting.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::types::{ExitCode, TokenAmount};

/// Method selector within the destination actor.
pub type MethodNum = u64;

/// An unsigned chain message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    pub from: Address,
    pub to: Address,
    /// Sender's nonce, totally ordering messages from one actor.
    pub sequence: u64,
    pub value: TokenAmount,
    pub method_num: MethodNum,
    pub params: Vec<u8>,
}

/// Opaque signature bytes; verification lives behind the prover boundary.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

/// A message together with the signature that authorizes it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedMessage {
    pub message: Message,
    pub signature: Signature,
}

impl SignedMessage {
    pub fn new(message: Message, signature: Signature) -> Self {
        Self { message, signature }
    }
}

/// The result of executing one message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Receipt {
    pub exit_code: ExitCode,
    pub return_data: Vec<u8>,
}

impl Receipt {
    /// Receipt of a message that executed cleanly and returned nothing.
    pub fn empty_ok() -> Self {
        Self {
            exit_code: ExitCode::OK,
            return_data: Vec::new(),
        }
    }
}
