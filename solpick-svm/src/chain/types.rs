//! Wire types for the JSON-RPC responses the verifier reads.
//!
//! Only the fields the payment flow looks at are modelled; everything else in
//! the node's response is ignored during deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Address;

/// One entry of a `getSignaturesForAddress` response, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    /// Base58 transaction signature.
    pub signature: String,
    /// Slot the transaction landed in.
    #[serde(default)]
    pub slot: u64,
    /// Execution error, `None` when the transaction succeeded.
    #[serde(default)]
    pub err: Option<Value>,
    /// Memo attached to the transaction, if any.
    #[serde(default)]
    pub memo: Option<String>,
    /// Estimated production time as a Unix timestamp.
    #[serde(default)]
    pub block_time: Option<i64>,
    /// Cluster confirmation status (`processed`, `confirmed`, `finalized`).
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

impl SignatureInfo {
    /// A successful entry carrying only a signature.
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            slot: 0,
            err: None,
            memo: None,
            block_time: None,
            confirmation_status: None,
        }
    }

    /// Whether the node reports the transaction as failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.err.is_some()
    }
}

/// A transaction fetched with `jsonParsed` encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    /// Slot the transaction landed in.
    #[serde(default)]
    pub slot: u64,
    /// Estimated production time as a Unix timestamp.
    #[serde(default)]
    pub block_time: Option<i64>,
    /// Status metadata.
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    /// The transaction body.
    pub transaction: ParsedTransactionBody,
}

impl ParsedTransaction {
    /// Top-level instructions in program order.
    #[must_use]
    pub fn instructions(&self) -> &[UiInstruction] {
        &self.transaction.message.instructions
    }

    /// Account keys referenced by the message.
    #[must_use]
    pub fn account_keys(&self) -> &[ParsedAccountKey] {
        &self.transaction.message.account_keys
    }

    /// Whether `address` is among the message's account keys, in any role.
    #[must_use]
    pub fn references_account(&self, address: &Address) -> bool {
        self.account_keys()
            .iter()
            .any(|key| key.address().as_ref() == Some(address))
    }
}

/// Status metadata attached to a fetched transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    /// Execution error, `None` when the transaction succeeded.
    #[serde(default)]
    pub err: Option<Value>,
    /// Fee paid in lamports.
    #[serde(default)]
    pub fee: u64,
}

/// Signatures plus message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransactionBody {
    /// Base58 signatures, fee payer first.
    #[serde(default)]
    pub signatures: Vec<String>,
    /// The parsed message.
    pub message: ParsedMessage,
}

/// A message as rendered by `jsonParsed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMessage {
    /// Every account the message touches.
    #[serde(default)]
    pub account_keys: Vec<ParsedAccountKey>,
    /// Top-level instructions.
    #[serde(default)]
    pub instructions: Vec<UiInstruction>,
}

/// An entry of `accountKeys` with its role flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAccountKey {
    /// Base58 public key.
    pub pubkey: String,
    /// Signed the transaction.
    #[serde(default)]
    pub signer: bool,
    /// Writable in this transaction.
    #[serde(default)]
    pub writable: bool,
    /// `transaction` or `lookupTable`.
    #[serde(default)]
    pub source: Option<String>,
}

impl ParsedAccountKey {
    /// The key as an [`Address`], `None` if the node sent something undecodable.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        self.pubkey.parse().ok()
    }
}

/// An instruction in a `jsonParsed` message.
///
/// Programs the node knows how to decode come back as [`ParsedInstruction`];
/// everything else as [`PartiallyDecodedInstruction`]. Anything matching
/// neither shape is kept as raw JSON so one odd instruction does not fail the
/// whole transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiInstruction {
    /// Decoded by the node.
    Parsed(ParsedInstruction),
    /// Program id, accounts and raw data only.
    PartiallyDecoded(PartiallyDecodedInstruction),
    /// Unrecognized shape.
    Unknown(Value),
}

/// An instruction the node decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInstruction {
    /// Program name, e.g. `system`.
    #[serde(default)]
    pub program: String,
    /// Base58 program id.
    pub program_id: String,
    /// Decoded payload, usually `{"type": ..., "info": {...}}`.
    pub parsed: Value,
    /// Invocation depth.
    #[serde(default)]
    pub stack_height: Option<u32>,
}

/// An instruction the node could not decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartiallyDecodedInstruction {
    /// Base58 program id.
    pub program_id: String,
    /// Base58 account keys.
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Base58 instruction data.
    #[serde(default)]
    pub data: String,
    /// Invocation depth.
    #[serde(default)]
    pub stack_height: Option<u32>,
}

/// Response value of `getLatestBlockhash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestBlockhash {
    /// Base58 blockhash.
    pub blockhash: String,
    /// Last block height at which the blockhash is valid.
    pub last_valid_block_height: u64,
}
