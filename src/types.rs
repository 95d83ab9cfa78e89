//! Core ledger types

use serde::{Deserialize, Serialize};

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Integer type
pub type Integer = i64;

/// OutPoint: the key of an unspent output, (source transaction id, output index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: Natural,
}

impl OutPoint {
    pub fn new(hash: Hash, index: Natural) -> Self {
        Self { hash, index }
    }
}

/// Transaction Input: the output being spent and the owner's signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub signature: ByteString,
}

/// Transaction Output: an amount and the address (public key) that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Integer,
    pub address: ByteString,
}

/// Transaction
///
/// Fields are frozen once `hash` is set by `finalize`; see `transaction.rs`
/// for the builder and validation functions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) inputs: Vec<TransactionInput>,
    pub(crate) outputs: Vec<TransactionOutput>,
    /// Extra entropy carried only by coinbase transactions
    pub(crate) coinbase_data: ByteString,
    /// Not serialized; ids are recomputed from content after decoding
    #[serde(skip)]
    pub(crate) hash: Option<Hash>,
}

/// Block: parent link, one coinbase and an ordered list of regular transactions
///
/// `prev_block_hash` is `None` only for genesis. See `block.rs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) prev_block_hash: Option<Hash>,
    pub(crate) coinbase: Transaction,
    pub(crate) transactions: Vec<Transaction>,
    #[serde(skip)]
    pub(crate) hash: Option<Hash>,
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}
