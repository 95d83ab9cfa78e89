//! Error types for ledger validation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("Transaction validation failed: {0}")]
    TransactionValidation(String),

    #[error("UTXO not found: {0}")]
    UtxoNotFound(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Transaction already finalized: {0}")]
    TransactionFinalized(String),

    #[error("Block already finalized: {0}")]
    BlockFinalized(String),

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
