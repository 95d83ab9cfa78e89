//! # Chain-Ledger
//!
//! A minimal UTXO ledger: transaction validation against an unspent output
//! set, and a fork-aware block chain that keeps a bounded window of competing
//! branches.
//!
//! ## Architecture
//!
//! Leaves first:
//! - `utxo` — the unspent output set, one independent copy per fork
//! - `transaction` — transaction records and the five validity rules
//! - `ordering` — pluggable candidate ordering (arrival order, highest fee)
//! - `epoch` — greedy acceptance of a batch of candidates
//! - `block` — block records and block connection
//! - `chain` — the fork tree, best chain selection and pruning
//! - `mempool` — pending transactions
//!
//! ## Design Principles
//!
//! 1. **Validation is a query**: validity checks read a UTXO snapshot and
//!    never modify it
//! 2. **Copy on extend**: each fork owns its UTXO set; branches never observe
//!    each other's spends
//! 3. **All or nothing**: a block with one invalid transaction leaves the chain
//!    untouched
//!
//! ## Usage
//!
//! ```rust
//! use chain_ledger::*;
//! use chain_ledger::crypto::{address_of, sign_message, SecretKey};
//!
//! let alice = SecretKey::from_slice(&[1; 32]).unwrap();
//! let bob = SecretKey::from_slice(&[2; 32]).unwrap();
//!
//! let genesis = Block::genesis(address_of(&alice));
//! let mut chain = BlockChain::new(genesis.clone());
//!
//! // Alice pays 20 of her genesis coinbase to Bob
//! let mut tx = Transaction::new();
//! tx.add_input(genesis.coinbase().id(), 0).unwrap();
//! tx.add_output(20, address_of(&bob)).unwrap();
//! let signature = sign_message(&alice, &tx.raw_data_to_sign(0).unwrap()).unwrap();
//! tx.add_signature(signature, 0).unwrap();
//! tx.finalize();
//!
//! let mut block = Block::new(Some(chain.get_max_height_block().id()), address_of(&bob));
//! block.add_transaction(tx).unwrap();
//! block.finalize();
//!
//! assert!(chain.add_block(block));
//! assert_eq!(chain.height(), 2);
//! ```

pub mod types;
pub mod constants;
pub mod config;
pub mod crypto;
pub mod utxo;
pub mod transaction;
pub mod ordering;
pub mod epoch;
pub mod block;
pub mod mempool;
pub mod chain;
pub mod error;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use config::ChainConfig;
pub use error::{ConsensusError, Result};
pub use utxo::UtxoPool;
pub use transaction::TxValidator;
pub use ordering::{ArrivalOrder, MaxFeeOrder, OrderingPolicy};
pub use epoch::{process_epoch, TxHandler};
pub use block::connect_block;
pub use mempool::TransactionPool;
pub use chain::{BlockChain, BlockNode};
