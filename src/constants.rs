//! Ledger constants

/// Maximum height distance between the best chain and the fork a new block extends
pub const CUT_OFF_AGE: u64 = 10;

/// Value of the coinbase output created by every block
pub const COINBASE_VALUE: i64 = 25;

/// Height of the genesis block
pub const GENESIS_HEIGHT: u64 = 1;
