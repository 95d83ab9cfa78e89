//! Fork-aware block chain
//!
//! Every accepted block becomes a `BlockNode` owning the UTXO set reached by
//! applying it on top of its parent. Nodes form a tree rooted at genesis; the
//! best chain ends at the highest node, and the first node to reach a height
//! keeps that position against later siblings of equal height.
//!
//! A block may only extend a node at most `cutoff_age` blocks below the best
//! height. Nodes lower than that can never gain children and are pruned, which
//! bounds memory to roughly `cutoff_age` times the fork width.

use std::collections::HashMap;

use log::{debug, info};

use crate::block::{apply_transaction, connect_block};
use crate::config::ChainConfig;
use crate::constants::GENESIS_HEIGHT;
use crate::crypto::hex_prefix;
use crate::error::{ConsensusError, Result};
use crate::mempool::TransactionPool;
use crate::types::*;
use crate::utxo::UtxoPool;

/// One accepted block and the ledger state after it
#[derive(Debug, Clone)]
pub struct BlockNode {
    block: Block,
    utxo_pool: UtxoPool,
    height: Natural,
}

impl BlockNode {
    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn utxo_pool(&self) -> &UtxoPool {
        &self.utxo_pool
    }

    pub fn height(&self) -> Natural {
        self.height
    }
}

#[derive(Debug)]
pub struct BlockChain {
    config: ChainConfig,
    nodes: HashMap<Hash, BlockNode>,
    best: Hash,
    height: Natural,
    tx_pool: TransactionPool,
}

impl BlockChain {
    /// Chain holding only `genesis`, with the default configuration
    pub fn new(genesis: Block) -> Self {
        Self::with_config(genesis, ChainConfig::default())
    }

    /// Chain holding only `genesis`
    ///
    /// Genesis is trusted: its transactions and coinbase are applied to an
    /// empty UTXO set without validation.
    pub fn with_config(mut genesis: Block, config: ChainConfig) -> Self {
        let hash = genesis.finalize();

        let mut utxo_pool = UtxoPool::new();
        for tx in genesis.transactions() {
            utxo_pool = apply_transaction(tx, utxo_pool);
        }
        utxo_pool.add_outputs_of(genesis.coinbase());

        let mut nodes = HashMap::new();
        nodes.insert(
            hash,
            BlockNode {
                block: genesis,
                utxo_pool,
                height: GENESIS_HEIGHT,
            },
        );

        info!("chain started at genesis {}", hex_prefix(&hash));
        Self {
            config,
            nodes,
            best: hash,
            height: GENESIS_HEIGHT,
            tx_pool: TransactionPool::new(),
        }
    }

    /// Add `block` if it is valid; see `submit_block` for the rejection reason
    pub fn add_block(&mut self, block: Block) -> bool {
        self.submit_block(block).is_valid()
    }

    /// AddBlock: ℬ → {valid, invalid}
    ///
    /// 1. The parent must be a known node (genesis-shaped blocks never are)
    /// 2. best height - parent height ≤ cutoff age
    /// 3. Every transaction must be valid, in block order, against a copy of
    ///    the parent's UTXO set
    /// 4. New node at parent height + 1; its transactions leave the mempool
    /// 5. Strictly higher nodes become the best chain
    ///
    /// Rejection leaves the chain and the mempool untouched.
    pub fn submit_block(&mut self, mut block: Block) -> ValidationResult {
        let block_hash = block.id();
        let verdict = self.check_parent(&block, &block_hash);
        let parent = match verdict {
            Ok(parent) => parent,
            Err(reason) => return self.reject(&block_hash, reason),
        };

        let (result, utxo_pool) = connect_block(&block, parent.utxo_pool.clone());
        if let ValidationResult::Invalid(reason) = result {
            return self.reject(&block_hash, reason);
        }

        let height = parent.height + 1;
        let block_hash = block.finalize();
        for tx in block.transactions() {
            self.tx_pool.remove_transaction(&tx.id());
        }
        let tx_count = block.transactions().len();
        self.nodes.insert(block_hash, BlockNode { block, utxo_pool, height });
        info!(
            "accepted block {} at height {} with {} transactions",
            hex_prefix(&block_hash),
            height,
            tx_count
        );

        if height > self.height {
            self.height = height;
            self.best = block_hash;
            info!("best chain now ends at {} (height {})", hex_prefix(&block_hash), height);
        }

        if self.config.prune_stale_forks {
            self.prune();
        }
        ValidationResult::Valid
    }

    fn check_parent(&self, block: &Block, block_hash: &Hash) -> std::result::Result<&BlockNode, String> {
        let prev = block
            .prev_block_hash()
            .ok_or_else(|| "Genesis block cannot extend the chain".to_string())?;
        let parent = self
            .nodes
            .get(&prev)
            .ok_or_else(|| format!("Unknown parent block {}", hex_prefix(&prev)))?;
        if self.nodes.contains_key(block_hash) {
            return Err("Block already in chain".to_string());
        }
        let age = self.height.saturating_sub(parent.height);
        if age > self.config.cutoff_age {
            return Err(format!(
                "Parent at height {} is {} blocks behind best height {} (cutoff {})",
                parent.height, age, self.height, self.config.cutoff_age
            ));
        }
        Ok(parent)
    }

    fn reject(&self, block_hash: &Hash, reason: String) -> ValidationResult {
        debug!("rejected block {}: {}", hex_prefix(block_hash), reason);
        ValidationResult::Invalid(reason)
    }

    /// Pool `tx` and register its outputs against the best fork's UTXO set
    ///
    /// The transaction is not validated here; it is checked when a block
    /// containing it is added. Outputs registered this way are not removed if
    /// the best chain later moves to another fork.
    pub fn add_transaction(&mut self, tx: Transaction) {
        if !self.tx_pool.add_transaction(tx.clone()) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(&self.best) {
            node.utxo_pool.add_outputs_of(&tx);
        }
    }

    /// Drop nodes more than `cutoff_age + 1` below the best height; returns how many
    pub fn prune(&mut self) -> usize {
        let min_height = self.height.saturating_sub(self.config.cutoff_age.saturating_add(1));
        let before = self.nodes.len();
        self.nodes.retain(|_, node| node.height >= min_height);
        let pruned = before - self.nodes.len();
        if pruned > 0 {
            debug!("pruned {} block nodes below height {}", pruned, min_height);
        }
        pruned
    }

    fn best_node(&self) -> &BlockNode {
        &self.nodes[&self.best]
    }

    pub fn get_max_height_block(&self) -> &Block {
        &self.best_node().block
    }

    /// UTXO set for mining on top of the best block
    pub fn get_max_height_utxo_pool(&self) -> &UtxoPool {
        &self.best_node().utxo_pool
    }

    pub fn get_transaction_pool(&self) -> &TransactionPool {
        &self.tx_pool
    }

    pub fn get_block_node(&self, hash: &Hash) -> Result<&BlockNode> {
        self.nodes
            .get(hash)
            .ok_or_else(|| ConsensusError::UnknownBlock(hex_prefix(hash)))
    }

    pub fn contains_block(&self, hash: &Hash) -> bool {
        self.nodes.contains_key(hash)
    }

    /// Hashes from the best block back to the oldest retained ancestor
    pub fn best_chain(&self) -> Vec<Hash> {
        let mut chain = vec![self.best];
        let mut current = self.best_node();
        while let Some(prev) = current.block.prev_block_hash() {
            match self.nodes.get(&prev) {
                Some(node) => {
                    chain.push(prev);
                    current = node;
                }
                None => break,
            }
        }
        chain
    }

    /// Height of the best block
    pub fn height(&self) -> Natural {
        self.height
    }

    /// Number of retained block nodes across all forks
    pub fn block_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COINBASE_VALUE, CUT_OFF_AGE};

    fn address(byte: u8) -> ByteString {
        vec![byte; 33]
    }

    fn chain() -> (BlockChain, Hash) {
        let mut genesis = Block::genesis(address(2));
        let hash = genesis.finalize();
        (BlockChain::new(genesis), hash)
    }

    fn child(parent: Hash, miner: u8) -> Block {
        let mut block = Block::new(Some(parent), address(miner));
        block.finalize();
        block
    }

    #[test]
    fn test_genesis_state() {
        let (chain, genesis) = chain();
        assert_eq!(chain.height(), GENESIS_HEIGHT);
        assert_eq!(chain.get_max_height_block().id(), genesis);
        assert_eq!(chain.get_max_height_utxo_pool().total_value(), Some(COINBASE_VALUE));
        assert!(chain.get_transaction_pool().is_empty());
    }

    #[test]
    fn test_reject_genesis_shaped_block() {
        let (mut chain, _) = chain();
        let result = chain.submit_block(Block::genesis(address(3)));
        assert!(!result.is_valid());
        assert_eq!(chain.block_count(), 1);
    }

    #[test]
    fn test_reject_unknown_parent() {
        let (mut chain, _) = chain();
        assert!(!chain.add_block(child([9; 32], 2)));
        assert_eq!(chain.block_count(), 1);
    }

    #[test]
    fn test_reject_duplicate_block() {
        let (mut chain, genesis) = chain();
        assert!(chain.add_block(child(genesis, 2)));
        assert!(!chain.add_block(child(genesis, 2)));
        assert_eq!(chain.block_count(), 2);
    }

    #[test]
    fn test_equal_height_keeps_first() {
        let (mut chain, genesis) = chain();
        let first = child(genesis, 2);
        let second = child(genesis, 3);
        assert!(chain.add_block(first.clone()));
        assert!(chain.add_block(second));
        assert_eq!(chain.get_max_height_block().id(), first.id());
    }

    #[test]
    fn test_cutoff_boundary() {
        let (mut chain, genesis) = chain();
        let mut tip = genesis;
        for _ in 0..CUT_OFF_AGE {
            let block = child(tip, 2);
            tip = block.id();
            assert!(chain.add_block(block));
        }
        // best height 11, genesis at 1: exactly cutoff_age behind
        assert!(chain.add_block(child(genesis, 3)));

        let block = child(tip, 2);
        assert!(chain.add_block(block));
        // best height 12: genesis now one past the cutoff
        assert!(!chain.add_block(child(genesis, 4)));
    }

    #[test]
    fn test_prune_bounds_nodes() {
        let (mut chain, genesis) = chain();
        let mut tip = genesis;
        for _ in 0..30 {
            let block = child(tip, 2);
            tip = block.id();
            assert!(chain.add_block(block));
        }
        assert_eq!(chain.height(), 31);
        assert_eq!(chain.block_count() as u64, CUT_OFF_AGE + 2);
        assert!(!chain.contains_block(&genesis));
        assert!(matches!(
            chain.get_block_node(&genesis),
            Err(ConsensusError::UnknownBlock(_))
        ));
        assert_eq!(chain.best_chain().len() as u64, CUT_OFF_AGE + 2);
    }

    #[test]
    fn test_pruning_disabled_keeps_everything() {
        let mut genesis = Block::genesis(address(2));
        let mut tip = genesis.finalize();
        let config = ChainConfig { cutoff_age: 2, prune_stale_forks: false };
        let mut chain = BlockChain::with_config(genesis, config);
        for _ in 0..6 {
            let block = child(tip, 2);
            tip = block.id();
            assert!(chain.add_block(block));
        }
        assert_eq!(chain.block_count(), 7);
        assert_eq!(chain.prune(), 3);
        assert_eq!(chain.block_count(), 4);
    }

    #[test]
    fn test_unbounded_cutoff_never_prunes() {
        let mut genesis = Block::genesis(address(2));
        let mut tip = genesis.finalize();
        let config = ChainConfig { cutoff_age: u64::MAX, prune_stale_forks: true };
        let mut chain = BlockChain::with_config(genesis, config);
        for _ in 0..3 {
            let block = child(tip, 2);
            tip = block.id();
            assert!(chain.add_block(block));
        }
        assert_eq!(chain.block_count(), 4);
        assert_eq!(chain.prune(), 0);
    }

    #[test]
    fn test_add_transaction_registers_outputs() {
        let (mut chain, _) = chain();
        let mut tx = Transaction::new();
        tx.add_output(5, address(7)).unwrap();
        let id = tx.finalize();

        chain.add_transaction(tx.clone());
        chain.add_transaction(tx);

        assert_eq!(chain.get_transaction_pool().len(), 1);
        assert!(chain.get_max_height_utxo_pool().contains(&OutPoint::new(id, 0)));
    }
}
