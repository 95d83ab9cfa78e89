//! Blocks and block connection

use crate::constants::COINBASE_VALUE;
use crate::crypto::{hash_bytes, hex_prefix};
use crate::error::{ConsensusError, Result};
use crate::transaction::TxValidator;
use crate::types::*;
use crate::utxo::UtxoPool;

impl Block {
    /// Block on top of `prev_block_hash` whose coinbase pays `COINBASE_VALUE` to `coinbase_address`
    pub fn new(prev_block_hash: Option<Hash>, coinbase_address: ByteString) -> Self {
        let coinbase_data = prev_block_hash.map(|h| h.to_vec()).unwrap_or_default();
        Block {
            prev_block_hash,
            coinbase: Transaction::coinbase(COINBASE_VALUE, coinbase_address, coinbase_data),
            transactions: Vec::new(),
            hash: None,
        }
    }

    pub fn genesis(coinbase_address: ByteString) -> Self {
        Self::new(None, coinbase_address)
    }

    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        if let Some(hash) = self.hash {
            return Err(ConsensusError::BlockFinalized(hex_prefix(&hash)));
        }
        self.transactions.push(tx);
        Ok(())
    }

    /// Canonical encoding hashed into the block id
    pub fn raw_block(&self) -> ByteString {
        let mut data = Vec::new();
        match &self.prev_block_hash {
            Some(prev) => {
                data.push(1);
                data.extend_from_slice(prev);
            }
            None => data.push(0),
        }
        data.extend_from_slice(&self.coinbase.id());
        data.extend_from_slice(&(self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            data.extend_from_slice(&tx.id());
        }
        data
    }

    /// Freeze the block and return its id; idempotent
    pub fn finalize(&mut self) -> Hash {
        match self.hash {
            Some(hash) => hash,
            None => {
                let hash = hash_bytes(&self.raw_block());
                self.hash = Some(hash);
                hash
            }
        }
    }

    pub fn hash(&self) -> Option<Hash> {
        self.hash
    }

    /// Id of the block, computed from current content when not finalized
    pub fn id(&self) -> Hash {
        self.hash.unwrap_or_else(|| hash_bytes(&self.raw_block()))
    }

    pub fn prev_block_hash(&self) -> Option<Hash> {
        self.prev_block_hash
    }

    pub fn coinbase(&self) -> &Transaction {
        &self.coinbase
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

/// ConnectBlock: ℬ × 𝒰𝒮 → {valid, invalid} × 𝒰𝒮
///
/// For block b = (prev, coinbase, txs) on top of the parent's UTXO set us:
/// 1. coinbase must have no inputs
/// 2. For each tx ∈ txs in block order:
///    - tx must be valid against us
///    - us = ApplyTransaction(tx, us)
/// 3. us = us ∪ outputs(coinbase)
/// 4. Return (valid, us)
///
/// All or nothing: the first invalid transaction rejects the block and the
/// returned set must be discarded. Pass in a copy of the parent's set.
pub fn connect_block(block: &Block, mut utxo_pool: UtxoPool) -> (ValidationResult, UtxoPool) {
    if !block.coinbase.is_coinbase() {
        return (
            ValidationResult::Invalid("Coinbase transaction has inputs".to_string()),
            utxo_pool,
        );
    }

    for (i, tx) in block.transactions.iter().enumerate() {
        if let ValidationResult::Invalid(reason) = TxValidator::new(&utxo_pool).check_tx(tx) {
            return (
                ValidationResult::Invalid(format!("Invalid transaction at index {}: {}", i, reason)),
                utxo_pool,
            );
        }
        utxo_pool = apply_transaction(tx, utxo_pool);
    }

    utxo_pool.add_outputs_of(&block.coinbase);
    (ValidationResult::Valid, utxo_pool)
}

/// ApplyTransaction: 𝒯𝒳 × 𝒰𝒮 → 𝒰𝒮
///
/// us' = (us \ {i.prevout : i ∈ tx.inputs}) ∪ {(tx.id, i) ↦ tx.outputs[i]}
pub fn apply_transaction(tx: &Transaction, mut utxo_pool: UtxoPool) -> UtxoPool {
    utxo_pool.remove_inputs_of(tx);
    utxo_pool.add_outputs_of(tx);
    utxo_pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{address_of, sign_message, SecretKey};

    fn key(byte: u8) -> SecretKey {
        SecretKey::from_slice(&[byte; 32]).unwrap()
    }

    fn spend(outpoint: OutPoint, owner: &SecretKey, value: Integer, to: &SecretKey) -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(outpoint.hash, outpoint.index).unwrap();
        tx.add_output(value, address_of(to)).unwrap();
        let sig = sign_message(owner, &tx.raw_data_to_sign(0).unwrap()).unwrap();
        tx.add_signature(sig, 0).unwrap();
        tx.finalize();
        tx
    }

    fn genesis_pool(owner: &SecretKey) -> (Block, UtxoPool) {
        let mut genesis = Block::genesis(address_of(owner));
        genesis.finalize();
        let mut pool = UtxoPool::new();
        pool.add_outputs_of(genesis.coinbase());
        (genesis, pool)
    }

    #[test]
    fn test_connect_block_valid() {
        let alice = key(1);
        let bob = key(2);
        let (genesis, pool) = genesis_pool(&alice);
        let coin = OutPoint::new(genesis.coinbase().id(), 0);

        let mut block = Block::new(Some(genesis.id()), address_of(&bob));
        let tx = spend(coin, &alice, 20, &bob);
        block.add_transaction(tx.clone()).unwrap();
        block.finalize();

        let (result, pool) = connect_block(&block, pool);
        assert_eq!(result, ValidationResult::Valid);
        assert!(!pool.contains(&coin));
        assert_eq!(pool.get_tx_output(&OutPoint::new(tx.id(), 0)).unwrap().value, 20);
        assert_eq!(
            pool.get_tx_output(&OutPoint::new(block.coinbase().id(), 0)).unwrap().value,
            COINBASE_VALUE
        );
    }

    #[test]
    fn test_connect_block_double_spend_across_transactions() {
        let alice = key(1);
        let (genesis, pool) = genesis_pool(&alice);
        let coin = OutPoint::new(genesis.coinbase().id(), 0);

        let mut block = Block::new(Some(genesis.id()), address_of(&alice));
        block.add_transaction(spend(coin, &alice, 10, &key(2))).unwrap();
        block.add_transaction(spend(coin, &alice, 11, &key(3))).unwrap();

        let (result, _) = connect_block(&block, pool);
        assert!(matches!(result, ValidationResult::Invalid(ref r) if r.contains("index 1")));
    }

    #[test]
    fn test_connect_block_chained_spend() {
        let alice = key(1);
        let bob = key(2);
        let (genesis, pool) = genesis_pool(&alice);
        let coin = OutPoint::new(genesis.coinbase().id(), 0);

        let first = spend(coin, &alice, 25, &bob);
        let second = spend(OutPoint::new(first.id(), 0), &bob, 24, &alice);
        let mut block = Block::new(Some(genesis.id()), address_of(&bob));
        block.add_transaction(first).unwrap();
        block.add_transaction(second.clone()).unwrap();

        let (result, pool) = connect_block(&block, pool);
        assert!(result.is_valid());
        assert!(pool.contains(&OutPoint::new(second.id(), 0)));
    }

    #[test]
    fn test_connect_block_rejects_coinbase_with_inputs() {
        let alice = key(1);
        let (genesis, pool) = genesis_pool(&alice);
        let mut block = Block::new(Some(genesis.id()), address_of(&alice));
        let mut coinbase = Transaction::new();
        coinbase.add_input([1; 32], 0).unwrap();
        coinbase.add_output(COINBASE_VALUE, address_of(&alice)).unwrap();
        block.coinbase = coinbase;

        let (result, _) = connect_block(&block, pool);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_apply_transaction() {
        let mut pool = UtxoPool::new();
        let spent = OutPoint::new([5; 32], 1);
        pool.add_utxo(spent, TransactionOutput { value: 3, address: vec![] });

        let mut tx = Transaction::new();
        tx.add_input(spent.hash, spent.index).unwrap();
        tx.add_output(1, vec![]).unwrap();
        tx.add_output(2, vec![]).unwrap();

        let pool = apply_transaction(&tx, pool);
        assert!(!pool.contains(&spent));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_block_finalize_freezes() {
        let mut block = Block::genesis(vec![0x02; 33]);
        let id = block.finalize();
        assert_eq!(block.finalize(), id);
        assert!(block.prev_block_hash().is_none());
        assert!(matches!(
            block.add_transaction(Transaction::new()),
            Err(ConsensusError::BlockFinalized(_))
        ));
    }

    #[test]
    fn test_coinbase_differs_per_parent() {
        let a = Block::new(Some([1; 32]), vec![0x02; 33]);
        let b = Block::new(Some([2; 32]), vec![0x02; 33]);
        assert_ne!(a.coinbase().id(), b.coinbase().id());
        assert_eq!(a.coinbase().outputs()[0].value, COINBASE_VALUE);
    }
}
