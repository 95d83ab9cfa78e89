//! Unspent transaction output set
//!
//! Every fork of the chain owns its own `UtxoPool`. Extending a fork clones
//! the parent's pool, so spends on one branch are never visible on another.

use std::collections::HashMap;

use crate::crypto::hex_prefix;
use crate::error::{ConsensusError, Result};
use crate::types::*;

/// UTXO Set: OutPoint -> TransactionOutput
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoPool {
    utxos: HashMap<OutPoint, TransactionOutput>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `output` under `outpoint`, replacing any existing entry
    pub fn add_utxo(&mut self, outpoint: OutPoint, output: TransactionOutput) {
        self.utxos.insert(outpoint, output);
    }

    /// Remove `outpoint`; absent keys are ignored
    pub fn remove_utxo(&mut self, outpoint: &OutPoint) {
        self.utxos.remove(outpoint);
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.utxos.contains_key(outpoint)
    }

    pub fn get_tx_output(&self, outpoint: &OutPoint) -> Result<&TransactionOutput> {
        self.utxos.get(outpoint).ok_or_else(|| {
            ConsensusError::UtxoNotFound(format!(
                "{}:{}",
                hex_prefix(&outpoint.hash),
                outpoint.index
            ))
        })
    }

    /// Register every output of `tx` under the transaction's id
    pub fn add_outputs_of(&mut self, tx: &Transaction) {
        let tx_id = tx.id();
        for (i, output) in tx.outputs().iter().enumerate() {
            self.add_utxo(OutPoint::new(tx_id, i as Natural), output.clone());
        }
    }

    /// Remove every output spent by `tx`
    pub fn remove_inputs_of(&mut self, tx: &Transaction) {
        for input in tx.inputs() {
            self.remove_utxo(&input.prevout);
        }
    }

    pub fn all_utxos(&self) -> Vec<OutPoint> {
        self.utxos.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &TransactionOutput)> {
        self.utxos.iter()
    }

    /// Sum of all unspent values, `None` on overflow
    pub fn total_value(&self) -> Option<Integer> {
        self.utxos
            .values()
            .try_fold(0i64, |acc, output| acc.checked_add(output.value))
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }
}
