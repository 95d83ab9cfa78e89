//! Pending transaction pool

use std::collections::HashMap;

use crate::types::*;

/// Transactions waiting for a block, keyed by id and kept in arrival order
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    entries: HashMap<Hash, Transaction>,
    arrival: Vec<Hash>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `tx`; returns false if a transaction with the same id is already pooled
    pub fn add_transaction(&mut self, tx: Transaction) -> bool {
        let id = tx.id();
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, tx);
        self.arrival.push(id);
        true
    }

    pub fn remove_transaction(&mut self, id: &Hash) -> Option<Transaction> {
        let removed = self.entries.remove(id)?;
        self.arrival.retain(|h| h != id);
        Some(removed)
    }

    pub fn get_transaction(&self, id: &Hash) -> Option<&Transaction> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.entries.contains_key(id)
    }

    /// Pooled transactions in arrival order
    pub fn get_transactions(&self) -> Vec<Transaction> {
        self.arrival
            .iter()
            .filter_map(|id| self.entries.get(id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
