//! Epoch processing: greedy acceptance of a batch of candidate transactions

use log::debug;

use crate::ordering::{ArrivalOrder, MaxFeeOrder, OrderingPolicy};
use crate::transaction::TxValidator;
use crate::types::*;
use crate::utxo::UtxoPool;

/// HandleTxs: 𝒯𝒳* × 𝒰𝒮 → 𝒯𝒳* × 𝒰𝒮
///
/// For candidates txs and UTXO set us:
/// 1. Order txs with the policy (fees taken against the initial us)
/// 2. For each tx in order, if tx is valid against the current us:
///    us = us \ spent(tx), finalize tx and accept it
/// 3. Invalid candidates are dropped
/// 4. Return (accepted, us)
///
/// Acceptance is greedy: an earlier transaction may consume an output a later
/// one needed. No two accepted transactions spend the same output. Outputs of
/// accepted transactions are not added to `us`, so a candidate spending another
/// candidate of the same epoch is never accepted.
pub fn process_epoch(
    candidates: Vec<Transaction>,
    mut utxo_pool: UtxoPool,
    policy: &dyn OrderingPolicy,
) -> (Vec<Transaction>, UtxoPool) {
    let total = candidates.len();
    let ordered = policy.order(candidates, &utxo_pool);
    let mut accepted = Vec::with_capacity(ordered.len());

    for mut tx in ordered {
        if !TxValidator::new(&utxo_pool).is_valid_tx(&tx) {
            continue;
        }
        utxo_pool.remove_inputs_of(&tx);
        tx.finalize();
        accepted.push(tx);
    }

    debug!("epoch accepted {} of {} transactions ({:?})", accepted.len(), total, policy);
    (accepted, utxo_pool)
}

/// Stateful handler owning its UTXO pool across epochs
#[derive(Debug)]
pub struct TxHandler {
    utxo_pool: UtxoPool,
    policy: Box<dyn OrderingPolicy>,
}

impl TxHandler {
    /// Handler processing candidates in arrival order
    pub fn new(utxo_pool: UtxoPool) -> Self {
        Self::with_policy(utxo_pool, Box::new(ArrivalOrder))
    }

    /// Handler offering the highest-fee candidates first
    pub fn max_fee(utxo_pool: UtxoPool) -> Self {
        Self::with_policy(utxo_pool, Box::new(MaxFeeOrder))
    }

    pub fn with_policy(utxo_pool: UtxoPool, policy: Box<dyn OrderingPolicy>) -> Self {
        Self { utxo_pool, policy }
    }

    pub fn is_valid_tx(&self, tx: &Transaction) -> bool {
        TxValidator::new(&self.utxo_pool).is_valid_tx(tx)
    }

    /// Accept a mutually valid subset of `txs` and update the pool
    pub fn handle_txs(&mut self, txs: Vec<Transaction>) -> Vec<Transaction> {
        let utxo_pool = std::mem::take(&mut self.utxo_pool);
        let (accepted, utxo_pool) = process_epoch(txs, utxo_pool, self.policy.as_ref());
        self.utxo_pool = utxo_pool;
        accepted
    }

    pub fn utxo_pool(&self) -> &UtxoPool {
        &self.utxo_pool
    }

    pub fn into_utxo_pool(self) -> UtxoPool {
        self.utxo_pool
    }
}
