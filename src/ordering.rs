//! Transaction ordering policies applied before greedy acceptance

use std::cmp::Reverse;

use crate::transaction::TxValidator;
use crate::types::*;
use crate::utxo::UtxoPool;

/// Decides the order in which a batch of candidates is offered to the validator
///
/// Implementations must return a permutation of `txs`.
pub trait OrderingPolicy: std::fmt::Debug {
    fn order(&self, txs: Vec<Transaction>, utxo_pool: &UtxoPool) -> Vec<Transaction>;
}

/// Keeps candidates in the order they were received
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrivalOrder;

impl OrderingPolicy for ArrivalOrder {
    fn order(&self, txs: Vec<Transaction>, _utxo_pool: &UtxoPool) -> Vec<Transaction> {
        txs
    }
}

/// Highest fee first, fees computed against the snapshot before the epoch
///
/// Equal fees keep their relative order. Candidates whose fee cannot be
/// computed (unknown inputs) go last. Conflicting high-fee candidates still
/// exclude each other, so this does not guarantee the maximum total fee.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxFeeOrder;

impl OrderingPolicy for MaxFeeOrder {
    fn order(&self, txs: Vec<Transaction>, utxo_pool: &UtxoPool) -> Vec<Transaction> {
        let validator = TxValidator::new(utxo_pool);
        let mut keyed: Vec<(Option<Integer>, Transaction)> = txs
            .into_iter()
            .map(|tx| (validator.fee(&tx).ok(), tx))
            .collect();
        keyed.sort_by_key(|(fee, _)| Reverse(*fee));
        keyed.into_iter().map(|(_, tx)| tx).collect()
    }
}
