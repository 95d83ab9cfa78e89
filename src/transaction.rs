//! Transactions and the five transaction validity rules

use crate::crypto::{hash_bytes, hex_prefix, verify_signature};
use crate::error::{ConsensusError, Result};
use crate::types::*;
use crate::utxo::UtxoPool;
use std::collections::HashSet;

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inputless transaction minting `value` to `address`, already finalized
    ///
    /// `coinbase_data` only feeds the transaction id, so that coinbases paying
    /// the same address in different blocks do not collide.
    pub fn coinbase(value: Integer, address: ByteString, coinbase_data: ByteString) -> Self {
        let mut tx = Transaction {
            inputs: Vec::new(),
            outputs: vec![TransactionOutput { value, address }],
            coinbase_data,
            hash: None,
        };
        tx.finalize();
        tx
    }

    pub fn add_input(&mut self, prev_tx_hash: Hash, output_index: Natural) -> Result<()> {
        self.ensure_mutable()?;
        self.inputs.push(TransactionInput {
            prevout: OutPoint::new(prev_tx_hash, output_index),
            signature: Vec::new(),
        });
        Ok(())
    }

    pub fn add_output(&mut self, value: Integer, address: ByteString) -> Result<()> {
        self.ensure_mutable()?;
        self.outputs.push(TransactionOutput { value, address });
        Ok(())
    }

    pub fn remove_input(&mut self, index: usize) -> Result<()> {
        self.ensure_mutable()?;
        if index < self.inputs.len() {
            self.inputs.remove(index);
        }
        Ok(())
    }

    pub fn add_signature(&mut self, signature: ByteString, index: usize) -> Result<()> {
        self.ensure_mutable()?;
        let input = self.inputs.get_mut(index).ok_or_else(|| {
            ConsensusError::TransactionValidation(format!("No input at index {}", index))
        })?;
        input.signature = signature;
        Ok(())
    }

    /// Payload signed by the owner of input `index`
    ///
    /// Covers the spent outpoint and every output, never any signature, so it
    /// is stable while signatures are being attached.
    pub fn raw_data_to_sign(&self, index: usize) -> Option<ByteString> {
        let input = self.inputs.get(index)?;
        let mut data = Vec::new();
        encode_outpoint(&mut data, &input.prevout);
        for output in &self.outputs {
            encode_output(&mut data, output);
        }
        Some(data)
    }

    /// Canonical encoding hashed into the transaction id
    pub fn raw_tx(&self) -> ByteString {
        let mut data = Vec::new();
        data.extend_from_slice(&encode_varint(self.inputs.len() as u64));
        for input in &self.inputs {
            encode_outpoint(&mut data, &input.prevout);
            data.extend_from_slice(&encode_varint(input.signature.len() as u64));
            data.extend_from_slice(&input.signature);
        }
        data.extend_from_slice(&encode_varint(self.outputs.len() as u64));
        for output in &self.outputs {
            encode_output(&mut data, output);
        }
        data.extend_from_slice(&encode_varint(self.coinbase_data.len() as u64));
        data.extend_from_slice(&self.coinbase_data);
        data
    }

    /// Freeze the transaction and return its id; idempotent
    pub fn finalize(&mut self) -> Hash {
        match self.hash {
            Some(hash) => hash,
            None => {
                let hash = hash_bytes(&self.raw_tx());
                self.hash = Some(hash);
                hash
            }
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.hash.is_some()
    }

    /// Id recorded by `finalize`, if any
    pub fn hash(&self) -> Option<Hash> {
        self.hash
    }

    /// Id of the transaction, computed from current content when not finalized
    pub fn id(&self) -> Hash {
        self.hash.unwrap_or_else(|| hash_bytes(&self.raw_tx()))
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn inputs(&self) -> &[TransactionInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TransactionOutput] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> Option<&TransactionInput> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&TransactionOutput> {
        self.outputs.get(index)
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    fn ensure_mutable(&self) -> Result<()> {
        match self.hash {
            Some(hash) => Err(ConsensusError::TransactionFinalized(
                hex_prefix(&hash),
            )),
            None => Ok(()),
        }
    }
}

/// Checks a transaction against a UTXO snapshot without modifying it
///
/// A transaction is valid iff:
/// 1. every spent output exists in the snapshot
/// 2. every input carries a valid signature by the owner of the spent output
/// 3. no output is spent twice by the transaction
/// 4. every output value is non-negative
/// 5. Σ input values ≥ Σ output values
#[derive(Debug, Clone, Copy)]
pub struct TxValidator<'a> {
    utxo_pool: &'a UtxoPool,
}

impl<'a> TxValidator<'a> {
    pub fn new(utxo_pool: &'a UtxoPool) -> Self {
        Self { utxo_pool }
    }

    pub fn utxo_pool(&self) -> &'a UtxoPool {
        self.utxo_pool
    }

    pub fn is_valid_tx(&self, tx: &Transaction) -> bool {
        self.check_tx(tx).is_valid()
    }

    /// Same verdict as `is_valid_tx`, naming the first rule that fails
    pub fn check_tx(&self, tx: &Transaction) -> ValidationResult {
        if !self.all_outputs_exist(tx) {
            return ValidationResult::Invalid("Spent output not in UTXO set".to_string());
        }
        if !self.valid_signatures(tx) {
            return ValidationResult::Invalid("Invalid input signature".to_string());
        }
        if !self.no_double_spending(tx) {
            return ValidationResult::Invalid("Output spent twice".to_string());
        }
        if !self.non_negative_outputs(tx) {
            return ValidationResult::Invalid("Negative output value".to_string());
        }
        if !self.no_over_spending(tx) {
            return ValidationResult::Invalid("Outputs exceed inputs".to_string());
        }
        ValidationResult::Valid
    }

    pub fn all_outputs_exist(&self, tx: &Transaction) -> bool {
        tx.inputs
            .iter()
            .all(|input| self.utxo_pool.contains(&input.prevout))
    }

    pub fn valid_signatures(&self, tx: &Transaction) -> bool {
        tx.inputs.iter().enumerate().all(|(i, input)| {
            let output = match self.utxo_pool.get_tx_output(&input.prevout) {
                Ok(output) => output,
                Err(_) => return false,
            };
            match tx.raw_data_to_sign(i) {
                Some(message) => verify_signature(&output.address, &message, &input.signature),
                None => false,
            }
        })
    }

    pub fn no_double_spending(&self, tx: &Transaction) -> bool {
        let mut seen = HashSet::with_capacity(tx.inputs.len());
        tx.inputs.iter().all(|input| seen.insert(input.prevout))
    }

    pub fn non_negative_outputs(&self, tx: &Transaction) -> bool {
        tx.outputs.iter().all(|output| output.value >= 0)
    }

    pub fn no_over_spending(&self, tx: &Transaction) -> bool {
        matches!(self.fee(tx), Ok(fee) if fee >= 0)
    }

    /// Σ values of the outputs spent by `tx`
    pub fn input_value(&self, tx: &Transaction) -> Result<Integer> {
        let mut total = 0i64;
        for input in &tx.inputs {
            let value = self.utxo_pool.get_tx_output(&input.prevout)?.value;
            total = total.checked_add(value).ok_or_else(|| {
                ConsensusError::TransactionValidation("Input value overflow".to_string())
            })?;
        }
        Ok(total)
    }

    /// Σ input values - Σ output values
    pub fn fee(&self, tx: &Transaction) -> Result<Integer> {
        let inputs = self.input_value(tx)?;
        let outputs = output_value(tx).ok_or_else(|| {
            ConsensusError::TransactionValidation("Output value overflow".to_string())
        })?;
        inputs.checked_sub(outputs).ok_or_else(|| {
            ConsensusError::TransactionValidation("Fee overflow".to_string())
        })
    }
}

/// Σ output values, `None` on overflow
pub fn output_value(tx: &Transaction) -> Option<Integer> {
    tx.outputs
        .iter()
        .try_fold(0i64, |acc, output| acc.checked_add(output.value))
}

fn encode_outpoint(data: &mut Vec<u8>, outpoint: &OutPoint) {
    data.extend_from_slice(&outpoint.hash);
    data.extend_from_slice(&outpoint.index.to_le_bytes());
}

fn encode_output(data: &mut Vec<u8>, output: &TransactionOutput) {
    data.extend_from_slice(&output.value.to_le_bytes());
    data.extend_from_slice(&encode_varint(output.address.len() as u64));
    data.extend_from_slice(&output.address);
}

/// Encode a number as a Bitcoin varint
pub(crate) fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}
