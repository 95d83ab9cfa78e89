//! Hashing and signature primitives
//!
//! Identities of transactions and blocks are double SHA-256 digests of their
//! canonical byte encoding. Signatures are DER-encoded ECDSA signatures over
//! secp256k1, taken over the SHA-256 digest of the signed payload. Addresses
//! are compressed secp256k1 public keys.

use bitcoin_hashes::{sha256d, Hash as BitcoinHash};
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1};
use sha2::{Digest, Sha256};

use crate::error::{ConsensusError, Result};
use crate::types::*;

pub use secp256k1::SecretKey;

/// Content identity: SHA256(SHA256(data))
pub fn hash_bytes(data: &[u8]) -> Hash {
    sha256d::Hash::hash(data).into_inner()
}

/// Verify a DER signature over `message` against the owner `address`
///
/// Malformed keys or signatures never verify.
pub fn verify_signature(address: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let pubkey = match PublicKey::from_slice(address) {
        Ok(pk) => pk,
        Err(_) => return false,
    };

    let signature = match Signature::from_der(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    let message = match message_digest(message) {
        Ok(msg) => msg,
        Err(_) => return false,
    };

    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&message, &signature, &pubkey).is_ok()
}

/// Sign `message` with `secret_key`, returning a DER-encoded signature
pub fn sign_message(secret_key: &SecretKey, message: &[u8]) -> Result<ByteString> {
    let message = message_digest(message)?;
    let secp = Secp256k1::signing_only();
    let signature = secp.sign_ecdsa(&message, secret_key);
    Ok(signature.serialize_der().to_vec())
}

/// Compressed public key (the address) owned by `secret_key`
pub fn address_of(secret_key: &SecretKey) -> ByteString {
    let secp = Secp256k1::signing_only();
    PublicKey::from_secret_key(&secp, secret_key).serialize().to_vec()
}

/// Short hex form of a hash for logs and error messages
pub(crate) fn hex_prefix(hash: &Hash) -> String {
    hash[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

fn message_digest(message: &[u8]) -> Result<Message> {
    let digest = Sha256::digest(message);
    Message::from_digest_slice(&digest)
        .map_err(|e| ConsensusError::InvalidSignature(e.to_string()))
}
