//! BLS12-381 signature primitives backed by the `blst` (supranational) library.
//!
//! This crate only covers the operations the attestation pool needs: producing
//! signatures and aggregating them. Individual attestations are verified before
//! they reach the pool, so no verification surface is exposed here.

mod aggregate_signature;
mod secret_key;
mod signature;

pub use aggregate_signature::AggregateSignature;
pub use secret_key::{SecretKey, SECRET_KEY_BYTES_LEN};
pub use signature::{Signature, SIGNATURE_BYTES_LEN};

use blst::BLST_ERROR;

pub type Hash256 = ethereum_types::H256;

/// The compressed bytes of the G2 point at infinity, the identity for signature aggregation.
pub const INFINITY_SIGNATURE: [u8; SIGNATURE_BYTES_LEN] = [
    0xc0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0,
];

/// The domain separation tag for BLS signatures over beacon chain data.
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// An error was raised from the BLST library.
    BlstError(BLST_ERROR),
    /// The provided bytes were an incorrect length.
    InvalidByteLength { got: usize, expected: usize },
    /// The provided secret key bytes were an incorrect length.
    InvalidSecretKeyLength { got: usize, expected: usize },
}

impl From<BLST_ERROR> for Error {
    fn from(e: BLST_ERROR) -> Error {
        Error::BlstError(e)
    }
}
