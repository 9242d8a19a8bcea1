use crate::{Error, INFINITY_SIGNATURE};
use blst::min_pk as blst_core;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::{Decode, DecodeError, Encode};
use std::fmt;
use std::hash::{Hash, Hasher};
use tree_hash::{merkle_root, Hash256, PackedEncoding, TreeHash, TreeHashType, BYTES_PER_CHUNK};

/// The byte-size of a compressed BLS signature.
pub const SIGNATURE_BYTES_LEN: usize = 96;

/// The compressed bytes used to represent `Signature::empty()`.
pub const EMPTY_SIGNATURE_SERIALIZATION: [u8; SIGNATURE_BYTES_LEN] = [0; SIGNATURE_BYTES_LEN];

/// A BLS signature over some message.
///
/// The "empty" signature has no underlying point and serializes as all-zeros. It is not a valid
/// signature from a cryptographic perspective, it exists to satisfy the Eth2 specification which
/// expects the all-zeros serialization to be meaningful (e.g., in unsigned containers).
#[derive(Clone)]
pub struct Signature {
    point: Option<blst_core::Signature>,
    is_infinity: bool,
}

impl Signature {
    /// Initialize `self` to the "empty" value. This value is serialized as all-zeros.
    pub fn empty() -> Self {
        Self {
            point: None,
            is_infinity: false,
        }
    }

    /// Returns `true` if `self` is equal to the "empty" value.
    pub fn is_empty(&self) -> bool {
        self.point.is_none()
    }

    /// Returns `true` if `self` is equal to the point at infinity.
    pub fn is_infinity(&self) -> bool {
        self.is_infinity
    }

    pub(crate) fn from_point(point: blst_core::Signature, is_infinity: bool) -> Self {
        Self {
            point: Some(point),
            is_infinity,
        }
    }

    pub(crate) fn point(&self) -> Option<&blst_core::Signature> {
        self.point.as_ref()
    }

    /// Serialize `self` as compressed bytes.
    pub fn serialize(&self) -> [u8; SIGNATURE_BYTES_LEN] {
        if let Some(point) = &self.point {
            point.to_bytes()
        } else {
            EMPTY_SIGNATURE_SERIALIZATION
        }
    }

    /// Deserialize `self` from compressed bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SIGNATURE_BYTES_LEN {
            return Err(Error::InvalidByteLength {
                got: bytes.len(),
                expected: SIGNATURE_BYTES_LEN,
            });
        }

        let point = if bytes == EMPTY_SIGNATURE_SERIALIZATION {
            None
        } else {
            Some(blst_core::Signature::from_bytes(bytes)?)
        };

        Ok(Self {
            point,
            is_infinity: bytes == INFINITY_SIGNATURE,
        })
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.serialize()[..] == other.serialize()[..]
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serialize().hash(state);
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.serialize()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.serialize()))
    }
}

impl Encode for Signature {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        SIGNATURE_BYTES_LEN
    }

    fn ssz_bytes_len(&self) -> usize {
        SIGNATURE_BYTES_LEN
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.serialize())
    }
}

impl Decode for Signature {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        SIGNATURE_BYTES_LEN
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::deserialize(bytes).map_err(|e| DecodeError::BytesInvalid(format!("{:?}", e)))
    }
}

impl TreeHash for Signature {
    fn tree_hash_type() -> TreeHashType {
        TreeHashType::Vector
    }

    fn tree_hash_packed_encoding(&self) -> PackedEncoding {
        unreachable!("Vector should never be packed.")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("Vector should never be packed.")
    }

    fn tree_hash_root(&self) -> Hash256 {
        let minimum_chunk_count = (SIGNATURE_BYTES_LEN + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK;
        merkle_root(&self.serialize(), minimum_chunk_count)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let bytes = hex::decode(string.trim_start_matches("0x")).map_err(D::Error::custom)?;
        Self::deserialize(&bytes).map_err(|e| D::Error::custom(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_serializes_as_zeros() {
        let sig = Signature::empty();
        assert!(sig.is_empty());
        assert_eq!(sig.serialize(), EMPTY_SIGNATURE_SERIALIZATION);
    }

    #[test]
    fn deserialize_round_trips_infinity() {
        let sig = Signature::deserialize(&INFINITY_SIGNATURE).unwrap();
        assert!(sig.is_infinity());
        assert_eq!(sig.serialize(), INFINITY_SIGNATURE);
    }

    #[test]
    fn rejects_incorrect_lengths() {
        assert_eq!(
            Signature::deserialize(&[0; 95]),
            Err(Error::InvalidByteLength {
                got: 95,
                expected: SIGNATURE_BYTES_LEN
            })
        );
    }
}
