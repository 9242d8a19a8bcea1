use crate::{Error, Signature, INFINITY_SIGNATURE, SIGNATURE_BYTES_LEN};
use blst::min_pk as blst_core;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::{Decode, DecodeError, Encode};
use std::fmt;
use std::hash::{Hash, Hasher};
use tree_hash::{merkle_root, Hash256, PackedEncoding, TreeHash, TreeHashType, BYTES_PER_CHUNK};

/// The compressed bytes used to represent `AggregateSignature::empty()`.
pub const EMPTY_SIGNATURE_SERIALIZATION: [u8; SIGNATURE_BYTES_LEN] = [0; SIGNATURE_BYTES_LEN];

/// A BLS aggregate signature: the sum of one or more signature points.
#[derive(Clone)]
pub struct AggregateSignature {
    point: Option<blst_core::AggregateSignature>,
    /// True if this point is equal to the `INFINITY_SIGNATURE`.
    is_infinity: bool,
}

impl AggregateSignature {
    /// Initialize `self` to the infinity value which can then have other signatures aggregated
    /// upon it.
    pub fn infinity() -> Self {
        let point = blst_core::Signature::from_bytes(&INFINITY_SIGNATURE)
            .map(|sig| blst_core::AggregateSignature::from_signature(&sig))
            .expect("should decode infinity signature");

        Self {
            point: Some(point),
            is_infinity: true,
        }
    }

    /// Initialize `self` to the "empty" value. This value is serialized as all-zeros.
    ///
    /// This value can have another signature aggregated atop of it. When this happens, `self` is
    /// simply set to infinity before having the other signature aggregated onto it.
    pub fn empty() -> Self {
        Self {
            point: None,
            is_infinity: false,
        }
    }

    /// Returns `true` if `self` is equal to the "empty" value.
    ///
    /// E.g., `AggregateSignature::empty().is_empty() == true`
    pub fn is_empty(&self) -> bool {
        self.point.is_none()
    }

    /// Returns `true` if `self` is equal to the point at infinity.
    pub fn is_infinity(&self) -> bool {
        self.is_infinity
    }

    /// Aggregates a signature onto `self`.
    pub fn add_assign(&mut self, other: &Signature) {
        if let Some(other_point) = other.point() {
            self.is_infinity = self.is_infinity && other.is_infinity();
            if let Some(self_point) = &mut self.point {
                // The subgroup check is omitted; the signature has been validated upstream.
                let _ = self_point.add_signature(other_point, false);
            } else {
                self.point = Some(blst_core::AggregateSignature::from_signature(other_point));
            }
        }
    }

    /// Aggregates an aggregate signature onto `self`.
    pub fn add_assign_aggregate(&mut self, other: &Self) {
        if let Some(other_point) = &other.point {
            self.is_infinity = self.is_infinity && other.is_infinity;
            if let Some(self_point) = &mut self.point {
                self_point.add_aggregate(other_point);
            } else {
                self.point = Some(other_point.clone());
            }
        }
    }

    /// Serialize `self` as compressed bytes.
    pub fn serialize(&self) -> [u8; SIGNATURE_BYTES_LEN] {
        if let Some(point) = &self.point {
            point.to_signature().to_bytes()
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
            let signature = blst_core::Signature::from_bytes(bytes)?;
            Some(blst_core::AggregateSignature::from_signature(&signature))
        };

        Ok(Self {
            point,
            is_infinity: bytes == INFINITY_SIGNATURE,
        })
    }
}

/// Allow aggregate signatures to be created from single signatures.
impl From<&Signature> for AggregateSignature {
    fn from(sig: &Signature) -> Self {
        let mut agg = Self::infinity();
        agg.add_assign(sig);
        agg
    }
}

impl PartialEq for AggregateSignature {
    fn eq(&self, other: &Self) -> bool {
        self.serialize()[..] == other.serialize()[..]
    }
}

impl Eq for AggregateSignature {}

impl Hash for AggregateSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serialize().hash(state);
    }
}

impl fmt::Display for AggregateSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.serialize()))
    }
}

impl fmt::Debug for AggregateSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.serialize()))
    }
}

impl Encode for AggregateSignature {
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

impl Decode for AggregateSignature {
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

impl TreeHash for AggregateSignature {
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

impl Serialize for AggregateSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AggregateSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let bytes = hex::decode(string.trim_start_matches("0x")).map_err(D::Error::custom)?;
        Self::deserialize(&bytes).map_err(|e| D::Error::custom(format!("{:?}", e)))
    }
}
