use crate::{AggregateSignature, AttestationData, BitList, EthSpec};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

/// A vote on an `AttestationData`, cast by one or more validators of a single committee.
///
/// A set bit at position `i` of `aggregation_bits` means committee member `i` signed;
/// `signature` is the BLS aggregate of the participating validators' signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "E: EthSpec")]
pub struct Attestation<E: EthSpec> {
    pub aggregation_bits: BitList<E::MaxValidatorsPerCommittee>,
    pub data: AttestationData,
    pub signature: AggregateSignature,
}

impl<E: EthSpec> Attestation<E> {
    /// Are the aggregation bitfields of these attestations disjoint?
    pub fn signers_disjoint_from(&self, other: &Self) -> bool {
        self.aggregation_bits
            .intersection(&other.aggregation_bits)
            .is_zero()
    }

    /// Aggregate another Attestation into this one.
    ///
    /// The aggregation bitfields must be disjoint, and the data must be the same.
    pub fn aggregate(&mut self, other: &Self) {
        debug_assert_eq!(self.data, other.data);
        debug_assert!(self.signers_disjoint_from(other));

        self.aggregation_bits = self.aggregation_bits.union(&other.aggregation_bits);
        self.signature.add_assign_aggregate(&other.signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AggregateSignature, MainnetEthSpec, SecretKey};

    type E = MainnetEthSpec;

    fn attestation(committee_size: usize, signers: &[usize]) -> Attestation<E> {
        let mut aggregation_bits = BitList::with_capacity(committee_size).unwrap();
        for signer in signers {
            aggregation_bits.set(*signer, true).unwrap();
        }

        Attestation {
            aggregation_bits,
            data: AttestationData::default(),
            signature: AggregateSignature::infinity(),
        }
    }

    #[test]
    fn disjoint_signers_detected() {
        let a = attestation(8, &[0, 1]);
        let b = attestation(8, &[2]);
        let c = attestation(8, &[1, 3]);

        assert!(a.signers_disjoint_from(&b));
        assert!(b.signers_disjoint_from(&a));
        assert!(!a.signers_disjoint_from(&c));
    }

    #[test]
    fn aggregate_unions_bits() {
        let mut a = attestation(8, &[0]);
        let b = attestation(8, &[5]);

        a.aggregate(&b);

        assert_eq!(a.aggregation_bits.num_set_bits(), 2);
        assert!(a.aggregation_bits.get(0).unwrap());
        assert!(a.aggregation_bits.get(5).unwrap());
    }

    #[test]
    fn aggregate_combines_signatures() {
        let message = crate::Hash256::repeat_byte(1);
        let sig_a = SecretKey::random().sign(message);
        let sig_b = SecretKey::random().sign(message);

        let mut a = attestation(8, &[0]);
        a.signature = AggregateSignature::from(&sig_a);
        let mut b = attestation(8, &[1]);
        b.signature = AggregateSignature::from(&sig_b);

        let mut expected = AggregateSignature::from(&sig_a);
        expected.add_assign(&sig_b);

        a.aggregate(&b);
        assert_eq!(a.signature, expected);
    }
}
