use crate::{Attestation, AttestationData, EthSpec, Hash256};

/// An attestation which has passed individual (gossip) validation, together with the committee
/// shuffling seed recorded during validation.
///
/// The shuffling seed identifies the committee shuffling context the attestation was produced
/// under; the pool uses it as the tie-breaking identity of each matching-data group and attaches
/// it to every aggregate it emits.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAttestation<E: EthSpec> {
    pub attestation: Attestation<E>,
    pub committee_shuffling_seed: Option<Hash256>,
}

impl<E: EthSpec> ValidatedAttestation<E> {
    /// Wrap an attestation whose shuffling seed was not recorded.
    pub fn from_attestation(attestation: Attestation<E>) -> Self {
        Self {
            attestation,
            committee_shuffling_seed: None,
        }
    }

    /// Wrap an attestation along with its committee shuffling seed.
    pub fn new(attestation: Attestation<E>, committee_shuffling_seed: Hash256) -> Self {
        Self {
            attestation,
            committee_shuffling_seed: Some(committee_shuffling_seed),
        }
    }

    pub fn data(&self) -> &AttestationData {
        &self.attestation.data
    }

    pub fn committee_shuffling_seed(&self) -> Option<Hash256> {
        self.committee_shuffling_seed
    }

    pub fn into_attestation(self) -> Attestation<E> {
        self.attestation
    }
}
