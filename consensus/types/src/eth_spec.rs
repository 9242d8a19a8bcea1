use serde::{Deserialize, Serialize};
use ssz_types::typenum::{Unsigned, U128, U2048, U32, U8};
use std::fmt::Debug;
use std::hash::Hash;

/// Compile-time protocol constants.
///
/// Only the constants the attestation pool depends on are included; the committee bitfield bound,
/// the per-block attestation cap and the epoch length.
pub trait EthSpec: 'static + Default + Sync + Send + Clone + Debug + PartialEq + Eq + Hash {
    /// The maximum number of validators in a single committee, bounding attestation bitfields.
    type MaxValidatorsPerCommittee: Unsigned + Clone + Sync + Send + Debug + PartialEq + Eq;
    /// The maximum number of attestations that may appear in a single block.
    type MaxAttestations: Unsigned + Clone + Sync + Send + Debug + PartialEq + Eq;
    /// The number of slots in an epoch.
    type SlotsPerEpoch: Unsigned + Clone + Sync + Send + Debug + PartialEq + Eq;

    /// Returns the `SLOTS_PER_EPOCH` constant for this specification.
    fn slots_per_epoch() -> u64 {
        Self::SlotsPerEpoch::to_u64()
    }

    /// Returns the `MAX_ATTESTATIONS` constant for this specification.
    fn max_attestations() -> usize {
        Self::MaxAttestations::to_usize()
    }

    /// Returns the `MAX_VALIDATORS_PER_COMMITTEE` constant for this specification.
    fn max_validators_per_committee() -> usize {
        Self::MaxValidatorsPerCommittee::to_usize()
    }
}

/// Ethereum Foundation specifications.
#[derive(Clone, PartialEq, Eq, Debug, Default, Hash, Serialize, Deserialize)]
pub struct MainnetEthSpec;

impl EthSpec for MainnetEthSpec {
    type MaxValidatorsPerCommittee = U2048;
    type MaxAttestations = U128;
    type SlotsPerEpoch = U32;
}

/// Ethereum Foundation minimal spec, as defined in the eth2.0-specs repo.
#[derive(Clone, PartialEq, Eq, Debug, Default, Hash, Serialize, Deserialize)]
pub struct MinimalEthSpec;

impl EthSpec for MinimalEthSpec {
    type MaxValidatorsPerCommittee = U2048;
    type MaxAttestations = U128;
    type SlotsPerEpoch = U8;
}
