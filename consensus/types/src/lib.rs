//! Consensus types shared by the attestation pool and its collaborators.
//!
//! The types in this crate conform to the beacon chain SSZ schemas; anything
//! specific to the pool itself lives in the `attestation_pool` crate.

pub mod attestation;
pub mod attestation_data;
pub mod checkpoint;
pub mod eth_spec;
pub mod slot_epoch;
pub mod validated_attestation;

pub use crate::attestation::Attestation;
pub use crate::attestation_data::AttestationData;
pub use crate::checkpoint::Checkpoint;
pub use crate::eth_spec::{EthSpec, MainnetEthSpec, MinimalEthSpec};
pub use crate::slot_epoch::{Epoch, Slot};
pub use crate::validated_attestation::ValidatedAttestation;

pub use bls::{AggregateSignature, SecretKey, Signature};
pub use ssz_types::{typenum, typenum::Unsigned, BitList, VariableList};

pub type Hash256 = ethereum_types::H256;
pub type CommitteeIndex = u64;
