//! A pool of attestations awaiting inclusion in a block.
//!
//! Attestations can be retrieved either for inclusion in a block or as an aggregate to publish
//! as part of the naive attestation aggregation algorithm. In both cases the returned
//! attestations are aggregated to maximise the number of validators represented.

mod attestation_group;
mod metrics;

pub use crate::attestation_group::{AggregateIterator, MatchingDataAttestationGroup};

use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use tree_hash::TreeHash;
use types::{
    Attestation, AttestationData, CommitteeIndex, Epoch, EthSpec, Hash256, Slot,
    ValidatedAttestation, VariableList,
};

/// The number of epochs attestations are retained for before `on_slot` prunes them.
pub const ATTESTATION_RETENTION_EPOCHS: u64 = 2;

#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// The attestation's validation wrapper carries no committee shuffling seed, so a group
    /// cannot be created for it. This indicates a bug in the caller; the pool does not invent
    /// a seed.
    MissingCommitteeShufflingSeed,
}

/// Protocol-level computations the pool consumes as an oracle. Implemented by the surrounding
/// state-transition machinery.
pub trait SpecProvider<E: EthSpec> {
    /// The beacon state attestations are validated against.
    type State;
    /// The error reported by `validate_attestation`. The pool only observes success or failure.
    type Error;

    /// Check whether an attestation with the given data would be valid for inclusion in a block
    /// built on `state`.
    fn validate_attestation(
        &self,
        state: &Self::State,
        data: &AttestationData,
    ) -> Result<(), Self::Error>;

    /// The current epoch of the given state.
    fn current_epoch(&self, state: &Self::State) -> Epoch;

    /// The number of attestations from the previous epoch that may still be included in a block
    /// built on `state`.
    fn previous_epoch_attestation_capacity(&self, state: &Self::State) -> usize;

    /// The epoch containing `slot`.
    fn compute_epoch_at_slot(&self, slot: Slot) -> Epoch;
}

/// Determines whether attestations belong to the fork expected at the block being proposed.
pub trait ForkChecker {
    fn attestations_from_correct_fork(&self, data: &AttestationData) -> bool;
}

/// Statistics about the attestations stored in the pool.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct AttestationStats {
    /// Total number of attestations across all groups.
    pub num_attestations: usize,
    /// Number of unique `AttestationData` attested to.
    pub num_attestation_data: usize,
    /// Maximum number of attestations stored for a single `AttestationData`.
    pub max_attestations_per_data: usize,
}

#[derive(Default)]
struct AttestationIndices<E: EthSpec> {
    attestation_group_by_data_hash: HashMap<Hash256, MatchingDataAttestationGroup<E>>,
    data_hash_by_slot: BTreeMap<Slot, HashSet<Hash256>>,
}

/// Maintains a pool of aggregated attestations, indexed by the tree hash root of their data and
/// by slot.
///
/// `add`, `remove`, `on_slot`, `get_attestations_for_block` and `create_aggregate_for` are
/// atomic with respect to each other; a single lock covers both indices. `get_attestations` is
/// a snapshotting traversal that tolerates groups disappearing underneath it, and `size` is an
/// unsynchronised read of an atomic counter.
pub struct AggregatingAttestationPool<E: EthSpec> {
    indices: RwLock<AttestationIndices<E>>,
    size: AtomicI64,
}

impl<E: EthSpec> Default for AggregatingAttestationPool<E> {
    fn default() -> Self {
        Self {
            indices: RwLock::new(AttestationIndices::default()),
            size: AtomicI64::new(0),
        }
    }
}

impl<E: EthSpec> AggregatingAttestationPool<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an individually-validated attestation to the pool.
    ///
    /// The attestation must carry its committee shuffling seed if it is the first for its data;
    /// otherwise an error is returned and the pool is unchanged.
    pub fn add(&self, attestation: ValidatedAttestation<E>) -> Result<(), Error> {
        let attestation_data = attestation.data().clone();
        let data_root = attestation_data.tree_hash_root();

        let mut indices = self.indices.write();
        let indices = &mut *indices;

        let group = match indices.attestation_group_by_data_hash.entry(data_root) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let committee_shuffling_seed = attestation
                    .committee_shuffling_seed()
                    .ok_or(Error::MissingCommitteeShufflingSeed)?;
                entry.insert(MatchingDataAttestationGroup::new(
                    attestation_data.clone(),
                    committee_shuffling_seed,
                ))
            }
        };

        if group.add(attestation) {
            self.update_size(1);
        }

        if group.is_empty() {
            // The add was rejected and left a freshly created group empty; the indices must
            // never hold an empty group.
            indices.attestation_group_by_data_hash.remove(&data_root);
        } else {
            indices
                .data_hash_by_slot
                .entry(attestation_data.slot)
                .or_default()
                .insert(data_root);
        }

        Ok(())
    }

    /// Remove the validators covered by `attestation` from the pool, e.g. because a block
    /// containing it became canonical.
    ///
    /// Stored attestations entirely covered by `attestation` are dropped; partial overlaps are
    /// retained. Unknown attestation data is a no-op.
    pub fn remove(&self, attestation: &Attestation<E>) {
        let data_root = attestation.data.tree_hash_root();

        let mut indices = self.indices.write();
        let indices = &mut *indices;

        let group = match indices.attestation_group_by_data_hash.get_mut(&data_root) {
            Some(group) => group,
            None => return,
        };

        let num_removed = group.remove(attestation);
        self.update_size(-(num_removed as i64));

        if group.is_empty() {
            indices.attestation_group_by_data_hash.remove(&data_root);
            remove_from_slot_mappings(
                &mut indices.data_hash_by_slot,
                attestation.data.slot,
                data_root,
            );
        }
    }

    /// Apply [`Self::remove`] to each attestation.
    pub fn remove_all<'a>(&self, attestations: impl IntoIterator<Item = &'a Attestation<E>>)
    where
        E: 'a,
    {
        for attestation in attestations {
            self.remove(attestation);
        }
    }

    /// Prune attestations whose slot has fallen out of the retention window.
    pub fn on_slot(&self, slot: Slot) {
        let retention_slots = E::slots_per_epoch() * ATTESTATION_RETENTION_EPOCHS;
        if slot <= retention_slots {
            return;
        }
        let first_valid_slot = slot - retention_slots;

        let mut indices = self.indices.write();
        let indices = &mut *indices;

        let retained = indices.data_hash_by_slot.split_off(&first_valid_slot);
        let expired = std::mem::replace(&mut indices.data_hash_by_slot, retained);

        for data_root in expired.into_values().flatten() {
            if let Some(group) = indices.attestation_group_by_data_hash.remove(&data_root) {
                self.update_size(-(group.size() as i64));
            }
        }
    }

    /// Select attestations for inclusion in a block built on `state_at_block_slot`.
    ///
    /// Newer attestations are preferred: slots are walked in descending order and the result
    /// preserves that order. Groups failing state validation or belonging to the wrong fork are
    /// skipped. At most `E::MaxAttestations` aggregates are drawn from the pool, and the number
    /// of admitted previous-epoch attestations is bounded by the state's remaining capacity.
    pub fn get_attestations_for_block<S: SpecProvider<E>>(
        &self,
        spec: &S,
        state_at_block_slot: &S::State,
        fork_checker: &impl ForkChecker,
    ) -> VariableList<Attestation<E>, E::MaxAttestations> {
        let current_epoch = spec.current_epoch(state_at_block_slot);
        let previous_epoch_limit = spec.previous_epoch_attestation_capacity(state_at_block_slot);

        let indices = self.indices.read();

        let mut attestations = VariableList::default();
        let mut num_streamed = 0_usize;
        let mut num_previous_epoch = 0_usize;

        'slot_walk: for data_hashes in indices.data_hash_by_slot.values().rev() {
            for data_root in data_hashes {
                let group = match indices.attestation_group_by_data_hash.get(data_root) {
                    Some(group) => group,
                    None => continue,
                };
                if spec
                    .validate_attestation(state_at_block_slot, group.data())
                    .is_err()
                {
                    continue;
                }
                if !fork_checker.attestations_from_correct_fork(group.data()) {
                    continue;
                }

                for aggregate in group.aggregates() {
                    // The total-count cap bounds the number of streamed aggregates, not the
                    // number of admitted ones; a previous-epoch rejection still consumes cap
                    // budget.
                    if num_streamed >= E::max_attestations() {
                        break 'slot_walk;
                    }
                    num_streamed += 1;

                    let attestation = aggregate.into_attestation();
                    if spec.compute_epoch_at_slot(attestation.data.slot) < current_epoch {
                        let num_admitted = num_previous_epoch;
                        num_previous_epoch += 1;
                        if num_admitted >= previous_epoch_limit {
                            continue;
                        }
                    }

                    if attestations.push(attestation).is_err() {
                        break 'slot_walk;
                    }
                }
            }
        }

        attestations
    }

    /// Iterate aggregated attestations, optionally restricted to a slot and/or committee index.
    ///
    /// Slots are visited in descending order. The traversal snapshots the slot index up front
    /// and looks groups up lazily, skipping any that are pruned concurrently. No retention or
    /// validity filtering is applied.
    pub fn get_attestations(
        &self,
        maybe_slot: Option<Slot>,
        maybe_committee_index: Option<CommitteeIndex>,
    ) -> impl Iterator<Item = Attestation<E>> + '_ {
        let data_roots: Vec<Hash256> = {
            let indices = self.indices.read();
            indices
                .data_hash_by_slot
                .iter()
                .rev()
                .filter(|(slot, _)| maybe_slot.map_or(true, |wanted| **slot == wanted))
                .flat_map(|(_, data_hashes)| data_hashes.iter().copied())
                .collect()
        };

        data_roots.into_iter().flat_map(move |data_root| {
            let indices = self.indices.read();
            indices
                .attestation_group_by_data_hash
                .get(&data_root)
                .filter(|group| {
                    maybe_committee_index.map_or(true, |index| group.data().index == index)
                })
                .map(|group| {
                    group
                        .aggregates()
                        .map(ValidatedAttestation::into_attestation)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        })
    }

    /// The best aggregate the pool can currently produce for the given attestation data root,
    /// if any attestations for it are known.
    pub fn create_aggregate_for(
        &self,
        attestation_data_root: &Hash256,
    ) -> Option<ValidatedAttestation<E>> {
        let indices = self.indices.read();
        indices
            .attestation_group_by_data_hash
            .get(attestation_data_root)?
            .aggregates()
            .next()
    }

    /// The total number of attestations stored in the pool.
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed).max(0) as usize
    }

    /// Statistics about all attestations stored in the pool.
    pub fn attestation_stats(&self) -> AttestationStats {
        let indices = self.indices.read();
        let mut stats = AttestationStats::default();

        for group in indices.attestation_group_by_data_hash.values() {
            stats.num_attestations += group.size();
            stats.num_attestation_data += 1;
            stats.max_attestations_per_data =
                std::cmp::max(stats.max_attestations_per_data, group.size());
        }
        stats
    }

    fn update_size(&self, delta: i64) {
        let previous = self.size.fetch_add(delta, Ordering::Relaxed);
        metrics::set_gauge(&metrics::ATTESTATION_POOL_SIZE, previous + delta);
    }
}

fn remove_from_slot_mappings(
    data_hash_by_slot: &mut BTreeMap<Slot, HashSet<Hash256>>,
    slot: Slot,
    data_root: Hash256,
) {
    if let Some(data_hashes) = data_hash_by_slot.get_mut(&slot) {
        data_hashes.remove(&data_root);
        if data_hashes.is_empty() {
            data_hash_by_slot.remove(&slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::typenum::{U2048, U32, U4};
    use types::{AggregateSignature, BitList, Checkpoint, MainnetEthSpec};

    type E = MainnetEthSpec;

    const COMMITTEE_SIZE: usize = 8;

    /// A spec with a small block attestation cap, so cap behaviour is testable with few groups.
    #[derive(Clone, PartialEq, Eq, Debug, Default, Hash)]
    struct SmallBlockSpec;

    impl EthSpec for SmallBlockSpec {
        type MaxValidatorsPerCommittee = U2048;
        type MaxAttestations = U4;
        type SlotsPerEpoch = U32;
    }

    struct TestState {
        current_epoch: Epoch,
        previous_epoch_attestation_capacity: usize,
    }

    #[derive(Default)]
    struct TestSpec {
        invalid_data_roots: HashSet<Hash256>,
    }

    impl<S: EthSpec> SpecProvider<S> for TestSpec {
        type State = TestState;
        type Error = String;

        fn validate_attestation(
            &self,
            _state: &TestState,
            data: &AttestationData,
        ) -> Result<(), String> {
            if self.invalid_data_roots.contains(&data.tree_hash_root()) {
                Err("attestation is not valid for the state".to_string())
            } else {
                Ok(())
            }
        }

        fn current_epoch(&self, state: &TestState) -> Epoch {
            state.current_epoch
        }

        fn previous_epoch_attestation_capacity(&self, state: &TestState) -> usize {
            state.previous_epoch_attestation_capacity
        }

        fn compute_epoch_at_slot(&self, slot: Slot) -> Epoch {
            slot.epoch(S::slots_per_epoch())
        }
    }

    struct AcceptAllForks;

    impl ForkChecker for AcceptAllForks {
        fn attestations_from_correct_fork(&self, _data: &AttestationData) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct RejectingForkChecker {
        rejected_data_roots: HashSet<Hash256>,
    }

    impl ForkChecker for RejectingForkChecker {
        fn attestations_from_correct_fork(&self, data: &AttestationData) -> bool {
            !self.rejected_data_roots.contains(&data.tree_hash_root())
        }
    }

    fn shuffling_seed() -> Hash256 {
        Hash256::repeat_byte(42)
    }

    fn data(slot: u64, index: CommitteeIndex) -> AttestationData {
        AttestationData {
            slot: Slot::new(slot),
            index,
            beacon_block_root: Hash256::zero(),
            source: Checkpoint::default(),
            target: Checkpoint::default(),
        }
    }

    fn attestation<S: EthSpec>(data: AttestationData, signers: &[usize]) -> Attestation<S> {
        let mut aggregation_bits = BitList::with_capacity(COMMITTEE_SIZE).unwrap();
        for signer in signers {
            aggregation_bits.set(*signer, true).unwrap();
        }

        Attestation {
            aggregation_bits,
            data,
            signature: AggregateSignature::infinity(),
        }
    }

    fn validated<S: EthSpec>(
        data: AttestationData,
        signers: &[usize],
    ) -> ValidatedAttestation<S> {
        ValidatedAttestation::new(attestation(data, signers), shuffling_seed())
    }

    fn state_at_epoch(epoch: u64, previous_epoch_attestation_capacity: usize) -> TestState {
        TestState {
            current_epoch: Epoch::new(epoch),
            previous_epoch_attestation_capacity,
        }
    }

    #[test]
    fn size_counts_stored_attestations() {
        let pool = AggregatingAttestationPool::<E>::new();

        pool.add(validated(data(1, 0), &[0])).unwrap();
        pool.add(validated(data(1, 0), &[1])).unwrap();
        pool.add(validated(data(1, 1), &[0])).unwrap();

        assert_eq!(pool.size(), 3);
        assert_eq!(pool.attestation_stats().num_attestations, pool.size());
        assert_eq!(pool.attestation_stats().num_attestation_data, 2);
        assert_eq!(pool.attestation_stats().max_attestations_per_data, 2);
    }

    #[test]
    fn duplicate_and_subset_adds_do_not_grow_the_pool() {
        let pool = AggregatingAttestationPool::<E>::new();

        pool.add(validated(data(1, 0), &[0])).unwrap();
        pool.add(validated(data(1, 0), &[0])).unwrap();
        assert_eq!(pool.size(), 1);

        pool.add(validated(data(1, 0), &[1])).unwrap();
        // {0} is covered by the union of everything seen so far.
        pool.add(validated(data(1, 0), &[0])).unwrap();
        assert_eq!(pool.size(), 2);
    }

    #[test]
    fn add_requires_seed_for_new_group_only() {
        let pool = AggregatingAttestationPool::<E>::new();
        let seedless =
            ValidatedAttestation::from_attestation(attestation::<E>(data(1, 0), &[0]));

        assert_eq!(
            pool.add(seedless.clone()),
            Err(Error::MissingCommitteeShufflingSeed)
        );
        assert_eq!(pool.size(), 0);

        // Once a seeded attestation created the group, the seed is no longer required.
        pool.add(validated(data(1, 0), &[1])).unwrap();
        pool.add(seedless).unwrap();
        assert_eq!(pool.size(), 2);
    }

    #[test]
    fn create_aggregate_for_unions_attestations() {
        let pool = AggregatingAttestationPool::<E>::new();
        let attestation_data = data(1, 0);

        pool.add(validated(attestation_data.clone(), &[0])).unwrap();
        pool.add(validated(attestation_data.clone(), &[1])).unwrap();

        let aggregate = pool
            .create_aggregate_for(&attestation_data.tree_hash_root())
            .unwrap();
        assert_eq!(aggregate.attestation.aggregation_bits.num_set_bits(), 2);
        assert_eq!(aggregate.committee_shuffling_seed(), Some(shuffling_seed()));

        assert!(pool.create_aggregate_for(&Hash256::repeat_byte(99)).is_none());
    }

    #[test]
    fn remove_is_bit_subtracting() {
        let pool = AggregatingAttestationPool::<E>::new();
        let attestation_data = data(1, 0);

        pool.add(validated(attestation_data.clone(), &[0, 1, 2, 3]))
            .unwrap();
        pool.add(validated(attestation_data.clone(), &[4, 5, 6, 7]))
            .unwrap();

        pool.remove(&attestation(attestation_data.clone(), &[0, 1, 2, 3]));
        assert_eq!(pool.size(), 1);

        // The removed validators were already served; a subset of them is not re-admitted.
        pool.add(validated(attestation_data.clone(), &[0, 1, 2]))
            .unwrap();
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn remove_unknown_data_is_a_no_op() {
        let pool = AggregatingAttestationPool::<E>::new();
        pool.remove(&attestation(data(1, 0), &[0]));
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn remove_erases_drained_groups() {
        let pool = AggregatingAttestationPool::<E>::new();
        let attestation_data = data(1, 0);

        pool.add(validated(attestation_data.clone(), &[0, 1])).unwrap();
        pool.remove(&attestation(attestation_data.clone(), &[0, 1]));

        assert_eq!(pool.size(), 0);
        assert_eq!(pool.attestation_stats().num_attestation_data, 0);
        assert_eq!(pool.get_attestations(None, None).count(), 0);
        assert!(pool
            .create_aggregate_for(&attestation_data.tree_hash_root())
            .is_none());
    }

    #[test]
    fn remove_all_applies_to_each_attestation() {
        let pool = AggregatingAttestationPool::<E>::new();

        pool.add(validated(data(1, 0), &[0])).unwrap();
        pool.add(validated(data(2, 0), &[1])).unwrap();
        pool.add(validated(data(3, 0), &[2])).unwrap();

        let included = vec![
            attestation::<E>(data(1, 0), &[0]),
            attestation::<E>(data(2, 0), &[1]),
        ];
        pool.remove_all(&included);

        assert_eq!(pool.size(), 1);
        let remaining: Vec<_> = pool.get_attestations(None, None).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].data.slot, Slot::new(3));
    }

    #[test]
    fn on_slot_prunes_expired_slots() {
        let pool = AggregatingAttestationPool::<E>::new();
        pool.add(validated(data(10, 0), &[0])).unwrap();

        // Inside the retention window nothing happens.
        pool.on_slot(Slot::new(64));
        assert_eq!(pool.size(), 1);

        // Slot 10 is exactly the first valid slot at 74; it survives.
        pool.on_slot(Slot::new(74));
        assert_eq!(pool.size(), 1);

        pool.on_slot(Slot::new(100));
        assert_eq!(pool.size(), 0);
        assert_eq!(pool.get_attestations(None, None).count(), 0);
    }

    #[test]
    fn on_slot_only_prunes_old_slots() {
        let pool = AggregatingAttestationPool::<E>::new();
        pool.add(validated(data(10, 0), &[0])).unwrap();
        pool.add(validated(data(90, 0), &[1])).unwrap();

        pool.on_slot(Slot::new(100));

        assert_eq!(pool.size(), 1);
        let remaining: Vec<_> = pool.get_attestations(None, None).collect();
        assert_eq!(remaining[0].data.slot, Slot::new(90));
    }

    #[test]
    fn get_attestations_filters_by_slot_and_committee() {
        let pool = AggregatingAttestationPool::<E>::new();

        pool.add(validated(data(1, 0), &[0])).unwrap();
        pool.add(validated(data(1, 1), &[1])).unwrap();
        pool.add(validated(data(2, 0), &[2])).unwrap();

        assert_eq!(pool.get_attestations(None, None).count(), 3);
        assert_eq!(pool.get_attestations(Some(Slot::new(1)), None).count(), 2);
        assert_eq!(pool.get_attestations(None, Some(1)).count(), 1);
        assert_eq!(
            pool.get_attestations(Some(Slot::new(2)), Some(1)).count(),
            0
        );
    }

    #[test]
    fn get_attestations_walks_slots_in_descending_order() {
        let pool = AggregatingAttestationPool::<E>::new();

        pool.add(validated(data(1, 0), &[0])).unwrap();
        pool.add(validated(data(5, 0), &[0])).unwrap();
        pool.add(validated(data(3, 0), &[0])).unwrap();

        let slots: Vec<_> = pool
            .get_attestations(None, None)
            .map(|attestation| attestation.data.slot)
            .collect();
        assert_eq!(slots, vec![Slot::new(5), Slot::new(3), Slot::new(1)]);
    }

    #[test]
    fn added_attestation_is_covered_by_a_returned_aggregate() {
        let pool = AggregatingAttestationPool::<E>::new();

        pool.add(validated(data(1, 0), &[3])).unwrap();
        pool.add(validated(data(1, 0), &[4, 5])).unwrap();

        let returned: Vec<_> = pool
            .get_attestations(Some(Slot::new(1)), Some(0))
            .collect();
        assert!(returned.iter().any(|attestation| {
            attestation.aggregation_bits.get(3).unwrap()
        }));
    }

    #[test]
    fn block_selection_walks_slots_in_descending_order() {
        let pool = AggregatingAttestationPool::<SmallBlockSpec>::new();
        let spec = TestSpec::default();
        let state = state_at_epoch(5, 128);

        for slot in [165_u64, 175, 170] {
            pool.add(validated::<SmallBlockSpec>(data(slot, 0), &[0]))
                .unwrap();
        }

        let attestations = pool.get_attestations_for_block(&spec, &state, &AcceptAllForks);
        let slots: Vec<_> = attestations
            .iter()
            .map(|attestation| attestation.data.slot.as_u64())
            .collect();
        assert_eq!(slots, vec![175, 170, 165]);
    }

    #[test]
    fn block_selection_applies_previous_epoch_cap() {
        let pool = AggregatingAttestationPool::<SmallBlockSpec>::new();
        let spec = TestSpec::default();
        // Current epoch 5, with room for a single previous-epoch attestation.
        let state = state_at_epoch(5, 1);

        // Three aggregates in epoch 4 and three in epoch 5.
        for slot in [130_u64, 140, 150, 165, 170, 175] {
            pool.add(validated::<SmallBlockSpec>(data(slot, 0), &[0]))
                .unwrap();
        }

        let attestations = pool.get_attestations_for_block(&spec, &state, &AcceptAllForks);
        let slots: Vec<_> = attestations
            .iter()
            .map(|attestation| attestation.data.slot.as_u64())
            .collect();

        // One from the previous epoch plus the three current-epoch aggregates.
        assert_eq!(slots, vec![175, 170, 165, 150]);
    }

    #[test]
    fn block_selection_counts_rejected_previous_epoch_attestations() {
        let pool = AggregatingAttestationPool::<SmallBlockSpec>::new();
        let spec = TestSpec::default();
        let state = state_at_epoch(5, 0);

        for slot in [130_u64, 140, 150, 165, 170, 175] {
            pool.add(validated::<SmallBlockSpec>(data(slot, 0), &[0]))
                .unwrap();
        }

        let attestations = pool.get_attestations_for_block(&spec, &state, &AcceptAllForks);
        let slots: Vec<_> = attestations
            .iter()
            .map(|attestation| attestation.data.slot.as_u64())
            .collect();

        // Every previous-epoch aggregate is rejected, but the first of them still consumed the
        // remaining stream budget.
        assert_eq!(slots, vec![175, 170, 165]);
    }

    #[test]
    fn block_selection_is_bounded_by_max_attestations() {
        let pool = AggregatingAttestationPool::<SmallBlockSpec>::new();
        let spec = TestSpec::default();
        let state = state_at_epoch(5, 128);

        for slot in 160_u64..166 {
            pool.add(validated::<SmallBlockSpec>(data(slot, 0), &[0]))
                .unwrap();
        }

        let attestations = pool.get_attestations_for_block(&spec, &state, &AcceptAllForks);
        assert_eq!(attestations.len(), 4);

        let slots: Vec<_> = attestations
            .iter()
            .map(|attestation| attestation.data.slot.as_u64())
            .collect();
        assert_eq!(slots, vec![165, 164, 163, 162]);
    }

    #[test]
    fn block_selection_skips_invalid_and_wrong_fork_groups() {
        let pool = AggregatingAttestationPool::<SmallBlockSpec>::new();
        let state = state_at_epoch(5, 128);

        let invalid = data(170, 0);
        let wrong_fork = data(171, 0);
        let good = data(172, 0);

        pool.add(validated::<SmallBlockSpec>(invalid.clone(), &[0]))
            .unwrap();
        pool.add(validated::<SmallBlockSpec>(wrong_fork.clone(), &[1]))
            .unwrap();
        pool.add(validated::<SmallBlockSpec>(good.clone(), &[2]))
            .unwrap();

        let spec = TestSpec {
            invalid_data_roots: HashSet::from([invalid.tree_hash_root()]),
        };
        let fork_checker = RejectingForkChecker {
            rejected_data_roots: HashSet::from([wrong_fork.tree_hash_root()]),
        };

        let attestations = pool.get_attestations_for_block(&spec, &state, &fork_checker);
        assert_eq!(attestations.len(), 1);
        assert_eq!(attestations[0].data, good);
    }

    #[test]
    fn block_selection_includes_every_aggregate_of_a_group() {
        let pool = AggregatingAttestationPool::<SmallBlockSpec>::new();
        let spec = TestSpec::default();
        let state = state_at_epoch(5, 128);
        let attestation_data = data(170, 0);

        // The single-signer attestation overlaps the larger one, forcing two aggregates.
        pool.add(validated::<SmallBlockSpec>(attestation_data.clone(), &[1]))
            .unwrap();
        pool.add(validated::<SmallBlockSpec>(
            attestation_data.clone(),
            &[0, 1, 2],
        ))
        .unwrap();

        let attestations = pool.get_attestations_for_block(&spec, &state, &AcceptAllForks);
        assert_eq!(attestations.len(), 2);
        assert_eq!(attestations[0].aggregation_bits.num_set_bits(), 3);
        assert_eq!(attestations[1].aggregation_bits.num_set_bits(), 1);
    }
}
