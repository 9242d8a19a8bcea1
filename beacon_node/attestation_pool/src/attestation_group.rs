use std::collections::{BTreeMap, VecDeque};
use types::{Attestation, AttestationData, BitList, EthSpec, Hash256, ValidatedAttestation};

/// Maintains an aggregated collection of attestations which all share the same
/// `AttestationData`.
///
/// The pool never stores an attestation whose signers are all covered by attestations it has
/// already seen, and when streaming aggregates it combines as many disjoint attestations as
/// possible into a single `Attestation`.
pub struct MatchingDataAttestationGroup<E: EthSpec> {
    data: AttestationData,
    committee_shuffling_seed: Hash256,
    /// Stored attestations, bucketed by the number of validators they include. Streaming visits
    /// buckets in descending key order so larger attestations become aggregation seeds first.
    attestations_by_validator_count: BTreeMap<usize, Vec<ValidatedAttestation<E>>>,
    /// The union of the aggregation bits of every attestation ever added to this group.
    ///
    /// Never cleared, even when attestations are removed, so that attestations subsumed by
    /// something this group has already served are not re-admitted.
    seen_aggregation_bits: Option<BitList<E::MaxValidatorsPerCommittee>>,
}

impl<E: EthSpec> MatchingDataAttestationGroup<E> {
    pub fn new(data: AttestationData, committee_shuffling_seed: Hash256) -> Self {
        Self {
            data,
            committee_shuffling_seed,
            attestations_by_validator_count: BTreeMap::new(),
            seen_aggregation_bits: None,
        }
    }

    pub fn data(&self) -> &AttestationData {
        &self.data
    }

    pub fn committee_shuffling_seed(&self) -> Hash256 {
        self.committee_shuffling_seed
    }

    /// Add an attestation to the group.
    ///
    /// Returns `true` if the attestation contributed at least one validator not already covered
    /// by the group's seen bits. Attestations with no signers, or whose signers are all already
    /// seen, are discarded and `false` is returned.
    pub fn add(&mut self, attestation: ValidatedAttestation<E>) -> bool {
        debug_assert_eq!(attestation.data(), &self.data);

        let bits = &attestation.attestation.aggregation_bits;
        let num_set_bits = bits.num_set_bits();
        if num_set_bits == 0 {
            return false;
        }

        let updated_seen_bits = match &self.seen_aggregation_bits {
            Some(seen_bits) => {
                if seen_bits.len() != bits.len() {
                    // A different committee size means a different committee; the caller
                    // violated the matching-data contract.
                    debug_assert!(false, "aggregation bitfield lengths must match");
                    return false;
                }
                if bits.difference(seen_bits).is_zero() {
                    return false;
                }
                seen_bits.union(bits)
            }
            None => bits.clone(),
        };
        self.seen_aggregation_bits = Some(updated_seen_bits);

        self.attestations_by_validator_count
            .entry(num_set_bits)
            .or_default()
            .push(attestation);
        true
    }

    /// Remove every stored attestation whose signers are all included in `attestation`.
    ///
    /// Stored attestations that only partially overlap are left untouched, and the seen bits are
    /// deliberately not reduced. Returns the number of attestations removed.
    pub fn remove(&mut self, attestation: &Attestation<E>) -> usize {
        let removed_bits = &attestation.aggregation_bits;
        let mut num_removed = 0;

        self.attestations_by_validator_count.retain(|_, bucket| {
            bucket.retain(|stored| {
                let stored_bits = &stored.attestation.aggregation_bits;
                if stored_bits.len() == removed_bits.len()
                    && stored_bits.difference(removed_bits).is_zero()
                {
                    num_removed += 1;
                    false
                } else {
                    true
                }
            });
            !bucket.is_empty()
        });

        num_removed
    }

    /// The number of attestations currently stored.
    pub fn size(&self) -> usize {
        self.attestations_by_validator_count
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.attestations_by_validator_count.is_empty()
    }

    /// Lazily stream aggregates built from the currently stored attestations.
    ///
    /// Each emitted aggregate greedily combines as many mutually disjoint attestations as
    /// possible around a seed attestation, larger seeds first. Every stored attestation
    /// contributes to exactly one aggregate per stream. The iterator must not outlive a
    /// mutation of the group.
    pub fn aggregates(&self) -> AggregateIterator<'_, E> {
        AggregateIterator {
            data: &self.data,
            committee_shuffling_seed: self.committee_shuffling_seed,
            remaining: self
                .attestations_by_validator_count
                .values()
                .rev()
                .flatten()
                .collect(),
        }
    }
}

/// Iterator over the maximal disjoint aggregates of a `MatchingDataAttestationGroup`.
pub struct AggregateIterator<'a, E: EthSpec> {
    data: &'a AttestationData,
    committee_shuffling_seed: Hash256,
    remaining: VecDeque<&'a ValidatedAttestation<E>>,
}

impl<'a, E: EthSpec> Iterator for AggregateIterator<'a, E> {
    type Item = ValidatedAttestation<E>;

    fn next(&mut self) -> Option<Self::Item> {
        let seed = self.remaining.pop_front()?;
        let mut aggregate = seed.attestation.clone();
        debug_assert_eq!(&aggregate.data, self.data);

        let mut index = 0;
        while index < self.remaining.len() {
            let candidate = &self.remaining[index];
            if aggregate.signers_disjoint_from(&candidate.attestation) {
                aggregate.aggregate(&candidate.attestation);
                self.remaining.remove(index);
            } else {
                index += 1;
            }
        }

        Some(ValidatedAttestation::new(
            aggregate,
            self.committee_shuffling_seed,
        ))
    }
}
