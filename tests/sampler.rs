//! Timestamp Sampling Tests
//!
//! Bounded-retry sampling of distinct seconds within a video's duration.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use media_jobs::app::sampler::sample_timestamps;

#[test]
fn samples_are_distinct_and_within_duration() {
    for seed in 0..200u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let duration = 1 + seed % 37;
        let count = (seed % 11) as usize;

        let sampled = sample_timestamps(count, duration, &mut rng);

        let unique: HashSet<u64> = sampled.iter().copied().collect();
        assert_eq!(unique.len(), sampled.len(), "duplicates for seed {}", seed);
        assert!(sampled.len() <= count);
        assert!(sampled.iter().all(|&t| t < duration));
    }
}

#[test]
fn zero_duration_yields_single_zero() {
    let mut rng = StdRng::seed_from_u64(7);
    for count in 1..10 {
        assert_eq!(sample_timestamps(count, 0, &mut rng), vec![0]);
    }
}

#[test]
fn zero_count_yields_nothing() {
    let mut rng = StdRng::seed_from_u64(7);
    assert!(sample_timestamps(0, 120, &mut rng).is_empty());
    assert!(sample_timestamps(0, 0, &mut rng).is_empty());
}

#[test]
fn one_second_duration_collapses_to_one_slot() {
    let mut rng = StdRng::seed_from_u64(3);
    assert_eq!(sample_timestamps(5, 1, &mut rng), vec![0]);
}

#[test]
fn exhausted_slots_are_skipped_not_retried_forever() {
    // 2 possible values, 50 slots: at most 2 can ever be accepted.
    let mut rng = StdRng::seed_from_u64(11);
    let sampled = sample_timestamps(50, 2, &mut rng);
    assert!(!sampled.is_empty());
    assert!(sampled.len() <= 2);
}

#[test]
fn long_video_usually_fills_every_slot() {
    let mut rng = StdRng::seed_from_u64(42);
    let sampled = sample_timestamps(3, 3600, &mut rng);
    assert_eq!(sampled.len(), 3);
}

#[test]
fn same_seed_same_sequence() {
    let first = sample_timestamps(4, 600, &mut StdRng::seed_from_u64(99));
    let second = sample_timestamps(4, 600, &mut StdRng::seed_from_u64(99));
    assert_eq!(first, second);
}

#[test]
fn oversized_count_stops_once_every_second_is_taken() {
    let mut rng = StdRng::seed_from_u64(7);
    assert_eq!(sample_timestamps(usize::MAX, 0, &mut rng), vec![0]);

    let mut sampled = sample_timestamps(usize::MAX, 5, &mut rng);
    sampled.sort_unstable();
    assert_eq!(sampled, vec![0, 1, 2, 3, 4]);
}
