//! Property tests over the public API.

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use u_roster::control::{MemoryStore, ProgressUpdate, RunStatus, SolverControl};
use u_roster::ga::{Chromosome, FitnessVector, Individual};
use u_roster::incremental::{Assignment, DateRange, IncrementalScheduleUpdater, Schedule};

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(offset as i64)
}

fn score() -> impl Strategy<Value = f64> {
    0.0f64..=1.0
}

fn fitness() -> impl Strategy<Value = FitnessVector> {
    prop::array::uniform6(score()).prop_map(FitnessVector::from)
}

proptest! {
    #[test]
    fn test_clone_is_independent(
        rows in 1usize..12,
        cols in 1usize..12,
        seed in any::<u64>(),
        r in 0usize..12,
        b in 0usize..12,
    ) {
        let original = Chromosome::create_random(rows, cols, 5, 0.5, seed).unwrap();
        let snapshot = original.genes().to_vec();
        let mut copy = original.clone();

        let (r, b) = (r % rows, b % cols);
        let current = copy.get_assignment(r, b).unwrap();
        copy.set_assignment(r, b, (current + 1) % 6).unwrap();

        prop_assert_eq!(original.genes(), snapshot.as_slice());
        prop_assert_ne!(copy.genes(), original.genes());
    }

    #[test]
    fn test_similarity_matches_hamming(
        rows in 1usize..10,
        cols in 1usize..10,
        s1 in any::<u64>(),
        s2 in any::<u64>(),
        density in 0.0f64..=1.0,
    ) {
        let a = Chromosome::create_random(rows, cols, 4, density, s1).unwrap();
        let b = Chromosome::create_random(rows, cols, 4, density, s2).unwrap();

        let hamming = a.hamming_distance(&b).unwrap() as f64;
        let expected = 1.0 - hamming / (rows * cols) as f64;
        prop_assert!((a.similarity(&b).unwrap() - expected).abs() < 1e-12);
        prop_assert_eq!(a.similarity(&a).unwrap(), 1.0);
    }

    #[test]
    fn test_shape_mismatch_always_errors(rows in 1usize..8, cols in 1usize..8) {
        let a = Chromosome::new(rows, cols, 3);
        let b = Chromosome::new(rows + 1, cols, 3);
        prop_assert!(a.hamming_distance(&b).is_err());
        prop_assert!(a.similarity(&b).is_err());
    }

    #[test]
    fn test_fitness_array_round_trip(values in prop::array::uniform6(any::<f64>().prop_filter("finite", |v| v.is_finite()))) {
        let f = FitnessVector::from(values);
        prop_assert_eq!(FitnessVector::from_array(&f.to_array()).unwrap(), f);
    }

    #[test]
    fn test_dominance_is_antisymmetric(base in fitness(), bumps in prop::array::uniform6(0.0f64..0.5), strict in 0usize..6) {
        let mut better = base.to_array();
        for (v, bump) in better.iter_mut().zip(bumps) {
            *v += bump;
        }
        better[strict] += 0.1;
        let better = FitnessVector::from(better);

        prop_assert!(better.dominates(&base));
        prop_assert!(!base.dominates(&better));
        prop_assert!(!base.dominates(&base));
    }

    #[test]
    fn test_disjoint_improvements_are_incomparable(base in fitness(), i in 0usize..6, j in 0usize..6) {
        prop_assume!(i != j);
        let mut x = base.to_array();
        let mut y = base.to_array();
        x[i] += 0.1;
        y[j] += 0.1;
        let (x, y) = (FitnessVector::from(x), FitnessVector::from(y));

        prop_assert!(!x.dominates(&y));
        prop_assert!(!y.dominates(&x));
    }

    #[test]
    fn test_preference_sort_is_rank_then_crowding(
        members in prop::collection::vec((0usize..4, 0.0f64..10.0), 1..20),
    ) {
        let mut population: Vec<Individual> = members
            .iter()
            .enumerate()
            .map(|(id, &(rank, crowding))| {
                let mut ind = Individual::new(Chromosome::new(1, 1, 1), 0, id as u64);
                ind.rank = rank;
                ind.crowding_distance = crowding;
                ind
            })
            .collect();
        population.sort_by(|a, b| a.cmp_preference(b));

        for pair in population.windows(2) {
            prop_assert!(pair[0].rank <= pair[1].rank);
            if pair[0].rank == pair[1].rank {
                prop_assert!(pair[0].crowding_distance >= pair[1].crowding_distance);
            }
        }
    }

    #[test]
    fn test_capacity_update_bounds_daily_load(
        rows in prop::collection::vec((0u32..5, 0usize..3, -3i32..3), 0..60),
        capacity in 0usize..5,
    ) {
        let rotations = ["icu", "ward", "clinic"];
        let mut schedule = Schedule::new();
        for (i, &(d, r, p)) in rows.iter().enumerate() {
            schedule.push(Assignment::new(format!("p{i}"), day(d), rotations[r]).with_priority(p));
        }

        let mut before: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for a in schedule.assignments.iter().filter(|a| a.rotation_id == "icu") {
            *before.entry(a.block_date).or_default() += 1;
        }
        let expected: usize = before.values().map(|&n| n.saturating_sub(capacity)).sum();

        let mut updater = IncrementalScheduleUpdater::new();
        let removed = updater.update_rotation_capacity(&mut schedule, "icu", capacity, &DateRange::new(day(0), day(4)));

        prop_assert_eq!(removed.len(), expected);
        prop_assert_eq!(updater.get_stats().conflicts, expected as u64);
        for d in 0..5 {
            prop_assert!(schedule.rotation_load("icu", day(d)) <= capacity);
        }
        prop_assert!(removed.iter().all(|a| a.rotation_id == "icu"));
    }

    #[test]
    fn test_progress_round_trip(iteration in any::<u64>(), best_score in any::<f64>().prop_filter("not NaN", |v| !v.is_nan())) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let record = runtime.block_on(async {
            let control = SolverControl::new(Arc::new(MemoryStore::new()));
            let update = ProgressUpdate {
                iteration,
                best_score,
                status: RunStatus::Running,
                ..ProgressUpdate::default()
            };
            control.update_progress("run", &update).await;
            control.get_progress("run").await
        }).unwrap();

        prop_assert_eq!(record.iteration, iteration);
        prop_assert_eq!(record.best_score.to_bits(), best_score.to_bits());
        prop_assert_eq!(record.status, RunStatus::Running);
    }
}
