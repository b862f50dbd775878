//! In-place schedule edits without re-optimization.

use super::predicates::{AlwaysFeasible, CapacityEligibility, RotationEligibility, SwapFeasibility};
use super::types::{Assignment, DateRange, Person, Schedule, UpdateConstraints};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Counters of applied and rejected edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateStats {
    /// Calls that reached the mutation stage.
    pub total_updates: u64,
    /// Rejected or undone changes.
    pub conflicts: u64,
    /// `conflicts / total_updates`, or `0.0` before any update.
    pub conflict_rate: f64,
}

/// Outcome of [`IncrementalScheduleUpdater::swap_assignments`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Rotations were exchanged.
    Swapped,
    /// At least one of the two assignments does not exist.
    NotFound,
    /// The feasibility check rejected the exchange.
    Rejected {
        /// Why the exchange was rejected.
        reason: String,
    },
}

/// Applies small edits to an existing [`Schedule`].
///
/// Constraint violations are counted outcomes, not errors. Editing a
/// schedule takes `&mut Schedule`, so edits to one schedule are serialized
/// by construction.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use u_roster::incremental::{DateRange, IncrementalScheduleUpdater, Person, Schedule, UpdateConstraints};
///
/// let mut schedule = Schedule::new();
/// let mut updater = IncrementalScheduleUpdater::new();
/// let constraints = UpdateConstraints::new().with_rotation("icu", Some(2));
/// let week = DateRange::new(
///     NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
/// );
///
/// let added = updater.add_person(&mut schedule, &Person::new("ann"), &week, &constraints);
/// assert_eq!(added, 7);
/// assert_eq!(updater.get_stats().total_updates, 1);
/// ```
#[derive(Debug, Clone)]
pub struct IncrementalScheduleUpdater<E = CapacityEligibility, F = AlwaysFeasible> {
    eligibility: E,
    feasibility: F,
    update_count: u64,
    conflict_count: u64,
}

impl IncrementalScheduleUpdater {
    /// Creates an updater with [`CapacityEligibility`] and [`AlwaysFeasible`].
    pub fn new() -> Self {
        Self::with_predicates(CapacityEligibility, AlwaysFeasible)
    }
}

impl Default for IncrementalScheduleUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RotationEligibility, F: SwapFeasibility> IncrementalScheduleUpdater<E, F> {
    /// Creates an updater with custom predicates.
    pub fn with_predicates(eligibility: E, feasibility: F) -> Self {
        Self {
            eligibility,
            feasibility,
            update_count: 0,
            conflict_count: 0,
        }
    }

    /// Adds `person` on every open date of `range`.
    ///
    /// A date is open when the person has no assignment on it and it is
    /// not excluded. The first eligible rotation is taken; dates without
    /// one are skipped. Existing assignments are never touched.
    ///
    /// Returns the number of assignments appended.
    pub fn add_person(
        &mut self,
        schedule: &mut Schedule,
        person: &Person,
        range: &DateRange,
        constraints: &UpdateConstraints,
    ) -> usize {
        self.update_count += 1;
        let mut added = 0;

        for date in range.days() {
            if constraints.excluded_dates.contains(&date) || schedule.position(&person.id, date).is_some() {
                continue;
            }
            let eligible = self.eligibility.eligible_rotations(schedule, person, date, constraints);
            let Some(rotation_id) = eligible.into_iter().next() else {
                debug!(person_id = %person.id, %date, "no eligible rotation");
                continue;
            };
            schedule.push(Assignment {
                person_id: person.id.clone(),
                block_date: date,
                rotation_id,
                priority: person.priority,
            });
            added += 1;
        }

        debug!(person_id = %person.id, added, days = range.num_days(), "person added");
        added
    }

    /// Removes `person_id`'s assignments within `range`, or all of them.
    ///
    /// Returns the number removed.
    pub fn remove_person(&mut self, schedule: &mut Schedule, person_id: &str, range: Option<&DateRange>) -> usize {
        self.update_count += 1;
        let before = schedule.len();
        schedule
            .assignments
            .retain(|a| a.person_id != person_id || range.is_some_and(|r| !r.contains(a.block_date)));
        let removed = before - schedule.len();
        debug!(person_id, removed, "person removed");
        removed
    }

    /// Exchanges the rotations of two assignments.
    ///
    /// Missing assignments leave the schedule and counters untouched. A
    /// rejected exchange leaves the schedule untouched and counts a
    /// conflict. Only the rotation fields change.
    pub fn swap_assignments(
        &mut self,
        schedule: &mut Schedule,
        person1_id: &str,
        person2_id: &str,
        date1: NaiveDate,
        date2: NaiveDate,
        constraints: &UpdateConstraints,
    ) -> SwapOutcome {
        let (Some(i), Some(j)) = (schedule.position(person1_id, date1), schedule.position(person2_id, date2)) else {
            debug!(person1_id, person2_id, %date1, %date2, "swap target not found");
            return SwapOutcome::NotFound;
        };
        self.update_count += 1;

        let check = self
            .feasibility
            .check(schedule, &schedule.assignments[i], &schedule.assignments[j], constraints);
        if let Err(reason) = check {
            self.conflict_count += 1;
            debug!(person1_id, person2_id, %reason, "swap rejected");
            return SwapOutcome::Rejected { reason };
        }

        if i != j {
            let first = schedule.assignments[i].rotation_id.clone();
            let second = std::mem::replace(&mut schedule.assignments[j].rotation_id, first);
            schedule.assignments[i].rotation_id = second;
        }
        debug!(person1_id, person2_id, "swap applied");
        SwapOutcome::Swapped
    }

    /// Trims `rotation_id` to `new_capacity` people per date within `range`.
    ///
    /// On each over-full date the lowest-priority assignments go first;
    /// among equal priorities the most recently appended goes first. Each
    /// removal counts a conflict.
    ///
    /// Returns the removed assignments in removal order.
    pub fn update_rotation_capacity(
        &mut self,
        schedule: &mut Schedule,
        rotation_id: &str,
        new_capacity: usize,
        range: &DateRange,
    ) -> Vec<Assignment> {
        self.update_count += 1;

        let mut by_date: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
        for (idx, a) in schedule.assignments.iter().enumerate() {
            if a.rotation_id == rotation_id && range.contains(a.block_date) {
                by_date.entry(a.block_date).or_default().push(idx);
            }
        }

        let mut victims = Vec::new();
        for (_, mut indices) in by_date {
            if indices.len() <= new_capacity {
                continue;
            }
            let excess = indices.len() - new_capacity;
            indices.sort_by_key(|&idx| (schedule.assignments[idx].effective_priority(), std::cmp::Reverse(idx)));
            victims.extend_from_slice(&indices[..excess]);
        }

        let removed: Vec<Assignment> = victims.iter().map(|&idx| schedule.assignments[idx].clone()).collect();
        let doomed: HashSet<usize> = victims.into_iter().collect();
        let mut idx = 0;
        schedule.assignments.retain(|_| {
            let keep = !doomed.contains(&idx);
            idx += 1;
            keep
        });

        self.conflict_count += removed.len() as u64;
        debug!(rotation_id, new_capacity, removed = removed.len(), "rotation capacity updated");
        removed
    }

    /// Current counters.
    pub fn get_stats(&self) -> UpdateStats {
        let conflict_rate = if self.update_count == 0 {
            0.0
        } else {
            self.conflict_count as f64 / self.update_count as f64
        };
        UpdateStats {
            total_updates: self.update_count,
            conflicts: self.conflict_count,
            conflict_rate,
        }
    }

    /// Zeroes the counters.
    pub fn reset_stats(&mut self) {
        self.update_count = 0;
        self.conflict_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incremental::CapacityAwareSwap;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn sample() -> Schedule {
        let mut schedule = Schedule::new();
        schedule.push(Assignment::new("ann", day(1), "icu"));
        schedule.push(Assignment::new("bob", day(1), "ward"));
        schedule.push(Assignment::new("ann", day(2), "ward"));
        schedule.push(Assignment::new("bob", day(2), "icu"));
        schedule
    }

    #[test]
    fn test_add_person_fills_open_dates() {
        let mut schedule = Schedule::new();
        schedule.push(Assignment::new("cat", day(2), "clinic"));
        let constraints = UpdateConstraints::new()
            .with_rotation("icu", None)
            .exclude_date(day(3));

        let mut updater = IncrementalScheduleUpdater::new();
        let added = updater.add_person(&mut schedule, &Person::new("cat").with_priority(2), &DateRange::new(day(1), day(4)), &constraints);

        assert_eq!(added, 2);
        assert_eq!(schedule.find("cat", day(2)).unwrap().rotation_id, "clinic");
        assert_eq!(schedule.find("cat", day(1)).unwrap().rotation_id, "icu");
        assert_eq!(schedule.find("cat", day(4)).unwrap().priority, Some(2));
        assert!(schedule.find("cat", day(3)).is_none());
        assert_eq!(updater.get_stats().total_updates, 1);
    }

    #[test]
    fn test_add_person_respects_capacity() {
        let mut schedule = sample();
        let constraints = UpdateConstraints::new().with_rotation("icu", Some(1));
        let mut updater = IncrementalScheduleUpdater::new();
        let added = updater.add_person(&mut schedule, &Person::new("dan"), &DateRange::new(day(1), day(3)), &constraints);
        assert_eq!(added, 1);
        assert!(schedule.find("dan", day(3)).is_some());
    }

    #[test]
    fn test_remove_person_range_and_all() {
        let mut schedule = sample();
        let mut updater = IncrementalScheduleUpdater::new();

        let removed = updater.remove_person(&mut schedule, "ann", Some(&DateRange::single(day(2))));
        assert_eq!(removed, 1);
        assert!(schedule.find("ann", day(1)).is_some());

        let removed = updater.remove_person(&mut schedule, "bob", None);
        assert_eq!(removed, 2);
        assert_eq!(schedule.len(), 1);
        assert_eq!(updater.get_stats().total_updates, 2);
    }

    #[test]
    fn test_swap_missing_target_is_noop() {
        let mut schedule = sample();
        let original = schedule.clone();
        let mut updater = IncrementalScheduleUpdater::new();

        let outcome = updater.swap_assignments(&mut schedule, "ann", "zed", day(1), day(1), &UpdateConstraints::new());

        assert_eq!(outcome, SwapOutcome::NotFound);
        assert_eq!(schedule, original);
        assert_eq!(updater.get_stats().total_updates, 0);
        assert_eq!(updater.get_stats().conflicts, 0);
    }

    #[test]
    fn test_swap_exchanges_rotation_only() {
        let mut schedule = sample();
        let mut updater = IncrementalScheduleUpdater::new();

        let outcome = updater.swap_assignments(&mut schedule, "ann", "bob", day(1), day(2), &UpdateConstraints::new());

        assert_eq!(outcome, SwapOutcome::Swapped);
        let ann = schedule.find("ann", day(1)).unwrap();
        let bob = schedule.find("bob", day(2)).unwrap();
        assert_eq!((ann.rotation_id.as_str(), ann.block_date), ("icu", day(1)));
        assert_eq!((bob.rotation_id.as_str(), bob.block_date), ("icu", day(2)));

        updater.swap_assignments(&mut schedule, "ann", "bob", day(1), day(1), &UpdateConstraints::new());
        assert_eq!(schedule.find("ann", day(1)).unwrap().rotation_id, "ward");
        assert_eq!(schedule.find("bob", day(1)).unwrap().rotation_id, "icu");
        assert_eq!(updater.get_stats().total_updates, 2);
    }

    #[test]
    fn test_swap_rejected_counts_conflict() {
        let mut schedule = sample();
        let original = schedule.clone();
        let mut updater = IncrementalScheduleUpdater::with_predicates(CapacityEligibility, CapacityAwareSwap);
        let constraints = UpdateConstraints::new().with_allowed_rotations("ann", ["icu"]);

        let outcome = updater.swap_assignments(&mut schedule, "ann", "bob", day(1), day(1), &constraints);

        assert!(matches!(outcome, SwapOutcome::Rejected { .. }));
        assert_eq!(schedule, original);
        let stats = updater.get_stats();
        assert_eq!(stats.total_updates, 1);
        assert_eq!(stats.conflicts, 1);
        assert_eq!(stats.conflict_rate, 1.0);
    }

    #[test]
    fn test_capacity_removes_lowest_priority() {
        let mut schedule = Schedule::new();
        for (person, priority) in [("a", 5), ("b", 1), ("c", 4), ("d", 2), ("e", 3)] {
            schedule.push(Assignment::new(person, day(1), "icu").with_priority(priority));
        }
        schedule.push(Assignment::new("f", day(1), "ward"));
        let mut updater = IncrementalScheduleUpdater::new();

        let removed = updater.update_rotation_capacity(&mut schedule, "icu", 3, &DateRange::single(day(1)));

        let ids: Vec<&str> = removed.iter().map(|a| a.person_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d"]);
        assert_eq!(schedule.rotation_load("icu", day(1)), 3);
        assert_eq!(schedule.len(), 4);
        assert_eq!(updater.get_stats().conflicts, 2);
        assert_eq!(updater.get_stats().total_updates, 1);
    }

    #[test]
    fn test_capacity_ties_remove_most_recent() {
        let mut schedule = Schedule::new();
        for person in ["a", "b", "c", "d"] {
            schedule.push(Assignment::new(person, day(1), "icu"));
        }
        schedule.push(Assignment::new("z", day(1), "icu").with_priority(-1));
        let mut updater = IncrementalScheduleUpdater::new();

        let removed = updater.update_rotation_capacity(&mut schedule, "icu", 2, &DateRange::single(day(1)));

        let ids: Vec<&str> = removed.iter().map(|a| a.person_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "d", "c"]);
        let kept: Vec<&str> = schedule.assignments.iter().map(|a| a.person_id.as_str()).collect();
        assert_eq!(kept, vec!["a", "b"]);
    }

    #[test]
    fn test_capacity_per_date_and_range() {
        let mut schedule = Schedule::new();
        for d in 1..=3 {
            for person in ["a", "b", "c"] {
                schedule.push(Assignment::new(person, day(d), "icu"));
            }
        }
        let mut updater = IncrementalScheduleUpdater::new();

        let removed = updater.update_rotation_capacity(&mut schedule, "icu", 1, &DateRange::new(day(1), day(2)));

        assert_eq!(removed.len(), 4);
        assert_eq!(schedule.rotation_load("icu", day(1)), 1);
        assert_eq!(schedule.rotation_load("icu", day(2)), 1);
        assert_eq!(schedule.rotation_load("icu", day(3)), 3);
    }

    #[test]
    fn test_stats_reset() {
        let mut updater = IncrementalScheduleUpdater::new();
        assert_eq!(updater.get_stats().conflict_rate, 0.0);
        updater.remove_person(&mut Schedule::new(), "x", None);
        assert_eq!(updater.get_stats().total_updates, 1);
        updater.reset_stats();
        assert_eq!(updater.get_stats().total_updates, 0);
    }
}
