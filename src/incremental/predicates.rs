//! Pluggable eligibility and swap-feasibility checks.

use super::types::{Assignment, Person, Schedule, UpdateConstraints};
use chrono::NaiveDate;

/// Decides which rotations a person may be added to on a date.
pub trait RotationEligibility {
    /// Eligible rotations, best candidate first.
    fn eligible_rotations(
        &self,
        schedule: &Schedule,
        person: &Person,
        date: NaiveDate,
        constraints: &UpdateConstraints,
    ) -> Vec<String>;
}

impl<F> RotationEligibility for F
where
    F: Fn(&Schedule, &Person, NaiveDate, &UpdateConstraints) -> Vec<String>,
{
    fn eligible_rotations(
        &self,
        schedule: &Schedule,
        person: &Person,
        date: NaiveDate,
        constraints: &UpdateConstraints,
    ) -> Vec<String> {
        self(schedule, person, date, constraints)
    }
}

/// Rotations from the constraints that the person may work and that still
/// have room on the date, least loaded first.
///
/// Ties keep the order of [`UpdateConstraints::rotations`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityEligibility;

impl RotationEligibility for CapacityEligibility {
    fn eligible_rotations(
        &self,
        schedule: &Schedule,
        person: &Person,
        date: NaiveDate,
        constraints: &UpdateConstraints,
    ) -> Vec<String> {
        let mut candidates: Vec<(usize, &String)> = constraints
            .rotations
            .iter()
            .filter(|r| person.allows(r) && constraints.allows(&person.id, r))
            .map(|r| (schedule.rotation_load(r, date), r))
            .filter(|(load, r)| constraints.capacity(r).map_or(true, |cap| *load < cap))
            .collect();
        candidates.sort_by_key(|(load, _)| *load);
        candidates.into_iter().map(|(_, r)| r.clone()).collect()
    }
}

/// Decides whether two assignments may exchange rotations.
pub trait SwapFeasibility {
    /// `Err(reason)` when the exchange would violate a constraint.
    fn check(
        &self,
        schedule: &Schedule,
        first: &Assignment,
        second: &Assignment,
        constraints: &UpdateConstraints,
    ) -> Result<(), String>;
}

/// Accepts every swap.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFeasible;

impl SwapFeasibility for AlwaysFeasible {
    fn check(&self, _: &Schedule, _: &Assignment, _: &Assignment, _: &UpdateConstraints) -> Result<(), String> {
        Ok(())
    }
}

/// Rejects swaps that put someone on a rotation they may not work, or
/// that push a rotation over its daily capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityAwareSwap;

impl SwapFeasibility for CapacityAwareSwap {
    fn check(
        &self,
        schedule: &Schedule,
        first: &Assignment,
        second: &Assignment,
        constraints: &UpdateConstraints,
    ) -> Result<(), String> {
        if !constraints.allows(&first.person_id, &second.rotation_id) {
            return Err(format!("{} may not work {}", first.person_id, second.rotation_id));
        }
        if !constraints.allows(&second.person_id, &first.rotation_id) {
            return Err(format!("{} may not work {}", second.person_id, first.rotation_id));
        }

        // Same-date or same-rotation swaps leave every daily load unchanged.
        if first.block_date == second.block_date || first.rotation_id == second.rotation_id {
            return Ok(());
        }
        for (rotation, date) in [
            (&second.rotation_id, first.block_date),
            (&first.rotation_id, second.block_date),
        ] {
            if let Some(cap) = constraints.capacity(rotation) {
                if schedule.rotation_load(rotation, date) + 1 > cap {
                    return Err(format!("{rotation} is full on {date}"));
                }
            }
        }
        Ok(())
    }
}
