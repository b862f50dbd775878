//! Schedule records and edit constraints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Priority of an assignment without an explicit one.
pub const NEUTRAL_PRIORITY: i32 = 0;

/// One person on one rotation on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Person identifier.
    pub person_id: String,
    /// Date of the assignment.
    pub block_date: NaiveDate,
    /// Rotation identifier.
    pub rotation_id: String,
    /// Higher means more important to keep; `None` is neutral.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl Assignment {
    /// Creates an assignment with neutral priority.
    pub fn new(person_id: impl Into<String>, block_date: NaiveDate, rotation_id: impl Into<String>) -> Self {
        Self {
            person_id: person_id.into(),
            block_date,
            rotation_id: rotation_id.into(),
            priority: None,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Priority, with [`NEUTRAL_PRIORITY`] for unset.
    pub fn effective_priority(&self) -> i32 {
        self.priority.unwrap_or(NEUTRAL_PRIORITY)
    }
}

/// Ordered collection of assignments.
///
/// Order is insertion order; capacity trimming treats later entries as
/// more recent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// The assignments.
    pub assignments: Vec<Assignment>,
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assignments.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the schedule is empty.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Appends an assignment.
    pub fn push(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Index of `person_id`'s assignment on `date`.
    pub fn position(&self, person_id: &str, date: NaiveDate) -> Option<usize> {
        self.assignments
            .iter()
            .position(|a| a.person_id == person_id && a.block_date == date)
    }

    /// `person_id`'s assignment on `date`.
    pub fn find(&self, person_id: &str, date: NaiveDate) -> Option<&Assignment> {
        self.position(person_id, date).map(|i| &self.assignments[i])
    }

    /// Assignments of one person.
    pub fn for_person<'a>(&'a self, person_id: &'a str) -> impl Iterator<Item = &'a Assignment> + 'a {
        self.assignments.iter().filter(move |a| a.person_id == person_id)
    }

    /// Number of people on `rotation_id` on `date`.
    pub fn rotation_load(&self, rotation_id: &str, date: NaiveDate) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.rotation_id == rotation_id && a.block_date == date)
            .count()
    }
}

/// Inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date.
    pub start: NaiveDate,
    /// Last date.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range. Empty when `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single-day range.
    pub fn single(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Whether `date` lies in the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Number of dates in the range.
    pub fn num_days(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }
}

/// A person being added to a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Person {
    /// Person identifier.
    pub id: String,
    /// Rotations this person may work; empty means any.
    pub allowed_rotations: BTreeSet<String>,
    /// Priority given to the person's new assignments.
    pub priority: Option<i32>,
}

impl Person {
    /// A person allowed on any rotation.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Restricts the person to `rotations`.
    pub fn with_allowed_rotations<I, S>(mut self, rotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_rotations = rotations.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the priority of new assignments.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Whether the person may work `rotation_id`.
    pub fn allows(&self, rotation_id: &str) -> bool {
        self.allowed_rotations.is_empty() || self.allowed_rotations.contains(rotation_id)
    }
}

/// Constraints consulted while editing a schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateConstraints {
    /// Candidate rotations, in preference order.
    pub rotations: Vec<String>,
    /// Maximum people per rotation per date; absent means unlimited.
    pub capacities: HashMap<String, usize>,
    /// Per-person rotation restrictions, consulted by swaps.
    pub allowed_rotations: HashMap<String, BTreeSet<String>>,
    /// Dates on which nobody is added.
    pub excluded_dates: BTreeSet<NaiveDate>,
}

impl UpdateConstraints {
    /// Creates empty constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate rotation with an optional daily capacity.
    pub fn with_rotation(mut self, rotation_id: impl Into<String>, capacity: Option<usize>) -> Self {
        let rotation_id = rotation_id.into();
        if let Some(capacity) = capacity {
            self.capacities.insert(rotation_id.clone(), capacity);
        }
        self.rotations.push(rotation_id);
        self
    }

    /// Restricts `person_id` to `rotations` for swaps.
    pub fn with_allowed_rotations<I, S>(mut self, person_id: impl Into<String>, rotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_rotations
            .insert(person_id.into(), rotations.into_iter().map(Into::into).collect());
        self
    }

    /// Excludes a date from additions.
    pub fn exclude_date(mut self, date: NaiveDate) -> Self {
        self.excluded_dates.insert(date);
        self
    }

    /// Daily capacity of `rotation_id`, if bounded.
    pub fn capacity(&self, rotation_id: &str) -> Option<usize> {
        self.capacities.get(rotation_id).copied()
    }

    /// Whether `person_id` may work `rotation_id`.
    pub fn allows(&self, person_id: &str, rotation_id: &str) -> bool {
        self.allowed_rotations
            .get(person_id)
            .map_or(true, |allowed| allowed.contains(rotation_id))
    }
}
