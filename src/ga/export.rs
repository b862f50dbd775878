//! Serializable snapshots of Pareto fronts and generation history.
//!
//! Everything here is plain numbers and arrays. The infinite crowding
//! distance of boundary solutions is exported as `None`; a non-finite
//! objective score is written as a string so it reads back unchanged.

use super::fitness::{FitnessVector, NUM_OBJECTIVES, OBJECTIVE_NAMES};
use super::stats::PopulationStats;
use super::types::Individual;
use serde::{Deserialize, Serialize};

/// One Pareto-front member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontMember {
    /// Individual id.
    pub id: u64,
    /// Generation the individual was created in.
    pub generation: usize,
    /// Scores in [`OBJECTIVE_NAMES`] order.
    #[serde(with = "crate::serde_float::array")]
    pub objectives: [f64; NUM_OBJECTIVES],
    /// Crowding distance; `None` for boundary (infinite) members.
    pub crowding_distance: Option<f64>,
    /// Row-major rotation grid.
    pub assignments: Vec<Vec<u32>>,
}

/// Export of a Pareto front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoFrontExport {
    /// Objective names, fixing the column order of `objectives`.
    pub objective_names: Vec<String>,
    /// Front members.
    pub members: Vec<FrontMember>,
}

impl ParetoFrontExport {
    /// Builds an export from front members.
    pub fn from_front<'a, I>(front: I) -> Self
    where
        I: IntoIterator<Item = &'a Individual>,
    {
        let members = front
            .into_iter()
            .map(|ind| FrontMember {
                id: ind.id,
                generation: ind.generation,
                objectives: ind.fitness.to_array(),
                crowding_distance: finite(ind.crowding_distance),
                assignments: (0..ind.chromosome.n_residents())
                    .filter_map(|r| ind.chromosome.row(r).ok().map(<[u32]>::to_vec))
                    .collect(),
            })
            .collect();

        Self {
            objective_names: OBJECTIVE_NAMES.iter().map(|s| s.to_string()).collect(),
            members,
        }
    }

    /// Fitness vectors of the members.
    pub fn fitness(&self) -> Vec<FitnessVector> {
        self.members.iter().map(|m| FitnessVector::from(m.objectives)).collect()
    }

    /// Encodes as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Export of a run's per-generation snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationHistoryExport {
    /// Snapshots in generation order.
    pub generations: Vec<PopulationStats>,
}

impl GenerationHistoryExport {
    /// Builds an export, replacing non-finite statistics with `0.0`.
    pub fn new(history: &[PopulationStats]) -> Self {
        let generations = history
            .iter()
            .map(|s| PopulationStats {
                best_fitness: finite(s.best_fitness).unwrap_or(0.0),
                worst_fitness: finite(s.worst_fitness).unwrap_or(0.0),
                mean_fitness: finite(s.mean_fitness).unwrap_or(0.0),
                std_fitness: finite(s.std_fitness).unwrap_or(0.0),
                convergence: finite(s.convergence).unwrap_or(0.0),
                ..s.clone()
            })
            .collect();
        Self { generations }
    }

    /// Encodes as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::Chromosome;

    fn member(id: u64, crowding: f64) -> Individual {
        let mut ind = Individual::new(Chromosome::from_rows(&[vec![1, 0], vec![2, 2]], 2).unwrap(), 3, id);
        ind.fitness = FitnessVector::new(0.1, 0.2, 0.3, 0.4, 0.5, 0.6);
        ind.rank = 0;
        ind.crowding_distance = crowding;
        ind
    }

    #[test]
    fn test_front_export_json_round_trip() {
        let front = vec![member(1, f64::INFINITY), member(2, 0.25)];
        let export = ParetoFrontExport::from_front(&front);
        let json = export.to_json().unwrap();
        assert!(!json.contains("inf"));
        let back: ParetoFrontExport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, export);
        assert_eq!(back.members[0].crowding_distance, None);
        assert_eq!(back.members[1].crowding_distance, Some(0.25));
        assert_eq!(back.members[0].assignments, vec![vec![1, 0], vec![2, 2]]);
        assert_eq!(back.fitness()[0], front[0].fitness);
    }

    #[test]
    fn test_front_export_keeps_non_finite_objectives() {
        let mut ind = member(7, 0.5);
        ind.fitness.coverage = f64::NEG_INFINITY;
        ind.fitness.continuity = f64::NAN;
        let json = ParetoFrontExport::from_front([&ind]).to_json().unwrap();
        assert!(!json.contains("null"));

        let back: ParetoFrontExport = serde_json::from_str(&json).unwrap();
        let fitness = back.fitness()[0];
        assert_eq!(fitness.coverage, f64::NEG_INFINITY);
        assert!(fitness.continuity.is_nan());
        assert_eq!(fitness.fairness, 0.2);
    }

    #[test]
    fn test_objective_names_order() {
        let export = ParetoFrontExport::from_front(&[]);
        assert_eq!(export.objective_names.len(), NUM_OBJECTIVES);
        assert_eq!(export.objective_names[4], "acgme_compliance");
    }

    #[test]
    fn test_history_export_is_precise() {
        let pop = vec![member(1, 1.0)];
        let stats = PopulationStats::from_population(&pop, 0, None);
        let export = GenerationHistoryExport::new(&[stats.clone()]);
        let json = export.to_json().unwrap();
        let back: GenerationHistoryExport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.generations[0].mean_fitness, stats.mean_fitness);
        assert_eq!(back.generations[0].hypervolume, stats.hypervolume);
    }
}
