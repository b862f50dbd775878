//! Genetic operators for rotation-grid chromosomes.
//!
//! Crossover operators require equal-shaped parents and return
//! [`RepresentationError::ShapeMismatch`] otherwise. Mutation operators
//! edit a chromosome in place and keep every cell a valid rotation id.
//!
//! # Crossover Operators
//!
//! - [`uniform_crossover`]: each cell taken from either parent with p = 0.5
//! - [`resident_crossover`]: whole resident rows exchanged (keeps each
//!   resident's rotation sequence intact)
//! - [`block_crossover`]: single cut point over block columns (keeps each
//!   block's staffing pattern intact)
//!
//! # Mutation Operators
//!
//! - [`reset_mutation`]: re-draw random cells
//! - [`swap_mutation`]: exchange two blocks within one resident's row
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"

use super::chromosome::{Chromosome, UNASSIGNED};
use crate::error::RepresentationError;
use rand::Rng;

fn check_parents(a: &Chromosome, b: &Chromosome) -> Result<(), RepresentationError> {
    if a.shape() != b.shape() {
        return Err(RepresentationError::ShapeMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }
    Ok(())
}

// ============================================================================
// Crossover operators
// ============================================================================

/// Uniform crossover: each cell independently swapped between children.
///
/// # Complexity
/// O(cells)
pub fn uniform_crossover<R: Rng>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    rng: &mut R,
) -> Result<(Chromosome, Chromosome), RepresentationError> {
    check_parents(parent1, parent2)?;

    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();
    for (g1, g2) in child1.genes_mut().iter_mut().zip(child2.genes_mut().iter_mut()) {
        if rng.random_bool(0.5) {
            std::mem::swap(g1, g2);
        }
    }
    Ok((child1, child2))
}

/// Resident-row crossover: each resident's row comes wholly from one parent.
pub fn resident_crossover<R: Rng>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    rng: &mut R,
) -> Result<(Chromosome, Chromosome), RepresentationError> {
    check_parents(parent1, parent2)?;

    let cols = parent1.n_blocks();
    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();
    if cols == 0 {
        return Ok((child1, child2));
    }

    let rows1 = child1.genes_mut().chunks_mut(cols);
    let rows2 = child2.genes_mut().chunks_mut(cols);
    for (r1, r2) in rows1.zip(rows2) {
        if rng.random_bool(0.5) {
            r1.swap_with_slice(r2);
        }
    }
    Ok((child1, child2))
}

/// Single-point crossover over block columns.
///
/// Blocks `[cut, n_blocks)` are exchanged for every resident.
pub fn block_crossover<R: Rng>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    rng: &mut R,
) -> Result<(Chromosome, Chromosome), RepresentationError> {
    check_parents(parent1, parent2)?;

    let cols = parent1.n_blocks();
    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();
    if cols < 2 {
        return Ok((child1, child2));
    }

    let cut = rng.random_range(1..cols);
    let rows1 = child1.genes_mut().chunks_mut(cols);
    let rows2 = child2.genes_mut().chunks_mut(cols);
    for (r1, r2) in rows1.zip(rows2) {
        r1[cut..].swap_with_slice(&mut r2[cut..]);
    }
    Ok((child1, child2))
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Re-draws each cell with probability `rate`.
///
/// A re-drawn cell becomes a uniformly random id in `0..=n_templates`
/// (unassigned included). Returns the number of cells changed.
pub fn reset_mutation<R: Rng>(chromosome: &mut Chromosome, rate: f64, rng: &mut R) -> usize {
    let max = chromosome.n_templates();
    let rate = rate.clamp(0.0, 1.0);
    let mut changed = 0;
    for gene in chromosome.genes_mut().iter_mut() {
        if rng.random_bool(rate) {
            let value = rng.random_range(UNASSIGNED..=max);
            if value != *gene {
                *gene = value;
                changed += 1;
            }
        }
    }
    changed
}

/// Exchanges two random blocks within one random resident's row.
///
/// No-op for grids with fewer than two blocks or no residents.
pub fn swap_mutation<R: Rng>(chromosome: &mut Chromosome, rng: &mut R) {
    let (rows, cols) = chromosome.shape();
    if rows == 0 || cols < 2 {
        return;
    }
    let r = rng.random_range(0..rows);
    let a = rng.random_range(0..cols);
    let b = rng.random_range(0..cols);
    chromosome.genes_mut().swap(r * cols + a, r * cols + b);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parents() -> (Chromosome, Chromosome) {
        let a = Chromosome::from_rows(&[vec![1, 1, 1, 1], vec![1, 1, 1, 1]], 2).unwrap();
        let b = Chromosome::from_rows(&[vec![2, 2, 2, 2], vec![2, 2, 2, 2]], 2).unwrap();
        (a, b)
    }

    #[test]
    fn test_uniform_preserves_cell_multiset() {
        let (a, b) = parents();
        let mut rng = StdRng::seed_from_u64(1);
        let (c1, c2) = uniform_crossover(&a, &b, &mut rng).unwrap();
        for i in 0..c1.total_cells() {
            let mut pair = [c1.genes()[i], c2.genes()[i]];
            pair.sort();
            assert_eq!(pair, [1, 2]);
        }
    }

    #[test]
    fn test_resident_crossover_keeps_rows_whole() {
        let (a, b) = parents();
        let mut rng = StdRng::seed_from_u64(3);
        let (c1, _) = resident_crossover(&a, &b, &mut rng).unwrap();
        for r in 0..c1.n_residents() {
            let row = c1.row(r).unwrap();
            assert!(row.iter().all(|&g| g == row[0]));
        }
    }

    #[test]
    fn test_block_crossover_single_cut() {
        let (a, b) = parents();
        let mut rng = StdRng::seed_from_u64(7);
        let (c1, c2) = block_crossover(&a, &b, &mut rng).unwrap();
        let row = c1.row(0).unwrap();
        assert_eq!(row[0], 1);
        assert_eq!(row[3], 2);
        assert_eq!(c2.row(1).unwrap()[0], 2);
    }

    #[test]
    fn test_crossover_shape_mismatch() {
        let a = Chromosome::new(2, 3, 1);
        let b = Chromosome::new(2, 4, 1);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(uniform_crossover(&a, &b, &mut rng).is_err());
        assert!(resident_crossover(&a, &b, &mut rng).is_err());
        assert!(block_crossover(&a, &b, &mut rng).is_err());
    }

    #[test]
    fn test_crossover_does_not_touch_parents() {
        let (a, b) = parents();
        let (a0, b0) = (a.clone(), b.clone());
        let mut rng = StdRng::seed_from_u64(5);
        let _ = uniform_crossover(&a, &b, &mut rng).unwrap();
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn test_reset_mutation_keeps_valid_ids() {
        let mut c = Chromosome::create_random(6, 8, 3, 0.5, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        reset_mutation(&mut c, 1.0, &mut rng);
        assert!(c.genes().iter().all(|&g| g <= 3));
    }

    #[test]
    fn test_reset_mutation_zero_rate() {
        let mut c = Chromosome::create_random(6, 8, 3, 0.5, 4).unwrap();
        let before = c.clone();
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(reset_mutation(&mut c, 0.0, &mut rng), 0);
        assert_eq!(c, before);
    }

    #[test]
    fn test_swap_mutation_preserves_counts() {
        let mut c = Chromosome::create_random(4, 10, 5, 0.7, 8).unwrap();
        let before: Vec<usize> = (0..4).map(|r| c.count_resident_assignments(r).unwrap()).collect();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..20 {
            swap_mutation(&mut c, &mut rng);
        }
        let after: Vec<usize> = (0..4).map(|r| c.count_resident_assignments(r).unwrap()).collect();
        assert_eq!(before, after);
    }
}
