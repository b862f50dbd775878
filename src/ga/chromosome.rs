//! Dense rotation-assignment grid.
//!
//! A [`Chromosome`] encodes one candidate roster as a `[residents][blocks]`
//! grid of rotation ids. Rotation id `0` means "unassigned"; ids
//! `1..=n_templates` refer to rotation templates.

use crate::error::RepresentationError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Rotation template id stored in a chromosome cell. `0` is unassigned.
pub type RotationId = u32;

/// Marker value for an unassigned cell.
pub const UNASSIGNED: RotationId = 0;

/// Fixed-shape assignment grid for one candidate schedule.
///
/// Cells are stored row-major (`resident * n_blocks + block`). The shape is
/// fixed at construction; `Clone` is a deep copy, so mutating a clone never
/// affects the original. Deserialization checks the same shape and
/// rotation-id rules as the constructors.
///
/// # Examples
///
/// ```
/// use u_roster::ga::Chromosome;
///
/// let a = Chromosome::create_random(4, 13, 6, 0.8, 42).unwrap();
/// let b = Chromosome::create_random(4, 13, 6, 0.8, 42).unwrap();
/// assert_eq!(a, b);
/// assert!((a.similarity(&b).unwrap() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawChromosome")]
pub struct Chromosome {
    n_residents: usize,
    n_blocks: usize,
    n_templates: u32,
    genes: Vec<RotationId>,
}

#[derive(Deserialize)]
struct RawChromosome {
    n_residents: usize,
    n_blocks: usize,
    n_templates: u32,
    genes: Vec<RotationId>,
}

impl TryFrom<RawChromosome> for Chromosome {
    type Error = RepresentationError;

    fn try_from(raw: RawChromosome) -> Result<Self, Self::Error> {
        let expected = raw.n_residents.checked_mul(raw.n_blocks);
        if expected != Some(raw.genes.len()) {
            return Err(RepresentationError::CellCount {
                expected: expected.unwrap_or(usize::MAX),
                actual: raw.genes.len(),
            });
        }
        if let Some(&value) = raw.genes.iter().find(|&&g| g > raw.n_templates) {
            return Err(RepresentationError::InvalidRotation {
                value,
                max: raw.n_templates,
            });
        }
        Ok(Self {
            n_residents: raw.n_residents,
            n_blocks: raw.n_blocks,
            n_templates: raw.n_templates,
            genes: raw.genes,
        })
    }
}

impl Chromosome {
    /// Creates an empty (fully unassigned) chromosome.
    pub fn new(n_residents: usize, n_blocks: usize, n_templates: u32) -> Self {
        Self {
            n_residents,
            n_blocks,
            n_templates,
            genes: vec![UNASSIGNED; n_residents * n_blocks],
        }
    }

    /// Creates a random chromosome.
    ///
    /// Each cell is independently filled with a rotation id drawn uniformly
    /// from `1..=n_templates` with probability `density`, otherwise left
    /// unassigned. The result depends only on the arguments: the same
    /// `seed` always yields the same grid.
    ///
    /// With `n_templates == 0` every cell stays unassigned.
    pub fn create_random(
        n_residents: usize,
        n_blocks: usize,
        n_templates: u32,
        density: f64,
        seed: u64,
    ) -> Result<Self, RepresentationError> {
        if !(0.0..=1.0).contains(&density) {
            return Err(RepresentationError::InvalidDensity(density));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut chromosome = Self::new(n_residents, n_blocks, n_templates);
        if n_templates == 0 {
            return Ok(chromosome);
        }

        for gene in chromosome.genes.iter_mut() {
            if rng.random_bool(density) {
                *gene = rng.random_range(1..=n_templates);
            }
        }
        Ok(chromosome)
    }

    /// Builds a chromosome from explicit rows.
    ///
    /// All rows must have the same length and every value must be a valid
    /// rotation id for `n_templates`.
    pub fn from_rows(rows: &[Vec<RotationId>], n_templates: u32) -> Result<Self, RepresentationError> {
        let n_residents = rows.len();
        let n_blocks = rows.first().map_or(0, Vec::len);
        let mut chromosome = Self::new(n_residents, n_blocks, n_templates);

        for (r, row) in rows.iter().enumerate() {
            if row.len() != n_blocks {
                return Err(RepresentationError::ShapeMismatch {
                    left: (n_residents, n_blocks),
                    right: (n_residents, row.len()),
                });
            }
            for (b, &value) in row.iter().enumerate() {
                chromosome.set_assignment(r, b, value)?;
            }
        }
        Ok(chromosome)
    }

    /// Number of resident rows.
    pub fn n_residents(&self) -> usize {
        self.n_residents
    }

    /// Number of block columns.
    pub fn n_blocks(&self) -> usize {
        self.n_blocks
    }

    /// Number of rotation templates (largest valid rotation id).
    pub fn n_templates(&self) -> u32 {
        self.n_templates
    }

    /// Grid shape as `(residents, blocks)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_residents, self.n_blocks)
    }

    /// Total number of cells.
    pub fn total_cells(&self) -> usize {
        self.genes.len()
    }

    /// Raw row-major cell values.
    pub fn genes(&self) -> &[RotationId] {
        &self.genes
    }

    /// One resident's row.
    pub fn row(&self, resident: usize) -> Result<&[RotationId], RepresentationError> {
        if resident >= self.n_residents {
            return Err(RepresentationError::ResidentOutOfBounds {
                resident,
                rows: self.n_residents,
            });
        }
        let start = resident * self.n_blocks;
        Ok(&self.genes[start..start + self.n_blocks])
    }

    fn index(&self, resident: usize, block: usize) -> Result<usize, RepresentationError> {
        if resident >= self.n_residents || block >= self.n_blocks {
            return Err(RepresentationError::OutOfBounds {
                resident,
                block,
                rows: self.n_residents,
                cols: self.n_blocks,
            });
        }
        Ok(resident * self.n_blocks + block)
    }

    /// Returns the rotation id assigned to `resident` in `block`.
    pub fn get_assignment(&self, resident: usize, block: usize) -> Result<RotationId, RepresentationError> {
        let idx = self.index(resident, block)?;
        Ok(self.genes[idx])
    }

    /// Assigns `rotation` to `resident` in `block`.
    ///
    /// `rotation` must be [`UNASSIGNED`] or in `1..=n_templates`.
    pub fn set_assignment(
        &mut self,
        resident: usize,
        block: usize,
        rotation: RotationId,
    ) -> Result<(), RepresentationError> {
        if rotation > self.n_templates {
            return Err(RepresentationError::InvalidRotation {
                value: rotation,
                max: self.n_templates,
            });
        }
        let idx = self.index(resident, block)?;
        self.genes[idx] = rotation;
        Ok(())
    }

    /// Number of assigned (nonzero) cells.
    pub fn count_assignments(&self) -> usize {
        self.genes.iter().filter(|&&g| g != UNASSIGNED).count()
    }

    /// Number of assigned cells in one resident's row.
    pub fn count_resident_assignments(&self, resident: usize) -> Result<usize, RepresentationError> {
        Ok(self.row(resident)?.iter().filter(|&&g| g != UNASSIGNED).count())
    }

    /// Number of residents assigned to `rotation` in `block`.
    pub fn count_block_rotation(&self, block: usize, rotation: RotationId) -> Result<usize, RepresentationError> {
        if block >= self.n_blocks {
            return Err(RepresentationError::OutOfBounds {
                resident: 0,
                block,
                rows: self.n_residents,
                cols: self.n_blocks,
            });
        }
        Ok((0..self.n_residents)
            .filter(|&r| self.genes[r * self.n_blocks + block] == rotation)
            .count())
    }

    fn check_shape(&self, other: &Self) -> Result<(), RepresentationError> {
        if self.shape() != other.shape() {
            return Err(RepresentationError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    /// Number of cells whose rotation differs between `self` and `other`.
    ///
    /// Fails with [`RepresentationError::ShapeMismatch`] when shapes differ;
    /// never truncates or pads.
    pub fn hamming_distance(&self, other: &Self) -> Result<usize, RepresentationError> {
        self.check_shape(other)?;
        Ok(self
            .genes
            .iter()
            .zip(other.genes.iter())
            .filter(|(a, b)| a != b)
            .count())
    }

    /// `1 - hamming_distance / total_cells`, in `[0, 1]`.
    ///
    /// Two zero-cell chromosomes are considered identical (`1.0`).
    pub fn similarity(&self, other: &Self) -> Result<f64, RepresentationError> {
        let distance = self.hamming_distance(other)?;
        let total = self.total_cells();
        if total == 0 {
            return Ok(1.0);
        }
        Ok(1.0 - distance as f64 / total as f64)
    }

    pub(crate) fn genes_mut(&mut self) -> &mut [RotationId] {
        &mut self.genes
    }
}
