use nalgebra::{DVector, Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("A coordinate set requires at least one point")]
    Empty,
    #[error("Flat coordinate buffer length {len} is not a multiple of 3")]
    RaggedBuffer { len: usize },
    #[error("Displacement has {found} components but the set has {expected} degrees of freedom")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Coordinate sets differ in size ({left} vs {right} points)")]
    SizeMismatch { left: usize, right: usize },
}

/// An ordered set of three-dimensional points, one per network node.
///
/// A `CoordinateSet` is never modified in place once built. Deformations along
/// a normal mode are expressed through [`CoordinateSet::displaced`], which
/// returns a new set and leaves the original untouched, so a baseline can be
/// shared freely between independent evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSet {
    points: Vec<Point3<f64>>,
}

impl CoordinateSet {
    /// Creates a coordinate set from a list of points.
    ///
    /// # Arguments
    ///
    /// * `points` - The positions, in the node order used by every matrix built from this set.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError::Empty`] if `points` is empty.
    pub fn new(points: Vec<Point3<f64>>) -> Result<Self, CoordinateError> {
        if points.is_empty() {
            return Err(CoordinateError::Empty);
        }
        Ok(Self { points })
    }

    /// Creates a coordinate set from a flat `x0, y0, z0, x1, ...` buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty or its length is not a multiple of 3.
    pub fn from_flat(values: &[f64]) -> Result<Self, CoordinateError> {
        if values.len() % 3 != 0 {
            return Err(CoordinateError::RaggedBuffer { len: values.len() });
        }
        let points = values
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of Cartesian degrees of freedom (`3 * len`).
    pub fn dof(&self) -> usize {
        self.points.len() * 3
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&Point3<f64>> {
        self.points.get(index)
    }

    /// Returns the coordinates flattened into a vector of length `3 * len`.
    pub fn to_flat(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.dof(),
            self.points.iter().flat_map(|p| [p.x, p.y, p.z]),
        )
    }

    /// Returns a new set moved by `coefficient * direction`.
    ///
    /// `direction` is a flat Cartesian vector of length `3 * len`, typically a
    /// normal-mode eigenvector. The receiver is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError::DimensionMismatch`] if `direction` does not
    /// have one component per degree of freedom.
    pub fn displaced(
        &self,
        direction: &DVector<f64>,
        coefficient: f64,
    ) -> Result<Self, CoordinateError> {
        if direction.len() != self.dof() {
            return Err(CoordinateError::DimensionMismatch {
                expected: self.dof(),
                found: direction.len(),
            });
        }
        let points = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let offset = Vector3::new(
                    direction[3 * i],
                    direction[3 * i + 1],
                    direction[3 * i + 2],
                );
                p + offset * coefficient
            })
            .collect();
        Ok(Self { points })
    }

    /// Root-mean-square deviation to another set of the same size, without superposition.
    pub fn rmsd(&self, other: &CoordinateSet) -> Result<f64, CoordinateError> {
        if self.len() != other.len() {
            return Err(CoordinateError::SizeMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        let sum: f64 = self
            .points
            .iter()
            .zip(&other.points)
            .map(|(a, b)| nalgebra::distance_squared(a, b))
            .sum();
        Ok((sum / self.len() as f64).sqrt())
    }
}

impl TryFrom<Vec<[f64; 3]>> for CoordinateSet {
    type Error = CoordinateError;

    fn try_from(rows: Vec<[f64; 3]>) -> Result<Self, Self::Error> {
        Self::new(
            rows.into_iter()
                .map(|[x, y, z]| Point3::new(x, y, z))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_of_three() -> CoordinateSet {
        CoordinateSet::try_from(vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [8.0, 0.0, 0.0]]).unwrap()
    }

    #[test]
    fn new_rejects_empty_point_list() {
        assert_eq!(CoordinateSet::new(Vec::new()), Err(CoordinateError::Empty));
    }

    #[test]
    fn from_flat_rejects_ragged_buffer() {
        let result = CoordinateSet::from_flat(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(result, Err(CoordinateError::RaggedBuffer { len: 4 }));
    }

    #[test]
    fn flat_buffer_preserves_point_order() {
        let coords = line_of_three();
        let flat = coords.to_flat();
        assert_eq!(flat.len(), 9);
        assert_eq!(flat[3], 4.0);
        assert_eq!(flat[6], 8.0);

        let rebuilt = CoordinateSet::from_flat(flat.as_slice()).unwrap();
        assert_eq!(rebuilt, coords);
    }

    #[test]
    fn displaced_returns_new_set_and_leaves_original_untouched() {
        let coords = line_of_three();
        let mut direction = DVector::zeros(9);
        direction[1] = 1.0;
        direction[8] = -2.0;

        let moved = coords.displaced(&direction, 0.5).unwrap();

        assert_eq!(moved.points()[0], Point3::new(0.0, 0.5, 0.0));
        assert_eq!(moved.points()[2], Point3::new(8.0, 0.0, -1.0));
        assert_eq!(coords.points()[0], Point3::origin());
    }

    #[test]
    fn displaced_rejects_wrong_dimension() {
        let coords = line_of_three();
        let result = coords.displaced(&DVector::zeros(6), 1.0);
        assert_eq!(
            result,
            Err(CoordinateError::DimensionMismatch {
                expected: 9,
                found: 6
            })
        );
    }

    #[test]
    fn rmsd_of_uniform_shift_equals_shift_length() {
        let coords = line_of_three();
        let mut direction = DVector::zeros(9);
        for i in 0..3 {
            direction[3 * i + 2] = 1.0;
        }
        let moved = coords.displaced(&direction, 2.0).unwrap();
        assert!((coords.rmsd(&moved).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rmsd_rejects_sets_of_different_size() {
        let a = line_of_three();
        let b = CoordinateSet::try_from(vec![[0.0, 0.0, 0.0]]).unwrap();
        assert!(matches!(
            a.rmsd(&b),
            Err(CoordinateError::SizeMismatch { left: 3, right: 1 })
        ));
    }

    #[test]
    fn rmsd_to_itself_is_zero() {
        let coords = line_of_three();
        assert_eq!(coords.rmsd(&coords.clone()).unwrap(), 0.0);
    }
}
