use super::mode::{Mode, ModeSet};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

/// Eigenvalues at or below this fraction of the dominant eigenvalue are treated as zero modes.
pub const ZERO_EIGENVALUE_TOLERANCE: f64 = 1e-6;

/// Rigid-body modes of an unconstrained three-dimensional network (3 translations, 3 rotations).
pub const EXPECTED_ZERO_MODES: usize = 6;

const STANDARD_EPSILON: f64 = 1e2 * f64::EPSILON;
const HIGH_PRECISION_EPSILON: f64 = f64::EPSILON;
const SYMMETRY_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Error, PartialEq)]
pub enum ModeError {
    #[error("Number of modes must be a positive integer")]
    NonPositiveModeCount,
    #[error("Hessian must be a square matrix (found {rows}x{cols})")]
    NotSquare { rows: usize, cols: usize },
    #[error("Hessian dimension {dim} is not a positive multiple of 3")]
    InvalidDimension { dim: usize },
    #[error("Hessian is not symmetric (max asymmetry {asymmetry:e})")]
    NotSymmetric { asymmetry: f64 },
    #[error("Eigendecomposition did not converge")]
    Decomposition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeCount {
    All,
    Count(usize),
}

impl Default for ModeCount {
    fn default() -> Self {
        ModeCount::Count(20)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolverOptions {
    pub num_modes: ModeCount,
    pub include_zeros: bool,
    pub high_precision: bool,
}

pub fn validate_hessian(hessian: &DMatrix<f64>) -> Result<(), ModeError> {
    let (rows, cols) = hessian.shape();
    if rows != cols {
        return Err(ModeError::NotSquare { rows, cols });
    }
    if rows == 0 || rows % 3 != 0 {
        return Err(ModeError::InvalidDimension { dim: rows });
    }
    let scale = hessian.abs().max().max(1.0);
    let asymmetry = (hessian - hessian.transpose()).abs().max();
    if !(asymmetry <= SYMMETRY_TOLERANCE * scale) {
        return Err(ModeError::NotSymmetric { asymmetry });
    }
    Ok(())
}

/// Diagonalizes a Hessian into normal modes sorted by ascending eigenvalue.
///
/// Eigenvalues within [`ZERO_EIGENVALUE_TOLERANCE`] of zero (relative to the
/// dominant eigenvalue) are rigid-body modes. They are dropped unless
/// `include_zeros` is set, in which case they lead the set without a variance.
/// `num_modes` counts internal modes only; when fewer exist the smaller set is
/// returned and [`ModeSet::shortfall`] reports the difference.
pub fn solve(hessian: &DMatrix<f64>, options: &SolverOptions) -> Result<ModeSet, ModeError> {
    let requested = match options.num_modes {
        ModeCount::Count(0) => return Err(ModeError::NonPositiveModeCount),
        ModeCount::Count(n) => Some(n),
        ModeCount::All => None,
    };
    validate_hessian(hessian)?;

    let dof = hessian.nrows();
    let started = Instant::now();
    let epsilon = if options.high_precision {
        HIGH_PRECISION_EPSILON
    } else {
        STANDARD_EPSILON
    };
    let eigen =
        SymmetricEigen::try_new(hessian.clone(), epsilon, 0).ok_or(ModeError::Decomposition)?;

    let mut order: Vec<usize> = (0..dof).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let dominant = eigen.eigenvalues.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let threshold = ZERO_EIGENVALUE_TOLERANCE * dominant;
    let zeros_detected = order
        .iter()
        .take_while(|&&k| eigen.eigenvalues[k] <= threshold)
        .count();

    if zeros_detected < EXPECTED_ZERO_MODES {
        warn!(
            found = zeros_detected,
            expected = EXPECTED_ZERO_MODES,
            "Less than {} zero eigenvalues are calculated.",
            EXPECTED_ZERO_MODES
        );
    } else if zeros_detected > EXPECTED_ZERO_MODES {
        warn!(
            found = zeros_detected,
            expected = EXPECTED_ZERO_MODES,
            "More than {} zero eigenvalues are calculated.",
            EXPECTED_ZERO_MODES
        );
    }

    let mut modes = Vec::new();
    if options.include_zeros {
        for &k in &order[..zeros_detected] {
            modes.push(Mode::zero(
                eigen.eigenvalues[k],
                canonical_vector(eigen.eigenvectors.column(k).into_owned()),
            ));
        }
    }
    let available = dof - zeros_detected;
    let take = requested.map_or(available, |n| n.min(available));
    for &k in order[zeros_detected..].iter().take(take) {
        modes.push(Mode::nonzero(
            eigen.eigenvalues[k],
            canonical_vector(eigen.eigenvectors.column(k).into_owned()),
        ));
    }

    if let Some(n) = requested {
        if n > available {
            warn!(
                requested = n,
                available, "Fewer non-zero modes are available than were requested."
            );
        }
    }
    info!(
        modes = modes.len(),
        elapsed_s = started.elapsed().as_secs_f64(),
        "{} modes were calculated.",
        modes.len()
    );

    Ok(ModeSet::new(modes, dof, zeros_detected, requested))
}

/// Normalizes to unit length and makes the largest-magnitude component positive.
fn canonical_vector(mut v: DVector<f64>) -> DVector<f64> {
    let norm = v.norm();
    if norm > 0.0 {
        v /= norm;
    }
    let pivot = v.iamax();
    if v[pivot] < 0.0 {
        v.neg_mut();
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::coords::CoordinateSet;
    use crate::core::network::gamma::GammaModel;
    use crate::core::network::hessian::{self, BuildOptions};

    const TOLERANCE: f64 = 1e-8;

    fn hessian_for(rows: Vec<[f64; 3]>, cutoff: f64) -> DMatrix<f64> {
        let coords = CoordinateSet::try_from(rows).unwrap();
        hessian::build(&coords, cutoff, &GammaModel::Constant(1.0), BuildOptions::default())
            .unwrap()
            .hessian()
            .to_dense()
    }

    fn triangle() -> DMatrix<f64> {
        hessian_for(
            vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [2.0, 3.5, 0.0]],
            15.0,
        )
    }

    fn line_of_three() -> DMatrix<f64> {
        hessian_for(
            vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [8.0, 0.0, 0.0]],
            15.0,
        )
    }

    fn helix(n: usize) -> DMatrix<f64> {
        let rows = (0..n)
            .map(|k| {
                let t = k as f64 * 100f64.to_radians();
                [2.3 * t.cos(), 2.3 * t.sin(), 1.5 * k as f64]
            })
            .collect();
        hessian_for(rows, 100.0)
    }

    fn all_modes() -> SolverOptions {
        SolverOptions {
            num_modes: ModeCount::All,
            ..SolverOptions::default()
        }
    }

    #[test]
    fn three_point_system_with_six_rigid_modes_yields_three_modes() {
        let modes = solve(&triangle(), &all_modes()).unwrap();
        assert_eq!(modes.len(), 9 - 6);
        assert_eq!(modes.zeros_detected(), 6);
        assert!(modes.iter().all(|m| m.eigenvalue() > 0.0));
    }

    #[test]
    fn collinear_three_point_system_reports_extra_zero_modes() {
        let options = SolverOptions {
            num_modes: ModeCount::Count(3),
            ..SolverOptions::default()
        };
        let modes = solve(&line_of_three(), &options).unwrap();
        assert_eq!(modes.zeros_detected(), 7);
        assert_eq!(modes.len(), 2);
        assert_eq!(modes.shortfall(), 1);
        for mode in &modes {
            assert!((mode.eigenvalue() - 3.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn rigid_structure_has_six_near_zero_eigenvalues() {
        let h = helix(12);
        let with_zeros = SolverOptions {
            num_modes: ModeCount::All,
            include_zeros: true,
            high_precision: true,
        };
        let modes = solve(&h, &with_zeros).unwrap();
        assert_eq!(modes.zeros_detected(), 6);
        assert_eq!(modes.len(), 36);
        let dominant = modes.modes().last().unwrap().eigenvalue();
        for mode in &modes.modes()[..6] {
            assert!(mode.is_zero());
            assert!(mode.eigenvalue() <= ZERO_EIGENVALUE_TOLERANCE * dominant);
        }
        assert!(modes.modes()[6..].iter().all(|m| !m.is_zero()));

        let without_zeros = solve(&h, &all_modes()).unwrap();
        assert_eq!(without_zeros.len(), 12 * 3 - 6);
    }

    #[test]
    fn eigenvalues_ascend_and_vectors_are_unit_norm() {
        let modes = solve(&helix(15), &all_modes()).unwrap();
        let values = modes.eigenvalues();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        for mode in &modes {
            assert!((mode.eigenvector().norm() - 1.0).abs() < TOLERANCE);
            assert_eq!(mode.dof(), 45);
        }
    }

    #[test]
    fn eigenpairs_satisfy_eigen_equation() {
        let h = helix(10);
        let modes = solve(&h, &SolverOptions::default()).unwrap();
        for mode in &modes {
            let v = mode.eigenvector();
            let residual = &h * v - v * mode.eigenvalue();
            assert!(residual.norm() < 1e-8);
        }
    }

    #[test]
    fn variances_are_reciprocal_eigenvalues() {
        let modes = solve(&helix(10), &SolverOptions::default()).unwrap();
        for mode in &modes {
            let variance = mode.variance().unwrap();
            assert!((variance * mode.eigenvalue() - 1.0).abs() < 1e-12);
        }
        let expected_trace: f64 = modes.iter().map(|m| 1.0 / m.eigenvalue()).sum();
        assert!((modes.trace() - expected_trace).abs() < 1e-9);
    }

    #[test]
    fn requested_count_limits_returned_modes() {
        let options = SolverOptions {
            num_modes: ModeCount::Count(5),
            ..SolverOptions::default()
        };
        let modes = solve(&helix(10), &options).unwrap();
        assert_eq!(modes.len(), 5);
        assert_eq!(modes.shortfall(), 0);
        assert_eq!(modes.requested(), Some(5));
    }

    #[test]
    fn zero_mode_count_is_rejected() {
        let options = SolverOptions {
            num_modes: ModeCount::Count(0),
            ..SolverOptions::default()
        };
        assert_eq!(
            solve(&triangle(), &options),
            Err(ModeError::NonPositiveModeCount)
        );
    }

    #[test]
    fn malformed_hessians_are_rejected_before_decomposition() {
        assert_eq!(
            solve(&DMatrix::zeros(6, 9), &all_modes()),
            Err(ModeError::NotSquare { rows: 6, cols: 9 })
        );
        assert_eq!(
            solve(&DMatrix::zeros(4, 4), &all_modes()),
            Err(ModeError::InvalidDimension { dim: 4 })
        );
        let mut asymmetric = DMatrix::identity(3, 3);
        asymmetric[(0, 1)] = 1.0;
        assert!(matches!(
            solve(&asymmetric, &all_modes()),
            Err(ModeError::NotSymmetric { .. })
        ));
    }

    #[test]
    fn eigenvector_sign_is_deterministic() {
        let h = helix(8);
        let first = solve(&h, &SolverOptions::default()).unwrap();
        let second = solve(&h, &SolverOptions::default()).unwrap();
        assert_eq!(first, second);
        for mode in &first {
            let v = mode.eigenvector();
            assert!(v[v.iamax()] > 0.0);
        }
    }
}
