use nalgebra::{DMatrix, DVector};

/// A single normal mode of an elastic network.
///
/// The eigenvector is unit-norm with one component per Cartesian degree of
/// freedom. `variance` is `1 / eigenvalue` for internal motions and `None` for
/// rigid-body (zero) modes, whose variance is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    eigenvalue: f64,
    eigenvector: DVector<f64>,
    variance: Option<f64>,
}

impl Mode {
    pub(crate) fn nonzero(eigenvalue: f64, eigenvector: DVector<f64>) -> Self {
        Self {
            eigenvalue,
            eigenvector,
            variance: Some(1.0 / eigenvalue),
        }
    }

    pub(crate) fn zero(eigenvalue: f64, eigenvector: DVector<f64>) -> Self {
        Self {
            eigenvalue: eigenvalue.max(0.0),
            eigenvector,
            variance: None,
        }
    }

    pub fn eigenvalue(&self) -> f64 {
        self.eigenvalue
    }

    pub fn eigenvector(&self) -> &DVector<f64> {
        &self.eigenvector
    }

    pub fn variance(&self) -> Option<f64> {
        self.variance
    }

    pub fn is_zero(&self) -> bool {
        self.variance.is_none()
    }

    pub fn dof(&self) -> usize {
        self.eigenvector.len()
    }
}

/// Normal modes ordered by ascending eigenvalue.
///
/// Besides the modes themselves, a `ModeSet` remembers how many zero modes the
/// decomposition found and how many internal modes the caller asked for, so a
/// short result can be reported instead of passing unnoticed.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSet {
    modes: Vec<Mode>,
    dof: usize,
    zeros_detected: usize,
    requested: Option<usize>,
}

impl ModeSet {
    pub(crate) fn new(
        modes: Vec<Mode>,
        dof: usize,
        zeros_detected: usize,
        requested: Option<usize>,
    ) -> Self {
        Self {
            modes,
            dof,
            zeros_detected,
            requested,
        }
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn get(&self, index: usize) -> Option<&Mode> {
        self.modes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mode> {
        self.modes.iter()
    }

    /// Modes describing internal motion, in ascending eigenvalue order.
    pub fn nonzero_modes(&self) -> impl Iterator<Item = &Mode> {
        self.modes.iter().filter(|m| !m.is_zero())
    }

    pub fn num_nonzero(&self) -> usize {
        self.nonzero_modes().count()
    }

    pub fn dof(&self) -> usize {
        self.dof
    }

    pub fn num_atoms(&self) -> usize {
        self.dof / 3
    }

    pub fn zeros_detected(&self) -> usize {
        self.zeros_detected
    }

    pub fn requested(&self) -> Option<usize> {
        self.requested
    }

    /// How many requested internal modes could not be provided.
    pub fn shortfall(&self) -> usize {
        self.requested
            .map(|n| n.saturating_sub(self.num_nonzero()))
            .unwrap_or(0)
    }

    pub fn eigenvalues(&self) -> Vec<f64> {
        self.modes.iter().map(Mode::eigenvalue).collect()
    }

    /// Sum of the variances of all internal modes.
    pub fn trace(&self) -> f64 {
        self.modes.iter().filter_map(Mode::variance).sum()
    }

    /// Per-node mean-square fluctuation, `sum_k var_k * |v_k(node)|^2`.
    pub fn square_fluctuations(&self) -> Vec<f64> {
        let mut flucts = vec![0.0; self.num_atoms()];
        for mode in &self.modes {
            let Some(variance) = mode.variance() else {
                continue;
            };
            let v = mode.eigenvector();
            for (atom, value) in flucts.iter_mut().enumerate() {
                let base = 3 * atom;
                *value += variance * (v[base].powi(2) + v[base + 1].powi(2) + v[base + 2].powi(2));
            }
        }
        flucts
    }

    /// Covariance matrix `sum_k var_k * v_k v_k^T` over the internal modes.
    pub fn covariance(&self) -> DMatrix<f64> {
        let mut cov = DMatrix::zeros(self.dof, self.dof);
        for mode in &self.modes {
            if let Some(variance) = mode.variance() {
                let v = mode.eigenvector();
                cov += v * v.transpose() * variance;
            }
        }
        cov
    }
}

impl<'a> IntoIterator for &'a ModeSet {
    type Item = &'a Mode;
    type IntoIter = std::slice::Iter<'a, Mode>;

    fn into_iter(self) -> Self::IntoIter {
        self.modes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dof: usize, index: usize) -> DVector<f64> {
        let mut v = DVector::zeros(dof);
        v[index] = 1.0;
        v
    }

    fn sample_set() -> ModeSet {
        ModeSet::new(
            vec![
                Mode::zero(-1e-15, unit(6, 0)),
                Mode::nonzero(2.0, unit(6, 1)),
                Mode::nonzero(4.0, unit(6, 4)),
            ],
            6,
            1,
            Some(3),
        )
    }

    #[test]
    fn zero_mode_has_no_variance_and_clamped_eigenvalue() {
        let set = sample_set();
        let zero = set.get(0).unwrap();
        assert!(zero.is_zero());
        assert_eq!(zero.variance(), None);
        assert_eq!(zero.eigenvalue(), 0.0);
    }

    #[test]
    fn trace_sums_internal_variances_only() {
        assert!((sample_set().trace() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn shortfall_counts_missing_internal_modes() {
        let set = sample_set();
        assert_eq!(set.num_nonzero(), 2);
        assert_eq!(set.shortfall(), 1);
    }

    #[test]
    fn square_fluctuations_match_covariance_diagonal_blocks() {
        let set = sample_set();
        let flucts = set.square_fluctuations();
        let cov = set.covariance();
        assert_eq!(flucts.len(), 2);
        for (atom, value) in flucts.iter().enumerate() {
            let block_trace: f64 = (0..3).map(|k| cov[(3 * atom + k, 3 * atom + k)]).sum();
            assert!((value - block_trace).abs() < 1e-12);
        }
        assert!((flucts[0] - 0.5).abs() < 1e-12);
        assert!((flucts[1] - 0.25).abs() < 1e-12);
    }
}
