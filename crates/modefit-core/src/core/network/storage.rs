use nalgebra::{DMatrix, Matrix3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "sparse")]
use sprs::{CsMat, TriMat};

/// Backing storage requested for the network matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatrixStorageKind {
    #[default]
    Dense,
    Sparse,
}

impl MatrixStorageKind {
    /// Whether this build of the library can produce the requested storage.
    pub fn is_available(self) -> bool {
        match self {
            MatrixStorageKind::Dense => true,
            MatrixStorageKind::Sparse => cfg!(feature = "sparse"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Storage {
    Dense(DMatrix<f64>),
    #[cfg(feature = "sparse")]
    Sparse(CsMat<f64>),
}

/// A square matrix produced by the network builder, dense or sparse.
///
/// Read access is storage-agnostic; consumers that need the full matrix (the
/// eigensolver) go through [`NetworkMatrix::to_dense`].
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkMatrix {
    storage: Storage,
}

impl NetworkMatrix {
    pub fn from_dense(matrix: DMatrix<f64>) -> Self {
        Self {
            storage: Storage::Dense(matrix),
        }
    }

    #[cfg(feature = "sparse")]
    pub fn from_sparse(matrix: CsMat<f64>) -> Self {
        Self {
            storage: Storage::Sparse(matrix),
        }
    }

    pub fn kind(&self) -> MatrixStorageKind {
        match &self.storage {
            Storage::Dense(_) => MatrixStorageKind::Dense,
            #[cfg(feature = "sparse")]
            Storage::Sparse(_) => MatrixStorageKind::Sparse,
        }
    }

    pub fn nrows(&self) -> usize {
        match &self.storage {
            Storage::Dense(m) => m.nrows(),
            #[cfg(feature = "sparse")]
            Storage::Sparse(m) => m.rows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match &self.storage {
            Storage::Dense(m) => m.ncols(),
            #[cfg(feature = "sparse")]
            Storage::Sparse(m) => m.cols(),
        }
    }

    pub fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        match &self.storage {
            Storage::Dense(m) => m[(row, col)],
            #[cfg(feature = "sparse")]
            Storage::Sparse(m) => m.get(row, col).copied().unwrap_or(0.0),
        }
    }

    /// The 3x3 super-element coupling nodes `i` and `j` of a Hessian.
    pub fn block3(&self, i: usize, j: usize) -> Matrix3<f64> {
        Matrix3::from_fn(|r, c| self.get(3 * i + r, 3 * j + c))
    }

    /// Number of structurally non-zero entries.
    pub fn nnz(&self) -> usize {
        match &self.storage {
            Storage::Dense(m) => m.iter().filter(|v| **v != 0.0).count(),
            #[cfg(feature = "sparse")]
            Storage::Sparse(m) => m.nnz(),
        }
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        match &self.storage {
            Storage::Dense(m) => m.clone(),
            #[cfg(feature = "sparse")]
            Storage::Sparse(m) => {
                let mut dense = DMatrix::zeros(m.rows(), m.cols());
                for (value, (row, col)) in m.iter() {
                    dense[(row, col)] += *value;
                }
                dense
            }
        }
    }

    pub fn as_dense(&self) -> Option<&DMatrix<f64>> {
        match &self.storage {
            Storage::Dense(m) => Some(m),
            #[cfg(feature = "sparse")]
            Storage::Sparse(_) => None,
        }
    }
}

/// Write side of a [`NetworkMatrix`] while it is being assembled.
///
/// The builder only ever adds to entries, so dense and sparse storage share one
/// accumulation path. Sparse duplicates are summed when the triplets are compressed.
pub(crate) enum Accumulator {
    Dense(DMatrix<f64>),
    #[cfg(feature = "sparse")]
    Sparse(TriMat<f64>),
}

impl Accumulator {
    /// Returns `None` when the requested storage is not compiled into this build.
    pub fn new(kind: MatrixStorageKind, dim: usize) -> Option<Self> {
        match kind {
            MatrixStorageKind::Dense => Some(Accumulator::Dense(DMatrix::zeros(dim, dim))),
            #[cfg(feature = "sparse")]
            MatrixStorageKind::Sparse => Some(Accumulator::Sparse(TriMat::new((dim, dim)))),
            #[cfg(not(feature = "sparse"))]
            MatrixStorageKind::Sparse => None,
        }
    }

    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        match self {
            Accumulator::Dense(m) => m[(row, col)] += value,
            #[cfg(feature = "sparse")]
            Accumulator::Sparse(t) => t.add_triplet(row, col, value),
        }
    }

    /// Adds `scale * block` to the 3x3 block at node pair `(i, j)`.
    #[inline]
    pub fn add_block3(&mut self, i: usize, j: usize, block: &Matrix3<f64>, scale: f64) {
        for r in 0..3 {
            for c in 0..3 {
                self.add(3 * i + r, 3 * j + c, scale * block[(r, c)]);
            }
        }
    }

    pub fn finish(self) -> NetworkMatrix {
        match self {
            Accumulator::Dense(m) => NetworkMatrix::from_dense(m),
            #[cfg(feature = "sparse")]
            Accumulator::Sparse(t) => NetworkMatrix::from_sparse(t.to_csr()),
        }
    }
}
