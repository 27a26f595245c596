use std::fmt;
use std::sync::Arc;

/// A pairwise spring-constant function for elastic network construction.
///
/// Implementations map the squared distance between nodes `i` and `j` to a
/// non-negative force constant. They must be pure: the same inputs always give
/// the same constant regardless of call order, so that a network built twice
/// from the same coordinates is identical.
///
/// Returning a negative or NaN value is a contract violation that silently
/// breaks positive semi-definiteness of the Hessian. It is not checked per call.
pub trait Gamma: Send + Sync {
    fn evaluate(&self, dist2: f64, i: usize, j: usize) -> f64;
}

impl<F> Gamma for F
where
    F: Fn(f64, usize, usize) -> f64 + Send + Sync,
{
    fn evaluate(&self, dist2: f64, i: usize, j: usize) -> f64 {
        self(dist2, i, j)
    }
}

pub type GammaFn = Arc<dyn Fn(f64, usize, usize) -> f64 + Send + Sync>;

/// The spring-constant models understood by the network builder.
#[derive(Clone)]
pub enum GammaModel {
    /// The same force constant for every contact.
    Constant(f64),
    /// `(reference / dist)^exponent`, stiffening short contacts.
    DistanceDependent { reference: f64, exponent: f64 },
    /// A user-supplied function of `(dist2, i, j)`.
    Custom(GammaFn),
}

impl GammaModel {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64, usize, usize) -> f64 + Send + Sync + 'static,
    {
        GammaModel::Custom(Arc::new(f))
    }

    /// Checks the parameters of the built-in variants.
    ///
    /// Custom models cannot be inspected and always pass.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            GammaModel::Constant(g) if !(g.is_finite() && g > 0.0) => {
                Err(format!("constant gamma must be greater than 0 (found {})", g))
            }
            GammaModel::DistanceDependent { reference, .. }
                if !(reference.is_finite() && reference > 0.0) =>
            {
                Err(format!(
                    "distance-dependent gamma requires a positive reference distance (found {})",
                    reference
                ))
            }
            GammaModel::DistanceDependent { exponent, .. } if !exponent.is_finite() => Err(
                format!("distance-dependent gamma requires a finite exponent (found {})", exponent),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for GammaModel {
    fn default() -> Self {
        GammaModel::Constant(1.0)
    }
}

impl Gamma for GammaModel {
    #[inline]
    fn evaluate(&self, dist2: f64, i: usize, j: usize) -> f64 {
        match self {
            GammaModel::Constant(g) => *g,
            GammaModel::DistanceDependent {
                reference,
                exponent,
            } => (reference * reference / dist2).powf(exponent / 2.0),
            GammaModel::Custom(f) => f(dist2, i, j),
        }
    }
}

impl fmt::Debug for GammaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GammaModel::Constant(g) => f.debug_tuple("Constant").field(g).finish(),
            GammaModel::DistanceDependent {
                reference,
                exponent,
            } => f
                .debug_struct("DistanceDependent")
                .field("reference", reference)
                .field("exponent", exponent)
                .finish(),
            GammaModel::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
