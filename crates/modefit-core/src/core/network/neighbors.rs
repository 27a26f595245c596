use crate::core::models::coords::CoordinateSet;
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// How contact pairs within the cutoff are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NeighborSearch {
    /// Scan all pairs, pruning on squared distance.
    #[default]
    BruteForce,
    /// Radius queries against a k-d tree of the coordinates.
    KdTree,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub i: usize,
    pub j: usize,
    /// `x_j - x_i`
    pub delta: Vector3<f64>,
    pub dist2: f64,
}

/// Enumerates every unordered pair `i < j` with squared distance `<= cutoff2`.
///
/// Both strategies return contacts sorted by `(i, j)`, so downstream
/// accumulation happens in the same order whichever strategy is used.
pub fn find_contacts(coords: &CoordinateSet, cutoff2: f64, strategy: NeighborSearch) -> Vec<Contact> {
    match strategy {
        NeighborSearch::BruteForce => brute_force(coords, cutoff2),
        NeighborSearch::KdTree => kd_tree(coords, cutoff2),
    }
}

fn brute_force(coords: &CoordinateSet, cutoff2: f64) -> Vec<Contact> {
    let points = coords.points();
    let mut contacts = Vec::new();
    for (i, pi) in points.iter().enumerate() {
        for (offset, pj) in points[i + 1..].iter().enumerate() {
            let delta = pj - pi;
            let dist2 = delta.norm_squared();
            if dist2 > cutoff2 {
                continue;
            }
            contacts.push(Contact {
                i,
                j: i + 1 + offset,
                delta,
                dist2,
            });
        }
    }
    contacts
}

fn kd_tree(coords: &CoordinateSet, cutoff2: f64) -> Vec<Contact> {
    let points = coords.points();
    let rows: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
    // The immutable tree tolerates many nodes sharing a value on one axis
    // (collinear or planar sets, rounded PDB coordinates).
    let tree: ImmutableKdTree<f64, 3> = ImmutableKdTree::new_from_slice(&rows);

    // Widen the query slightly and re-apply the exact test below, so pairs
    // sitting on the cutoff are classified exactly as in the brute-force scan.
    let query_radius = cutoff2 * (1.0 + 1e-9) + f64::EPSILON;

    let mut contacts = Vec::new();
    for (i, query) in rows.iter().enumerate() {
        let mut neighbors: Vec<usize> = tree
            .within_unsorted::<SquaredEuclidean>(query, query_radius)
            .into_iter()
            .map(|nn| nn.item as usize)
            .filter(|&j| j > i)
            .collect();
        neighbors.sort_unstable();

        for j in neighbors {
            let delta = points[j] - points[i];
            let dist2 = delta.norm_squared();
            if dist2 > cutoff2 {
                continue;
            }
            contacts.push(Contact { i, j, delta, dist2 });
        }
    }
    contacts
}
