use super::gamma::Gamma;
use super::neighbors::{NeighborSearch, find_contacts};
use super::storage::{Accumulator, MatrixStorageKind, NetworkMatrix};
use crate::core::models::coords::CoordinateSet;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Smallest cutoff distance (Angstroms) accepted for network construction.
pub const MIN_CUTOFF: f64 = 4.0;

#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("Cutoff must be a finite distance of at least {minimum} (found {cutoff})")]
    CutoffTooSmall { cutoff: f64, minimum: f64 },
    #[error("Network construction requires at least one coordinate")]
    EmptyCoordinates,
    #[error(
        "Sparse matrix storage was requested but this build lacks sparse support (enable the `sparse` feature)"
    )]
    SparseUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BuildOptions {
    pub storage: MatrixStorageKind,
    pub neighbor_search: NeighborSearch,
}

/// Hessian and Kirchhoff matrices of an anisotropic elastic network.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticNetwork {
    hessian: NetworkMatrix,
    kirchhoff: NetworkMatrix,
    cutoff: f64,
    num_atoms: usize,
    num_contacts: usize,
}

impl ElasticNetwork {
    pub fn hessian(&self) -> &NetworkMatrix {
        &self.hessian
    }

    pub fn kirchhoff(&self) -> &NetworkMatrix {
        &self.kirchhoff
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn num_atoms(&self) -> usize {
        self.num_atoms
    }

    pub fn dof(&self) -> usize {
        self.num_atoms * 3
    }

    pub fn num_contacts(&self) -> usize {
        self.num_contacts
    }

    pub fn into_parts(self) -> (NetworkMatrix, NetworkMatrix) {
        (self.hessian, self.kirchhoff)
    }
}

/// Builds the ANM Hessian and Kirchhoff matrices for `coords`.
///
/// Every pair within `cutoff` contributes the super-element
/// `-g / d^2 * (d d^T)` to its two off-diagonal blocks and subtracts it from
/// the two diagonal blocks, so each diagonal block is the negated sum of the
/// off-diagonal blocks in its row. Coincident points carry no direction and
/// are skipped.
pub fn build<G: Gamma + ?Sized>(
    coords: &CoordinateSet,
    cutoff: f64,
    gamma: &G,
    options: BuildOptions,
) -> Result<ElasticNetwork, NetworkError> {
    if !(cutoff.is_finite() && cutoff >= MIN_CUTOFF) {
        return Err(NetworkError::CutoffTooSmall {
            cutoff,
            minimum: MIN_CUTOFF,
        });
    }
    if coords.is_empty() {
        return Err(NetworkError::EmptyCoordinates);
    }

    let num_atoms = coords.len();
    let dof = num_atoms * 3;
    let mut hessian =
        Accumulator::new(options.storage, dof).ok_or(NetworkError::SparseUnavailable)?;
    let mut kirchhoff =
        Accumulator::new(options.storage, num_atoms).ok_or(NetworkError::SparseUnavailable)?;

    let started = Instant::now();
    if options.neighbor_search == NeighborSearch::KdTree {
        info!("Using a k-d tree to enumerate network contacts.");
    }
    let contacts = find_contacts(coords, cutoff * cutoff, options.neighbor_search);

    let mut num_contacts = 0;
    for contact in &contacts {
        if contact.dist2 == 0.0 {
            debug!(i = contact.i, j = contact.j, "Skipping coincident node pair.");
            continue;
        }
        let (i, j) = (contact.i, contact.j);
        let g = gamma.evaluate(contact.dist2, i, j);
        let super_element = contact.delta * contact.delta.transpose() * (-g / contact.dist2);

        hessian.add_block3(i, j, &super_element, 1.0);
        hessian.add_block3(j, i, &super_element, 1.0);
        hessian.add_block3(i, i, &super_element, -1.0);
        hessian.add_block3(j, j, &super_element, -1.0);

        kirchhoff.add(i, j, -g);
        kirchhoff.add(j, i, -g);
        kirchhoff.add(i, i, g);
        kirchhoff.add(j, j, g);
        num_contacts += 1;
    }

    info!(
        atoms = num_atoms,
        contacts = num_contacts,
        elapsed_s = started.elapsed().as_secs_f64(),
        "Hessian was built."
    );

    Ok(ElasticNetwork {
        hessian: hessian.finish(),
        kirchhoff: kirchhoff.finish(),
        cutoff,
        num_atoms,
        num_contacts,
    })
}
