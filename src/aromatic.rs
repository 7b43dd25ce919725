//! Aromaticity perception and kekulization.
//!
//! Atoms that are still short of a bond (or are wildcards) form the
//! delocalization graph. Each connected piece of it must have a perfect
//! matching, which is a Kekulé structure: every matched pair shares a double
//! bond. Atoms of such a piece that lie on a cycle are aromatic. Matched pairs
//! that are entirely outside the cycles become plain double bonds.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use tracing::*;

use crate::{
    bonds_missing,
    graph::{connected_components, cycle_basis, induced_subgraph, is_perfect_matching, maximum_matching, restrict},
    BondOrder, FillOptions, MoleculeError, MoleculeGraph,
};

/// Atoms that can take part in delocalization: wildcards, and atoms still
/// missing at least one bond.
fn delocalizable_atoms(
    mol: &MoleculeGraph,
    atoms: impl IntoIterator<Item = NodeIndex>,
) -> Result<HashSet<NodeIndex>, MoleculeError> {
    let mut eligible = HashSet::new();
    for node in atoms {
        if mol[node].is_wildcard() || bonds_missing(mol, node, true)? > 0 {
            eligible.insert(node);
        }
    }
    Ok(eligible)
}

/// Kekulize the molecule and set the `aromatic` flag on its atoms.
///
/// Only `atoms` are considered for delocalization (all atoms when `None`),
/// but every atom's flag is reset first. Components processed before a
/// failing one keep their new flags and bond orders.
pub fn mark_aromatic_atoms(mol: &mut MoleculeGraph, atoms: Option<&[NodeIndex]>) -> Result<(), MoleculeError> {
    let eligible = match atoms {
        Some(atoms) => delocalizable_atoms(mol, atoms.iter().copied())?,
        None => delocalizable_atoms(mol, mol.node_indices())?,
    };
    let delocalized = induced_subgraph(mol, &eligible);

    for atom in mol.node_weights_mut() {
        atom.aromatic = false;
    }

    for component in connected_components(&delocalized) {
        let system = restrict(&delocalized, &component);
        let matching = maximum_matching(&system);
        if !is_perfect_matching(&system, &matching) {
            let mut atoms: Vec<usize> = system.node_weights().map(|node| node.index()).collect();
            atoms.sort_unstable();
            return Err(MoleculeError::Kekulization { atoms });
        }

        let in_cycle: HashSet<NodeIndex> = cycle_basis(&system).into_iter().flatten().collect();
        for node in system.node_indices() {
            mol[system[node]].aromatic = in_cycle.contains(&node);
        }

        let mut double_bonds = 0;
        for (a, b) in matching.edges() {
            if in_cycle.contains(&a) || in_cycle.contains(&b) {
                continue;
            }
            if let Some(edge) = mol.find_edge(system[a], system[b]) {
                mol[edge].order = Some(BondOrder::Double);
                double_bonds += 1;
            }
        }
        debug!(
            "Kekulized {} delocalized atoms: {} aromatic, {} exocyclic double bonds",
            system.node_count(),
            in_cycle.len(),
            double_bonds
        );
    }
    Ok(())
}

/// Bonds between two aromatic atoms become aromatic (order 1.5); every other
/// bond without an order becomes single.
pub fn mark_aromatic_edges(mol: &mut MoleculeGraph) {
    for edge in mol.edge_indices() {
        let Some((a, b)) = mol.edge_endpoints(edge) else {
            continue;
        };
        let both_aromatic = mol[a].aromatic && mol[b].aromatic;
        let bond = &mut mol[edge];
        if both_aromatic {
            bond.order = Some(BondOrder::Aromatic);
        } else if bond.order.is_none() {
            bond.order = Some(BondOrder::Single);
        }
    }
}

/// Complete hydrogen counts, then perceive aromaticity over the whole
/// molecule and give aromatic bonds order 1.5.
pub fn correct_aromatic_rings(mol: &mut MoleculeGraph) -> Result<(), MoleculeError> {
    crate::fill_valence(mol, &FillOptions::default())?;
    mark_aromatic_atoms(mol, None)?;
    mark_aromatic_edges(mol);
    Ok(())
}
