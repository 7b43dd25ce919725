//! Implicit hydrogen completion, bond-order saturation and conversion
//! between implicit and explicit hydrogens.

use petgraph::graph::NodeIndex;
use tracing::*;

use crate::{bonds_missing, Atom, Bond, BondOrder, MoleculeError, MoleculeGraph};

/// How [`fill_valence`] completes a molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOptions {
    /// Leave atoms that already have an `hcount` alone.
    pub respect_hcount: bool,
    /// When false, raise bond orders to saturate valences before adding hydrogens.
    pub respect_bond_order: bool,
    /// Highest bond order bond-order incrementing may create.
    pub max_bond_order: u8,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            respect_hcount: true,
            respect_bond_order: true,
            max_bond_order: 3,
        }
    }
}

/// Give every atom an `hcount` that completes its valence.
///
/// Atoms with a known `hcount` are skipped unless `respect_hcount` is off,
/// in which case the missing hydrogens are added on top of the existing ones.
pub fn fill_valence(mol: &mut MoleculeGraph, options: &FillOptions) -> Result<(), MoleculeError> {
    if !options.respect_bond_order {
        increment_bond_orders(mol, options.max_bond_order)?;
    }
    for node in mol.node_indices() {
        if options.respect_hcount && mol[node].hcount.is_some() {
            continue;
        }
        let missing = bonds_missing(mol, node, true)?;
        let atom = &mut mol[node];
        let hcount = atom.hcount.unwrap_or(0) + missing;
        if atom.is_hydrogen() && hcount > 0 {
            return Err(MoleculeError::HydrogenWithHydrogens { atom: node.index() });
        }
        atom.hcount = Some(hcount);
    }
    Ok(())
}

/// Raise bond orders as far as both endpoints' valences allow, up to
/// `max_bond_order` (at most 4). A bond already above the maximum is clamped
/// down to it. Aromatic bonds are never touched.
///
/// Every atom's spare capacity is measured once, before any bond changes, and
/// bonds are visited in insertion order; earlier bonds win when an atom has
/// less capacity than unsaturated bonds.
pub fn increment_bond_orders(mol: &mut MoleculeGraph, max_bond_order: u8) -> Result<(), MoleculeError> {
    let max_bond_order = max_bond_order.min(4);
    let mut missing = vec![0u32; mol.node_count()];
    for node in mol.node_indices() {
        missing[node.index()] = bonds_missing(mol, node, true)?;
    }

    for edge in mol.edge_indices() {
        let Some((u, v)) = mol.edge_endpoints(edge) else {
            continue;
        };
        let bond = &mut mol[edge];
        let current = match bond.order {
            Some(order) => match order.multiplicity() {
                Some(n) => n,
                None => continue,
            },
            None => 1,
        };
        let available = missing[u.index()].min(missing[v.index()]);
        let available = u8::try_from(available).unwrap_or(u8::MAX);
        let new_order = current.saturating_add(available).min(max_bond_order);
        bond.order = BondOrder::from_multiplicity(new_order);

        if new_order > current {
            trace!("Raised bond {}-{} from order {} to {}", u.index(), v.index(), current, new_order);
            let applied = u32::from(new_order - current);
            missing[u.index()] -= applied;
            missing[v.index()] -= applied;
        } else if new_order < current {
            trace!("Clamped bond {}-{} from order {} to {}", u.index(), v.index(), current, new_order);
        }
    }
    Ok(())
}

/// Turn every implicit hydrogen into a hydrogen node joined by a single bond.
/// The `hcount` of every original atom is removed.
pub fn add_explicit_hydrogens(mol: &mut MoleculeGraph) {
    let nodes: Vec<NodeIndex> = mol.node_indices().collect();
    for node in nodes {
        let hcount = mol[node].hcount.take().unwrap_or(0);
        for _ in 0..hcount {
            let h = mol.add_node(Atom::hydrogen());
            mol.add_edge(node, h, Bond::single());
        }
        if hcount > 0 {
            trace!("Materialized {} hydrogens on atom {}", hcount, node.index());
        }
    }
}

/// Fold simple explicit hydrogens back into their neighbour's `hcount`.
///
/// A hydrogen is simple when it is uncharged, has no isotope and no class
/// (or class 0), and is singly bonded to exactly one non-hydrogen atom.
/// Every remaining atom ends up with an `hcount`, 0 if it had none.
/// Removing nodes compacts the graph's indices.
pub fn remove_explicit_hydrogens(mol: &mut MoleculeGraph) {
    let mut to_remove = Vec::new();
    for node in mol.node_indices() {
        let atom = &mol[node];
        if !(atom.is_hydrogen()
            && atom.charge == 0
            && atom.isotope.is_none()
            && atom.class.unwrap_or(0) == 0)
        {
            continue;
        }
        let mut neighbors = mol.neighbors(node);
        let (Some(neighbor), None) = (neighbors.next(), neighbors.next()) else {
            continue;
        };
        let single = mol
            .find_edge(node, neighbor)
            .is_some_and(|edge| mol[edge].weight() == 1.0);
        if mol[neighbor].is_hydrogen() || !single {
            continue;
        }
        to_remove.push(node);
    }

    for &h in &to_remove {
        if let Some(neighbor) = mol.neighbors(h).next() {
            let hcount = &mut mol[neighbor].hcount;
            *hcount = Some(hcount.unwrap_or(0) + 1);
        }
    }
    if !to_remove.is_empty() {
        trace!("Removing {} explicit hydrogens", to_remove.len());
    }
    mol.retain_nodes(|_, node| !to_remove.contains(&node));

    for atom in mol.node_weights_mut() {
        atom.hcount.get_or_insert(0);
    }
}
