//! Valence model and bond accounting.
//!
//! Admissible valences are derived by filling electron shells rather than
//! looked up per element: the unpaired electrons of the outermost, partially
//! filled shell give the lowest valence, and when the following shell has d
//! orbitals every electron pair may be promoted, adding two each time
//! (so sulfur is 2, 4 or 6).

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::{MoleculeError, MoleculeGraph, Symbol};

/// Orbital group capacities per shell: 1s; 2s 2p; 3s 3p; 4s 3d 4p; 5s 4d 5p; 6s 4f 5d 6p.
const ORBITAL_SIZES: &[&[i64]] = &[
    &[2],
    &[2, 6],
    &[2, 6],
    &[2, 10, 6],
    &[2, 10, 6],
    &[2, 14, 10, 6],
];

/// Electrons of the neutral atom. Elements outside the modeled main-group
/// set, and the wildcard, have none.
fn electron_count(element: Option<&Symbol>) -> i64 {
    match element.map(Symbol::as_str) {
        Some("H") => 1,
        Some("B") => 5,
        Some("C") => 6,
        Some("N") => 7,
        Some("O") => 8,
        Some("F") => 9,
        Some("P") => 15,
        Some("S") => 16,
        Some("Cl") => 17,
        Some("As") => 33,
        Some("Se") => 34,
        Some("Br") => 35,
        Some("I") => 53,
        _ => 0,
    }
}

/// Every admissible valence of `element` carrying `charge`, in ascending order.
///
/// A positive charge removes electrons. Unmodeled elements give `[0]`.
pub fn valence(element: Option<&Symbol>, charge: i32) -> Result<Vec<u32>, MoleculeError> {
    let mut electrons = (electron_count(element) - i64::from(charge)).max(0);

    let mut shell_index = None;
    for (idx, shell) in ORBITAL_SIZES.iter().enumerate() {
        let shell_size: i64 = shell.iter().sum();
        if shell_size <= electrons {
            electrons -= shell_size;
        } else {
            shell_index = Some(idx);
            break;
        }
    }
    let Some(idx) = shell_index else {
        return Err(MoleculeError::ValenceOverflow {
            element: element.map_or_else(|| "*".to_string(), Symbol::to_string),
            charge,
            electrons: electron_count(element) - i64::from(charge),
        });
    };

    // One electron per orbital first, then pair them up.
    let half_shell: i64 = ORBITAL_SIZES[idx].iter().sum::<i64>() / 2;
    let mut unpaired = electrons.min(half_shell);
    electrons -= unpaired;
    let pairs = electrons.min(half_shell);
    unpaired -= pairs;

    let can_promote = ORBITAL_SIZES
        .get(idx + 1)
        .is_some_and(|next| next.len() >= 3);
    let unpaired = unpaired as u32;
    if can_promote {
        Ok((0..=pairs as u32).map(|n| unpaired + 2 * n).collect())
    } else {
        Ok(vec![unpaired])
    }
}

/// The atom's explicit bonding load. With `weighted` each bond counts its
/// order (aromatic bonds 1.5); otherwise every bond counts one.
pub fn bond_load(mol: &MoleculeGraph, node: NodeIndex, weighted: bool) -> f64 {
    if weighted {
        mol.edges(node).map(|edge| edge.weight().weight()).sum()
    } else {
        mol.edges(node).count() as f64
    }
}

/// The smallest admissible valence that fits `load`, or 0 when the atom is
/// already over-bonded.
fn target_valence(mol: &MoleculeGraph, node: NodeIndex, load: f64) -> Result<f64, MoleculeError> {
    let atom = &mol[node];
    let valences = valence(atom.element.as_ref(), atom.charge)?;
    Ok(valences
        .into_iter()
        .map(f64::from)
        .find(|&v| v >= load)
        .unwrap_or(0.0))
}

/// How many bonds the atom is short of its valence, counting both explicit
/// bonds and the hydrogens already assigned to it.
pub fn bonds_missing(mol: &MoleculeGraph, node: NodeIndex, weighted: bool) -> Result<u32, MoleculeError> {
    let load = bond_load(mol, node, weighted) + f64::from(mol[node].hcount.unwrap_or(0));
    let target = target_valence(mol, node, load)?;
    Ok((target - load).max(0.0) as u32)
}

/// Whether the stored hydrogen count is exactly what the valence model
/// would assign to an atom with these bonds and no hydrogens yet.
pub fn has_default_h_count(mol: &MoleculeGraph, node: NodeIndex, weighted: bool) -> Result<bool, MoleculeError> {
    let load = bond_load(mol, node, weighted);
    let target = target_valence(mol, node, load)?;
    let hcount = f64::from(mol[node].hcount.unwrap_or(0));
    Ok((target - load).max(0.0) == hcount)
}
