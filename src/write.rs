//! Writing a [`MoleculeGraph`] back out as SMILES.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::NodeIndex;

use crate::{has_default_h_count, Bond, BondOrder, MoleculeError, MoleculeGraph, SmilesError};

/// Symbols that may be written without brackets. The first seven may also
/// be written aromatic.
const ORGANIC_SUBSET: [&str; 11] = ["B", "C", "N", "O", "P", "S", "*", "F", "Cl", "Br", "I"];

/// Ring-closure numbers run from 1 to this.
const MAX_RING_NUMBER: u8 = 99;

/// Write a single atom: the bare symbol when that loses nothing, otherwise
/// a bracket atom `[isotope symbol H<n> charge :class]`.
pub fn format_atom(mol: &MoleculeGraph, node: NodeIndex) -> Result<String, MoleculeError> {
    let atom = &mol[node];
    let symbol = if atom.aromatic {
        atom.symbol().to_lowercase()
    } else {
        atom.symbol().to_string()
    };

    let organic = match ORGANIC_SUBSET.iter().position(|&s| s == atom.symbol()) {
        Some(idx) => !atom.aromatic || idx < 7,
        None => false,
    };
    if organic
        && atom.isotope.is_none()
        && atom.charge == 0
        && atom.class.is_none()
        && has_default_h_count(mol, node, true)?
    {
        return Ok(symbol);
    }

    let mut out = String::from("[");
    if let Some(isotope) = atom.isotope {
        out.push_str(&isotope.to_string());
    }
    out.push_str(&symbol);
    match atom.hcount.unwrap_or(0) {
        0 => {}
        1 => out.push('H'),
        n => out.push_str(&format!("H{n}")),
    }
    match atom.charge {
        0 => {}
        1 => out.push('+'),
        -1 => out.push('-'),
        c if c > 0 => out.push_str(&format!("+{c}")),
        c => out.push_str(&c.to_string()),
    }
    if let Some(class) = atom.class {
        out.push_str(&format!(":{class}"));
    }
    out.push(']');
    Ok(out)
}

/// The bond symbol to write between `a` and `b`; empty when reading it back
/// would infer the same order.
fn bond_symbol(mol: &MoleculeGraph, a: NodeIndex, b: NodeIndex, bond: &Bond) -> &'static str {
    let aromatic_pair = mol[a].aromatic && mol[b].aromatic;
    match bond.order {
        None | Some(BondOrder::Single) if aromatic_pair => "-",
        None | Some(BondOrder::Single) => "",
        Some(BondOrder::Double) => "=",
        Some(BondOrder::Triple) => "#",
        Some(BondOrder::Quadruple) => "$",
        Some(BondOrder::Aromatic) if aromatic_pair => "",
        Some(BondOrder::Aromatic) => ":",
    }
}

/// Formats a ring closure number according to SMILES rules.
fn format_ring(number: u8) -> String {
    if number < 10 {
        number.to_string()
    } else {
        format!("%{number}")
    }
}

/// A non-tree edge of the depth-first spanning tree: `opening` is the
/// ancestor, written first.
#[derive(Debug, Clone, Copy)]
struct RingClosure {
    opening: NodeIndex,
    closing: NodeIndex,
}

#[derive(Default)]
struct SpanningTree {
    children: BTreeMap<NodeIndex, Vec<NodeIndex>>,
    ring_closures: Vec<RingClosure>,
}

/// First pass: a depth-first spanning tree visiting neighbours in ascending
/// index order, recording every back edge as a ring closure.
fn compute_spanning_tree(
    mol: &MoleculeGraph,
    current: NodeIndex,
    parent: Option<NodeIndex>,
    visited: &mut [bool],
    path: &mut Vec<NodeIndex>,
    tree: &mut SpanningTree,
) {
    visited[current.index()] = true;
    path.push(current);

    let mut nbrs: Vec<NodeIndex> = mol.neighbors(current).collect();
    nbrs.sort();
    nbrs.dedup();
    for nbr in nbrs {
        if Some(nbr) == parent || nbr == current {
            continue;
        }
        if !visited[nbr.index()] {
            tree.children.entry(current).or_default().push(nbr);
            compute_spanning_tree(mol, nbr, Some(current), visited, path, tree);
        } else if path.contains(&nbr) {
            tree.ring_closures.push(RingClosure {
                opening: nbr,
                closing: current,
            });
        }
    }
    path.pop();
}

/// Second pass: emit atoms in tree order, inserting ring-closure numbers
/// and parenthesising every child but the last.
struct Emitter<'a> {
    mol: &'a MoleculeGraph,
    tree: &'a SpanningTree,
    openings: HashMap<NodeIndex, Vec<usize>>,
    closings: HashMap<NodeIndex, Vec<usize>>,
    numbers: HashMap<usize, u8>,
    in_use: BTreeSet<u8>,
    out: String,
}

impl<'a> Emitter<'a> {
    fn new(mol: &'a MoleculeGraph, tree: &'a SpanningTree) -> Self {
        let mut openings: HashMap<NodeIndex, Vec<usize>> = HashMap::new();
        let mut closings: HashMap<NodeIndex, Vec<usize>> = HashMap::new();
        for (idx, rc) in tree.ring_closures.iter().enumerate() {
            openings.entry(rc.opening).or_default().push(idx);
            closings.entry(rc.closing).or_default().push(idx);
        }
        Self {
            mol,
            tree,
            openings,
            closings,
            numbers: HashMap::new(),
            in_use: BTreeSet::new(),
            out: String::new(),
        }
    }

    fn emit(&mut self, current: NodeIndex) -> Result<(), SmilesError> {
        self.out.push_str(&format_atom(self.mol, current)?);

        for idx in self.closings.get(&current).cloned().unwrap_or_default() {
            if let Some(number) = self.numbers.remove(&idx) {
                self.in_use.remove(&number);
                self.out.push_str(&format_ring(number));
            }
        }
        for idx in self.openings.get(&current).cloned().unwrap_or_default() {
            let number = (1..=MAX_RING_NUMBER)
                .find(|n| !self.in_use.contains(n))
                .ok_or(SmilesError::TooManyRings(MAX_RING_NUMBER as usize))?;
            self.in_use.insert(number);
            self.numbers.insert(idx, number);

            let rc = self.tree.ring_closures[idx];
            if let Some(edge) = self.mol.find_edge(rc.opening, rc.closing) {
                self.out
                    .push_str(bond_symbol(self.mol, rc.opening, rc.closing, &self.mol[edge]));
            }
            self.out.push_str(&format_ring(number));
        }

        let children = self.tree.children.get(&current).cloned().unwrap_or_default();
        for (k, &child) in children.iter().enumerate() {
            let last = k + 1 == children.len();
            if !last {
                self.out.push('(');
            }
            if let Some(edge) = self.mol.find_edge(current, child) {
                self.out
                    .push_str(bond_symbol(self.mol, current, child, &self.mol[edge]));
            }
            self.emit(child)?;
            if !last {
                self.out.push(')');
            }
        }
        Ok(())
    }
}

/// Write the molecule as SMILES. Each connected component is written from
/// its lowest-index atom; components are joined by `.`. Stereochemistry is
/// not written.
pub fn write_smiles(mol: &MoleculeGraph) -> Result<String, SmilesError> {
    let mut visited = vec![false; mol.node_count()];
    let mut fragments = Vec::new();

    for root in mol.node_indices() {
        if visited[root.index()] {
            continue;
        }
        let mut tree = SpanningTree::default();
        compute_spanning_tree(mol, root, None, &mut visited, &mut Vec::new(), &mut tree);

        let mut emitter = Emitter::new(mol, &tree);
        emitter.emit(root)?;
        fragments.push(emitter.out);
    }
    Ok(fragments.join("."))
}
