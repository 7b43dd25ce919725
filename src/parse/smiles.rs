use std::collections::{BTreeMap, BTreeSet};

use petgraph::{graph::NodeIndex, visit::EdgeRef};
use thiserror::Error;
use tracing::*;

use super::parse_atom;
use crate::{
    add_explicit_hydrogens, bonds_missing, fill_valence, mark_aromatic_atoms, mark_aromatic_edges,
    remove_explicit_hydrogens, Atom, Bond, BondOrder, FillOptions, MoleculeError, MoleculeGraph,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("Atom {token:?} is malformed: {reason}")]
    MalformedAtom { token: String, reason: String },
    #[error("Unknown atom {0:?} at position {1}")]
    UnknownAtom(String, usize),
    #[error("Hydrogen atom {0:?} cannot carry hydrogens")]
    HydrogenWithHydrogens(String),
    #[error("{0} branch(es) opened with '(' but never closed")]
    UnmatchedBranchOpen(usize),
    #[error("Branch end ')' at position {0} without a matching '('")]
    UnmatchedBranchClose(usize),
    #[error("Branch start '(' at position {0} without a current atom")]
    BranchWithoutAtom(usize),
    #[error("Bond {0:?} at position {1} without a current atom")]
    BondWithoutAtom(char, usize),
    #[error("Bond {0:?} at position {1} is not followed by an atom or ring closure")]
    DanglingBond(char, usize),
    #[error("Ring closure {0} at position {1} without a current atom")]
    RingClosureWithoutAtom(u8, usize),
    #[error("Ring(s) {0:?} opened but never closed")]
    UnclosedRing(Vec<u8>),
    #[error("Ring closure {0} at position {1} has a different bond order than its opening")]
    ConflictingRingBond(u8, usize),
    #[error("Ring closure {0} at position {1} bonds an atom to itself or to an existing neighbour")]
    InvalidRingBond(u8, usize),
    #[error("More than {0} ring closures open at once")]
    TooManyRings(usize),
    #[error("Unexpected character {0:?} at position {1}")]
    UnexpectedCharacter(char, usize),
    #[error(transparent)]
    Molecule(#[from] MoleculeError),
}

/// How [`read_smiles`] post-processes the parsed graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Keep hydrogens as nodes instead of folding them into `hcount`.
    pub explicit_hydrogen: bool,
    /// Re-derive aromaticity from the atoms written aromatic, kekulizing
    /// whatever turns out not to be.
    pub reinterpret_aromatic: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            explicit_hydrogen: false,
            reinterpret_aromatic: true,
        }
    }
}

/// Atoms that may be written without brackets. Two-letter symbols come first
/// so that `Cl` is never read as `C` followed by `l`.
const ORGANIC_SUBSET: [&str; 17] = [
    "Cl", "Br", "B", "C", "N", "O", "P", "S", "F", "I", "b", "c", "n", "o", "p", "s", "*",
];

/// An explicit bond symbol waiting for the atom or ring closure it applies to.
#[derive(Debug, Clone, Copy)]
struct PendingBond {
    order: BondOrder,
    symbol: char,
    position: usize,
}

/// Parses a SMILES string into a MoleculeGraph with complete hydrogen counts
/// and, unless disabled, perceived aromaticity.
pub fn read_smiles(smiles: &str, options: &ReadOptions) -> Result<MoleculeGraph, SmilesError> {
    let mut mol = parse_graph(smiles.trim())?;
    debug!("Parsed {smiles:?}: {} atoms, {} bonds", mol.node_count(), mol.edge_count());

    if options.reinterpret_aromatic {
        reinterpret_aromaticity(&mut mol)?;
    } else {
        fill_valence(&mut mol, &FillOptions::default())?;
    }

    if options.explicit_hydrogen {
        add_explicit_hydrogens(&mut mol);
    } else {
        remove_explicit_hydrogens(&mut mol);
    }
    Ok(mol)
}

fn implicit_order(mol: &MoleculeGraph, a: NodeIndex, b: NodeIndex) -> BondOrder {
    if mol[a].aromatic && mol[b].aromatic {
        BondOrder::Aromatic
    } else {
        BondOrder::Single
    }
}

fn organic_token(chars: &[char], start: usize) -> Option<&'static str> {
    ORGANIC_SUBSET.iter().copied().find(|symbol| {
        symbol
            .chars()
            .enumerate()
            .all(|(offset, c)| chars.get(start + offset) == Some(&c))
    })
}

/// Add `atom` and bond it to the current atom, if there is one.
fn attach(
    mol: &mut MoleculeGraph,
    current: &mut Option<NodeIndex>,
    pending: &mut Option<PendingBond>,
    atom: Atom,
) {
    let node = mol.add_node(atom);
    if let Some(prev) = *current {
        let order = match pending.take() {
            Some(bond) => bond.order,
            None => implicit_order(mol, prev, node),
        };
        mol.add_edge(prev, node, Bond::new(order));
    }
    *current = Some(node);
}

fn parse_graph(smiles: &str) -> Result<MoleculeGraph, SmilesError> {
    let mut mol = MoleculeGraph::new_undirected();
    let mut current: Option<NodeIndex> = None;
    let mut pending: Option<PendingBond> = None;
    let mut branch_stack: Vec<NodeIndex> = Vec::new();
    let mut rings: BTreeMap<u8, (NodeIndex, Option<BondOrder>)> = BTreeMap::new();

    let chars: Vec<char> = smiles.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '(' | ')' | '.' => {
                if let Some(bond) = pending {
                    return Err(SmilesError::DanglingBond(bond.symbol, bond.position));
                }
                match c {
                    '(' => branch_stack.push(current.ok_or(SmilesError::BranchWithoutAtom(i))?),
                    ')' => current = Some(branch_stack.pop().ok_or(SmilesError::UnmatchedBranchClose(i))?),
                    // The next atom starts a new fragment.
                    _ => current = None,
                }
                i += 1;
            }
            '-' | '=' | '#' | '$' | ':' | '/' | '\\' => {
                if current.is_none() {
                    return Err(SmilesError::BondWithoutAtom(c, i));
                }
                if pending.is_some() {
                    return Err(SmilesError::UnexpectedCharacter(c, i));
                }
                let order = match c {
                    '=' => BondOrder::Double,
                    '#' => BondOrder::Triple,
                    '$' => BondOrder::Quadruple,
                    ':' => BondOrder::Aromatic,
                    '/' | '\\' => {
                        warn!("Bond stereochemistry {c:?} at position {i} will be discarded");
                        BondOrder::Single
                    }
                    _ => BondOrder::Single,
                };
                pending = Some(PendingBond { order, symbol: c, position: i });
                i += 1;
            }
            '0'..='9' | '%' => {
                let (number, width) = if c == '%' {
                    let digit = |offset: usize| chars.get(i + offset).and_then(|d| d.to_digit(10));
                    match (digit(1), digit(2)) {
                        (Some(tens), Some(ones)) => ((tens * 10 + ones) as u8, 3),
                        _ => return Err(SmilesError::UnexpectedCharacter(c, i)),
                    }
                } else {
                    (c as u8 - b'0', 1)
                };
                let atom = current.ok_or(SmilesError::RingClosureWithoutAtom(number, i))?;
                let explicit = pending.take().map(|bond| bond.order);

                match rings.remove(&number) {
                    Some((opening, opening_order)) => {
                        let order = match (opening_order, explicit) {
                            (Some(a), Some(b)) if a != b => {
                                return Err(SmilesError::ConflictingRingBond(number, i))
                            }
                            (a, b) => a.or(b).unwrap_or_else(|| implicit_order(&mol, opening, atom)),
                        };
                        if opening == atom || mol.find_edge(opening, atom).is_some() {
                            return Err(SmilesError::InvalidRingBond(number, i));
                        }
                        mol.add_edge(opening, atom, Bond::new(order));
                    }
                    None => {
                        rings.insert(number, (atom, explicit));
                    }
                }
                i += width;
            }
            '[' => {
                let end = chars[i..]
                    .iter()
                    .position(|&x| x == ']')
                    .map(|offset| i + offset)
                    .ok_or_else(|| SmilesError::MalformedAtom {
                        token: chars[i..].iter().collect(),
                        reason: "unterminated bracket atom".to_string(),
                    })?;
                let token: String = chars[i..=end].iter().collect();
                let atom = parse_atom(&token)?;
                attach(&mut mol, &mut current, &mut pending, atom);
                i = end + 1;
            }
            '*' | 'A'..='Z' | 'a'..='z' => {
                let token = organic_token(&chars, i).ok_or_else(|| SmilesError::UnknownAtom(c.to_string(), i))?;
                let atom = parse_atom(token)?;
                attach(&mut mol, &mut current, &mut pending, atom);
                i += token.len();
            }
            _ => return Err(SmilesError::UnexpectedCharacter(c, i)),
        }
    }

    if let Some(bond) = pending {
        return Err(SmilesError::DanglingBond(bond.symbol, bond.position));
    }
    if !branch_stack.is_empty() {
        return Err(SmilesError::UnmatchedBranchOpen(branch_stack.len()));
    }
    if !rings.is_empty() {
        return Err(SmilesError::UnclosedRing(rings.into_keys().collect()));
    }
    Ok(mol)
}

/// Replace the aromaticity as written with the aromaticity the graph
/// supports. Aromatic atoms keep one missing bond for the delocalized double
/// bond when their hydrogens are inferred.
fn reinterpret_aromaticity(mol: &mut MoleculeGraph) -> Result<(), SmilesError> {
    let mut aromatic: BTreeSet<NodeIndex> = mol.node_indices().filter(|&node| mol[node].aromatic).collect();
    for edge in mol.edge_references() {
        if edge.weight().is_aromatic() {
            aromatic.insert(edge.source());
            aromatic.insert(edge.target());
        }
    }

    for bond in mol.edge_weights_mut() {
        if bond.is_aromatic() {
            bond.order = Some(BondOrder::Single);
        }
    }
    for &node in &aromatic {
        if mol[node].hcount.is_none() {
            let missing = bonds_missing(mol, node, true)?;
            mol[node].hcount = Some(missing.saturating_sub(1));
        }
    }
    fill_valence(mol, &FillOptions::default())?;

    let aromatic: Vec<NodeIndex> = aromatic.into_iter().collect();
    mark_aromatic_atoms(mol, Some(&aromatic))?;
    mark_aromatic_edges(mol);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_logging;

    fn read(smiles: &str) -> MoleculeGraph {
        read_smiles(smiles, &ReadOptions::default()).unwrap()
    }

    fn hcounts(mol: &MoleculeGraph) -> Vec<Option<u32>> {
        mol.node_weights().map(|atom| atom.hcount).collect()
    }

    fn orders(mol: &MoleculeGraph) -> Vec<Option<BondOrder>> {
        mol.edge_weights().map(|bond| bond.order).collect()
    }

    fn count_orders(mol: &MoleculeGraph, order: BondOrder) -> usize {
        mol.edge_weights().filter(|bond| bond.order == Some(order)).count()
    }

    #[test]
    fn test_parse_ethanol() {
        init_logging("trace");
        let mol = read("CCO");
        assert_eq!(mol.node_count(), 3);
        assert_eq!(
            mol.node_weights().map(Atom::symbol).collect::<Vec<_>>(),
            vec!["C", "C", "O"]
        );
        assert_eq!(hcounts(&mol), vec![Some(3), Some(2), Some(1)]);
        assert_eq!(orders(&mol), vec![Some(BondOrder::Single); 2]);
    }

    #[test]
    fn test_parse_isobutane() {
        let mol = read("CC(C)C");
        assert_eq!(mol.node_count(), 4);
        assert_eq!(mol.edge_count(), 3);
        let center = NodeIndex::new(1);
        assert_eq!(mol.neighbors(center).count(), 3);
        assert_eq!(mol[center].hcount, Some(1));
    }

    #[test]
    fn test_parse_benzene() {
        let mol = read("c1ccccc1");
        assert_eq!(mol.node_count(), 6);
        assert_eq!(mol.edge_count(), 6);
        assert!(mol.node_weights().all(|atom| atom.aromatic && atom.hcount == Some(1)));
        assert_eq!(orders(&mol), vec![Some(BondOrder::Aromatic); 6]);
    }

    #[test]
    fn test_parse_pyridine() {
        let mol = read("c1ccncc1");
        assert!(mol.node_weights().all(|atom| atom.aromatic));
        assert_eq!(mol[NodeIndex::new(3)].hcount, Some(0));
        assert_eq!(count_orders(&mol, BondOrder::Aromatic), 6);
    }

    #[test]
    fn test_parse_naphthalene() {
        let mol = read("c1ccc2ccccc2c1");
        assert_eq!(mol.node_count(), 10);
        assert_eq!(mol.edge_count(), 11);
        assert!(mol.node_weights().all(|atom| atom.aromatic));
        assert_eq!(count_orders(&mol, BondOrder::Aromatic), 11);
        // The two fusion atoms carry no hydrogens.
        assert_eq!(mol.node_weights().filter(|atom| atom.hcount == Some(0)).count(), 2);
    }

    #[test]
    fn furan_is_kekulized() {
        let mol = read("o1cccc1");
        assert!(mol.node_weights().all(|atom| !atom.aromatic));
        assert_eq!(mol[NodeIndex::new(0)].hcount, Some(0));
        assert_eq!(count_orders(&mol, BondOrder::Double), 2);
        assert_eq!(count_orders(&mol, BondOrder::Aromatic), 0);
    }

    #[test]
    fn aromatic_bond_between_aliphatic_atoms() {
        let mol = read("C:C");
        assert_eq!(orders(&mol), vec![Some(BondOrder::Double)]);
        assert_eq!(hcounts(&mol), vec![Some(2), Some(2)]);
    }

    #[test]
    fn odd_aromatic_ring_is_rejected() {
        let err = read_smiles("c1cccc1", &ReadOptions::default()).unwrap_err();
        assert_eq!(
            err,
            SmilesError::Molecule(MoleculeError::Kekulization { atoms: vec![0, 1, 2, 3, 4] })
        );
    }

    #[test]
    fn aromaticity_as_written() {
        let options = ReadOptions {
            reinterpret_aromatic: false,
            ..Default::default()
        };
        let mol = read_smiles("c1ccccc1", &options).unwrap();
        assert!(mol.node_weights().all(|atom| atom.aromatic && atom.hcount == Some(1)));
        assert_eq!(orders(&mol), vec![Some(BondOrder::Aromatic); 6]);
    }

    #[test]
    fn bracket_atoms() {
        let mol = read("[13CH3-:2]O");
        let carbon = &mol[NodeIndex::new(0)];
        assert_eq!(carbon.charge, -1);
        assert_eq!(carbon.hcount, Some(3));
        assert_eq!(carbon.isotope, Some(13));
        assert_eq!(carbon.class, Some(2));
        assert_eq!(mol[NodeIndex::new(1)].hcount, Some(1));

        let radical = read("[CH3]");
        assert_eq!(hcounts(&radical), vec![Some(3)]);
    }

    #[test]
    fn explicit_hydrogens() {
        let options = ReadOptions {
            explicit_hydrogen: true,
            ..Default::default()
        };
        let methane = read_smiles("C", &options).unwrap();
        assert_eq!(methane.node_count(), 5);
        assert_eq!(methane.edge_count(), 4);
        assert!(methane.node_weights().all(|atom| atom.hcount.is_none()));

        let folded = read("[H]C([H])([H])[H]");
        assert_eq!(folded.node_count(), 1);
        assert_eq!(hcounts(&folded), vec![Some(4)]);
    }

    #[test]
    fn special_hydrogens_stay() {
        let hydrogen = read("[H][H]");
        assert_eq!(hydrogen.node_count(), 2);
        assert_eq!(hcounts(&hydrogen), vec![Some(0), Some(0)]);

        let deuterated = read("[2H]C");
        assert_eq!(deuterated.node_count(), 2);
        assert_eq!(deuterated[NodeIndex::new(1)].hcount, Some(3));
    }

    #[test]
    fn ring_closure_bonds() {
        let opening = read("C=1CCCCC1");
        let closing = read("C1CCCCC=1");
        for mol in [&opening, &closing] {
            let edge = mol.find_edge(NodeIndex::new(0), NodeIndex::new(5)).unwrap();
            assert_eq!(mol[edge].order, Some(BondOrder::Double));
        }
        let both = read("C=1CCCCC=1");
        assert_eq!(count_orders(&both, BondOrder::Double), 1);

        let percent = read("C%10CC%10");
        assert_eq!(percent.edge_count(), 3);
    }

    #[test]
    fn disconnected_fragments() {
        let salt = read("[Na+].[Cl-]");
        assert_eq!(salt.node_count(), 2);
        assert_eq!(salt.edge_count(), 0);
        assert_eq!(salt[NodeIndex::new(0)].charge, 1);
        assert_eq!(salt[NodeIndex::new(1)].charge, -1);
    }

    #[test]
    fn stereo_bonds_read_as_single() {
        let mol = read("F/C=C/F");
        assert_eq!(
            orders(&mol),
            vec![Some(BondOrder::Single), Some(BondOrder::Double), Some(BondOrder::Single)]
        );
    }

    #[test]
    fn organic_subset_tokens() {
        let mol = read("ClCBr");
        assert_eq!(
            mol.node_weights().map(Atom::symbol).collect::<Vec<_>>(),
            vec!["Cl", "C", "Br"]
        );
        let wildcard = read("*C");
        assert!(wildcard[NodeIndex::new(0)].is_wildcard());
        assert_eq!(wildcard[NodeIndex::new(0)].hcount, Some(0));
        assert_eq!(wildcard[NodeIndex::new(1)].hcount, Some(3));
    }

    #[test]
    fn test_ciprofloxacin() {
        let mol = read("C1CNCCN1c(c2)c(F)cc3c2N(C4CC4)C=C(C3=O)C(=O)O");
        assert_eq!(mol.node_count(), 24);
        assert_eq!(mol.node_weights().filter(|atom| atom.aromatic).count(), 6);
    }

    #[test]
    fn syntax_errors() {
        let cases = [
            ("C(", SmilesError::UnmatchedBranchOpen(1)),
            ("C)", SmilesError::UnmatchedBranchClose(1)),
            ("(C", SmilesError::BranchWithoutAtom(0)),
            ("=C", SmilesError::BondWithoutAtom('=', 0)),
            ("C=", SmilesError::DanglingBond('=', 1)),
            ("C=(C)", SmilesError::DanglingBond('=', 1)),
            ("C==C", SmilesError::UnexpectedCharacter('=', 2)),
            ("1C", SmilesError::RingClosureWithoutAtom(1, 0)),
            ("C1CC", SmilesError::UnclosedRing(vec![1])),
            ("C11", SmilesError::InvalidRingBond(1, 2)),
            ("C12CC12", SmilesError::InvalidRingBond(2, 6)),
            ("C=1CC#1", SmilesError::ConflictingRingBond(1, 6)),
            ("CX", SmilesError::UnknownAtom("X".to_string(), 1)),
            ("C?C", SmilesError::UnexpectedCharacter('?', 1)),
            ("C%1", SmilesError::UnexpectedCharacter('%', 1)),
        ];
        for (smiles, expected) in cases {
            assert_eq!(read_smiles(smiles, &ReadOptions::default()).unwrap_err(), expected, "{smiles}");
        }
        assert!(matches!(
            read_smiles("C[CH3", &ReadOptions::default()),
            Err(SmilesError::MalformedAtom { .. })
        ));
        assert!(matches!(
            read_smiles("[HH]", &ReadOptions::default()),
            Err(SmilesError::HydrogenWithHydrogens(_))
        ));
    }
}
