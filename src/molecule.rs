use std::fmt::{Display, Formatter, Result as FmtResult};

use petgraph::graph::UnGraph;

use crate::{
    aromatic, hydrogen, write, FillOptions, MoleculeError, SmilesError, Symbol,
};

/// An attributed, undirected molecular graph.
pub type MoleculeGraph = UnGraph<Atom, Bond>;

/// A single atom. Optional fields are genuinely optional: an absent `hcount`
/// means "infer it", while `Some(0)` means "known to have no hydrogens".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Atom {
    /// `None` is the wildcard `*`.
    pub element: Option<Symbol>,
    pub charge: i32,
    pub hcount: Option<u32>,
    pub aromatic: bool,
    pub isotope: Option<u32>,
    pub class: Option<u32>,
    /// Carried through untouched; never interpreted.
    pub stereo: Option<String>,
}

impl Atom {
    pub fn new(element: &str) -> Self {
        Self {
            element: Some(Symbol::new(element)),
            ..Default::default()
        }
    }

    /// A plain explicit hydrogen: no charge, not aromatic, no hcount.
    pub fn hydrogen() -> Self {
        Self {
            element: Some(Symbol::hydrogen()),
            ..Default::default()
        }
    }

    pub fn wildcard() -> Self {
        Self::default()
    }

    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_hcount(mut self, hcount: u32) -> Self {
        self.hcount = Some(hcount);
        self
    }

    pub fn with_aromatic(mut self, aromatic: bool) -> Self {
        self.aromatic = aromatic;
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.element.is_none()
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element.as_ref().is_some_and(Symbol::is_hydrogen)
    }

    /// The element symbol, or `*` for the wildcard.
    pub fn symbol(&self) -> &str {
        self.element.as_ref().map_or("*", Symbol::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// The bond's weight when counting valence; aromatic bonds count 1.5.
    pub fn weight(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Quadruple => 4.0,
            BondOrder::Aromatic => 1.5,
        }
    }

    /// The integral multiplicity, or `None` for aromatic bonds.
    pub fn multiplicity(self) -> Option<u8> {
        match self {
            BondOrder::Single => Some(1),
            BondOrder::Double => Some(2),
            BondOrder::Triple => Some(3),
            BondOrder::Quadruple => Some(4),
            BondOrder::Aromatic => None,
        }
    }

    /// Orders above four are clamped to a quadruple bond; zero has no order.
    pub fn from_multiplicity(multiplicity: u8) -> Option<Self> {
        match multiplicity {
            0 => None,
            1 => Some(BondOrder::Single),
            2 => Some(BondOrder::Double),
            3 => Some(BondOrder::Triple),
            _ => Some(BondOrder::Quadruple),
        }
    }
}

impl Display for BondOrder {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self.multiplicity() {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "1.5"),
        }
    }
}

/// A bond between two atoms. An absent order counts as a single bond.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bond {
    pub order: Option<BondOrder>,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self { order: Some(order) }
    }

    pub fn single() -> Self {
        Self::new(BondOrder::Single)
    }

    pub fn double() -> Self {
        Self::new(BondOrder::Double)
    }

    pub fn aromatic() -> Self {
        Self::new(BondOrder::Aromatic)
    }

    pub fn weight(&self) -> f64 {
        self.order.map_or(1.0, BondOrder::weight)
    }

    pub fn is_aromatic(&self) -> bool {
        self.order == Some(BondOrder::Aromatic)
    }
}

/// Method-style access to the chemistry operations on a [`MoleculeGraph`].
pub trait MoleculeExt {
    fn fill_valence(&mut self, options: &FillOptions) -> Result<(), MoleculeError>;
    fn correct_aromatic_rings(&mut self) -> Result<(), MoleculeError>;
    fn add_explicit_hydrogens(&mut self);
    fn remove_explicit_hydrogens(&mut self);
    fn to_smiles(&self) -> Result<String, SmilesError>;
}

impl MoleculeExt for MoleculeGraph {
    fn fill_valence(&mut self, options: &FillOptions) -> Result<(), MoleculeError> {
        hydrogen::fill_valence(self, options)
    }

    fn correct_aromatic_rings(&mut self) -> Result<(), MoleculeError> {
        aromatic::correct_aromatic_rings(self)
    }

    fn add_explicit_hydrogens(&mut self) {
        hydrogen::add_explicit_hydrogens(self)
    }

    fn remove_explicit_hydrogens(&mut self) {
        hydrogen::remove_explicit_hydrogens(self)
    }

    fn to_smiles(&self) -> Result<String, SmilesError> {
        write::write_smiles(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_bond_order_weighs_one() {
        assert_eq!(Bond::default().weight(), 1.0);
        assert_eq!(Bond::aromatic().weight(), 1.5);
        assert_eq!(Bond::new(BondOrder::Triple).weight(), 3.0);
    }

    #[test]
    fn multiplicity_round_trip() {
        for order in [BondOrder::Single, BondOrder::Double, BondOrder::Triple, BondOrder::Quadruple] {
            let n = order.multiplicity().unwrap();
            assert_eq!(BondOrder::from_multiplicity(n), Some(order));
        }
        assert_eq!(BondOrder::from_multiplicity(0), None);
        assert_eq!(BondOrder::from_multiplicity(7), Some(BondOrder::Quadruple));
        assert_eq!(BondOrder::Aromatic.multiplicity(), None);
    }

    #[test]
    fn atom_symbols() {
        assert_eq!(Atom::wildcard().symbol(), "*");
        assert_eq!(Atom::new("cl").symbol(), "Cl");
        assert!(Atom::hydrogen().is_hydrogen());
        assert!(Atom::hydrogen().hcount.is_none());
    }

    #[test]
    fn extension_methods_delegate() {
        let mut mol = MoleculeGraph::new_undirected();
        let c = mol.add_node(Atom::new("C"));
        let o = mol.add_node(Atom::new("O"));
        mol.add_edge(c, o, Bond::single());
        mol.fill_valence(&FillOptions::default()).unwrap();
        assert_eq!(mol[c].hcount, Some(3));
        assert_eq!(mol[o].hcount, Some(1));
        assert_eq!(mol.to_smiles().unwrap(), "CO");

        mol.add_explicit_hydrogens();
        assert_eq!(mol.node_count(), 6);
        mol.remove_explicit_hydrogens();
        assert_eq!(mol.node_count(), 2);
        assert_eq!(mol[c].hcount, Some(3));
    }
}
