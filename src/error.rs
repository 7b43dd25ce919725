use thiserror::Error;

/// Failures raised by the valence, hydrogen and aromaticity algorithms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("too many electrons ({electrons}) to fill the shells of {element} with charge {charge}")]
    ValenceOverflow {
        element: String,
        charge: i32,
        electrons: i64,
    },
    #[error("molecule cannot be kekulized: no perfect matching for delocalized atoms {atoms:?}")]
    Kekulization { atoms: Vec<usize> },
    #[error("hydrogen atom {atom} cannot carry implicit hydrogens")]
    HydrogenWithHydrogens { atom: usize },
}
