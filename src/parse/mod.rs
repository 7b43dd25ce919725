mod atom;
pub use atom::*;

mod smiles;
pub use smiles::*;
