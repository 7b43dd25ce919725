//! Reading and writing SMILES, and the chemistry that makes the resulting
//! molecular graphs consistent: implicit hydrogens, bond orders and
//! aromaticity.

use tracing::metadata::LevelFilter;

mod error;
pub use error::*;

mod symbol;
pub use symbol::*;

mod molecule;
pub use molecule::*;

mod valence;
pub use valence::*;

mod hydrogen;
pub use hydrogen::*;

pub mod graph;

mod aromatic;
pub use aromatic::*;

mod parse;
pub use parse::*;

mod write;
pub use write::*;

mod visualize;
pub use visualize::*;

/// Install a stderr `tracing` subscriber at `level` ("trace", "debug", ...).
/// Unknown levels fall back to `info`; later calls are no-ops.
pub fn init_logging(level: &str) {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}
