use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use molgraph::*;
use petgraph::visit::EdgeRef;

/// Read SMILES strings and print the inferred molecular graphs.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Keep implicit hydrogens as explicit hydrogen atoms
    #[arg(long = "explicit-h")]
    explicit_h: bool,

    /// Take aromatic atoms and bonds as written instead of re-deriving them
    #[arg(long = "no-aromatic")]
    no_aromatic: bool,

    /// Write a Graphviz DOT file for each molecule
    #[arg(long, value_name = "FILE")]
    dot: Option<PathBuf>,

    /// SMILES strings to read
    #[arg(required = true)]
    smiles: Vec<String>,
}

/// The DOT file for the `n`th of `total` inputs; with several inputs the
/// file name gets an `n-` prefix.
fn dot_path_for(path: &Path, n: usize, total: usize) -> PathBuf {
    match path.file_name() {
        Some(name) if total > 1 => path.with_file_name(format!("{n}-{}", name.to_string_lossy())),
        _ => path.to_path_buf(),
    }
}

fn main() -> Result<()> {
    init_logging(&std::env::var("MOLGRAPH_LOG").unwrap_or_else(|_| "warn".to_string()));

    let cli = Cli::parse();
    let options = ReadOptions {
        explicit_hydrogen: cli.explicit_h,
        reinterpret_aromatic: !cli.no_aromatic,
    };

    for (n, smiles) in cli.smiles.iter().enumerate() {
        let mol = read_smiles(smiles, &options).with_context(|| format!("Failed to read SMILES {smiles:?}"))?;

        println!("{smiles}");
        println!("  {:>4}  {:<6} {:>6} {:>6}  aromatic", "atom", "symbol", "charge", "hcount");
        for node in mol.node_indices() {
            let atom = &mol[node];
            let hcount = atom.hcount.map_or_else(|| "-".to_string(), |h| h.to_string());
            println!(
                "  {:>4}  {:<6} {:>6} {:>6}  {}",
                node.index(),
                atom.symbol(),
                atom.charge,
                hcount,
                atom.aromatic
            );
        }
        for edge in mol.edge_references() {
            let order = edge.weight().order.map_or_else(|| "-".to_string(), |o| o.to_string());
            println!("  bond {}-{}: {}", edge.source().index(), edge.target().index(), order);
        }
        let written = mol.to_smiles().with_context(|| format!("Failed to write SMILES for {smiles:?}"))?;
        println!("  smiles: {written}");

        if let Some(path) = &cli.dot {
            let path = dot_path_for(path, n, cli.smiles.len());
            visualize_graph(&mol, &path.to_string_lossy(), None)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags_and_inputs() {
        let cli = Cli::try_parse_from(["molgraph", "--explicit-h", "--dot", "out/mol.dot", "CCO", "c1ccccc1"]).unwrap();
        assert!(cli.explicit_h);
        assert!(!cli.no_aromatic);
        assert_eq!(cli.dot, Some(PathBuf::from("out/mol.dot")));
        assert_eq!(cli.smiles, vec!["CCO", "c1ccccc1"]);
    }

    #[test]
    fn rejects_unknown_flags_and_missing_inputs() {
        assert!(Cli::try_parse_from(["molgraph", "-x", "CCO"]).is_err());
        assert!(Cli::try_parse_from(["molgraph", "--no-aromatic"]).is_err());
    }

    #[test]
    fn dot_prefix_only_touches_the_file_name() {
        let path = Path::new("out/mol.dot");
        assert_eq!(dot_path_for(path, 0, 1), PathBuf::from("out/mol.dot"));
        assert_eq!(dot_path_for(path, 1, 2), PathBuf::from("out/1-mol.dot"));
        assert_eq!(dot_path_for(Path::new("mol.dot"), 0, 3), PathBuf::from("0-mol.dot"));
    }
}
