use std::fmt::Write as FmtWrite;
use std::io::Write;

use anyhow::{bail, Context, Result};
use petgraph::prelude::EdgeRef;
use tracing::*;

use crate::{Atom, Bond, BondOrder, MoleculeGraph};

/// Visualizes the MoleculeGraph by exporting it to a DOT file and optionally
/// rendering it as an image with Graphviz (`dot` must be on the `PATH`).
pub fn visualize_graph(mol: &MoleculeGraph, output_dot: &str, output_image: Option<&str>) -> Result<()> {
    let dot_string = generate_dot(mol);

    let mut file = std::fs::File::create(output_dot).with_context(|| format!("Failed to create DOT file {output_dot}"))?;
    file.write_all(dot_string.as_bytes())
        .with_context(|| format!("Failed to write DOT file {output_dot}"))?;
    info!("DOT file saved to {output_dot}");

    if let Some(image_path) = output_image {
        let status = std::process::Command::new("dot")
            .args(["-Tpng", output_dot, "-o", image_path])
            .status()
            .context("Failed to execute Graphviz 'dot' command")?;

        if !status.success() {
            bail!("Graphviz 'dot' command failed with status: {status}");
        }
        info!("Image rendered to {image_path}");
    }

    Ok(())
}

/// Generates a DOT representation of the molecule. Double, triple and
/// quadruple bonds are drawn as parallel edges; aromatic bonds are dashed.
pub fn generate_dot(mol: &MoleculeGraph) -> String {
    let mut dot_output = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(dot_output, "graph Molecule {{");
    let _ = writeln!(dot_output, "    layout=neato; rankdir=LR;");
    let _ = writeln!(dot_output, "    multiedge=true;");

    for node in mol.node_indices() {
        let atom = &mol[node];
        let _ = writeln!(
            dot_output,
            "    {} [label=\"{}\", fontcolor=white, shape=circle, style=filled, fillcolor={}];",
            node.index(),
            atom_label(atom),
            atom_color(atom)
        );
    }

    for edge in mol.edge_references() {
        let (style, extra) = bond_to_style(edge.weight());
        let count = edge.weight().order.and_then(BondOrder::multiplicity).unwrap_or(1);
        for _ in 0..count {
            let _ = writeln!(
                dot_output,
                "    {} -- {} [style={}, penwidth=2{}];",
                edge.source().index(),
                edge.target().index(),
                style,
                extra
            );
        }
    }

    let _ = writeln!(dot_output, "}}");
    dot_output
}

/// The symbol with its hydrogens and charge, e.g. `NH3+`.
fn atom_label(atom: &Atom) -> String {
    let mut label = atom.symbol().to_string();
    match atom.hcount {
        Some(0) | None => {}
        Some(1) => label.push('H'),
        Some(n) => label.push_str(&format!("H{n}")),
    }
    match atom.charge {
        0 => {}
        1 => label.push('+'),
        -1 => label.push('-'),
        c if c > 0 => label.push_str(&format!("+{c}")),
        c => label.push_str(&c.to_string()),
    }
    label
}

fn atom_color(atom: &Atom) -> &'static str {
    match atom.symbol() {
        "C" => "black",
        "H" => "gray",
        "O" => "red",
        "N" => "blue",
        "Cl" => "darkgreen",
        "Br" => "brown",
        "F" => "pink",
        "I" => "purple",
        "S" => "gold",
        "P" => "orange",
        "B" => "salmon",
        "*" => "white",
        _ => "slategray",
    }
}

fn bond_to_style(bond: &Bond) -> (&'static str, &'static str) {
    if bond.is_aromatic() {
        ("dashed", ", color=purple")
    } else {
        ("solid", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{read_smiles, ReadOptions};

    #[test]
    fn test_atom_labels() {
        assert_eq!(atom_label(&Atom::new("C").with_hcount(3)), "CH3");
        assert_eq!(atom_label(&Atom::new("N").with_hcount(4).with_charge(1)), "NH4+");
        assert_eq!(atom_label(&Atom::new("O").with_charge(-2)), "O-2");
        assert_eq!(atom_label(&Atom::new("Fe").with_charge(3)), "Fe+3");
        assert_eq!(atom_label(&Atom::wildcard()), "*");
    }

    #[test]
    fn dot_for_methyl_ethanoate() {
        let mol = read_smiles("COC(C)=O", &ReadOptions::default()).unwrap();
        let dot = generate_dot(&mol);
        assert!(dot.starts_with("graph Molecule {"));
        assert!(dot.trim_end().ends_with('}'));
        assert!(dot.contains("0 [label=\"CH3\""));
        assert!(dot.contains("fillcolor=red"));
        // Three single bonds and one double bond drawn twice.
        assert_eq!(dot.matches(" -- ").count(), 5);
        assert_eq!(dot.matches("2 -- 4 ").count(), 2);
    }

    #[test]
    fn dot_for_benzene_is_dashed() {
        let mol = read_smiles("c1ccccc1", &ReadOptions::default()).unwrap();
        let dot = generate_dot(&mol);
        assert_eq!(dot.matches("style=dashed").count(), 6);
        assert!(!dot.contains("style=solid"));
    }

    #[test]
    fn writes_dot_file() {
        let mol = read_smiles("CCO", &ReadOptions::default()).unwrap();
        let path = std::env::temp_dir().join(format!("molgraph-ethanol-{}.dot", std::process::id()));
        let path = path.to_string_lossy().to_string();
        visualize_graph(&mol, &path, None).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, generate_dot(&mol));
        let _ = std::fs::remove_file(&path);
    }
}
