//! The handful of graph algorithms the chemistry needs, kept behind plain
//! functions so the rest of the crate never reaches into petgraph's
//! algorithm modules directly.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::{
    algo::Matching,
    graph::{EdgeIndex, NodeIndex, UnGraph},
    unionfind::UnionFind,
    visit::EdgeRef,
};

use crate::MoleculeGraph;

/// A subgraph whose node and edge weights are their indices in the parent graph.
pub type Subgraph = UnGraph<NodeIndex, EdgeIndex>;

/// The subgraph induced by `nodes`: those nodes and every edge between them.
pub fn induced_subgraph(mol: &MoleculeGraph, nodes: &HashSet<NodeIndex>) -> Subgraph {
    mol.filter_map(
        |node, _| nodes.contains(&node).then_some(node),
        |edge, _| Some(edge),
    )
}

/// Restrict a subgraph further, keeping parent indices as weights.
pub fn restrict(graph: &Subgraph, nodes: &[NodeIndex]) -> Subgraph {
    let keep: HashSet<NodeIndex> = nodes.iter().copied().collect();
    graph.filter_map(
        |node, parent| keep.contains(&node).then_some(*parent),
        |_, parent| Some(*parent),
    )
}

/// Connected components, each sorted, ordered by their smallest node.
pub fn connected_components<N, E>(graph: &UnGraph<N, E>) -> Vec<Vec<NodeIndex>> {
    let mut sets = UnionFind::<usize>::new(graph.node_count());
    for edge in graph.edge_references() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let mut components: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
    let mut first_member: HashMap<usize, usize> = HashMap::new();
    for node in graph.node_indices() {
        let root = sets.find(node.index());
        let key = *first_member.entry(root).or_insert(node.index());
        components.entry(key).or_default().push(node);
    }
    components.into_values().collect()
}

/// A fundamental cycle basis: one cycle per non-tree edge of a depth-first
/// spanning forest. Roots are taken in ascending node order.
pub fn cycle_basis<N, E>(graph: &UnGraph<N, E>) -> Vec<Vec<NodeIndex>> {
    let mut cycles = Vec::new();
    let mut seen: HashSet<NodeIndex> = HashSet::new();

    for root in graph.node_indices() {
        if seen.contains(&root) {
            continue;
        }
        let mut stack = vec![root];
        let mut pred: HashMap<NodeIndex, NodeIndex> = HashMap::from([(root, root)]);
        let mut used: HashMap<NodeIndex, HashSet<NodeIndex>> = HashMap::from([(root, HashSet::new())]);

        while let Some(z) = stack.pop() {
            for nbr in graph.neighbors(z) {
                if !used.contains_key(&nbr) {
                    pred.insert(nbr, z);
                    stack.push(nbr);
                    used.insert(nbr, HashSet::from([z]));
                } else if nbr == z {
                    cycles.push(vec![z]);
                } else if !used[&z].contains(&nbr) {
                    // Walk back from z until reaching a node that nbr has used.
                    let mut cycle = vec![nbr, z];
                    let mut p = pred[&z];
                    while !used[&nbr].contains(&p) {
                        cycle.push(p);
                        p = pred[&p];
                    }
                    cycle.push(p);
                    cycles.push(cycle);
                    if let Some(set) = used.get_mut(&nbr) {
                        set.insert(z);
                    }
                }
            }
        }
        seen.extend(pred.keys().copied());
    }
    cycles
}

/// A maximum-cardinality matching (Gabow's algorithm for general graphs).
pub fn maximum_matching<N, E>(graph: &UnGraph<N, E>) -> Matching<&UnGraph<N, E>> {
    petgraph::algo::maximum_matching(graph)
}

/// Whether `matching` covers every node of `graph`.
pub fn is_perfect_matching<N, E>(graph: &UnGraph<N, E>, matching: &Matching<&UnGraph<N, E>>) -> bool {
    matching.len() * 2 == graph.node_count()
}
