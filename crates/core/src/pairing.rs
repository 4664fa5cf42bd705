//! The similarity pairing map `P: (NodeId, NodeId) -> f64` threaded through
//! the differencer, the edit-script generator and the refiner's distance
//! calculation. Kept as its own tiny module since it is shared by all three
//! rather than owned by any single one of them.

use std::collections::HashMap;

use crate::arena::NodeId;

/// Sparse by design: a pair absent from the map has similarity 0. Only
/// pairs that clear the differencer's `f` threshold are ever inserted.
pub type Pairing = HashMap<(NodeId, NodeId), f64>;

/// Collapses a many-to-many [`Pairing`] into a one-to-one matching: visit
/// pairs from highest to lowest score and greedily keep a pair only if
/// neither of its two nodes has already been claimed by a higher-scoring
/// pair.
pub fn remove_duplicates(pairing: &Pairing) -> Pairing {
  let mut entries: Vec<(&(NodeId, NodeId), &f64)> = pairing.iter().collect();
  entries.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

  let mut matched: std::collections::HashSet<NodeId> = std::collections::HashSet::new();
  let mut out = Pairing::new();
  for (&(a, b), &score) in entries {
    if !matched.contains(&a) && !matched.contains(&b) {
      out.insert((a, b), score);
      matched.insert(a);
      matched.insert(b);
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arena::Arena;
  use crate::node::Node;

  #[test]
  fn keeps_only_the_highest_scoring_pair_per_node() {
    let mut arena = Arena::new();
    let a1 = arena.alloc(Node::Variable { name: "a1".into() });
    let a2 = arena.alloc(Node::Variable { name: "a2".into() });
    let b1 = arena.alloc(Node::Variable { name: "b1".into() });

    let mut pairing = Pairing::new();
    pairing.insert((a1, b1), 0.9);
    pairing.insert((a2, b1), 0.4);

    let deduped = remove_duplicates(&pairing);
    assert_eq!(deduped.len(), 1);
    assert_eq!(deduped.get(&(a1, b1)), Some(&0.9));
  }
}
