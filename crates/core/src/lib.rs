//! `patterndiff-core`: the language-independent wrapped AST model, tree
//! differencer, edit-script generator/applicator and streaming matcher that
//! together make up the core of the pattern-mining engine.
//!
//! This crate never parses source text. A host-language crate (e.g.
//! `patterndiff-lang` for Python) implements [`pattern::SourceParser`] and
//! supplies the actual `ast::parse` + wrapping-visitor step; everything
//! downstream of "I already have a wrapped tree" lives here.

pub mod arena;
pub mod differ;
pub mod edit_script;
pub mod error;
pub mod matcher;
pub mod meta_var;
pub mod node;
pub mod pairing;
pub mod pattern;

pub use arena::{Arena, NodeId};
pub use differ::Differencer;
pub use edit_script::{EditScript, Op};
pub use error::CoreError;
pub use matcher::{HostDocument, Hit, LineSpan, Recommender};
pub use meta_var::{IndexAllocator, WildcardBlocks};
pub use node::{ConstKind, Node, OpKind, Order};
pub use pairing::Pairing;
pub use pattern::{Pattern, SourceParser};
