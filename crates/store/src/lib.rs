//! `patterndiff-store`: the append-only pattern blob store and the
//! observer-driven emitters that turn a [`patterndiff_core::Hit`] into
//! readable text, XML, a bare count, or a programmatic recommendation.

pub mod emitters;
pub mod error;
pub mod render;
pub mod storage;

pub use emitters::{Change, CounterEmitter, Emitter, ReadableEmitter, RecommendationEmitter, XmlEmitter};
pub use error::StoreError;
pub use render::Renderer;
pub use storage::StorageContext;
