//! Core world data types
//!
//! Block identifiers and chunk coordinates shared by the world and the
//! persistence layer.

mod block;
mod position;

pub use block::BlockId;
pub use position::ChunkCoord;
