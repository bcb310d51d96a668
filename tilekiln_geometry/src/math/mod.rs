//! Small geometric helpers shared across the `geo` and `vector_tile` modules.

mod area;

pub use area::*;
