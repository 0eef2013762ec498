pub mod pages_index;
pub use pages_index::*;

pub mod group_by_hash;
pub use group_by_hash::*;

pub mod join_compiler;
pub use join_compiler::*;
