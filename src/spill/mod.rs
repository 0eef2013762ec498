pub mod spill_store;
pub use spill_store::*;

pub mod memory_spill_store;
pub use memory_spill_store::*;

pub mod json_file_spill_store;
pub use json_file_spill_store::*;
