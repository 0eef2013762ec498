pub mod block;
pub use block::*;

pub mod page;
pub use page::*;

pub mod group_by_id_block;
pub use group_by_id_block::*;
