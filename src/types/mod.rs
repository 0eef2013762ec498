pub mod logical_type;
pub use logical_type::*;

pub mod sort_order;
pub use sort_order::*;

pub mod value_key;
pub use value_key::*;

pub mod type_operators;
pub use type_operators::*;
