pub mod masking;
pub use masking::*;

pub mod distinct;
pub use distinct::*;

pub mod ordering;
pub use ordering::*;

pub mod spilling;
pub use spilling::*;
