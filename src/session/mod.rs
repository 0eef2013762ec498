pub mod spill_config;
pub use spill_config::*;

pub mod session;
pub use session::*;
