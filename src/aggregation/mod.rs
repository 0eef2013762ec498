pub mod aggregation_error;
pub use aggregation_error::*;

pub mod state_descriptor;
pub use state_descriptor::*;

pub mod accumulator_state;
pub use accumulator_state::*;

pub mod lambda_provider;
pub use lambda_provider::*;

pub mod accumulator;
pub use accumulator::*;

pub mod grouped_accumulator;
pub use grouped_accumulator::*;

pub mod construction;
pub use construction::*;

pub mod aggregate_impl;
pub use aggregate_impl::*;

pub mod call_site;
pub use call_site::*;

pub mod binder;
pub use binder::*;

pub mod factory;
pub use factory::*;

pub mod aggregate_registry;
pub use aggregate_registry::*;

pub mod decorations;

pub mod functions;
pub use functions::*;
