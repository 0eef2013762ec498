pub mod row_aggregation;
pub use row_aggregation::*;

pub mod count_impl;
pub use count_impl::*;

pub mod sum_impl;
pub use sum_impl::*;

pub mod avg_impl;
pub use avg_impl::*;

pub mod array_agg_impl;
pub use array_agg_impl::*;

pub mod reduce_agg_impl;
pub use reduce_agg_impl::*;
