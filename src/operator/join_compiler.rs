use tracing::trace;

use crate::{operator::GroupByHash, types::{LogicalType, TypeOperators}};

/// Builds typed hashing structures over a fixed list of column types.
#[derive(Debug, Clone, Default)]
pub struct JoinCompiler {
    type_operators: TypeOperators,
}

impl JoinCompiler {
    pub fn new(type_operators: TypeOperators) -> Self { Self { type_operators } }

    pub fn compile_group_by_hash(&self, types: Vec<LogicalType>) -> GroupByHash {
        trace!(?types, "compiling group by hash");
        GroupByHash::new(types, self.type_operators)
    }
}
