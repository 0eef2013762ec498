use std::sync::Arc;

use crate::{
    aggregation::LambdaProvider,
    operator::{JoinCompiler, PagesIndexFactory},
    session::Session,
    types::{LogicalType, SortOrder, TypeOperators},
};

/// Everything one use of an aggregate in one plan contributes to `bind`.
///
/// `source_types[c]` is the type of channel `c` of the pages the accumulators
/// will see; argument, mask and order-by channels all index into it.
#[derive(Debug, Clone)]
pub struct AccumulatorCallSite {
    pub argument_channels: Vec<usize>,
    pub mask_channel: Option<usize>,
    pub source_types: Vec<LogicalType>,
    pub order_by_channels: Vec<usize>,
    pub orderings: Vec<SortOrder>,
    pub pages_index_factory: PagesIndexFactory,
    pub distinct: bool,
    pub join_compiler: JoinCompiler,
    pub type_operators: TypeOperators,
    pub lambda_providers: Vec<LambdaProvider>,
    pub spill_enabled: bool,
    pub session: Arc<Session>,
}

impl AccumulatorCallSite {
    pub fn new(argument_channels: Vec<usize>, source_types: Vec<LogicalType>) -> Self {
        Self {
            argument_channels,
            mask_channel: None,
            source_types,
            order_by_channels: Vec::new(),
            orderings: Vec::new(),
            pages_index_factory: PagesIndexFactory::default(),
            distinct: false,
            join_compiler: JoinCompiler::default(),
            type_operators: TypeOperators::default(),
            lambda_providers: Vec::new(),
            spill_enabled: false,
            session: Arc::new(Session::default()),
        }
    }

    pub fn with_mask(mut self, channel: usize) -> Self {
        self.mask_channel = Some(channel);
        self
    }

    pub fn with_order_by(mut self, channels: Vec<usize>, orderings: Vec<SortOrder>) -> Self {
        self.order_by_channels = channels;
        self.orderings = orderings;
        self
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_lambdas(mut self, lambda_providers: Vec<LambdaProvider>) -> Self {
        self.lambda_providers = lambda_providers;
        self
    }

    pub fn with_spill(mut self, spill_enabled: bool) -> Self {
        self.spill_enabled = spill_enabled;
        self
    }

    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = session;
        self
    }

    pub fn with_pages_index_factory(mut self, factory: PagesIndexFactory) -> Self {
        self.pages_index_factory = factory;
        self
    }

    pub fn with_join_compiler(mut self, join_compiler: JoinCompiler) -> Self {
        self.join_compiler = join_compiler;
        self
    }

    pub fn with_type_operators(mut self, type_operators: TypeOperators) -> Self {
        self.type_operators = type_operators;
        self
    }

    /// Types of `channels`, or the first channel with no declared type.
    pub(crate) fn types_of(&self, channels: &[usize]) -> Result<Vec<LogicalType>, usize> {
        channels.iter()
            .map(|c| self.source_types.get(*c).copied().ok_or(*c))
            .collect()
    }
}
