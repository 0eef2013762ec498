use std::{fmt, sync::Arc};

use tracing::{debug, trace};

use crate::{
    aggregation::{
        decorations::{
            DistinctingAccumulator, DistinctingGroupedAccumulator, MaskedAccumulator, MaskedGroupedAccumulator,
            OrderingAccumulator, OrderingGroupedAccumulator, SpillingGroupedAccumulator,
        },
        Accumulator, AccumulatorArgs, AccumulatorCallSite, AccumulatorStateDescriptor, AggregationError,
        GroupedAccumulator, GroupedConstructor, ScalarConstructor,
    },
    types::LogicalType,
};

/// One wrapper layer between the caller and the raw accumulator,
/// listed outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationStage {
    /// Drop rows whose mask cell is not `true`.
    Mask(usize),
    /// Feed each distinct argument tuple once.
    Distinct,
    /// Buffer, sort and replay input at finalization.
    Ordering,
    /// Grouped only: checkpoint state to the session's spill store on request.
    Spill,
}

/// Creates accumulators for one use of an aggregate in one plan.
pub trait AccumulatorFactory: Send + Sync {
    fn input_channels(&self) -> &[usize];

    fn has_order_by(&self) -> bool;

    fn has_distinct(&self) -> bool;

    fn stages(&self) -> &[DecorationStage];

    fn create_accumulator(&self) -> Result<Box<dyn Accumulator>, AggregationError>;

    /// Undecorated accumulator that only consumes intermediate states.
    fn create_intermediate_accumulator(&self) -> Result<Box<dyn Accumulator>, AggregationError>;

    fn create_grouped_accumulator(&self) -> Result<Box<dyn GroupedAccumulator>, AggregationError>;

    fn create_grouped_intermediate_accumulator(&self) -> Result<Box<dyn GroupedAccumulator>, AggregationError>;
}

pub struct GenericAccumulatorFactory {
    function: String,
    state_descriptors: Arc<[AccumulatorStateDescriptor]>,
    scalar: ScalarConstructor,
    grouped: GroupedConstructor,
    has_remove_input: bool,
    call_site: AccumulatorCallSite,
    stages: Vec<DecorationStage>,
}

impl fmt::Debug for GenericAccumulatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericAccumulatorFactory")
            .field("function", &self.function)
            .field("input_channels", &self.call_site.argument_channels)
            .field("stages", &self.stages)
            .finish()
    }
}

impl GenericAccumulatorFactory {
    pub(crate) fn new(
        function: String,
        state_descriptors: Arc<[AccumulatorStateDescriptor]>,
        scalar: ScalarConstructor,
        grouped: GroupedConstructor,
        has_remove_input: bool,
        call_site: AccumulatorCallSite,
    ) -> Self {
        let mut stages = Vec::new();
        if let Some(mask) = call_site.mask_channel {
            stages.push(DecorationStage::Mask(mask));
        }
        if call_site.distinct {
            stages.push(DecorationStage::Distinct);
        }
        if !call_site.order_by_channels.is_empty() {
            stages.push(DecorationStage::Ordering);
        }
        if call_site.spill_enabled && stages.iter().all(|s| matches!(s, DecorationStage::Mask(_))) {
            stages.push(DecorationStage::Spill);
        } else if call_site.spill_enabled {
            debug!(function = %function, "spill disabled for DISTINCT/ORDER BY aggregate");
        }

        Self { function, state_descriptors, scalar, grouped, has_remove_input, call_site, stages }
    }

    pub fn function(&self) -> &str { &self.function }
    pub fn call_site(&self) -> &AccumulatorCallSite { &self.call_site }

    fn has_stage(&self, stage: DecorationStage) -> bool {
        self.stages.contains(&stage)
    }

    /// Whether the outermost accumulator may forward `remove_input`.
    fn allows_remove_input(&self) -> bool {
        self.has_remove_input && !self.has_stage(DecorationStage::Distinct) && !self.has_stage(DecorationStage::Ordering)
    }

    fn args(&self, input_channels: Vec<usize>) -> AccumulatorArgs {
        AccumulatorArgs {
            state_descriptors: Arc::clone(&self.state_descriptors),
            input_channels,
            // masking is applied by the outermost decoration
            mask_channel: None,
            lambda_providers: self.call_site.lambda_providers.clone(),
        }
    }

    /// Channels the raw accumulator reads: the call-site channels, or
    /// `0..n` when the ordering stage replays a compacted page.
    fn raw_input_channels(&self) -> Vec<usize> {
        if self.has_stage(DecorationStage::Ordering) {
            (0..self.call_site.argument_channels.len()).collect()
        } else {
            self.call_site.argument_channels.clone()
        }
    }

    fn types_of(&self, channels: &[usize]) -> Result<Vec<LogicalType>, AggregationError> {
        self.call_site.types_of(channels)
            .map_err(|channel| AggregationError::ChannelOutOfBounds { channel, channels: self.call_site.source_types.len() })
    }
}

impl AccumulatorFactory for GenericAccumulatorFactory {
    fn input_channels(&self) -> &[usize] { &self.call_site.argument_channels }

    fn has_order_by(&self) -> bool { self.has_stage(DecorationStage::Ordering) }

    fn has_distinct(&self) -> bool { self.has_stage(DecorationStage::Distinct) }

    fn stages(&self) -> &[DecorationStage] { &self.stages }

    fn create_accumulator(&self) -> Result<Box<dyn Accumulator>, AggregationError> {
        let cs = &self.call_site;
        let mut accumulator = (self.scalar)(self.args(self.raw_input_channels()))?;

        if self.has_order_by() {
            let channels = [cs.argument_channels.as_slice(), cs.order_by_channels.as_slice()].concat();
            accumulator = Box::new(OrderingAccumulator::new(
                accumulator,
                cs.argument_channels.clone(),
                cs.order_by_channels.clone(),
                cs.orderings.clone(),
                cs.pages_index_factory.new_pages_index(self.types_of(&channels)?),
                cs.type_operators,
            ));
        }
        if self.has_distinct() {
            accumulator = Box::new(DistinctingAccumulator::new(
                accumulator,
                cs.argument_channels.clone(),
                cs.join_compiler.compile_group_by_hash(self.types_of(&cs.argument_channels)?),
            ));
        }

        trace!(function = %self.function, stages = ?self.stages, "created accumulator");
        Ok(Box::new(MaskedAccumulator::new(accumulator, cs.mask_channel, self.allows_remove_input())))
    }

    fn create_intermediate_accumulator(&self) -> Result<Box<dyn Accumulator>, AggregationError> {
        (self.scalar)(self.args(Vec::new()))
    }

    fn create_grouped_accumulator(&self) -> Result<Box<dyn GroupedAccumulator>, AggregationError> {
        let cs = &self.call_site;
        let args = self.args(self.raw_input_channels());
        let mut accumulator = (self.grouped)(args.clone())?;

        if self.has_order_by() {
            let channels = [cs.argument_channels.as_slice(), cs.order_by_channels.as_slice()].concat();
            let types = [vec![LogicalType::BigInt], self.types_of(&channels)?].concat();
            accumulator = Box::new(OrderingGroupedAccumulator::new(
                accumulator,
                cs.argument_channels.clone(),
                cs.order_by_channels.clone(),
                cs.orderings.clone(),
                cs.pages_index_factory.new_pages_index(types),
                cs.type_operators,
            ));
        }
        if self.has_distinct() {
            let types = [vec![LogicalType::BigInt], self.types_of(&cs.argument_channels)?].concat();
            accumulator = Box::new(DistinctingGroupedAccumulator::new(
                accumulator,
                cs.argument_channels.clone(),
                cs.join_compiler.compile_group_by_hash(types),
            ));
        }
        if self.has_stage(DecorationStage::Spill) {
            accumulator = Box::new(SpillingGroupedAccumulator::new(
                accumulator,
                Arc::clone(&self.grouped),
                args,
                cs.session.create_spill_store(),
                cs.session.spill.memory_threshold_bytes,
            ));
        }

        trace!(function = %self.function, stages = ?self.stages, "created grouped accumulator");
        Ok(Box::new(MaskedGroupedAccumulator::new(accumulator, cs.mask_channel, self.allows_remove_input())))
    }

    fn create_grouped_intermediate_accumulator(&self) -> Result<Box<dyn GroupedAccumulator>, AggregationError> {
        (self.grouped)(self.args(Vec::new()))
    }
}
