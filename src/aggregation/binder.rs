use std::sync::Arc;

use tracing::debug;

use crate::aggregation::{
    state_types, AccumulatorCallSite, AccumulatorFactory, AccumulatorKind, AccumulatorStateDescriptor,
    AccumulatorTraits, AggregateImpl, AggregationError, ConstructionCapability, ConstructorShape,
    GenericAccumulatorFactory, GroupedConstructor, ScalarConstructor,
};

/// Turns a call site into an [`AccumulatorFactory`].
pub trait AccumulatorFactoryBinder: Send + Sync {
    fn bind(&self, call_site: AccumulatorCallSite) -> Result<Arc<dyn AccumulatorFactory>, AggregationError>;
}

/// Binder built from one scalar and one grouped construction capability.
///
/// All structural checks happen in [`GenericAccumulatorFactoryBinder::new`];
/// a binder that exists is known to be consistent with its descriptors, so
/// `bind` only has to check the call site.
#[derive(Debug, Clone)]
pub struct GenericAccumulatorFactoryBinder {
    name: String,
    state_descriptors: Arc<[AccumulatorStateDescriptor]>,
    shape: ConstructorShape,
    traits: AccumulatorTraits,
    scalar: Capability<ScalarConstructor>,
    grouped: Capability<GroupedConstructor>,
}

#[derive(Clone)]
struct Capability<C>(C);

impl<C> std::fmt::Debug for Capability<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("..")
    }
}

impl GenericAccumulatorFactoryBinder {
    pub fn new(
        name: &str,
        state_descriptors: Vec<AccumulatorStateDescriptor>,
        capabilities: Vec<ConstructionCapability>,
        traits: AccumulatorTraits,
    ) -> Result<Self, AggregationError> {
        let declared = state_types(&state_descriptors);

        let mut scalar = None;
        let mut grouped = None;
        for capability in capabilities {
            let kind = capability.kind();
            if capability.shape().state_types != declared {
                return AggregationError::ConstructorShapeMismatch {
                    function: name.to_string(),
                    kind,
                    expected: declared,
                    got: capability.shape().state_types.clone(),
                }.err();
            }
            let duplicate = match capability {
                ConstructionCapability::Scalar { shape, construct } => scalar.replace((shape, construct)).is_some(),
                ConstructionCapability::Grouped { shape, construct } => grouped.replace((shape, construct)).is_some(),
            };
            if duplicate {
                return AggregationError::DuplicateConstructor { function: name.to_string(), kind }.err();
            }
        }

        let missing = |kind| AggregationError::MissingConstructor { function: name.to_string(), kind };
        let (scalar_shape, scalar) = scalar.ok_or_else(|| missing(AccumulatorKind::Scalar))?;
        let (grouped_shape, grouped) = grouped.ok_or_else(|| missing(AccumulatorKind::Grouped))?;

        // state types already match the descriptors on both sides
        if scalar_shape.input_arity != grouped_shape.input_arity {
            return AggregationError::ConstructorArityMismatch {
                function: name.to_string(),
                scalar: scalar_shape.input_arity,
                grouped: grouped_shape.input_arity,
            }.err();
        }
        if scalar_shape.lambda_count != grouped_shape.lambda_count {
            return AggregationError::ConstructorLambdaMismatch {
                function: name.to_string(),
                scalar: scalar_shape.lambda_count,
                grouped: grouped_shape.lambda_count,
            }.err();
        }

        debug!(function = name, state = ?declared, ?traits, "validated accumulator constructors");
        Ok(Self {
            name: name.to_string(),
            state_descriptors: Arc::from(state_descriptors),
            shape: scalar_shape,
            traits,
            scalar: Capability(scalar),
            grouped: Capability(grouped),
        })
    }

    /// Binder whose constructors are the `create_*` methods of `imp`.
    pub fn from_impl<I: AggregateImpl + 'static>(imp: I) -> Result<Self, AggregationError> {
        let imp = Arc::new(imp);
        let shape = ConstructorShape::new(imp.state_layout(), imp.input_arity()).with_lambdas(imp.lambda_count());
        let scalar = Arc::clone(&imp);
        let grouped = Arc::clone(&imp);
        Self::new(
            imp.name(),
            imp.state_descriptors(),
            vec![
                ConstructionCapability::scalar(shape.clone(), move |args| scalar.create_accumulator(args)),
                ConstructionCapability::grouped(shape, move |args| grouped.create_grouped_accumulator(args)),
            ],
            imp.traits(),
        )
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn traits(&self) -> AccumulatorTraits { self.traits }
    pub fn shape(&self) -> &ConstructorShape { &self.shape }

    pub fn accumulator_has_remove_input(&self) -> bool {
        self.traits.has_remove_input
    }

    pub fn get_state_descriptors(&self) -> &[AccumulatorStateDescriptor] {
        &self.state_descriptors
    }

    /// Check the call site and package it with the validated constructors.
    pub fn bind_generic(&self, call_site: AccumulatorCallSite) -> Result<GenericAccumulatorFactory, AggregationError> {
        if call_site.order_by_channels.len() != call_site.orderings.len() {
            return AggregationError::OrderingMismatch {
                channels: call_site.order_by_channels.len(),
                orderings: call_site.orderings.len(),
            }.err();
        }
        if call_site.distinct && !self.traits.distinct_compatible {
            return AggregationError::DistinctNotSupported(self.name.clone()).err();
        }
        if call_site.argument_channels.len() != self.shape.input_arity {
            return AggregationError::ArgumentCountMismatch {
                function: self.name.clone(),
                expected: self.shape.input_arity,
                got: call_site.argument_channels.len(),
            }.err();
        }
        if call_site.lambda_providers.len() != self.shape.lambda_count {
            return AggregationError::LambdaCountMismatch {
                function: self.name.clone(),
                expected: self.shape.lambda_count,
                got: call_site.lambda_providers.len(),
            }.err();
        }
        let referenced: Vec<usize> = call_site.argument_channels.iter()
            .chain(call_site.mask_channel.iter())
            .chain(call_site.order_by_channels.iter())
            .copied()
            .collect();
        call_site.types_of(&referenced)
            .map_err(|channel| AggregationError::ChannelOutOfBounds { channel, channels: call_site.source_types.len() })?;

        let factory = GenericAccumulatorFactory::new(
            self.name.clone(),
            Arc::clone(&self.state_descriptors),
            Arc::clone(&self.scalar.0),
            Arc::clone(&self.grouped.0),
            self.traits.has_remove_input,
            call_site,
        );
        debug!(function = %self.name, stages = ?factory.stages(), "bound accumulator factory");
        Ok(factory)
    }
}

impl AccumulatorFactoryBinder for GenericAccumulatorFactoryBinder {
    fn bind(&self, call_site: AccumulatorCallSite) -> Result<Arc<dyn AccumulatorFactory>, AggregationError> {
        Ok(Arc::new(self.bind_generic(call_site)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregation::{functions::SumImpl, AccumulatorArgs, DecorationStage},
        types::{LogicalType, SortOrder},
    };
    use serde_json::Value;

    fn sum_descriptors() -> Vec<AccumulatorStateDescriptor> {
        vec![AccumulatorStateDescriptor::new("sum", LogicalType::BigInt, Value::Null)]
    }

    fn scalar(shape: ConstructorShape) -> ConstructionCapability {
        ConstructionCapability::scalar(shape, |args: AccumulatorArgs| SumImpl.create_accumulator(args))
    }

    fn grouped(shape: ConstructorShape) -> ConstructionCapability {
        ConstructionCapability::grouped(shape, |args: AccumulatorArgs| SumImpl.create_grouped_accumulator(args))
    }

    fn bigint_shape() -> ConstructorShape {
        ConstructorShape::new(vec![LogicalType::BigInt], 1)
    }

    #[test]
    fn valid_binder_exposes_supplied_descriptors() {
        let binder = GenericAccumulatorFactoryBinder::new(
            "sum", sum_descriptors(), vec![scalar(bigint_shape()), grouped(bigint_shape())], AccumulatorTraits::removable(),
        ).unwrap();
        assert_eq!(binder.get_state_descriptors(), sum_descriptors().as_slice());
        assert!(binder.accumulator_has_remove_input());
    }

    #[test]
    fn constructor_shape_mismatch_fails_every_time() {
        let wrong = ConstructorShape::new(vec![LogicalType::Double], 1);
        for _ in 0..3 {
            let err = GenericAccumulatorFactoryBinder::new(
                "sum", sum_descriptors(), vec![scalar(wrong.clone()), grouped(bigint_shape())], AccumulatorTraits::default(),
            ).unwrap_err();
            assert_eq!(err, AggregationError::ConstructorShapeMismatch {
                function: "sum".into(),
                kind: AccumulatorKind::Scalar,
                expected: vec![LogicalType::BigInt],
                got: vec![LogicalType::Double],
            });
        }
    }

    #[test]
    fn both_constructor_kinds_are_required_exactly_once() {
        let missing = GenericAccumulatorFactoryBinder::new(
            "sum", sum_descriptors(), vec![scalar(bigint_shape())], AccumulatorTraits::default(),
        ).unwrap_err();
        assert_eq!(missing, AggregationError::MissingConstructor { function: "sum".into(), kind: AccumulatorKind::Grouped });

        let duplicate = GenericAccumulatorFactoryBinder::new(
            "sum", sum_descriptors(), vec![scalar(bigint_shape()), grouped(bigint_shape()), grouped(bigint_shape())], AccumulatorTraits::default(),
        ).unwrap_err();
        assert_eq!(duplicate, AggregationError::DuplicateConstructor { function: "sum".into(), kind: AccumulatorKind::Grouped });
    }

    #[test]
    fn scalar_and_grouped_must_agree_on_arity() {
        let err = GenericAccumulatorFactoryBinder::new(
            "sum", sum_descriptors(),
            vec![scalar(bigint_shape()), grouped(ConstructorShape::new(vec![LogicalType::BigInt], 2))],
            AccumulatorTraits::default(),
        ).unwrap_err();
        assert_eq!(err, AggregationError::ConstructorArityMismatch { function: "sum".into(), scalar: 1, grouped: 2 });
        assert_eq!(err.category(), crate::aggregation::ErrorCategory::Registration);

        let err = GenericAccumulatorFactoryBinder::new(
            "sum", sum_descriptors(),
            vec![scalar(bigint_shape()), grouped(bigint_shape().with_lambdas(1))],
            AccumulatorTraits::default(),
        ).unwrap_err();
        assert_eq!(err, AggregationError::ConstructorLambdaMismatch { function: "sum".into(), scalar: 0, grouped: 1 });
    }

    #[test]
    fn bind_rejects_call_site_contract_violations() {
        let binder = GenericAccumulatorFactoryBinder::from_impl(SumImpl).unwrap();
        let types = vec![LogicalType::BigInt, LogicalType::Boolean];

        let err = binder.bind_generic(AccumulatorCallSite::new(vec![0], types.clone())
            .with_order_by(vec![0], vec![])).unwrap_err();
        assert_eq!(err, AggregationError::OrderingMismatch { channels: 1, orderings: 0 });

        let err = binder.bind_generic(AccumulatorCallSite::new(vec![0, 1], types.clone())).unwrap_err();
        assert!(matches!(err, AggregationError::ArgumentCountMismatch { expected: 1, got: 2, .. }));

        let err = binder.bind_generic(AccumulatorCallSite::new(vec![0], types.clone()).with_mask(5)).unwrap_err();
        assert_eq!(err, AggregationError::ChannelOutOfBounds { channel: 5, channels: 2 });

        let err = binder.bind_generic(AccumulatorCallSite::new(vec![0], types)
            .with_lambdas(vec![crate::aggregation::LambdaProvider::new("f", |_| Ok(Value::Null))])).unwrap_err();
        assert!(matches!(err, AggregationError::LambdaCountMismatch { expected: 0, got: 1, .. }));
    }

    #[test]
    fn bind_rejects_distinct_on_incompatible_function() {
        let binder = GenericAccumulatorFactoryBinder::new(
            "sum", sum_descriptors(), vec![scalar(bigint_shape()), grouped(bigint_shape())],
            AccumulatorTraits::default().without_distinct(),
        ).unwrap();
        let err = binder.bind_generic(AccumulatorCallSite::new(vec![0], vec![LogicalType::BigInt]).with_distinct(true)).unwrap_err();
        assert_eq!(err, AggregationError::DistinctNotSupported("sum".into()));
    }

    #[test]
    fn bind_computes_stages_in_pipeline_order() {
        let binder = GenericAccumulatorFactoryBinder::from_impl(SumImpl).unwrap();
        let factory = binder.bind_generic(
            AccumulatorCallSite::new(vec![0], vec![LogicalType::BigInt, LogicalType::Boolean])
                .with_mask(1)
                .with_distinct(true)
                .with_order_by(vec![0], vec![SortOrder::DescNullsLast]),
        ).unwrap();
        assert_eq!(factory.stages(), &[DecorationStage::Mask(1), DecorationStage::Distinct, DecorationStage::Ordering]);
        assert!(factory.has_distinct());
        assert!(factory.has_order_by());

        let shown = format!("{factory:?}");
        assert!(shown.contains("\"sum\""));
        assert!(shown.contains("[Mask(1), Distinct, Ordering]"));
    }
}
