use std::{collections::HashMap, sync::Arc};

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::aggregation::{
    AccumulatorCallSite, AccumulatorFactory, AccumulatorFactoryBinder, AggregateImpl, AggregationError, ArrayAggImpl,
    AvgImpl, CountImpl, GenericAccumulatorFactoryBinder, ReduceAggImpl, SumImpl,
};

/// Case-insensitive registry of aggregate binders.
#[derive(Default)]
pub struct AggregateRegistry {
    by_name: HashMap<String, Arc<GenericAccumulatorFactoryBinder>>,
}

static GLOBAL: OnceCell<AggregateRegistry> = OnceCell::new();

impl AggregateRegistry {
    pub fn new() -> Self { Self { by_name: HashMap::new() } }

    /// Validates `imp` and stores its binder. Invalid definitions never
    /// become visible.
    pub fn register<I: AggregateImpl + 'static>(&mut self, imp: I) -> Result<Arc<GenericAccumulatorFactoryBinder>, AggregationError> {
        let binder = GenericAccumulatorFactoryBinder::from_impl(imp)?;
        self.register_binder(binder)
    }

    pub fn register_binder(&mut self, binder: GenericAccumulatorFactoryBinder) -> Result<Arc<GenericAccumulatorFactoryBinder>, AggregationError> {
        let key = binder.name().to_ascii_lowercase();
        if self.by_name.contains_key(&key) {
            return AggregationError::DuplicateFunction(key).err();
        }
        let binder = Arc::new(binder);
        self.by_name.insert(key, Arc::clone(&binder));
        debug!(function = %binder.name(), "registered aggregate");
        Ok(binder)
    }

    pub fn get(&self, name: &str) -> Option<Arc<GenericAccumulatorFactoryBinder>> {
        self.by_name.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn list(&self) -> Vec<String> {
        let mut v: Vec<_> = self.by_name.keys().cloned().collect();
        v.sort();
        v
    }

    pub fn bind(&self, name: &str, call_site: AccumulatorCallSite) -> Result<Arc<dyn AccumulatorFactory>, AggregationError> {
        let binder = self.get(name).ok_or_else(|| AggregationError::FunctionNotFound(name.to_string()))?;
        binder.bind(call_site)
    }

    pub fn default_aggregate_registry() -> Result<Self, AggregationError> {
        let mut registry = Self::new();
        registry.register(CountImpl)?;
        registry.register(SumImpl)?;
        registry.register(AvgImpl)?;
        registry.register(ArrayAggImpl)?;
        registry.register(ReduceAggImpl)?;
        Ok(registry)
    }

    /// Process-wide default registry, built on first use.
    pub fn global() -> Result<&'static AggregateRegistry, AggregationError> {
        GLOBAL.get_or_try_init(Self::default_aggregate_registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregation::{AccumulatorStateDescriptor, AccumulatorTraits, ConstructionCapability, ConstructorShape},
        page::Page,
        types::LogicalType,
    };
    use serde_json::{json, Value};

    #[test]
    fn registry_contains_all_and_lookup_is_case_insensitive() {
        let r = AggregateRegistry::default_aggregate_registry().unwrap();
        assert_eq!(r.list(), vec!["array_agg", "avg", "count", "reduce_agg", "sum"]);

        assert!(r.get("COUNT").is_some());
        assert!(r.get("sUm").is_some());
        assert!(r.get("Array_Agg").is_some());
        assert!(r.get("median").is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut r = AggregateRegistry::new();
        r.register(SumImpl).unwrap();
        let err = r.register(SumImpl).unwrap_err();
        assert_eq!(err, AggregationError::DuplicateFunction("sum".into()));
    }

    #[test]
    fn broken_definition_is_never_registered() {
        let mut r = AggregateRegistry::new();
        let descriptors = vec![AccumulatorStateDescriptor::new("sum", LogicalType::BigInt, Value::Null)];
        let shape = ConstructorShape::new(vec![LogicalType::BigInt], 1);
        let result = GenericAccumulatorFactoryBinder::new(
            "broken",
            descriptors,
            vec![ConstructionCapability::scalar(shape, |args| SumImpl.create_accumulator(args))],
            AccumulatorTraits::default(),
        ).and_then(|b| r.register_binder(b));

        assert!(result.is_err());
        assert!(r.get("broken").is_none());
    }

    #[test]
    fn bind_unknown_function_fails() {
        let r = AggregateRegistry::default_aggregate_registry().unwrap();
        let err = r.bind("median", AccumulatorCallSite::new(vec![0], vec![LogicalType::BigInt])).err();
        assert_eq!(err, Some(AggregationError::FunctionNotFound("median".into())));
    }

    #[test]
    fn global_registry_binds_and_accumulates() {
        let r = AggregateRegistry::global().unwrap();
        let factory = r.bind("SUM", AccumulatorCallSite::new(vec![0], vec![LogicalType::BigInt])).unwrap();
        let mut acc = factory.create_accumulator().unwrap();
        acc.add_input(&Page::from_rows(1, &[vec![json!(4)], vec![json!(5)]]).unwrap()).unwrap();
        assert_eq!(acc.evaluate_final().unwrap(), json!(9));
        assert!(std::ptr::eq(r, AggregateRegistry::global().unwrap()));
    }
}
