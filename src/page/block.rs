use serde_json::Value;

/// One column of a [`Page`](crate::page::Page).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block(pub Vec<Value>);

impl Block {
    pub fn new(values: Vec<Value>) -> Self { Self(values) }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, position: usize) -> Option<&Value> { self.0.get(position) }

    pub fn is_null(&self, position: usize) -> bool {
        self.0.get(position).is_none_or(Value::is_null)
    }

    pub fn values(&self) -> &[Value] { &self.0 }

    pub fn iter(&self) -> impl Iterator<Item = &Value> { self.0.iter() }

    /// Copy the cells at `positions`, in that order.
    pub fn copy_positions(&self, positions: &[usize]) -> Block {
        Block(positions.iter().filter_map(|p| self.0.get(*p).cloned()).collect())
    }
}

impl From<Vec<Value>> for Block {
    fn from(values: Vec<Value>) -> Self { Self(values) }
}

impl FromIterator<Value> for Block {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
