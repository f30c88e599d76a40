//! Complex data type (list and map) operations on a single bin.

use crate::model::value::Value;

/// Selects a nested list or map inside a bin.
#[derive(Debug, Clone, PartialEq)]
pub enum Ctx {
    ListIndex(i64),
    ListRank(i64),
    ListValue(Value),
    MapIndex(i64),
    MapRank(i64),
    MapKey(Value),
    MapValue(Value),
}

impl Ctx {
    pub fn list_index(index: i64) -> Self {
        Ctx::ListIndex(index)
    }

    pub fn map_key(key: impl Into<Value>) -> Self {
        Ctx::MapKey(key.into())
    }
}

/// What a list selector operation returns.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ListReturnType {
    #[default]
    None,
    Index,
    Rank,
    Count,
    Value,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum MapReturnType {
    #[default]
    None,
    Key,
    Value,
    KeyValue,
    Count,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ListOrder {
    #[default]
    Unordered,
    Ordered,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ListPolicy {
    pub order: ListOrder,
    pub add_unique: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum MapOrder {
    #[default]
    Unordered,
    KeyOrdered,
    KeyValueOrdered,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum MapWriteMode {
    #[default]
    Update,
    UpdateOnly,
    CreateOnly,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct MapPolicy {
    pub order: MapOrder,
    pub write_mode: MapWriteMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListOp {
    Append { policy: ListPolicy, value: Value },
    AppendItems { policy: ListPolicy, values: Vec<Value> },
    Insert { index: i64, value: Value },
    RemoveRange { index: i64, count: u64 },
    RemoveByValue { value: Value, return_type: ListReturnType },
    GetRange { index: i64, count: Option<u64> },
    Trim { index: i64, count: u64 },
    Size,
    Clear,
}

/// A list operation on `bin`, optionally nested through `ctx`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListOperation {
    pub bin: String,
    pub ctx: Vec<Ctx>,
    pub op: ListOp,
}

impl ListOperation {
    fn new(bin: impl Into<String>, op: ListOp) -> Self {
        Self {
            bin: bin.into(),
            ctx: Vec::new(),
            op,
        }
    }

    pub fn append(bin: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(
            bin,
            ListOp::Append {
                policy: ListPolicy::default(),
                value: value.into(),
            },
        )
    }

    pub fn append_items(bin: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(
            bin,
            ListOp::AppendItems {
                policy: ListPolicy::default(),
                values,
            },
        )
    }

    pub fn insert(bin: impl Into<String>, index: i64, value: impl Into<Value>) -> Self {
        Self::new(
            bin,
            ListOp::Insert {
                index,
                value: value.into(),
            },
        )
    }

    /// Removes `count` items starting at `index`.
    pub fn remove_range(bin: impl Into<String>, index: i64, count: u64) -> Self {
        Self::new(bin, ListOp::RemoveRange { index, count })
    }

    pub fn remove_by_value(
        bin: impl Into<String>,
        value: impl Into<Value>,
        return_type: ListReturnType,
    ) -> Self {
        Self::new(
            bin,
            ListOp::RemoveByValue {
                value: value.into(),
                return_type,
            },
        )
    }

    pub fn get_range(bin: impl Into<String>, index: i64, count: Option<u64>) -> Self {
        Self::new(bin, ListOp::GetRange { index, count })
    }

    /// Keeps `count` items starting at `index` and removes the rest.
    pub fn trim(bin: impl Into<String>, index: i64, count: u64) -> Self {
        Self::new(bin, ListOp::Trim { index, count })
    }

    pub fn size(bin: impl Into<String>) -> Self {
        Self::new(bin, ListOp::Size)
    }

    pub fn clear(bin: impl Into<String>) -> Self {
        Self::new(bin, ListOp::Clear)
    }

    pub fn with_policy(mut self, list_policy: ListPolicy) -> Self {
        match &mut self.op {
            ListOp::Append { policy, .. } | ListOp::AppendItems { policy, .. } => {
                *policy = list_policy
            }
            _ => {}
        }
        self
    }

    pub fn ctx(mut self, ctx: Ctx) -> Self {
        self.ctx.push(ctx);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    Put { key: Value, value: Value },
    PutItems { items: Vec<(Value, Value)> },
    Increment { key: Value, incr: Value },
    RemoveByKey { key: Value, return_type: MapReturnType },
    Size,
    Clear,
}

/// A map operation on `bin`, optionally nested through `ctx`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOperation {
    pub bin: String,
    pub ctx: Vec<Ctx>,
    pub policy: MapPolicy,
    pub op: MapOp,
}

impl MapOperation {
    fn new(policy: MapPolicy, bin: impl Into<String>, op: MapOp) -> Self {
        Self {
            bin: bin.into(),
            ctx: Vec::new(),
            policy,
            op,
        }
    }

    pub fn put(
        policy: MapPolicy,
        bin: impl Into<String>,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Self {
        Self::new(
            policy,
            bin,
            MapOp::Put {
                key: key.into(),
                value: value.into(),
            },
        )
    }

    pub fn put_items(policy: MapPolicy, bin: impl Into<String>, items: Vec<(Value, Value)>) -> Self {
        Self::new(policy, bin, MapOp::PutItems { items })
    }

    pub fn increment(
        policy: MapPolicy,
        bin: impl Into<String>,
        key: impl Into<Value>,
        incr: impl Into<Value>,
    ) -> Self {
        Self::new(
            policy,
            bin,
            MapOp::Increment {
                key: key.into(),
                incr: incr.into(),
            },
        )
    }

    pub fn remove_by_key(
        bin: impl Into<String>,
        key: impl Into<Value>,
        return_type: MapReturnType,
    ) -> Self {
        Self::new(
            MapPolicy::default(),
            bin,
            MapOp::RemoveByKey {
                key: key.into(),
                return_type,
            },
        )
    }

    pub fn size(bin: impl Into<String>) -> Self {
        Self::new(MapPolicy::default(), bin, MapOp::Size)
    }

    pub fn clear(bin: impl Into<String>) -> Self {
        Self::new(MapPolicy::default(), bin, MapOp::Clear)
    }

    pub fn ctx(mut self, ctx: Ctx) -> Self {
        self.ctx.push(ctx);
        self
    }
}
