use crate::model::value::Value;
use std::collections::HashMap;

/// A named field within a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub name: String,
    pub value: Value,
}

impl Bin {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Record state as returned by a read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub bins: HashMap<String, Value>,
    pub generation: u32,
    pub expiration: u32,
}

impl Record {
    pub fn new(bins: HashMap<String, Value>, generation: u32, expiration: u32) -> Self {
        Self {
            bins,
            generation,
            expiration,
        }
    }

    pub fn get(&self, bin: &str) -> Option<&Value> {
        self.bins.get(bin)
    }

    pub fn get_list(&self, bin: &str) -> Option<&[Value]> {
        self.bins.get(bin).and_then(|v| v.as_list())
    }

    pub fn get_map(&self, bin: &str) -> Option<&[(Value, Value)]> {
        self.bins.get(bin).and_then(|v| v.as_map())
    }

    /// Keeps only the named bins. An empty selection keeps everything.
    pub fn select(mut self, bin_names: &[&str]) -> Self {
        if !bin_names.is_empty() {
            self.bins.retain(|name, _| bin_names.contains(&name.as_str()));
        }
        self
    }
}

impl FromIterator<Bin> for Record {
    fn from_iter<T: IntoIterator<Item = Bin>>(iter: T) -> Self {
        Self {
            bins: iter.into_iter().map(|bin| (bin.name, bin.value)).collect(),
            generation: 1,
            expiration: 0,
        }
    }
}
