use crate::model::record::Bin;
use crate::operation::cdt::{ListOperation, MapOperation};

/// A sub-operation of an [`OperateOperation`](super::record::OperateOperation),
/// applied atomically together with its siblings on one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Reads one bin, or all bins when `bin` is `None`.
    Read { bin: Option<String> },
    ReadHeader,
    Write(Bin),
    /// Adds an integer or float to the bin.
    Add(Bin),
    /// Appends a string to the bin.
    Append(Bin),
    Prepend(Bin),
    Touch,
    Delete,
    List(ListOperation),
    Map(MapOperation),
}

impl Operation {
    pub fn get() -> Self {
        Operation::Read { bin: None }
    }

    pub fn get_bin(bin: impl Into<String>) -> Self {
        Operation::Read {
            bin: Some(bin.into()),
        }
    }

    pub fn put(bin: Bin) -> Self {
        Operation::Write(bin)
    }

    /// Name of the bin the operation targets, if any.
    pub fn bin_name(&self) -> Option<&str> {
        match self {
            Operation::Read { bin } => bin.as_deref(),
            Operation::Write(bin)
            | Operation::Add(bin)
            | Operation::Append(bin)
            | Operation::Prepend(bin) => Some(bin.name.as_str()),
            Operation::List(op) => Some(op.bin.as_str()),
            Operation::Map(op) => Some(op.bin.as_str()),
            Operation::ReadHeader | Operation::Touch | Operation::Delete => None,
        }
    }
}

impl From<ListOperation> for Operation {
    fn from(value: ListOperation) -> Self {
        Operation::List(value)
    }
}

impl From<MapOperation> for Operation {
    fn from(value: MapOperation) -> Self {
        Operation::Map(value)
    }
}
