use crate::model::result_code::ResultCode;

/// Misuse while building an operation or key. Never reaches the executor.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("cannot create {0}: key is required")]
    MissingKey(&'static str),
    #[error("cannot create operate operation: no operations")]
    NoOperations,
    #[error("namespace must not be empty")]
    EmptyNamespace,
    #[error("invalid user key type: {0}")]
    InvalidUserKey(&'static str),
    #[error("bin name [{0}] exceeds 15 bytes")]
    BinNameTooLong(String),
}

/// Failure of a read issued through an
/// [`AerospikeReader`](crate::reader::AerospikeReader).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ReaderError {
    pub code: ResultCode,
    pub message: String,
}

impl ReaderError {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ResultCode::KEY_NOT_FOUND_ERROR, message)
    }

    /// A missing record is an expected outcome of a pre-read, not a failure.
    pub fn is_not_found(&self) -> bool {
        self.code == ResultCode::KEY_NOT_FOUND_ERROR
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    #[error("read failed: {0}")]
    Reader(#[from] ReaderError),
    #[error("invalid operation: {0}")]
    Operation(#[from] OperationError),
    #[error("invalid transform param [{name}]: {msg}")]
    InvalidParam { name: String, msg: String },
    #[error("invalid field [{name}]: {msg}")]
    InvalidField { name: String, msg: String },
    #[error("composite record operations are not allowed for [{0}]")]
    CompositeNotAllowed(String),
    #[error("{msg}: {source}")]
    Custom {
        msg: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TransformError {
    pub fn invalid_field(name: &str, msg: impl Into<String>) -> Self {
        Self::InvalidField {
            name: name.to_string(),
            msg: msg.into(),
        }
    }

    pub fn invalid_param(name: &str, msg: impl Into<String>) -> Self {
        Self::InvalidParam {
            name: name.to_string(),
            msg: msg.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to open file [{file}]: {source}")]
    Read {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("no transform registered for class [{0}]")]
    UnknownClass(String),
    #[error("transform class [{0}] is already registered")]
    DuplicateClass(String),
    #[error("failed to create transform [{class}]: {source}")]
    Factory {
        class: String,
        #[source]
        source: TransformError,
    },
}
