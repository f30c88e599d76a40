use crate::error::{ConfigError, TransformError};
use crate::model::policy::WritePolicy;
use crate::model::result_code::ResultCode;
use crate::model::value::Value;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;

/// Selects and parameterizes the transform bound to a topic.
///
/// `params` is also accepted under the legacy names `transform-config` and
/// `transformer-config`; all three land in the same field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransformConfig {
    #[serde(rename = "class")]
    class_name: String,
    #[serde(default, alias = "transform-config", alias = "transformer-config")]
    params: Option<toml::Table>,
    #[serde(default)]
    unsafe_composite_record_operations: bool,
}

impl TransformConfig {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            params: None,
            unsafe_composite_record_operations: false,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.params
            .get_or_insert_with(toml::Table::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_unsafe_composite_record_operations(mut self, allow: bool) -> Self {
        self.unsafe_composite_record_operations = allow;
        self
    }

    /// Identifier the transform was registered under.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn allows_composite(&self) -> bool {
        self.unsafe_composite_record_operations
    }

    pub fn has_params(&self) -> bool {
        self.params.is_some()
    }

    pub fn param(&self, name: &str) -> Option<Value> {
        self.params
            .as_ref()
            .and_then(|p| p.get(name))
            .map(|v| Value::from(v.clone()))
    }

    /// All params, ordered by name.
    pub fn params(&self) -> Vec<(String, Value)> {
        self.params
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect()
    }

    pub fn str_param(&self, name: &str) -> Result<Option<String>, TransformError> {
        match self.param(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(TransformError::invalid_param(
                name,
                format!("expected string, found {}", other.type_name()),
            )),
        }
    }

    pub fn str_param_or(&self, name: &str, default: &str) -> Result<String, TransformError> {
        Ok(self.str_param(name)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn int_param_or(&self, name: &str, default: i64) -> Result<i64, TransformError> {
        match self.param(name) {
            None => Ok(default),
            Some(Value::Int(i)) => Ok(i),
            Some(other) => Err(TransformError::invalid_param(
                name,
                format!("expected integer, found {}", other.type_name()),
            )),
        }
    }
}

/// Per-topic settings the host applies before invoking the transform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TopicConfig {
    pub transform: TransformConfig,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub set: Option<String>,
    /// Message field holding the record user key.
    #[serde(default)]
    pub key_field: Option<String>,
    #[serde(default)]
    pub write_policy: Option<WritePolicy>,
    #[serde(default)]
    pub ignore_error_codes: HashSet<i32>,
}

fn default_namespace() -> String {
    "test".to_string()
}

impl TopicConfig {
    pub fn ignore_error_codes(&self) -> HashSet<ResultCode> {
        self.ignore_error_codes.iter().map(|c| ResultCode(*c)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct InboundConfig {
    #[serde(default)]
    pub topics: BTreeMap<String, TopicConfig>,
}

impl InboundConfig {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(file_path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(file_path).map_err(|e| ConfigError::Read {
            file: file_path.to_string(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    pub fn topic(&self, name: &str) -> Option<&TopicConfig> {
        self.topics.get(name)
    }
}
