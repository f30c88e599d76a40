use crate::error::OperationError;
use crate::model::value::Value;
use bytes::Bytes;
use std::fmt::{Display, Formatter};

/// The part of a record key chosen by the application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserKey {
    String(String),
    Int(i64),
    Bytes(Bytes),
}

impl From<&str> for UserKey {
    fn from(value: &str) -> Self {
        UserKey::String(value.to_string())
    }
}

impl From<String> for UserKey {
    fn from(value: String) -> Self {
        UserKey::String(value)
    }
}

impl From<i64> for UserKey {
    fn from(value: i64) -> Self {
        UserKey::Int(value)
    }
}

impl From<i32> for UserKey {
    fn from(value: i32) -> Self {
        UserKey::Int(value as i64)
    }
}

impl From<Bytes> for UserKey {
    fn from(value: Bytes) -> Self {
        UserKey::Bytes(value)
    }
}

impl TryFrom<&Value> for UserKey {
    type Error = OperationError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(UserKey::String(s.clone())),
            Value::Int(i) => Ok(UserKey::Int(*i)),
            Value::Bytes(b) => Ok(UserKey::Bytes(b.clone())),
            other => Err(OperationError::InvalidUserKey(other.type_name())),
        }
    }
}

impl From<UserKey> for Value {
    fn from(value: UserKey) -> Self {
        match value {
            UserKey::String(s) => Value::String(s),
            UserKey::Int(i) => Value::Int(i),
            UserKey::Bytes(b) => Value::Bytes(b),
        }
    }
}

impl Display for UserKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UserKey::String(s) => f.write_str(s),
            UserKey::Int(i) => write!(f, "{}", i),
            UserKey::Bytes(b) => write!(f, "{:?}", b),
        }
    }
}

/// Unique identifier of a database record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    namespace: String,
    set_name: Option<String>,
    user_key: UserKey,
}

impl Key {
    pub fn new(
        namespace: impl Into<String>,
        set_name: Option<&str>,
        user_key: impl Into<UserKey>,
    ) -> Result<Self, OperationError> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(OperationError::EmptyNamespace);
        }
        Ok(Self {
            namespace,
            set_name: set_name.map(|s| s.to_string()),
            user_key: user_key.into(),
        })
    }

    /// Builds a key from a message field value.
    pub fn from_value(
        namespace: impl Into<String>,
        set_name: Option<&str>,
        user_key: &Value,
    ) -> Result<Self, OperationError> {
        Self::new(namespace, set_name, UserKey::try_from(user_key)?)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set_name(&self) -> Option<&str> {
        self.set_name.as_deref()
    }

    pub fn user_key(&self) -> &UserKey {
        &self.user_key
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.namespace,
            self.set_name.as_deref().unwrap_or(""),
            self.user_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_namespace() {
        let err = Key::new("", None, "kevin").unwrap_err();
        assert!(matches!(err, OperationError::EmptyNamespace));
    }

    #[test]
    fn user_key_from_value() {
        let key = Key::from_value("test", Some("demo"), &Value::Int(7)).unwrap();
        assert_eq!(key.user_key(), &UserKey::Int(7));
        assert_eq!(key.set_name(), Some("demo"));
        assert_eq!(key.to_string(), "test:demo:7");

        let err = Key::from_value("test", None, &Value::Nil).unwrap_err();
        assert!(matches!(err, OperationError::InvalidUserKey("nil")));
        let err = Key::from_value("test", None, &Value::Float(1.5)).unwrap_err();
        assert!(matches!(err, OperationError::InvalidUserKey("float")));
    }
}
