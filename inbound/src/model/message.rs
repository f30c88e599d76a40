use crate::model::key::Key;
use crate::model::policy::WritePolicy;
use crate::model::result_code::ResultCode;
use crate::model::value::Value;
use std::collections::{HashMap, HashSet};

/// A single message handed to a transform by the host.
///
/// `K` is the key type of the source system and `M` the raw, unparsed
/// message. Everything else is derived by the host from its own
/// configuration before the transform is invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage<K, M> {
    message_key: Option<K>,
    message: M,
    key: Option<Key>,
    write_policy: Option<WritePolicy>,
    fields: HashMap<String, Value>,
    ignore_error_codes: HashSet<ResultCode>,
}

impl<K, M> InboundMessage<K, M> {
    pub fn new(
        message_key: Option<K>,
        message: M,
        key: Option<Key>,
        write_policy: Option<WritePolicy>,
        fields: HashMap<String, Value>,
        ignore_error_codes: HashSet<ResultCode>,
    ) -> Self {
        Self {
            message_key,
            message,
            key,
            write_policy,
            fields,
            ignore_error_codes,
        }
    }

    pub fn builder(message: M) -> InboundMessageBuilder<K, M> {
        InboundMessageBuilder {
            inner: Self::new(None, message, None, None, HashMap::new(), HashSet::new()),
        }
    }

    /// Key of the message in the source system, if it has one.
    pub fn message_key(&self) -> Option<&K> {
        self.message_key.as_ref()
    }

    pub fn message(&self) -> &M {
        &self.message
    }

    /// Database key extracted by the host, if configured.
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn write_policy(&self) -> Option<&WritePolicy> {
        self.write_policy.as_ref()
    }

    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_nil())
    }

    /// Result codes the executor treats as success for writes produced from
    /// this message.
    pub fn ignore_error_codes(&self) -> &HashSet<ResultCode> {
        &self.ignore_error_codes
    }
}

pub struct InboundMessageBuilder<K, M> {
    inner: InboundMessage<K, M>,
}

impl<K, M> InboundMessageBuilder<K, M> {
    pub fn message_key(mut self, message_key: K) -> Self {
        self.inner.message_key = Some(message_key);
        self
    }

    pub fn key(mut self, key: Key) -> Self {
        self.inner.key = Some(key);
        self
    }

    pub fn write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.inner.write_policy = Some(write_policy);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.fields.insert(name.into(), value.into());
        self
    }

    pub fn fields(mut self, fields: HashMap<String, Value>) -> Self {
        self.inner.fields = fields;
        self
    }

    pub fn ignore_error_code(mut self, code: impl Into<ResultCode>) -> Self {
        self.inner.ignore_error_codes.insert(code.into());
        self
    }

    pub fn ignore_error_codes(mut self, codes: HashSet<ResultCode>) -> Self {
        self.inner.ignore_error_codes = codes;
        self
    }

    pub fn build(self) -> InboundMessage<K, M> {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collections_by_default() {
        let msg: InboundMessage<String, &str> = InboundMessage::builder("payload").build();

        assert!(msg.fields().is_empty());
        assert!(msg.ignore_error_codes().is_empty());
        assert!(msg.message_key().is_none());
        assert!(msg.key().is_none());
        assert!(msg.write_policy().is_none());
        assert_eq!(*msg.message(), "payload");
    }

    #[test]
    fn nil_fields_read_as_missing() {
        let msg: InboundMessage<String, ()> = InboundMessage::builder(())
            .message_key("messageKey".to_string())
            .key(Key::new("test", Some("demo"), 1).unwrap())
            .field("name", "kevin")
            .field("empty", Value::Nil)
            .ignore_error_code(ResultCode::KEY_EXISTS_ERROR)
            .build();

        assert_eq!(msg.field("name"), Some(&Value::from("kevin")));
        assert_eq!(msg.field("empty"), None);
        assert_eq!(msg.fields().len(), 2);
        assert!(msg.ignore_error_codes().contains(&ResultCode(5)));
        assert_eq!(msg.message_key().map(|k| k.as_str()), Some("messageKey"));
    }
}
