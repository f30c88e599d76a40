use crate::error::TransformError;
use crate::operation::record::RecordOperation;

/// How long the host keeps a transform instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance shared by all host workers. The transform must be
    /// `Sync`; any mutable state it touches must tolerate concurrent calls.
    Singleton,
    /// A fresh instance for every message.
    PerMessage,
}

/// Turns one inbound message into any number of record operations.
///
/// The host applies the returned operations independently; nothing makes
/// them atomic as a group. Returning an error fails the message and hands
/// it to the host's retry or dead-letter handling, so prefer
/// [`RecordOperation::Skip`] for input that can never succeed.
pub trait InboundMessageTransform<T>: Send {
    fn transform(&self, input: &T) -> Result<Vec<RecordOperation>, TransformError>;
}

/// Turns one inbound message into exactly one record operation, which may
/// be [`RecordOperation::Skip`].
pub trait InboundMessageTransformer<T>: Send {
    fn transform(&self, input: &T) -> Result<RecordOperation, TransformError>;
}

/// Runs an [`InboundMessageTransformer`] where an [`InboundMessageTransform`]
/// is expected.
pub struct TransformerAdapter<X> {
    inner: X,
}

impl<X> TransformerAdapter<X> {
    pub fn new(inner: X) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> X {
        self.inner
    }
}

impl<T, X> InboundMessageTransform<T> for TransformerAdapter<X>
where
    X: InboundMessageTransformer<T>,
{
    fn transform(&self, input: &T) -> Result<Vec<RecordOperation>, TransformError> {
        Ok(vec![self.inner.transform(input)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysSkip;

    impl InboundMessageTransformer<String> for AlwaysSkip {
        fn transform(&self, _: &String) -> Result<RecordOperation, TransformError> {
            Ok(RecordOperation::Skip)
        }
    }

    #[test]
    fn adapter_wraps_single_result() {
        let adapter = TransformerAdapter::new(AlwaysSkip);
        let ops = adapter.transform(&"msg".to_string()).unwrap();
        assert_eq!(ops, vec![RecordOperation::Skip]);
    }
}
