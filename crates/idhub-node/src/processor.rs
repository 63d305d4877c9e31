//! Message processors and the method → processor registry.

use std::collections::HashMap;
use std::sync::Arc;

use idhub_core::{MessageEnvelope, MessageMethod, MessageReply, MessageStatus};

use crate::store::MessageStore;

/// Handles one message of a hub request.
///
/// Processors never fail: every outcome, including bad input, is encoded in
/// the returned reply's status.
pub trait MessageProcessor: Send + Sync {
    fn process(&self, message: &MessageEnvelope) -> MessageReply;
}

/// `CollectionsQuery`: returns every stored record.
pub struct QueryProcessor {
    store: Arc<MessageStore>,
}

impl QueryProcessor {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self { store }
    }
}

impl MessageProcessor for QueryProcessor {
    fn process(&self, message: &MessageEnvelope) -> MessageReply {
        MessageReply::ok(message.message_id(), self.store.get_all())
    }
}

/// `CollectionsWrite`: stores the decoded payload as a token string.
pub struct WriteProcessor {
    store: Arc<MessageStore>,
}

impl WriteProcessor {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self { store }
    }

    fn decode_record(message: &MessageEnvelope) -> Result<String, String> {
        let bytes = message
            .decode_data()
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "message carries no data".to_string())?;
        let record = String::from_utf8(bytes).map_err(|e| format!("data is not UTF-8: {}", e))?;
        if record.trim().is_empty() {
            return Err("data is empty".into());
        }
        Ok(record)
    }
}

impl MessageProcessor for WriteProcessor {
    fn process(&self, message: &MessageEnvelope) -> MessageReply {
        match Self::decode_record(message) {
            Ok(record) => {
                self.store.add(serde_json::Value::String(record));
                MessageReply::ok(message.message_id(), Vec::new())
            }
            Err(reason) => {
                tracing::debug!(message_id = message.message_id(), %reason, "rejecting write");
                MessageReply::status(message.message_id(), MessageStatus::MALFORMED_MESSAGE)
            }
        }
    }
}

/// `FeatureDetectionRead`: describes the interfaces this hub supports.
#[derive(Debug, Default)]
pub struct FeatureDetectionProcessor;

impl FeatureDetectionProcessor {
    pub fn descriptor() -> serde_json::Value {
        serde_json::json!({
            "type": "FeatureDetection",
            "interfaces": {
                "collections": {
                    "CollectionsQuery": true,
                    "CollectionsWrite": true,
                },
                "featureDetection": {
                    "FeatureDetectionRead": true,
                }
            }
        })
    }
}

impl MessageProcessor for FeatureDetectionProcessor {
    fn process(&self, message: &MessageEnvelope) -> MessageReply {
        MessageReply::ok(message.message_id(), vec![Self::descriptor()])
    }
}

/// Fallback for methods with no registered processor.
#[derive(Debug, Default)]
pub struct NotImplementedProcessor;

impl MessageProcessor for NotImplementedProcessor {
    fn process(&self, message: &MessageEnvelope) -> MessageReply {
        MessageReply::status(message.message_id(), MessageStatus::INTERFACE_NOT_IMPLEMENTED)
    }
}

/// Method-keyed dispatch table.
pub struct MessageProcessorRegistry {
    processors: HashMap<MessageMethod, Arc<dyn MessageProcessor>>,
    fallback: Arc<dyn MessageProcessor>,
}

impl Default for MessageProcessorRegistry {
    fn default() -> Self {
        Self {
            processors: HashMap::new(),
            fallback: Arc::new(NotImplementedProcessor),
        }
    }
}

impl MessageProcessorRegistry {
    /// Empty registry; every method resolves to [`NotImplementedProcessor`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the query, write and feature-detection processors
    /// backed by `store`.
    pub fn with_defaults(store: Arc<MessageStore>) -> Self {
        let mut registry = Self::new();
        registry.register(MessageMethod::Query, Arc::new(QueryProcessor::new(store.clone())));
        registry.register(MessageMethod::Write, Arc::new(WriteProcessor::new(store)));
        registry.register(MessageMethod::FeatureDetection, Arc::new(FeatureDetectionProcessor));
        registry
    }

    /// Register a processor. A later registration for the same method
    /// replaces the earlier one.
    pub fn register(&mut self, method: MessageMethod, processor: Arc<dyn MessageProcessor>) {
        if self.processors.insert(method.clone(), processor).is_some() {
            tracing::debug!(%method, "replaced message processor");
        }
    }

    pub fn resolve(&self, method: &MessageMethod) -> Arc<dyn MessageProcessor> {
        self.processors
            .get(method)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
