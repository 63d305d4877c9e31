//! Hub message protocol: request/response envelopes exchanged over a single
//! HTTP POST endpoint.
//!
//! A request carries one or more messages; every message is answered by its
//! own reply so a bad message never fails its siblings.

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;

/// Placeholder message id used when a message carries no nonce.
pub const DEFAULT_MESSAGE_ID: &str = "messageId";

/// Method tag of a hub message.
///
/// Unknown method names are kept verbatim in [`MessageMethod::Other`] so
/// they can be answered with INTERFACE_NOT_IMPLEMENTED instead of failing
/// the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageMethod {
    /// `CollectionsQuery`: list stored credentials.
    Query,
    /// `CollectionsWrite`: append a credential.
    Write,
    /// `FeatureDetectionRead`: describe hub capabilities.
    FeatureDetection,
    /// Any other method name.
    Other(String),
}

impl MessageMethod {
    /// Wire name of the method.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Query => "CollectionsQuery",
            Self::Write => "CollectionsWrite",
            Self::FeatureDetection => "FeatureDetectionRead",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for MessageMethod {
    fn from(name: String) -> Self {
        match name.as_str() {
            "CollectionsQuery" => Self::Query,
            "CollectionsWrite" => Self::Write,
            "FeatureDetectionRead" => Self::FeatureDetection,
            _ => Self::Other(name),
        }
    }
}

impl From<MessageMethod> for String {
    fn from(method: MessageMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for MessageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-message status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStatus {
    pub code: u16,
    pub detail: Cow<'static, str>,
}

impl MessageStatus {
    pub const OK: Self = Self {
        code: 200,
        detail: Cow::Borrowed("The message was successfully processed"),
    };
    pub const MALFORMED_MESSAGE: Self = Self {
        code: 400,
        detail: Cow::Borrowed("The message was malformed or improperly constructed"),
    };
    /// Reserved; authorization is not enforced by the hub.
    pub const FAILED_AUTHORIZATION: Self = Self {
        code: 401,
        detail: Cow::Borrowed("The message failed authorization requirements"),
    };
    pub const INTERFACE_NOT_IMPLEMENTED: Self = Self {
        code: 501,
        detail: Cow::Borrowed("The interface method is not implemented"),
    };

    /// Whether the code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Request-level status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatus {
    pub code: u16,
    pub detail: Cow<'static, str>,
}

impl RequestStatus {
    pub const OK: Self = Self {
        code: 200,
        detail: Cow::Borrowed("The request was successfully processed"),
    };

    /// Whether the code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Descriptor of a single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub method: MessageMethod,
    #[serde(default)]
    pub nonce: String,
}

/// A single message inside a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub descriptor: Descriptor,
    /// Base64 payload (URL-safe alphabet on write; standard also accepted).
    #[serde(default)]
    pub data: Option<String>,
}

impl MessageEnvelope {
    /// Build a message with a fresh random nonce, base64url-encoding `data`.
    pub fn new(method: MessageMethod, data: Option<&[u8]>) -> Self {
        Self {
            descriptor: Descriptor {
                method,
                nonce: Uuid::new_v4().to_string(),
            },
            data: data.map(|bytes| URL_SAFE.encode(bytes)),
        }
    }

    /// Method tag of this message.
    pub fn method(&self) -> &MessageMethod {
        &self.descriptor.method
    }

    /// Id used for the reply: the nonce, or a placeholder when absent.
    pub fn message_id(&self) -> &str {
        if self.descriptor.nonce.is_empty() {
            DEFAULT_MESSAGE_ID
        } else {
            &self.descriptor.nonce
        }
    }

    /// Decode the base64 payload, if any.
    pub fn decode_data(&self) -> Result<Option<Vec<u8>>, CoreError> {
        let Some(data) = self.data.as_deref() else {
            return Ok(None);
        };
        let trimmed = data.trim();
        URL_SAFE
            .decode(trimmed)
            .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed))
            .or_else(|_| STANDARD.decode(trimmed))
            .map(Some)
            .map_err(|e| CoreError::Parse(format!("invalid base64 message data: {}", e)))
    }
}

/// Request envelope posted to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub request_id: String,
    #[serde(default)]
    pub target: String,
    pub messages: Vec<MessageEnvelope>,
}

impl RequestEnvelope {
    /// Build a request with a fresh UUID request id.
    pub fn new(target: impl Into<String>, messages: Vec<MessageEnvelope>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            target: target.into(),
            messages,
        }
    }
}

/// Request envelope as received by the hub, before its messages are decoded.
///
/// Only the envelope shape is enforced here. Each message is decoded on its
/// own through [`IncomingMessage::decode`] so a malformed one is answered
/// with MALFORMED_MESSAGE instead of rejecting the whole request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRequest {
    pub request_id: String,
    #[serde(default)]
    pub target: String,
    pub messages: Vec<serde_json::Value>,
}

/// One message of an [`IncomingRequest`] after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    Valid(MessageEnvelope),
    Malformed {
        /// The message's nonce when one could be read, else [`DEFAULT_MESSAGE_ID`].
        message_id: String,
        reason: String,
    },
}

impl IncomingMessage {
    pub fn decode(raw: serde_json::Value) -> Self {
        let message_id = raw
            .get("descriptor")
            .and_then(|d| d.get("nonce"))
            .and_then(serde_json::Value::as_str)
            .filter(|nonce| !nonce.is_empty())
            .unwrap_or(DEFAULT_MESSAGE_ID)
            .to_string();
        match serde_json::from_value::<MessageEnvelope>(raw) {
            Ok(message) => Self::Valid(message),
            Err(e) => Self::Malformed {
                message_id,
                reason: e.to_string(),
            },
        }
    }
}

/// Reply to a single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReply {
    pub message_id: String,
    pub status: MessageStatus,
    #[serde(default)]
    pub entries: Vec<serde_json::Value>,
}

impl MessageReply {
    /// Reply with a status and no entries.
    pub fn status(message_id: impl Into<String>, status: MessageStatus) -> Self {
        Self {
            message_id: message_id.into(),
            status,
            entries: Vec::new(),
        }
    }

    /// OK reply carrying entries.
    pub fn ok(message_id: impl Into<String>, entries: Vec<serde_json::Value>) -> Self {
        Self {
            message_id: message_id.into(),
            status: MessageStatus::OK,
            entries,
        }
    }
}

/// Response envelope returned by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub request_id: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub replies: Vec<MessageReply>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_wire_names() {
        for (method, name) in [
            (MessageMethod::Query, "CollectionsQuery"),
            (MessageMethod::Write, "CollectionsWrite"),
            (MessageMethod::FeatureDetection, "FeatureDetectionRead"),
        ] {
            assert_eq!(serde_json::to_value(&method).unwrap(), serde_json::json!(name));
            assert_eq!(MessageMethod::from(name.to_string()), method);
        }
    }

    #[test]
    fn test_unknown_method_preserved() {
        let method: MessageMethod = serde_json::from_str(r#""PermissionsRequest""#).unwrap();
        assert_eq!(method, MessageMethod::Other("PermissionsRequest".into()));
        assert_eq!(method.to_string(), "PermissionsRequest");
    }

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::json!({
            "requestId": "6a7d1b8e-0000-4000-8000-000000000000",
            "target": "did:y",
            "messages": [
                {"descriptor": {"method": "CollectionsQuery", "nonce": "n1"}, "data": null},
                {"descriptor": {"method": "CollectionsWrite", "nonce": "n2"}, "data": "aGVsbG8="}
            ]
        });
        let req: RequestEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].method(), &MessageMethod::Query);
        assert_eq!(req.messages[0].decode_data().unwrap(), None);
        assert_eq!(
            req.messages[1].decode_data().unwrap(),
            Some(b"hello".to_vec())
        );
    }

    #[test]
    fn test_incoming_messages_decoded_one_by_one() {
        let json = serde_json::json!({
            "requestId": "r1",
            "messages": [
                {"descriptor": {"method": "CollectionsQuery", "nonce": "n1"}},
                {"nonce": "outside-descriptor"},
                {"descriptor": {"method": 7, "nonce": "n3"}},
                {"descriptor": {"method": "CollectionsWrite", "nonce": ""}, "data": 12},
                "not an object"
            ]
        });
        let incoming: IncomingRequest = serde_json::from_value(json).unwrap();
        assert_eq!(incoming.request_id, "r1");
        assert_eq!(incoming.target, "");
        let messages: Vec<IncomingMessage> = incoming
            .messages
            .into_iter()
            .map(IncomingMessage::decode)
            .collect();
        assert_eq!(messages.len(), 5);

        assert!(matches!(&messages[0], IncomingMessage::Valid(m) if m.message_id() == "n1"));
        let ids: Vec<&str> = messages[1..]
            .iter()
            .map(|m| match m {
                IncomingMessage::Malformed { message_id, .. } => message_id.as_str(),
                IncomingMessage::Valid(_) => panic!("expected malformed message"),
            })
            .collect();
        assert_eq!(ids, vec![DEFAULT_MESSAGE_ID, "n3", DEFAULT_MESSAGE_ID, DEFAULT_MESSAGE_ID]);
    }

    #[test]
    fn test_incoming_request_needs_envelope_fields() {
        let missing_messages = serde_json::json!({"requestId": "r1"});
        assert!(serde_json::from_value::<IncomingRequest>(missing_messages).is_err());
        let missing_id = serde_json::json!({"messages": []});
        assert!(serde_json::from_value::<IncomingRequest>(missing_id).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let resp = ResponseEnvelope {
            request_id: "r1".into(),
            status: RequestStatus::OK,
            replies: vec![MessageReply::ok("n1", vec![serde_json::json!("tok")])],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["requestId"], "r1");
        assert_eq!(json["status"]["code"], 200);
        assert_eq!(json["replies"][0]["messageId"], "n1");
        assert_eq!(json["replies"][0]["status"]["code"], 200);
        assert_eq!(json["replies"][0]["entries"][0], "tok");
    }

    #[test]
    fn test_message_new_fresh_nonce_and_encoding() {
        let a = MessageEnvelope::new(MessageMethod::Write, Some("a.b.c".as_bytes()));
        let b = MessageEnvelope::new(MessageMethod::Write, Some("a.b.c".as_bytes()));
        assert_ne!(a.descriptor.nonce, b.descriptor.nonce);
        assert_eq!(a.message_id(), a.descriptor.nonce);
        assert_eq!(a.decode_data().unwrap(), Some(b"a.b.c".to_vec()));
    }

    #[test]
    fn test_message_id_placeholder() {
        let msg: MessageEnvelope =
            serde_json::from_str(r#"{"descriptor":{"method":"CollectionsQuery"}}"#).unwrap();
        assert_eq!(msg.message_id(), DEFAULT_MESSAGE_ID);
    }

    #[test]
    fn test_decode_invalid_base64() {
        let msg = MessageEnvelope {
            descriptor: Descriptor {
                method: MessageMethod::Write,
                nonce: "n".into(),
            },
            data: Some("!!not base64!!".into()),
        };
        assert!(msg.decode_data().is_err());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(MessageStatus::OK.code, 200);
        assert_eq!(MessageStatus::MALFORMED_MESSAGE.code, 400);
        assert_eq!(MessageStatus::FAILED_AUTHORIZATION.code, 401);
        assert_eq!(MessageStatus::INTERFACE_NOT_IMPLEMENTED.code, 501);
        assert!(MessageStatus::OK.is_success());
        assert!(!MessageStatus::MALFORMED_MESSAGE.is_success());
        assert!(RequestStatus::OK.is_success());
    }
}
