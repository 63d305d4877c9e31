//! Identity Hub Core: credential model, hub message protocol, and errors
//! shared by the hub node, the hub client, and the verifier.

pub mod error;
pub mod protocol;
pub mod types;

pub use error::CoreError;
pub use protocol::{
    Descriptor, IncomingMessage, IncomingRequest, MessageEnvelope, MessageMethod, MessageReply,
    MessageStatus, RequestEnvelope, RequestStatus, ResponseEnvelope, DEFAULT_MESSAGE_ID,
};
pub use types::{Claim, VerifiableCredential};
