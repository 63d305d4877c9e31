use std::sync::Arc;

use idhub_core::{
    IncomingMessage, IncomingRequest, MessageReply, MessageStatus, RequestEnvelope, RequestStatus,
    ResponseEnvelope,
};

use crate::processor::MessageProcessorRegistry;

/// Dispatches every message of a request and collects the replies.
pub struct HubProtocolEndpoint {
    registry: Arc<MessageProcessorRegistry>,
}

impl HubProtocolEndpoint {
    pub fn new(registry: Arc<MessageProcessorRegistry>) -> Self {
        Self { registry }
    }

    /// Handle a request envelope.
    ///
    /// Messages are processed in arrival order and replies keep that order.
    /// A failing message only affects its own reply; the request status is
    /// always OK.
    pub fn handle(&self, request: RequestEnvelope) -> ResponseEnvelope {
        let messages = request
            .messages
            .into_iter()
            .map(IncomingMessage::Valid)
            .collect();
        self.dispatch(request.request_id, &request.target, messages)
    }

    /// Handle a request whose messages have not been decoded yet. A message
    /// that does not decode is answered with MALFORMED_MESSAGE in its slot.
    pub fn handle_incoming(&self, request: IncomingRequest) -> ResponseEnvelope {
        let messages = request
            .messages
            .into_iter()
            .map(IncomingMessage::decode)
            .collect();
        self.dispatch(request.request_id, &request.target, messages)
    }

    fn dispatch(
        &self,
        request_id: String,
        target: &str,
        messages: Vec<IncomingMessage>,
    ) -> ResponseEnvelope {
        tracing::debug!(
            request_id = %request_id,
            target = %target,
            messages = messages.len(),
            "handling hub request"
        );

        let replies = messages
            .iter()
            .map(|message| match message {
                IncomingMessage::Valid(message) => {
                    let reply = self.registry.resolve(message.method()).process(message);
                    tracing::debug!(
                        request_id = %request_id,
                        method = %message.method(),
                        status = reply.status.code,
                        "message processed"
                    );
                    reply
                }
                IncomingMessage::Malformed { message_id, reason } => {
                    tracing::debug!(
                        request_id = %request_id,
                        message_id = %message_id,
                        %reason,
                        "rejecting malformed message"
                    );
                    MessageReply::status(message_id.clone(), MessageStatus::MALFORMED_MESSAGE)
                }
            })
            .collect();

        ResponseEnvelope {
            request_id,
            status: RequestStatus::OK,
            replies,
        }
    }
}
