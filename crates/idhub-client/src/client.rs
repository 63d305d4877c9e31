use async_trait::async_trait;

use idhub_core::{MessageEnvelope, MessageMethod, MessageReply, RequestEnvelope, ResponseEnvelope};

use crate::error::ClientError;

/// Source of raw credential tokens published at a hub.
///
/// Implemented by [`HubClient`]; the verifier depends on this trait so the
/// transport can be substituted.
#[async_trait]
pub trait CredentialFetcher: Send + Sync {
    /// Fetch every token stored at `hub_url`, in hub order.
    async fn fetch_credentials(&self, hub_url: &str) -> Result<Vec<String>, ClientError>;
}

/// HTTP client for the hub message protocol.
#[derive(Debug, Clone, Default)]
pub struct HubClient {
    http: reqwest::Client,
}

impl HubClient {
    /// Create a client with a default `reqwest` configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client over a preconfigured `reqwest` client (timeouts, TLS).
    pub fn with_http(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Publish a signed credential token with a single `CollectionsWrite`.
    pub async fn submit_credential(&self, hub_url: &str, token: &str) -> Result<(), ClientError> {
        let message = MessageEnvelope::new(MessageMethod::Write, Some(token.as_bytes()));
        let (status, body, response) = self.post(hub_url, message).await?;
        let reply = first_reply(status, &body, &response)?;

        tracing::info!(hub_url, message_id = %reply.message_id, "credential submitted");
        Ok(())
    }

    /// Query every stored token with a single `CollectionsQuery`.
    pub async fn fetch_credentials(&self, hub_url: &str) -> Result<Vec<String>, ClientError> {
        let message = MessageEnvelope::new(MessageMethod::Query, None);
        let (status, body, response) = self.post(hub_url, message).await?;
        let reply = first_reply(status, &body, &response)?;

        let tokens = reply
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                entry.as_str().map(str::to_string).ok_or_else(|| ClientError::Protocol {
                    status,
                    body: body.clone(),
                    reason: format!("entry {} is not a token string", idx),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(hub_url, count = tokens.len(), "credentials fetched");
        Ok(tokens)
    }

    /// Post a one-message request and parse the response envelope.
    async fn post(
        &self,
        hub_url: &str,
        message: MessageEnvelope,
    ) -> Result<(u16, String, ResponseEnvelope), ClientError> {
        let request = RequestEnvelope::new(hub_url, vec![message]);
        let payload = serde_json::to_vec(&request)?;

        let resp = self
            .http
            .post(hub_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: hub_url.to_string(),
                source,
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|source| ClientError::Transport {
            url: hub_url.to_string(),
            source,
        })?;

        if !(200..300).contains(&status) {
            return Err(ClientError::Protocol {
                status,
                body,
                reason: "hub returned a non-success status".into(),
            });
        }

        let response: ResponseEnvelope = match serde_json::from_str(&body) {
            Ok(response) => response,
            Err(e) => {
                return Err(ClientError::Protocol {
                    status,
                    body,
                    reason: format!("malformed response envelope: {}", e),
                })
            }
        };

        if response.request_id != request.request_id {
            tracing::warn!(
                sent = %request.request_id,
                received = %response.request_id,
                "hub echoed a different request id"
            );
        }

        Ok((status, body, response))
    }
}

/// First reply of a response, which must exist and carry a success status.
fn first_reply<'a>(
    status: u16,
    body: &str,
    response: &'a ResponseEnvelope,
) -> Result<&'a MessageReply, ClientError> {
    let protocol = |reason: String| ClientError::Protocol {
        status,
        body: body.to_string(),
        reason,
    };

    if !response.status.is_success() {
        return Err(protocol(format!(
            "request failed with status {}: {}",
            response.status.code, response.status.detail
        )));
    }
    let reply = response
        .replies
        .first()
        .ok_or_else(|| protocol("response contains no replies".into()))?;
    if !reply.status.is_success() {
        return Err(protocol(format!(
            "message failed with status {}: {}",
            reply.status.code, reply.status.detail
        )));
    }
    Ok(reply)
}

#[async_trait]
impl CredentialFetcher for HubClient {
    async fn fetch_credentials(&self, hub_url: &str) -> Result<Vec<String>, ClientError> {
        HubClient::fetch_credentials(self, hub_url).await
    }
}
