//! Integration test: issue → publish → fetch → verify over a live hub.

use std::collections::BTreeMap;
use std::sync::Arc;

use idhub_client::HubClient;
use idhub_core::{MessageEnvelope, MessageMethod, RequestEnvelope, ResponseEnvelope};
use idhub_credentials::{
    extract_credential, CredentialIssuer, CredentialVerificationPipeline, DropReason,
    VerifierError,
};
use idhub_crypto::KeyPair;
use idhub_identity::{
    DidDocument, DocumentKeyResolver, InMemoryDidResolver, StaticKeyResolver,
    IDENTITY_HUB_SERVICE_TYPE,
};
use idhub_integration_tests::TestHub;

fn credential(id: &str, claims: &[(&str, &str)]) -> idhub_core::VerifiableCredential {
    let claims: BTreeMap<String, String> = claims
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    idhub_core::VerifiableCredential::new(id, claims).expect("valid credential")
}

fn subject_document(did: &str, hub: &TestHub) -> DidDocument {
    DidDocument::new(did).with_service(IDENTITY_HUB_SERVICE_TYPE, &hub.url())
}

// =========================================================================
// Write and query
// =========================================================================

#[tokio::test]
async fn test_written_token_is_queried_verbatim() {
    let hub = TestHub::spawn().await.unwrap();
    let issuer = CredentialIssuer::new("did:x", KeyPair::generate());
    let token = issuer
        .issue(&credential("abc", &[("region", "eu")]), "did:y")
        .unwrap();

    let client = HubClient::new();
    client.submit_credential(&hub.url(), &token).await.unwrap();

    let tokens = client.fetch_credentials(&hub.url()).await.unwrap();
    assert_eq!(tokens, vec![token.clone()]);
    assert_eq!(hub.store.len(), 1);

    let (id, vc) = extract_credential(&tokens[0]).unwrap();
    assert_eq!(id, "abc");
    assert_eq!(vc.claim("region"), Some("eu"));
}

#[tokio::test]
async fn test_query_empty_hub() {
    let hub = TestHub::spawn().await.unwrap();
    let tokens = HubClient::new().fetch_credentials(&hub.url()).await.unwrap();
    assert!(tokens.is_empty());
}

#[tokio::test]
async fn test_mixed_request_over_http() {
    let hub = TestHub::spawn().await.unwrap();
    let request = RequestEnvelope::new(
        "did:y",
        vec![
            MessageEnvelope::new(MessageMethod::Write, Some("a.b.c".as_bytes())),
            MessageEnvelope::new(MessageMethod::Other("PermissionsGrant".into()), None),
            MessageEnvelope::new(MessageMethod::FeatureDetection, None),
            MessageEnvelope::new(MessageMethod::Query, None),
        ],
    );

    let http = post_envelope(&hub.url(), &request).await;
    assert_eq!(http.request_id, request.request_id);
    let codes: Vec<u16> = http.replies.iter().map(|r| r.status.code).collect();
    assert_eq!(codes, vec![200, 501, 200, 200]);
    assert_eq!(http.replies[3].entries, vec![serde_json::json!("a.b.c")]);
}

/// Post a raw envelope without going through the typed client.
async fn post_envelope(url: &str, request: &RequestEnvelope) -> ResponseEnvelope {
    let response = reqwest::Client::new()
        .post(url)
        .json(request)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

// =========================================================================
// Verification pipeline
// =========================================================================

#[tokio::test]
async fn test_pipeline_keeps_valid_and_drops_invalid() {
    let hub = TestHub::spawn().await.unwrap();
    let subject = "did:web:participant";

    let trusted = CredentialIssuer::new("did:web:trusted", KeyPair::generate());
    let unknown = CredentialIssuer::new("did:web:unknown", KeyPair::generate());
    let impostor = CredentialIssuer::new("did:web:trusted", KeyPair::generate());

    let client = HubClient::new();
    let tokens = vec![
        trusted.issue(&credential("membership", &[("member", "true")]), subject).unwrap(),
        trusted.issue(&credential("other", &[("member", "false")]), "did:web:someone-else").unwrap(),
        unknown.issue(&credential("anon", &[("tier", "gold")]), subject).unwrap(),
        impostor.issue(&credential("forged", &[("member", "admin")]), subject).unwrap(),
        trusted.issue(&credential("region", &[("region", "eu")]), subject).unwrap(),
    ];
    for token in &tokens {
        client.submit_credential(&hub.url(), token).await.unwrap();
    }

    let keys = StaticKeyResolver::new();
    keys.insert("did:web:trusted", trusted.public_key());
    let pipeline = CredentialVerificationPipeline::new(Arc::new(client), Arc::new(keys));

    let result = pipeline
        .get_verified_claims(&subject_document(subject, &hub))
        .await
        .unwrap();

    assert_eq!(result.credential_ids, vec!["membership", "region"]);
    assert_eq!(result.get("did:web:trusted", "member"), Some("true"));
    assert_eq!(result.get("did:web:trusted", "region"), Some("eu"));
    assert_eq!(result.claims.len(), 2);

    let reasons: Vec<DropReason> = result.dropped.iter().map(|d| d.reason).collect();
    assert_eq!(
        reasons,
        vec![
            DropReason::SubjectMismatch,
            DropReason::IssuerKeyUnresolvable,
            DropReason::BadSignature,
        ]
    );
}

#[tokio::test]
async fn test_pipeline_with_document_key_resolution() {
    let hub = TestHub::spawn().await.unwrap();
    let subject = "did:web:participant";
    let issuer = CredentialIssuer::new("did:web:issuer", KeyPair::generate());

    HubClient::new()
        .submit_credential(
            &hub.url(),
            &issuer.issue(&credential("c", &[("country", "DE")]), subject).unwrap(),
        )
        .await
        .unwrap();

    let dids = Arc::new(InMemoryDidResolver::new());
    dids.register(DidDocument::new("did:web:issuer").with_ed25519_key(&issuer.public_key().to_bs58()));
    let pipeline = CredentialVerificationPipeline::new(
        Arc::new(HubClient::new()),
        Arc::new(DocumentKeyResolver::new(dids)),
    );

    let result = pipeline
        .get_verified_claims(&subject_document(subject, &hub))
        .await
        .unwrap();
    assert_eq!(result.get("did:web:issuer", "country"), Some("DE"));
    assert!(result.dropped.is_empty());
}

#[tokio::test]
async fn test_pipeline_without_hub_service_makes_no_request() {
    let hub = TestHub::spawn().await.unwrap();
    let pipeline = CredentialVerificationPipeline::new(
        Arc::new(HubClient::new()),
        Arc::new(StaticKeyResolver::new()),
    );

    let err = pipeline
        .get_verified_claims(&DidDocument::new("did:web:participant"))
        .await
        .unwrap_err();
    assert!(matches!(err, VerifierError::Resolution(ref msg) if msg.contains("IdentityHub")));
    assert!(hub.store.is_empty());
}

#[tokio::test]
async fn test_pipeline_unreachable_hub_is_fatal() {
    // Nothing listens on port 1.
    let document = DidDocument::new("did:web:participant")
        .with_service(IDENTITY_HUB_SERVICE_TYPE, "http://127.0.0.1:1/api/identity-hub");
    let pipeline = CredentialVerificationPipeline::new(
        Arc::new(HubClient::new()),
        Arc::new(StaticKeyResolver::new()),
    );

    let err = pipeline.get_verified_claims(&document).await.unwrap_err();
    assert!(matches!(err, VerifierError::Fetch(_)));
}

#[tokio::test]
async fn test_malformed_body_rejected_by_live_hub() {
    let hub = TestHub::spawn().await.unwrap();
    let response = reqwest::Client::new()
        .post(hub.url())
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
    assert!(hub.store.is_empty());
}
