//! Credential verification pipeline.
//!
//! Discovers a participant's hub from its DID document, fetches every stored
//! token, verifies each one independently and aggregates the claims of the
//! survivors. Only hub discovery and the fetch itself are fatal; a bad token
//! is dropped and logged, never allowed to block the valid ones.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use idhub_client::CredentialFetcher;
use idhub_core::{Claim, VerifiableCredential};
use idhub_identity::{DidDocument, DidPublicKeyResolver, IDENTITY_HUB_SERVICE_TYPE};

use crate::codec::{decode_claims, extract_credential, verify_claims, verify_signature};
use crate::error::VerifierError;

/// Why a fetched token was not trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The token could not be decoded at all.
    MalformedToken,
    /// The token names no issuer.
    MissingIssuer,
    /// `sub` is missing or differs from the DID being verified.
    SubjectMismatch,
    /// No public key could be resolved for the `iss` DID.
    IssuerKeyUnresolvable,
    /// The signature does not verify against the issuer key.
    BadSignature,
    /// The `vc` claim is absent or not a credential.
    MalformedVcClaim,
}

impl DropReason {
    /// Stable snake_case name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedToken => "malformed_token",
            Self::MissingIssuer => "missing_issuer",
            Self::SubjectMismatch => "subject_mismatch",
            Self::IssuerKeyUnresolvable => "issuer_key_unresolvable",
            Self::BadSignature => "bad_signature",
            Self::MalformedVcClaim => "malformed_vc_claim",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token that failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedCredential {
    /// Position of the token in the hub's response.
    pub index: usize,
    pub reason: DropReason,
    pub detail: String,
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifiedClaims {
    /// `"issuer:property"` → value, last write wins in fetch order.
    pub claims: BTreeMap<String, String>,
    /// Ids of the credentials that passed, in fetch order.
    pub credential_ids: Vec<String>,
    /// Tokens that were dropped, in fetch order.
    pub dropped: Vec<DroppedCredential>,
}

impl VerifiedClaims {
    /// Look up an aggregated claim.
    pub fn get(&self, issuer: &str, property: &str) -> Option<&str> {
        self.claims
            .get(&format!("{}:{}", issuer, property))
            .map(String::as_str)
    }
}

/// A token that survived every check.
struct VerifiedToken {
    issuer: String,
    credential: VerifiableCredential,
}

/// Turns hub-stored tokens into verified claims.
pub struct CredentialVerificationPipeline {
    fetcher: Arc<dyn CredentialFetcher>,
    key_resolver: Arc<dyn DidPublicKeyResolver>,
}

impl CredentialVerificationPipeline {
    /// Create a pipeline over a token source and an issuer-key resolver.
    pub fn new(
        fetcher: Arc<dyn CredentialFetcher>,
        key_resolver: Arc<dyn DidPublicKeyResolver>,
    ) -> Self {
        Self {
            fetcher,
            key_resolver,
        }
    }

    /// Fetch, verify and aggregate the credentials published by the owner of
    /// `did_document`.
    pub async fn get_verified_claims(
        &self,
        did_document: &DidDocument,
    ) -> Result<VerifiedClaims, VerifierError> {
        let subject = did_document.id.as_str();
        tracing::info!(did = subject, "retrieving verified credentials");

        let hub_url = did_document
            .service_endpoint(IDENTITY_HUB_SERVICE_TYPE)
            .ok_or_else(|| {
                tracing::error!(did = subject, "no identity hub service in DID document");
                VerifierError::Resolution(format!(
                    "DID document {} has no '{}' service",
                    subject, IDENTITY_HUB_SERVICE_TYPE
                ))
            })?;
        tracing::info!(did = subject, hub_url, "using identity hub");

        let tokens = self.fetcher.fetch_credentials(hub_url).await.map_err(|e| {
            tracing::error!(hub_url, error = %e, "could not retrieve credentials from hub");
            VerifierError::from(e)
        })?;
        tracing::info!(hub_url, count = tokens.len(), "retrieved credentials");

        // join_all keeps input order; aggregation below relies on it.
        let outcomes = join_all(
            tokens
                .iter()
                .enumerate()
                .map(|(index, token)| self.verify_token(index, token, subject)),
        )
        .await;

        let mut result = VerifiedClaims::default();
        for outcome in outcomes {
            match outcome {
                Ok(verified) => {
                    for (property, value) in verified.credential.claims() {
                        let claim = Claim {
                            subject: subject.to_string(),
                            property: property.clone(),
                            value: value.clone(),
                            issuer: verified.issuer.clone(),
                        };
                        if let Some(previous) = result.claims.insert(claim.key(), claim.value) {
                            tracing::debug!(
                                key = %format!("{}:{}", verified.issuer, property),
                                previous = %previous,
                                "claim overwritten by later credential"
                            );
                        }
                    }
                    result
                        .credential_ids
                        .push(verified.credential.id().to_string());
                }
                Err(dropped) => result.dropped.push(dropped),
            }
        }

        tracing::info!(
            did = subject,
            verified = result.credential_ids.len(),
            dropped = result.dropped.len(),
            claims = result.claims.len(),
            "credential verification complete"
        );
        Ok(result)
    }

    async fn verify_token(
        &self,
        index: usize,
        token: &str,
        subject: &str,
    ) -> Result<VerifiedToken, DroppedCredential> {
        let reject = |reason: DropReason, detail: String| {
            tracing::warn!(index, reason = reason.as_str(), %detail, "dropping credential");
            DroppedCredential {
                index,
                reason,
                detail,
            }
        };

        let decoded = decode_claims(token)
            .map_err(|e| reject(DropReason::MalformedToken, e.to_string()))?;
        if decoded.iss.as_deref().map_or(true, str::is_empty) {
            return Err(reject(
                DropReason::MissingIssuer,
                "token has no 'iss' claim".to_string(),
            ));
        }

        let claims = verify_claims(token, subject)
            .map_err(|e| reject(DropReason::SubjectMismatch, e.to_string()))?;
        // iss was checked non-empty above
        let issuer = claims.iss.unwrap_or_default();

        let public_key = self
            .key_resolver
            .resolve_public_key(&issuer)
            .await
            .map_err(|e| {
                reject(
                    DropReason::IssuerKeyUnresolvable,
                    format!("issuer {}: {}", issuer, e),
                )
            })?;

        match verify_signature(token, &public_key) {
            Ok(true) => {}
            Ok(false) => {
                return Err(reject(
                    DropReason::BadSignature,
                    format!("signature does not match key of {}", issuer),
                ))
            }
            Err(e) => return Err(reject(DropReason::BadSignature, e.to_string())),
        }

        let (credential_id, credential) = extract_credential(token)
            .map_err(|e| reject(DropReason::MalformedVcClaim, e.to_string()))?;
        tracing::debug!(index, credential_id = %credential_id, issuer = %issuer, "credential verified");

        Ok(VerifiedToken { issuer, credential })
    }
}
