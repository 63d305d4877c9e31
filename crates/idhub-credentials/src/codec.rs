//! Compact signed-token codec for verifiable credentials.
//!
//! Tokens are JWS compact serializations signed with Ed25519
//! (`alg = "EdDSA"`) through `jsonwebtoken`. The credential travels in the
//! custom `vc` claim next to the registered `iss`, `sub` and `iat` claims.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use idhub_core::VerifiableCredential;
use idhub_crypto::{KeyPair, PublicKey};

use crate::error::CodecError;

/// JWS algorithm credentials are signed with.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::EdDSA;

/// Claim set of a signed token.
///
/// `vc` stays untyped here so that a token with a broken credential can
/// still have its registered claims checked; [`extract_credential`]
/// decodes it into a [`VerifiableCredential`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vc: Option<serde_json::Value>,
}

/// Validation shared by every decode: no registered claim is mandatory and
/// nothing expires. `iss`/`sub` are checked by [`verify_claims`].
fn base_validation() -> Validation {
    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation
}

/// Sign `credential` on behalf of `issuer` about `subject`, issued at `now`.
pub fn build_signed_token(
    credential: &VerifiableCredential,
    issuer: &str,
    subject: &str,
    keypair: &KeyPair,
    now: DateTime<Utc>,
) -> Result<String, CodecError> {
    if issuer.trim().is_empty() {
        return Err(CodecError::Signing("issuer must not be empty".into()));
    }

    let mut header = Header::new(SIGNING_ALGORITHM);
    header.kid = Some(format!("{}#keys-1", issuer));

    let vc = serde_json::to_value(credential)
        .map_err(|e| CodecError::Signing(format!("cannot encode credential: {}", e)))?;
    let claims = TokenClaims {
        iss: Some(issuer.to_string()),
        sub: Some(subject.to_string()),
        iat: Some(now.timestamp()),
        vc: Some(vc),
    };

    let der = keypair
        .to_pkcs8_der()
        .map_err(|e| CodecError::Signing(e.to_string()))?;
    jsonwebtoken::encode(&header, &claims, &EncodingKey::from_ed_der(&der))
        .map_err(|e| CodecError::Signing(e.to_string()))
}

/// Check the token's signature against `public_key`.
///
/// The signature covers the encoded header and claims verbatim, so any
/// change to the claims yields `Ok(false)`, as does a header naming another
/// algorithm. A token that cannot be split or decoded is an error.
pub fn verify_signature(token: &str, public_key: &PublicKey) -> Result<bool, CodecError> {
    let token = token.trim();
    let malformed = |e: jsonwebtoken::errors::Error| {
        CodecError::Verification(format!("malformed token: {}", e))
    };

    let header = jsonwebtoken::decode_header(token).map_err(malformed)?;
    if header.alg != SIGNING_ALGORITHM {
        tracing::debug!(alg = ?header.alg, "unsupported token algorithm");
        return Ok(false);
    }

    // An Ed25519 JWK `x` parameter is the raw key, base64url-encoded.
    let key = DecodingKey::from_ed_components(&URL_SAFE_NO_PAD.encode(public_key.as_bytes()))
        .map_err(malformed)?;

    match jsonwebtoken::decode::<serde_json::Value>(token, &key, &base_validation()) {
        Ok(_) => Ok(true),
        Err(e) => match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Ok(false),
            _ => Err(malformed(e)),
        },
    }
}

/// Decode the claim set of a compact token without checking the signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, CodecError> {
    let mut validation = base_validation();
    validation.insecure_disable_signature_validation();

    jsonwebtoken::decode::<TokenClaims>(token.trim(), &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| CodecError::Parse(e.to_string()))
}

/// Require an `iss` claim and `sub == expected_subject`.
///
/// Returns the decoded claims on success; the error names every missing or
/// mismatched claim.
pub fn verify_claims(token: &str, expected_subject: &str) -> Result<TokenClaims, CodecError> {
    let claims = decode_claims(token)?;

    let mut problems = Vec::new();
    if claims.iss.as_deref().map_or(true, str::is_empty) {
        problems.push("missing required claim 'iss'".to_string());
    }
    match claims.sub.as_deref() {
        None => problems.push("missing required claim 'sub'".to_string()),
        Some(sub) if sub != expected_subject => problems.push(format!(
            "claim 'sub' mismatch: expected '{}', found '{}'",
            expected_subject, sub
        )),
        Some(_) => {}
    }

    if problems.is_empty() {
        Ok(claims)
    } else {
        Err(CodecError::Claim(problems.join("; ")))
    }
}

/// Decode the `vc` claim into `(credential id, credential)`.
pub fn extract_credential(token: &str) -> Result<(String, VerifiableCredential), CodecError> {
    let claims = decode_claims(token)?;
    let vc = claims
        .vc
        .ok_or_else(|| CodecError::Extraction("no vc field found".into()))?;
    let credential: VerifiableCredential = serde_json::from_value(vc)
        .map_err(|e| CodecError::Extraction(format!("invalid vc claim: {}", e)))?;
    Ok((credential.id().to_string(), credential))
}
