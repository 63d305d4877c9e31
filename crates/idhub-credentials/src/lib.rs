//! Identity Hub Credentials: signed-token codec, issuer, and the
//! verification pipeline that turns hub-stored tokens into trusted claims.

pub mod codec;
pub mod error;
pub mod issuer;
pub mod verifier;

pub use codec::{
    build_signed_token, decode_claims, extract_credential, verify_claims, verify_signature,
    TokenClaims, SIGNING_ALGORITHM,
};
pub use error::{CodecError, VerifierError};
pub use issuer::CredentialIssuer;
pub use verifier::{
    CredentialVerificationPipeline, DropReason, DroppedCredential, VerifiedClaims,
};
