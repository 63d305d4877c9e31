use chrono::{DateTime, Utc};

use idhub_core::VerifiableCredential;
use idhub_crypto::{KeyPair, PublicKey};

use crate::codec::build_signed_token;
use crate::error::CodecError;

/// Issues signed credential tokens with the issuer's keypair.
pub struct CredentialIssuer {
    /// DID of the issuer, written into the `iss` claim.
    did: String,
    /// Issuer's signing keypair.
    keypair: KeyPair,
}

impl CredentialIssuer {
    /// Create a new credential issuer.
    pub fn new(did: impl Into<String>, keypair: KeyPair) -> Self {
        Self {
            did: did.into(),
            keypair,
        }
    }

    /// Get the issuer's DID.
    pub fn did(&self) -> &str {
        &self.did
    }

    /// Public key relying parties need to verify this issuer's tokens.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Issue a token for `subject_did`, timestamped now.
    pub fn issue(
        &self,
        credential: &VerifiableCredential,
        subject_did: &str,
    ) -> Result<String, CodecError> {
        self.issue_at(credential, subject_did, Utc::now())
    }

    /// Issue a token with an explicit issuance time.
    pub fn issue_at(
        &self,
        credential: &VerifiableCredential,
        subject_did: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, CodecError> {
        let token =
            build_signed_token(credential, &self.did, subject_did, &self.keypair, issued_at)?;

        tracing::info!(
            issuer = %self.did,
            subject = subject_did,
            credential_id = credential.id(),
            "credential issued"
        );

        Ok(token)
    }
}
