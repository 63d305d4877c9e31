use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;

/// A verifiable credential as published to an identity hub.
///
/// Immutable once built: the id is guaranteed non-empty and the claims map
/// can only be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCredential")]
pub struct VerifiableCredential {
    id: String,
    claims: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RawCredential {
    id: String,
    #[serde(default)]
    claims: BTreeMap<String, String>,
}

impl TryFrom<RawCredential> for VerifiableCredential {
    type Error = CoreError;

    fn try_from(raw: RawCredential) -> Result<Self, Self::Error> {
        Self::new(raw.id, raw.claims)
    }
}

impl VerifiableCredential {
    /// Build a credential. Fails if the id is empty or blank.
    pub fn new(
        id: impl Into<String>,
        claims: BTreeMap<String, String>,
    ) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::InvalidCredential(
                "credential id must not be empty".into(),
            ));
        }
        Ok(Self { id, claims })
    }

    /// Unique credential identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Property → value claims carried by the credential.
    pub fn claims(&self) -> &BTreeMap<String, String> {
        &self.claims
    }

    /// Look up a single claim value.
    pub fn claim(&self, property: &str) -> Option<&str> {
        self.claims.get(property).map(String::as_str)
    }
}

/// A single claim extracted from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// DID the claim is about.
    pub subject: String,
    /// Claim property name (e.g. "region").
    pub property: String,
    /// Claim value.
    pub value: String,
    /// DID of the credential issuer.
    pub issuer: String,
}

impl Claim {
    /// Aggregation key: `"<issuer>:<property>"`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.issuer, self.property)
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} (issuer {})", self.property, self.value, self.issuer)
    }
}
