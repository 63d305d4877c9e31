use serde::{Deserialize, Serialize};

/// Service type under which a participant advertises its identity hub.
pub const IDENTITY_HUB_SERVICE_TYPE: &str = "IdentityHub";

/// Verification method type for Ed25519 keys.
pub const ED25519_VERIFICATION_KEY: &str = "Ed25519VerificationKey2020";

/// A verification method within a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Verification method identifier (e.g., "did:web:example.com#keys-1").
    pub id: String,
    /// Type of the verification method (e.g., "Ed25519VerificationKey2020").
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID that controls this verification method.
    pub controller: String,
    /// Base58-encoded public key material.
    pub public_key_base58: String,
}

/// A service endpoint in a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default)]
    pub id: String,
    /// Service type (e.g., "IdentityHub").
    #[serde(rename = "type")]
    pub service_type: String,
    /// Service endpoint URL.
    pub service_endpoint: String,
}

/// DID Document, restricted to the parts the hub verifier reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// The DID subject.
    pub id: String,
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default)]
    pub service: Vec<Service>,
}

impl DidDocument {
    /// Create an empty document for a DID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            verification_method: Vec::new(),
            service: Vec::new(),
        }
    }

    /// Add a service endpoint.
    pub fn with_service(mut self, service_type: &str, endpoint: &str) -> Self {
        let idx = self.service.len() + 1;
        self.service.push(Service {
            id: format!("{}#service-{}", self.id, idx),
            service_type: service_type.to_string(),
            service_endpoint: endpoint.to_string(),
        });
        self
    }

    /// Add an Ed25519 verification method.
    pub fn with_ed25519_key(mut self, public_key_base58: &str) -> Self {
        let idx = self.verification_method.len() + 1;
        self.verification_method.push(VerificationMethod {
            id: format!("{}#keys-{}", self.id, idx),
            method_type: ED25519_VERIFICATION_KEY.to_string(),
            controller: self.id.clone(),
            public_key_base58: public_key_base58.to_string(),
        });
        self
    }

    /// Services of the document.
    pub fn services(&self) -> &[Service] {
        &self.service
    }

    /// Endpoint of the first service of the given type.
    pub fn service_endpoint(&self, service_type: &str) -> Option<&str> {
        self.service
            .iter()
            .find(|s| s.service_type == service_type)
            .map(|s| s.service_endpoint.as_str())
    }

    /// Base58 key of the first Ed25519 verification method.
    pub fn primary_ed25519_key(&self) -> Option<&str> {
        self.verification_method
            .iter()
            .find(|vm| vm.method_type == ED25519_VERIFICATION_KEY)
            .map(|vm| vm.public_key_base58.as_str())
    }
}
