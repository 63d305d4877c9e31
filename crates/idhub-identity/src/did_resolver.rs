use async_trait::async_trait;
use dashmap::DashMap;

use crate::document::DidDocument;
use crate::error::IdentityError;

/// Trait for resolving DIDs to their documents.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve a DID URI to its DID Document.
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError>;
}

/// Resolves DIDs from documents registered in memory.
#[derive(Debug, Default)]
pub struct InMemoryDidResolver {
    documents: DashMap<String, DidDocument>,
}

impl InMemoryDidResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a document under its own id.
    pub fn register(&self, document: DidDocument) {
        tracing::debug!(did = %document.id, "DID document registered");
        self.documents.insert(document.id.clone(), document);
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no documents are registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DidResolver for InMemoryDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        self.documents
            .get(did)
            .map(|doc| doc.value().clone())
            .ok_or_else(|| IdentityError::DidNotFound(did.to_string()))
    }
}
