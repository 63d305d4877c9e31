//! Identity Hub Identity Layer
//!
//! DID documents and the two capabilities the verifier consumes:
//! - DID resolution (`DidResolver`)
//! - issuer public-key resolution (`DidPublicKeyResolver`)
//!
//! Both are traits so callers can inject their own resolution mechanics.

pub mod did_resolver;
pub mod document;
pub mod error;
pub mod key_resolver;

pub use did_resolver::{DidResolver, InMemoryDidResolver};
pub use document::{DidDocument, Service, VerificationMethod, IDENTITY_HUB_SERVICE_TYPE};
pub use error::IdentityError;
pub use key_resolver::{DidPublicKeyResolver, DocumentKeyResolver, StaticKeyResolver};
