//! Identity Hub key material and raw Ed25519 signatures.

pub mod error;
pub mod keys;
pub mod signing;

pub use error::CryptoError;
pub use keys::{KeyPair, PublicKey};
pub use signing::{sign, verify, Signature, SIGNATURE_LENGTH};
