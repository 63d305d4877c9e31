//! Identity Hub Client: talks the hub message protocol over HTTP.
//!
//! Every call makes exactly one network attempt; retry policy belongs to
//! the caller.

pub mod client;
pub mod error;

pub use client::{CredentialFetcher, HubClient};
pub use error::ClientError;
