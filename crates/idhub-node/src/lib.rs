//! Identity Hub node: message store, protocol processors, and the HTTP API
//! that serves the hub protocol.

pub mod api;
pub mod config;
pub mod endpoint;
pub mod processor;
pub mod store;

use std::sync::Arc;

pub use api::{build_router, start_api_server};
pub use config::HubConfig;
pub use endpoint::HubProtocolEndpoint;
pub use processor::{
    FeatureDetectionProcessor, MessageProcessor, MessageProcessorRegistry,
    NotImplementedProcessor, QueryProcessor, WriteProcessor,
};
pub use store::MessageStore;

/// Wire the default processors over `store` and build the hub router.
pub fn hub_router(store: Arc<MessageStore>, base_path: &str) -> axum::Router {
    let registry = Arc::new(MessageProcessorRegistry::with_defaults(store));
    build_router(Arc::new(HubProtocolEndpoint::new(registry)), base_path)
}
