//! Fixtures for the cross-crate tests: a hub node served over real HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use idhub_node::{hub_router, MessageStore};

pub const BASE_PATH: &str = "/api/identity-hub";

/// A hub node running on an ephemeral local port.
pub struct TestHub {
    pub addr: SocketAddr,
    pub store: Arc<MessageStore>,
    server: tokio::task::JoinHandle<()>,
}

impl TestHub {
    /// Bind `127.0.0.1:0` and serve the hub protocol in a background task.
    pub async fn spawn() -> std::io::Result<Self> {
        let store = Arc::new(MessageStore::new());
        let app = hub_router(store.clone(), BASE_PATH);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "test hub stopped");
            }
        });

        Ok(Self {
            addr,
            store,
            server,
        })
    }

    /// Hub protocol URL, as advertised in a DID document.
    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, BASE_PATH)
    }
}

impl Drop for TestHub {
    fn drop(&mut self) {
        self.server.abort();
    }
}
