//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use reqwest::header::{COOKIE, SET_COOKIE};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use satchel_server::{Server, ServerConfig};
use satchel_session::{ManagerConfig, SessionManager};

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server. Cookies are sent by hand.
    pub client: Client,
    /// The session manager behind the server.
    pub manager: Arc<SessionManager>,
    /// Triggers graceful shutdown.
    shutdown: Option<oneshot::Sender<()>>,
    /// Handle to the server task.
    handle: Option<JoinHandle<satchel_server::Result<()>>>,
}

impl TestServer {
    /// Start a new test server with default session settings.
    pub async fn start() -> Result<Self> {
        Self::start_with(ManagerConfig::default()).await
    }

    /// Start a new test server with the given session settings.
    pub async fn start_with(session: ManagerConfig) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let manager = Arc::new(SessionManager::in_memory(session)?);
        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_logging(false);

        let (tx, rx) = oneshot::channel();
        let server = Server::new(manager.clone(), config);
        let handle = tokio::spawn(server.run_with_shutdown(listener, async {
            let _ = rx.await;
        }));

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            manager,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// GET with an optional `name=value` cookie pair.
    pub fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(
            self.client.get(format!("{}{}", self.base_url(), path)),
            cookie,
        )
    }

    /// PUT with an optional cookie pair.
    pub fn put(&self, path: &str, cookie: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(
            self.client.put(format!("{}{}", self.base_url(), path)),
            cookie,
        )
    }

    /// POST with an optional cookie pair.
    pub fn post(&self, path: &str, cookie: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(
            self.client.post(format!("{}{}", self.base_url(), path)),
            cookie,
        )
    }

    /// DELETE with an optional cookie pair.
    pub fn delete(&self, path: &str, cookie: Option<&str>) -> reqwest::RequestBuilder {
        with_cookie(
            self.client.delete(format!("{}{}", self.base_url(), path)),
            cookie,
        )
    }

    /// Open a session and return the `name=value` pair to replay.
    pub async fn open_session(&self) -> Result<String> {
        let resp = self.get("/api/v1/session", None).send().await?;
        set_cookie_pair(&resp).ok_or_else(|| anyhow::anyhow!("no Set-Cookie on first request"))
    }

    /// Stop the server and wait for the GC loop to wind down.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await??;
        }
        Ok(())
    }
}

/// Extract the `name=value` pair from a response's `Set-Cookie` header.
pub fn set_cookie_pair(resp: &reqwest::Response) -> Option<String> {
    let header = resp.headers().get(SET_COOKIE)?.to_str().ok()?;
    header.split(';').next().map(|pair| pair.trim().to_string())
}

fn with_cookie(builder: reqwest::RequestBuilder, cookie: Option<&str>) -> reqwest::RequestBuilder {
    match cookie {
        Some(pair) => builder.header(COOKIE, pair),
        None => builder,
    }
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
