#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::Router;
use vms_client::{ResourceClient, StateStore};

/// An in-process stand-in for the VMS API, bound on a free local port.
pub struct MockApi {
    pub port: u16,
    pub base_url: String,
}

impl MockApi {
    pub async fn spawn(router: Router) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind mock API")?;
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        let api = Self { port, base_url };
        api.wait_ready(Duration::from_secs(5)).await?;
        Ok(api)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            // Any HTTP response, even a 404, means the listener is serving
            if client.get(format!("{}/", self.base_url)).send().await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("mock API did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn client(&self) -> ResourceClient {
        ResourceClient::new(&self.base_url).expect("valid mock URL")
    }
}

/// Request counter shared between a handler and the test.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A fresh, uniquely named store directory under the system temp dir.
pub fn temp_store_dir() -> PathBuf {
    std::env::temp_dir().join(format!("vms-test-{}", uuid::Uuid::new_v4()))
}

pub fn temp_store() -> (PathBuf, StateStore) {
    let dir = temp_store_dir();
    let store = StateStore::open(&dir).expect("open temp store");
    (dir, store)
}
