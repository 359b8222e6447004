//! vSphere Sessions
//!
//! Lazily created, per-server vSphere sessions. A cached session is probed
//! before reuse and recreated when it has gone stale.

use crate::config::{VCenterCredential, DEFAULT_VSPHERE_CALL_TIMEOUT};
use crate::domain::ports::{VirtualizationConnectorRef, VirtualizationInventoryRef};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Run one vSphere call under a fixed deadline
pub async fn with_deadline<T, F>(operation: &str, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation: operation.to_string(),
            seconds: timeout.as_secs(),
        }),
    }
}

/// Session manager for vSphere endpoints
pub struct VSphereSessions {
    connector: VirtualizationConnectorRef,
    credentials: BTreeMap<String, VCenterCredential>,
    sessions: HashMap<String, VirtualizationInventoryRef>,
    call_timeout: Duration,
}

impl VSphereSessions {
    /// Create an empty session manager
    pub fn new(connector: VirtualizationConnectorRef) -> Self {
        Self {
            connector,
            credentials: BTreeMap::new(),
            sessions: HashMap::new(),
            call_timeout: DEFAULT_VSPHERE_CALL_TIMEOUT,
        }
    }

    /// Deadline for the session probe and login calls
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Register credentials for a server. The first registration wins.
    pub fn add_credentials(&mut self, server: impl Into<String>, credential: VCenterCredential) {
        self.credentials.entry(server.into()).or_insert(credential);
    }

    /// Configured servers, in sorted order
    pub fn servers(&self) -> Vec<String> {
        self.credentials.keys().cloned().collect()
    }

    /// Get the session for a server, creating or recreating it as needed
    pub async fn session(&mut self, server: &str) -> Result<VirtualizationInventoryRef> {
        let credential = self
            .credentials
            .get(server)
            .ok_or_else(|| Error::CredentialsNotFound {
                target: server.to_string(),
            })?;

        if let Some(existing) = self.sessions.get(server) {
            match with_deadline("session check", self.call_timeout, existing.is_active()).await {
                Ok(true) => return Ok(existing.clone()),
                Ok(false) => debug!("Session for {} is no longer active", server),
                Err(e) => warn!("Session check for {} failed: {}", server, e),
            }
            info!("Recreating vSphere session for {}", server);
        } else {
            info!("Creating vSphere session for {}", server);
        }

        let session = with_deadline(
            "login",
            self.call_timeout,
            self.connector.connect(server, credential),
        )
        .await?;
        self.sessions.insert(server.to_string(), session.clone());
        Ok(session)
    }
}
