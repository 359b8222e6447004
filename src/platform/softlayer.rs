//! IBM Cloud (SoftLayer) REST Adapter
//!
//! Talks to the SoftLayer REST API (`/rest/v3.1`) with basic authentication
//! (username + API key). Only the three account calls the generator needs are
//! implemented. Calls are not subject to a deadline.

use crate::config::SoftLayerCredential;
use crate::domain::network::{NetworkSubnet, NetworkVlan};
use crate::domain::ports::{NetworkConnector, NetworkInventory, NetworkInventoryRef};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Public SoftLayer REST endpoint
pub const DEFAULT_SOFTLAYER_ENDPOINT: &str = "https://api.softlayer.com/rest/v3.1";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the SoftLayer adapter
#[derive(Debug, Clone)]
pub struct SoftLayerConfig {
    /// REST API base URL
    pub endpoint: String,
}

impl Default for SoftLayerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SOFTLAYER_ENDPOINT.to_string(),
        }
    }
}

/// Error body returned by the API on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

#[derive(Debug, Deserialize)]
struct CurrentUser {
    #[serde(default)]
    username: Option<String>,
}

// =============================================================================
// REST Client
// =============================================================================

/// Authenticated client for one SoftLayer account
pub struct SoftLayerRestClient {
    http: reqwest::Client,
    endpoint: String,
    account: String,
    credential: SoftLayerCredential,
}

impl SoftLayerRestClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        account: impl Into<String>,
        credential: SoftLayerCredential,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            account: account.into(),
            credential,
        }
    }

    /// GET `SoftLayer_Account/<method>.json` with an optional object mask
    async fn get<T: DeserializeOwned>(&self, method: &str, object_mask: Option<&str>) -> Result<T> {
        let url = format!("{}/SoftLayer_Account/{}.json", self.endpoint, method);
        debug!("SoftLayer call {} for account {}", method, self.account);

        let mut request = self
            .http
            .get(&url)
            .basic_auth(&self.credential.username, Some(&self.credential.api_token));
        if let Some(mask) = object_mask {
            request = request.query(&[("objectMask", mask)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(Error::SoftLayerApi {
                status: status.as_u16(),
                reason,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl NetworkInventory for SoftLayerRestClient {
    async fn current_user(&self) -> Result<String> {
        let user: CurrentUser = self.get("getCurrentUser", Some("mask[username]")).await?;
        Ok(user.username.unwrap_or_default())
    }

    async fn network_vlans(&self, object_mask: &str) -> Result<Vec<NetworkVlan>> {
        self.get("getNetworkVlans", Some(object_mask)).await
    }

    async fn subnets(&self, object_mask: &str) -> Result<Vec<NetworkSubnet>> {
        self.get("getSubnets", Some(object_mask)).await
    }
}

// =============================================================================
// Connector
// =============================================================================

/// Opens SoftLayer account sessions sharing one HTTP connection pool
pub struct SoftLayerConnector {
    config: SoftLayerConfig,
    http: reqwest::Client,
}

impl SoftLayerConnector {
    pub fn new(config: SoftLayerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("vcmd/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl NetworkConnector for SoftLayerConnector {
    async fn connect(
        &self,
        account: &str,
        credential: &SoftLayerCredential,
    ) -> Result<NetworkInventoryRef> {
        if credential.username.is_empty() || credential.api_token.is_empty() {
            return Err(Error::SessionAuth {
                target: account.to_string(),
                reason: "username and API key are required".into(),
            });
        }

        info!("Connecting to SoftLayer account {} at {}", account, self.config.endpoint);
        Ok(Arc::new(SoftLayerRestClient::new(
            self.http.clone(),
            self.config.endpoint.clone(),
            account,
            credential.clone(),
        )))
    }
}
