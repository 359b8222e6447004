//! SoftLayer Account Sessions
//!
//! Per-account SoftLayer sessions with two response caches (VLANs and
//! subnets). Each cache is an exact, unfiltered snapshot of the account's
//! collection, populated on first use and kept for the rest of the run.
//! Filtering by datacenter / pod happens on read and never touches the cache.

use crate::config::SoftLayerCredential;
use crate::domain::network::{NetworkSubnet, NetworkVlan};
use crate::domain::ports::{NetworkConnectorRef, NetworkInventoryRef};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

// =============================================================================
// Object Masks
// =============================================================================

/// Mask for the account VLAN list, including nested subnets and addresses
pub const VLAN_SUBNET_MASK: &str = "mask[id,name,vlanNumber,fullyQualifiedName,podName,datacenter[name],subnets[id,ipAddressCount,gateway,cidr,netmask,networkIdentifier,subnetType,ipAddresses[ipAddress,isNetwork,isBroadcast,isGateway]],primaryRouter[hostname,datacenter[name]]]";

/// Mask for the account subnet list
pub const SUBNET_MASK: &str =
    "mask[id,cidr,gateway,netmask,networkIdentifier,subnetType,ipAddressCount,networkVlan[vlanNumber]]";

// =============================================================================
// Account Session
// =============================================================================

struct AccountSession {
    client: NetworkInventoryRef,
    vlans: Option<Vec<NetworkVlan>>,
    subnets: Option<Vec<NetworkSubnet>>,
}

/// Session manager for SoftLayer accounts
pub struct SoftLayerSessions {
    connector: NetworkConnectorRef,
    credentials: BTreeMap<String, SoftLayerCredential>,
    sessions: HashMap<String, AccountSession>,
}

impl SoftLayerSessions {
    /// Create an empty session manager
    pub fn new(connector: NetworkConnectorRef) -> Self {
        Self {
            connector,
            credentials: BTreeMap::new(),
            sessions: HashMap::new(),
        }
    }

    /// Register credentials for an account. The first registration wins.
    pub fn add_credentials(&mut self, account: impl Into<String>, credential: SoftLayerCredential) {
        self.credentials.entry(account.into()).or_insert(credential);
    }

    /// Configured accounts, in sorted order
    pub fn accounts(&self) -> Vec<String> {
        self.credentials.keys().cloned().collect()
    }

    /// Get a usable client for an account, creating or refreshing the session.
    /// Response caches survive a session refresh.
    pub async fn client(&mut self, account: &str) -> Result<NetworkInventoryRef> {
        let credential = self
            .credentials
            .get(account)
            .ok_or_else(|| Error::CredentialsNotFound {
                target: account.to_string(),
            })?;

        if let Some(state) = self.sessions.get_mut(account) {
            match state.client.current_user().await {
                Ok(_) => return Ok(state.client.clone()),
                Err(e) => {
                    warn!("SoftLayer session for account {} is stale: {}", account, e);
                    state.client = self.connector.connect(account, credential).await?;
                    return Ok(state.client.clone());
                }
            }
        }

        info!("Creating SoftLayer session for account {}", account);
        let client = self.connector.connect(account, credential).await?;
        self.sessions.insert(
            account.to_string(),
            AccountSession {
                client: client.clone(),
                vlans: None,
                subnets: None,
            },
        );
        Ok(client)
    }

    /// The account's full VLAN list, fetched once per run
    pub async fn network_vlans(&mut self, account: &str) -> Result<&[NetworkVlan]> {
        let cached = self
            .sessions
            .get(account)
            .is_some_and(|state| state.vlans.is_some());

        if !cached {
            let client = self.client(account).await?;
            let vlans = client.network_vlans(VLAN_SUBNET_MASK).await?;
            debug!("Cached {} VLANs for account {}", vlans.len(), account);
            if let Some(state) = self.sessions.get_mut(account) {
                state.vlans = Some(vlans);
            }
        }

        self.sessions
            .get(account)
            .and_then(|state| state.vlans.as_deref())
            .ok_or_else(|| Error::SessionAuth {
                target: account.to_string(),
                reason: "no session after VLAN retrieval".into(),
            })
    }

    /// VLANs of the account located in the given datacenter and pod
    pub async fn vlans_in(
        &mut self,
        account: &str,
        datacenter: &str,
        pod: &str,
    ) -> Result<Vec<NetworkVlan>> {
        let vlans = self.network_vlans(account).await?;
        Ok(vlans
            .iter()
            .filter(|vlan| vlan.is_in(datacenter, pod))
            .cloned()
            .collect())
    }

    /// The account's full subnet list, fetched once per run
    pub async fn subnets(&mut self, account: &str) -> Result<&[NetworkSubnet]> {
        let cached = self
            .sessions
            .get(account)
            .is_some_and(|state| state.subnets.is_some());

        if !cached {
            let client = self.client(account).await?;
            let subnets = client.subnets(SUBNET_MASK).await?;
            debug!("Cached {} subnets for account {}", subnets.len(), account);
            if let Some(state) = self.sessions.get_mut(account) {
                state.subnets = Some(subnets);
            }
        }

        self.sessions
            .get(account)
            .and_then(|state| state.subnets.as_deref())
            .ok_or_else(|| Error::SessionAuth {
                target: account.to_string(),
                reason: "no session after subnet retrieval".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::fixtures::{sample_vlans, FakeNetworkConnector};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn sessions(connector: Arc<FakeNetworkConnector>) -> SoftLayerSessions {
        let mut sessions = SoftLayerSessions::new(connector);
        sessions.add_credentials(
            "1234567",
            SoftLayerCredential {
                username: "apikey".into(),
                api_token: "token".into(),
            },
        );
        sessions
    }

    #[tokio::test]
    async fn test_vlan_list_is_cached() {
        let connector = Arc::new(FakeNetworkConnector::new(sample_vlans()));
        let mut sessions = sessions(connector.clone());

        let first = sessions.network_vlans("1234567").await.unwrap().len();
        let second = sessions.network_vlans("1234567").await.unwrap().len();

        assert_eq!(first, second);
        assert_eq!(connector.inventory.vlan_calls(), 1);
        assert_eq!(connector.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_filtering_does_not_mutate_cache() {
        let connector = Arc::new(FakeNetworkConnector::new(sample_vlans()));
        let mut sessions = sessions(connector.clone());

        let total = sessions.network_vlans("1234567").await.unwrap().len();
        let filtered = sessions
            .vlans_in("1234567", "dal10", "dal10.pod01")
            .await
            .unwrap();

        assert!(filtered.len() < total);
        assert!(filtered.iter().all(|v| v.is_in("dal10", "dal10.pod01")));
        assert_eq!(sessions.network_vlans("1234567").await.unwrap().len(), total);
        assert_eq!(connector.inventory.vlan_calls(), 1);
    }

    #[tokio::test]
    async fn test_subnet_list_is_cached() {
        let connector = Arc::new(FakeNetworkConnector::new(sample_vlans()));
        let mut sessions = sessions(connector.clone());

        sessions.subnets("1234567").await.unwrap();
        let subnets = sessions.subnets("1234567").await.unwrap();

        assert!(!subnets.is_empty());
        assert_eq!(connector.inventory.subnet_calls(), 1);
    }

    #[tokio::test]
    async fn test_stale_session_is_recreated() {
        let connector = Arc::new(FakeNetworkConnector::new(sample_vlans()));
        let mut sessions = sessions(connector.clone());

        sessions.client("1234567").await.unwrap();
        connector.inventory.set_valid(false);
        sessions.client("1234567").await.unwrap();

        assert_eq!(connector.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let connector = Arc::new(FakeNetworkConnector::new(Vec::new()));
        let mut sessions = sessions(connector);

        let result = sessions.network_vlans("9999999").await;
        assert_matches!(result, Err(Error::CredentialsNotFound { .. }));
    }
}
