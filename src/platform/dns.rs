//! System DNS resolver

use crate::domain::ports::HostResolver;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::net::IpAddr;

/// Resolves hostnames through the operating system resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        let resolved = tokio::net::lookup_host((host, 443))
            .await
            .map_err(|e| Error::DnsResolution {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let mut addresses: Vec<IpAddr> = Vec::new();
        for socket in resolved {
            if !addresses.contains(&socket.ip()) {
                addresses.push(socket.ip());
            }
        }

        if addresses.is_empty() {
            return Err(Error::DnsResolution {
                host: host.to_string(),
                reason: "no addresses returned".into(),
            });
        }
        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_ip_literal() {
        let addresses = SystemResolver.lookup("127.0.0.1").await.unwrap();
        assert_eq!(addresses, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }
}
