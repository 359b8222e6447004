//! Manifest Assets
//!
//! Generated documents and their file names, plus writing them into a
//! manifest directory as individual YAML files. The target directory must
//! exist and be empty before anything is written.

use crate::crd::{Network, Pool};
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A generated document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AssetDocument {
    Pool(Pool),
    Network(Network),
}

/// One document and the file it is persisted to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Asset {
    pub asset: AssetDocument,
    pub file_name: String,
}

impl Asset {
    /// `pool-<name>.yaml`
    pub fn pool(pool: Pool) -> Self {
        let file_name = format!("pool-{}.yaml", pool.metadata.name.as_deref().unwrap_or_default());
        Self {
            asset: AssetDocument::Pool(pool),
            file_name,
        }
    }

    /// `network-<name>.yaml`
    pub fn network(network: Network) -> Self {
        let file_name = format!(
            "network-{}.yaml",
            network.metadata.name.as_deref().unwrap_or_default()
        );
        Self {
            asset: AssetDocument::Network(network),
            file_name,
        }
    }
}

/// Whether `dir` has no entries. A missing directory is an error.
pub fn is_manifest_dir_empty(dir: impl AsRef<Path>) -> Result<bool> {
    let mut entries = std::fs::read_dir(dir.as_ref())?;
    Ok(entries.next().is_none())
}

/// Serialize one document to `<dir>/<file_name>` as YAML. An existing file
/// is never overwritten.
pub fn write_manifest<T: Serialize>(document: &T, dir: impl AsRef<Path>, file_name: &str) -> Result<PathBuf> {
    let path = dir.as_ref().join(file_name);
    let yaml = serde_yaml::to_string(document)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => Error::DuplicateManifest {
                file_name: file_name.to_string(),
            },
            _ => Error::Io(e),
        })?;
    file.write_all(yaml.as_bytes())?;

    debug!("Wrote {}", path.display());
    Ok(path)
}

/// Write every asset into `dir`, refusing a non-empty directory and asset
/// lists that reuse a file name
pub fn write_assets(assets: &[Asset], dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    ensure_empty_manifest_dir(dir)?;

    let mut names = BTreeSet::new();
    if let Some(duplicate) = assets.iter().find(|a| !names.insert(a.file_name.as_str())) {
        return Err(Error::DuplicateManifest {
            file_name: duplicate.file_name.clone(),
        });
    }

    let written = assets
        .iter()
        .map(|asset| match &asset.asset {
            AssetDocument::Pool(pool) => write_manifest(pool, dir, &asset.file_name),
            AssetDocument::Network(network) => write_manifest(network, dir, &asset.file_name),
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Wrote {} manifests to {}", written.len(), dir.display());
    Ok(written)
}

/// Fail with [`Error::ManifestDirNotEmpty`] unless `dir` exists and is empty
pub fn ensure_empty_manifest_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if !is_manifest_dir_empty(dir)? {
        return Err(Error::ManifestDirNotEmpty {
            path: dir.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{NetworkSpec, PoolSpec};
    use assert_matches::assert_matches;

    fn network() -> Network {
        Network::new(
            "ci-vlan-100-dal10-dal10.pod01",
            NetworkSpec {
                port_group_name: "ci-vlan-100".into(),
                vlan_id: "100".into(),
                ..Default::default()
            },
        )
    }

    fn pool() -> Pool {
        Pool::new(
            "vc1-dc1-cluster1",
            PoolSpec {
                failure_domain: Default::default(),
                vcpus: 8,
                memory: 64,
                storage: 0,
                exclude: false,
                ibm_pool_spec: Default::default(),
            },
        )
    }

    #[test]
    fn test_asset_file_names() {
        assert_eq!(Asset::pool(pool()).file_name, "pool-vc1-dc1-cluster1.yaml");
        assert_eq!(
            Asset::network(network()).file_name,
            "network-ci-vlan-100-dal10-dal10.pod01.yaml"
        );
    }

    #[test]
    fn test_write_assets() {
        let dir = tempfile::tempdir().unwrap();
        assert!(is_manifest_dir_empty(dir.path()).unwrap());

        let written = write_assets(&[Asset::pool(pool()), Asset::network(network())], dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let yaml = std::fs::read_to_string(dir.path().join("network-ci-vlan-100-dal10-dal10.pod01.yaml")).unwrap();
        let parsed: Network = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.spec.vlan_id, "100");
        assert!(yaml.contains("kind: Network"));
    }

    #[test]
    fn test_non_empty_dir_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("existing.yaml"), "x").unwrap();

        let result = write_assets(&[Asset::network(network())], dir.path());
        assert_matches!(result, Err(Error::ManifestDirNotEmpty { .. }));
        assert!(!dir.path().join("network-ci-vlan-100-dal10-dal10.pod01.yaml").exists());
    }

    #[test]
    fn test_duplicate_file_names_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let result = write_assets(
            &[Asset::network(network()), Asset::pool(pool()), Asset::network(network())],
            dir.path(),
        );
        assert_matches!(
            result,
            Err(Error::DuplicateManifest { file_name }) if file_name == "network-ci-vlan-100-dal10-dal10.pod01.yaml"
        );
        assert!(is_manifest_dir_empty(dir.path()).unwrap());
    }

    #[test]
    fn test_write_manifest_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(&network(), dir.path(), "network.yaml").unwrap();

        let result = write_manifest(&pool(), dir.path(), "network.yaml");
        assert_matches!(result, Err(Error::DuplicateManifest { .. }));

        let yaml = std::fs::read_to_string(dir.path().join("network.yaml")).unwrap();
        assert!(yaml.contains("kind: Network"));
    }

    #[test]
    fn test_missing_dir_is_error() {
        assert_matches!(is_manifest_dir_empty("/nonexistent/manifests"), Err(Error::Io(_)));
    }

    #[test]
    fn test_asset_json_shape() {
        let json = serde_json::to_value(Asset::network(network())).unwrap();
        assert_eq!(json["FileName"], "network-ci-vlan-100-dal10-dal10.pod01.yaml");
        assert_eq!(json["Asset"]["kind"], "Network");
    }
}
