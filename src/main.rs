//! vcmd
//!
//! Generates vSphere capacity manager `Pool` and `Network` manifests by
//! correlating vCenter inventories with IBM Cloud network inventories.
//!
//! ```text
//! vcmd generate -v vcenter.json -i ibmcloud.json -m manifests/ -o output.json
//! ```

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vcmd::config::{
    DEFAULT_IPV6_PREFIX, DEFAULT_PORT_GROUP_FILTER, DEFAULT_REGION_CATEGORY,
    DEFAULT_ZONE_CATEGORY,
};
use vcmd::manifest::ensure_empty_manifest_dir;
use vcmd::platform::softlayer::DEFAULT_SOFTLAYER_ENDPOINT;
use vcmd::{
    load_softlayer_credentials, load_vcenter_credentials, write_assets, Error, GeneratorConfig,
    ReachabilityMode, Result, SnapshotConnector, SoftLayerConfig, SoftLayerConnector,
    SoftLayerSessions, SystemResolver, TagCategoryNames, TopologyAggregator, VSphereSessions,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// vSphere Capacity Manager data generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate Pool and Network assets
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// vCenter credentials file
    #[arg(short = 'v', long, env = "VCMD_VCENTER", default_value = "vcenter.json")]
    vcenter: PathBuf,

    /// IBM Cloud credentials file
    #[arg(short = 'i', long, env = "VCMD_IBMCLOUD", default_value = "ibmcloud.json")]
    ibmcloud: PathBuf,

    /// Write every generated asset to this file as JSON
    #[arg(short = 'o', long, env = "VCMD_OUTPUT")]
    output: Option<PathBuf>,

    /// Write each asset as a YAML manifest into this (empty) directory
    #[arg(short = 'm', long, env = "VCMD_MANIFESTS")]
    manifests: Option<PathBuf>,

    /// IPv6 base prefix; the VLAN number becomes the fourth hextet
    #[arg(short = '6', long, env = "VCMD_SUBNET6", default_value = DEFAULT_IPV6_PREFIX)]
    subnet6: String,

    /// Port group name substring selecting CI networks
    #[arg(short = 'p', long, env = "VCMD_PG", default_value = DEFAULT_PORT_GROUP_FILTER)]
    pg: String,

    /// Directory holding vCenter inventory snapshots (<server>.yaml)
    #[arg(long, env = "VCMD_INVENTORY_DIR", default_value = "inventory")]
    inventory_dir: PathBuf,

    /// SoftLayer REST API endpoint
    #[arg(long, env = "VCMD_SOFTLAYER_ENDPOINT", default_value = DEFAULT_SOFTLAYER_ENDPOINT)]
    softlayer_endpoint: String,

    /// Region tag category
    #[arg(long, env = "VCMD_REGION_CATEGORY", default_value = DEFAULT_REGION_CATEGORY)]
    region_category: String,

    /// Zone tag category
    #[arg(long, env = "VCMD_ZONE_CATEGORY", default_value = DEFAULT_ZONE_CATEGORY)]
    zone_category: String,

    /// Datastore reachability strategy
    #[arg(long, env = "VCMD_REACHABILITY", value_enum, default_value_t = ReachabilityMode::Strict)]
    reachability: ReachabilityMode,

    /// Per-call deadline for vSphere calls, in seconds
    #[arg(long, env = "VCMD_VSPHERE_TIMEOUT", default_value = "60")]
    vsphere_timeout_secs: u64,

    /// Write the environment summary to this file as JSON
    #[arg(long, env = "VCMD_SUMMARY")]
    summary: Option<PathBuf>,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    info!("Starting vcmd {}", vcmd::VERSION);

    match cli.command {
        Command::Generate(args) => generate(args).await,
    }
}

async fn generate(args: GenerateArgs) -> Result<()> {
    info!("  vCenter credentials: {}", args.vcenter.display());
    info!("  IBM Cloud credentials: {}", args.ibmcloud.display());
    info!("  Inventory snapshots: {}", args.inventory_dir.display());
    info!("  Port group filter: {}", args.pg);
    info!("  IPv6 prefix: {}", args.subnet6);
    info!("  Reachability: {}", args.reachability);

    if let Some(dir) = &args.manifests {
        ensure_empty_manifest_dir(dir)?;
    }

    let config = GeneratorConfig {
        ipv6_prefix: args.subnet6.clone(),
        port_group_filter: args.pg.clone(),
        tag_categories: TagCategoryNames {
            region: args.region_category.clone(),
            zone: args.zone_category.clone(),
        },
        reachability: args.reachability,
        vsphere_call_timeout: Duration::from_secs(args.vsphere_timeout_secs),
    };
    config.validate()?;

    let mut softlayer = SoftLayerSessions::new(Arc::new(SoftLayerConnector::new(SoftLayerConfig {
        endpoint: args.softlayer_endpoint.clone(),
    })?));
    for (account, credential) in load_softlayer_credentials(&args.ibmcloud)? {
        softlayer.add_credentials(account, credential);
    }

    let mut vsphere = VSphereSessions::new(Arc::new(SnapshotConnector::from_dir(&args.inventory_dir)))
        .with_call_timeout(config.vsphere_call_timeout);
    for (server, credential) in load_vcenter_credentials(&args.vcenter)? {
        vsphere.add_credentials(server, credential);
    }

    if vsphere.servers().is_empty() {
        return Err(Error::Configuration(format!(
            "no vCenters configured in {}",
            args.vcenter.display()
        )));
    }

    let mut aggregator = TopologyAggregator::new(config, vsphere, softlayer, Arc::new(SystemResolver));
    let output = aggregator.generate().await?;

    if let Some(path) = &args.output {
        write_json(&output.assets, path)?;
        info!("Wrote {} assets to {}", output.assets.len(), path.display());
    }

    if let Some(path) = &args.summary {
        write_json(&output.summary, path)?;
        info!("Wrote environment summary to {}", path.display());
    }

    if let Some(dir) = &args.manifests {
        write_assets(&output.assets, dir)?;
    }

    info!("Generation complete");
    Ok(())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(cli: &Cli) {
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn", "rustls=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
