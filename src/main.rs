//! vCenter inventory poller - main entry point
//!
//! Small operational CLI around the library: run a poll and print the
//! snapshot, verify connectivity, or show the cache key for a target.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use vcenter_inventory::{
    fingerprint::fingerprint, logging, InventoryCollector, MemoryCache, PollerConfig, Result,
    VCenterTarget, VimConnector, VimHttpConnector, VmStats,
};

/// Command line arguments
#[derive(Parser)]
#[command(name = "vcenter-inventory")]
#[command(about = "VMware vCenter inventory poller")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the target and print the inventory snapshot as JSON
    Poll {
        /// Poll even when a live cache entry exists
        #[arg(long)]
        force: bool,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Verify connectivity and credentials, then disconnect
    Check,
    /// Print the cache fingerprint of the configured target
    Fingerprint,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_config = logging::LogConfig::from_env();
    if let Err(e) = logging::init_logging(log_config) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    // Load configuration
    let config = match PollerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Load the poll target
    let target = match VCenterTarget::from_env() {
        Ok(target) => target,
        Err(e) => {
            error!("Failed to load target: {e}");
            error!("💡 Set VCENTER_SERVER, VCENTER_USERNAME and VCENTER_PASSWORD");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Poll { force, pretty } => run_poll(config, target, force, pretty).await,
        Commands::Check => run_check(config, target).await,
        Commands::Fingerprint => {
            println!("{}", fingerprint(&target));
            Ok(())
        }
    }
}

/// Poll once and print the snapshot
async fn run_poll(
    config: PollerConfig,
    target: VCenterTarget,
    force: bool,
    pretty: bool,
) -> Result<()> {
    info!("🚀 Polling {}", target.server);

    let cache = Arc::new(MemoryCache::new());
    let connector = Arc::new(VimHttpConnector::new(config.request_timeout));
    let collector = InventoryCollector::new(connector, cache, config.cache.clone());

    match collector.refresh(&target, force).await? {
        Some(snapshot) => {
            info!("✅ Retrieved {} VMs from {}", snapshot.vms.len(), target.server);
            for (name, vm) in &snapshot.vms {
                info!("   VM: {} ({})", name, describe_vm(vm));
            }

            let rendered = if pretty {
                serde_json::to_string_pretty(&snapshot)
            } else {
                serde_json::to_string(&snapshot)
            };
            println!("{}", rendered.map_err(vcenter_inventory::VcError::from)?);
            Ok(())
        }
        None => {
            error!("Poll failed; see log output above");
            std::process::exit(1);
        }
    }
}

/// One-line stat summary of a VM for the poll report
fn describe_vm(vm: &VmStats) -> String {
    let power = match vm.powered_on {
        Some(true) => "on",
        Some(false) => "off",
        None => "unknown",
    };
    let vlans: Vec<&str> = vm
        .nics
        .iter()
        .filter_map(|nic| nic.vlan_id.as_deref())
        .collect();

    format!(
        "power {}, {} vCPUs, {} MB, {} GB, VLANs [{}]",
        power,
        fmt_stat(vm.vcpus.map(u64::from)),
        fmt_stat(vm.memory_mb),
        fmt_stat(vm.disk_gb),
        vlans.join(", ")
    )
}

fn fmt_stat(value: Option<u64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// Verify connectivity and credentials
async fn run_check(config: PollerConfig, target: VCenterTarget) -> Result<()> {
    println!(
        "vcenter-inventory {} ({})",
        env!("BUILD_VERSION"),
        option_env!("BUILD_GIT_HASH").unwrap_or("unknown")
    );
    println!("Built {}", env!("BUILD_TIMESTAMP"));
    println!("Checking {} as {}...", target.server, target.username);

    let connector = VimHttpConnector::new(config.request_timeout);
    match connector.connect(&target).await {
        Ok(mut session) => {
            session.disconnect().await?;
            println!("✅ Connection and credentials OK");
            Ok(())
        }
        Err(e) => {
            println!("❌ Connection failed: {e}");
            if e.is_auth_error() {
                println!("   Check VCENTER_USERNAME / VCENTER_PASSWORD");
            } else if e.is_retryable() {
                println!("   Server unreachable or slow; worth retrying");
            }
            std::process::exit(1);
        }
    }
}
