//! Hostscope - device inventory lookup CLI
//!
//! The `hostscope` command resolves lists of hostnames and cloud instance IDs
//! against the device inventory and manages sensor installers.
//!
//! ## Commands
//!
//! - `search`: Report sensor presence for a list of names
//! - `sensors list`: List available sensor installers
//! - `sensors lineage`: Show current / previous / oldest installer per OS
//! - `sensors download`: Download installers from the selected lineage slot

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use device_inventory::{DeviceInventory, HttpInventory, SortOrder};
use hostscope_core::lineage::{build_version_map, filter_by_os_version, plan_downloads};
use hostscope_core::reporting::{
    render_csv, render_installers, render_json, render_lineage, write_report,
};
use hostscope_core::{
    normalize_os_alias, os_filter, DownloadStep, HostSearch, NMinus, OutputRow, SearchConfig,
    SensorInstaller, TenantDirectory,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "hostscope")]
#[command(author = "Hostscope Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Device inventory lookup and sensor installer tool", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a newline-delimited list of hostnames / instance IDs
    Search {
        /// File with one name per line (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ReportFormat,

        /// TOML file mapping tenant IDs to friendly names
        #[arg(long, env = "HOSTSCOPE_TENANTS")]
        tenants: Option<PathBuf>,

        /// Lookups in flight at once (overrides HOSTSCOPE_CONCURRENCY)
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sensor installer operations
    Sensors {
        #[command(subcommand)]
        action: SensorAction,
    },
}

#[derive(Subcommand)]
enum SensorAction {
    /// List installers, newest first
    List {
        /// Operating system alias (e.g. rhel, ubuntu, win, mac)
        #[arg(long)]
        os: Option<String>,

        /// Only this OS version
        #[arg(long)]
        osver: Option<String>,

        /// Show every column
        #[arg(long)]
        all: bool,
    },

    /// Show the selected installer for each platform and OS bucket
    Lineage {
        #[arg(long)]
        os: Option<String>,

        #[arg(long)]
        osver: Option<String>,

        /// 0 = current, 1 = previous, 2 = oldest
        #[arg(short, long, default_value = "0")]
        nminus: NMinus,
    },

    /// Download installers
    Download {
        #[arg(long)]
        os: Option<String>,

        #[arg(long)]
        osver: Option<String>,

        /// 0 = current, 1 = previous, 2 = oldest
        #[arg(short, long, default_value = "0")]
        nminus: NMinus,

        /// Download one installer per OS bucket instead of only the first
        #[arg(long)]
        all: bool,

        /// Save under this file name instead of the installer's own
        #[arg(long)]
        filename: Option<String>,

        /// Base directory for downloads
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    hostscope_core::init_tracing(cli.json, level);

    let inventory: Arc<dyn DeviceInventory> = Arc::new(
        HttpInventory::from_env().context("Failed to configure the device inventory client")?,
    );

    match cli.command {
        Commands::Search {
            input,
            format,
            tenants,
            concurrency,
            output,
        } => {
            let raw = read_input(input.as_deref()).await?;
            cmd_search(
                inventory,
                &raw,
                format,
                tenants.as_deref(),
                concurrency,
                output.as_deref(),
            )
            .await
        }
        Commands::Sensors { action } => match action {
            SensorAction::List { os, osver, all } => {
                cmd_sensors_list(inventory.as_ref(), os.as_deref(), osver.as_deref(), all).await
            }
            SensorAction::Lineage { os, osver, nminus } => {
                cmd_sensors_lineage(inventory.as_ref(), os.as_deref(), osver.as_deref(), nminus)
                    .await
            }
            SensorAction::Download {
                os,
                osver,
                nminus,
                all,
                filename,
                dir,
            } => {
                cmd_sensors_download(
                    inventory.as_ref(),
                    os.as_deref(),
                    osver.as_deref(),
                    nminus,
                    all,
                    filename.as_deref(),
                    &dir,
                )
                .await
                .map(|_| ())
            }
        },
    }
}

async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path)),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read names from stdin")?;
            Ok(raw)
        }
    }
}

fn render(rows: &[OutputRow], format: ReportFormat) -> Result<String> {
    let content = match format {
        ReportFormat::Csv => render_csv(rows)?,
        ReportFormat::Json => render_json(rows)?,
    };
    Ok(content)
}

/// Run a search and print or write the report
async fn cmd_search(
    inventory: Arc<dyn DeviceInventory>,
    raw: &str,
    format: ReportFormat,
    tenants: Option<&Path>,
    concurrency: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    let tenants = match tenants {
        Some(path) => TenantDirectory::load(path)?,
        None => TenantDirectory::new(),
    };

    let mut config = SearchConfig::from_env();
    if let Some(n) = concurrency {
        config = config.with_concurrency(n);
    }

    let search = HostSearch::new(inventory, tenants, config)?;
    let rows = search.search(raw).await.context("Search failed")?;
    let content = render(&rows, format)?;

    if let Some(path) = output {
        write_report(path, &content).with_context(|| format!("Failed to write to {:?}", path))?;
        info!(rows = rows.len(), "Report written to {:?}", path);
    } else {
        print!("{}", content);
    }

    Ok(())
}

/// Turn an `--os` alias into a catalog filter. Unknown aliases list everything.
fn resolve_os_filter(os: Option<&str>) -> Option<String> {
    let os = os?;
    match normalize_os_alias(os) {
        Some(label) => Some(os_filter(label)),
        None => {
            warn!(os = %os, "Unrecognised OS alias, not filtering by OS");
            None
        }
    }
}

async fn fetch_installers(
    inventory: &dyn DeviceInventory,
    os: Option<&str>,
) -> Result<Vec<SensorInstaller>> {
    let filter = resolve_os_filter(os);
    inventory
        .list_installers(filter.as_deref(), SortOrder::ReleaseDateDesc)
        .await
        .context("Failed to list sensor installers")
}

async fn cmd_sensors_list(
    inventory: &dyn DeviceInventory,
    os: Option<&str>,
    osver: Option<&str>,
    all: bool,
) -> Result<()> {
    let installers = fetch_installers(inventory, os).await?;
    let matching: Vec<SensorInstaller> = filter_by_os_version(&installers, osver)
        .cloned()
        .collect();

    if matching.is_empty() {
        println!("No results, check your filter and try your query again.");
        return Ok(());
    }
    print!("{}", render_installers(&matching, all)?);
    Ok(())
}

async fn cmd_sensors_lineage(
    inventory: &dyn DeviceInventory,
    os: Option<&str>,
    osver: Option<&str>,
    nminus: NMinus,
) -> Result<()> {
    let installers = fetch_installers(inventory, os).await?;
    let matching: Vec<SensorInstaller> = filter_by_os_version(&installers, osver)
        .cloned()
        .collect();

    print!("{}", render_lineage(&build_version_map(&matching), nminus));
    Ok(())
}

/// Download the selected lineage slot, returning the paths written.
async fn cmd_sensors_download(
    inventory: &dyn DeviceInventory,
    os: Option<&str>,
    osver: Option<&str>,
    nminus: NMinus,
    all: bool,
    filename: Option<&str>,
    base_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let installers = fetch_installers(inventory, os).await?;
    let mut written = Vec::new();

    for step in plan_downloads(&installers, osver, nminus, all, filename) {
        let plan = match step {
            DownloadStep::Fetch(plan) => plan,
            DownloadStep::Unavailable { bucket, slot } => {
                println!(
                    "{slot} version not available for {bucket}. The OS grouping label likely was recently changed."
                );
                continue;
            }
        };

        let dir = base_dir.join(&plan.dir);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {:?}", dir))?;

        println!(
            "Downloading {} version {}",
            plan.installer.description.as_deref().unwrap_or(&plan.installer.name),
            plan.installer.version
        );
        let bytes = inventory
            .download_installer(&plan.installer.sha256)
            .await
            .with_context(|| format!("Failed to download {}", plan.installer.name))?;

        let path = dir.join(&plan.file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write to {:?}", path))?;
        info!(bytes = bytes.len(), bucket = %plan.bucket, "Saved installer to {:?}", path);
        written.push(path);
    }

    Ok(written)
}
