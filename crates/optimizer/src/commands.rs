//! Command line of `pjtune-optimizer`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use infra_common::logging::log_welcome;
use infra_common::{setup_logging, LoggingConfig};
use optimizer::{ReconciliationLoop, Settings};
use probe_core::bandwidth::DEFAULT_DURATION_SECS;
use probe_core::{BandwidthProbe, EndpointDiscovery, EndpointRecord, SystemRunner};
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::info;

/// Adapts PJSIP endpoint codecs to measured bandwidth
#[derive(Parser, Debug)]
#[command(name = "pjtune-optimizer", author, version, about, long_about = None)]
pub struct Cli {
    /// TOML settings file
    #[arg(short, long, global = true, env = "PJTUNE_CONFIG")]
    config: Option<PathBuf>,

    /// Asterisk configuration directory (overrides asterisk.conf_dir)
    #[arg(long, global = true)]
    conf_dir: Option<PathBuf>,

    /// Log level (overrides logging.level)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Log the start and end of every cycle span (overrides logging.spans)
    #[arg(long, global = true)]
    log_spans: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run reconciliation cycles until interrupted (default)
    Run,

    /// Run a single cycle and print what it did
    Once {
        /// Print the cycle report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the endpoints currently registered with the server
    Discover {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Measure throughput to one address
    Probe {
        /// Address running an iperf3 server
        address: String,

        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Test duration in seconds [default: 10]
        #[arg(short = 't', long)]
        duration: Option<u32>,

        /// Use UDP instead of TCP
        #[arg(short, long)]
        udp: bool,

        /// UDP target bitrate, e.g. 1M
        #[arg(short, long)]
        bitrate: Option<String>,
    },

    /// Print the effective settings as TOML
    Settings,
}

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Extension")]
    extension: String,
    #[tabled(rename = "AOR")]
    aor: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "RTT (ms)")]
    rtt: String,
}

impl From<&EndpointRecord> for EndpointRow {
    fn from(record: &EndpointRecord) -> Self {
        Self {
            extension: record.extension.clone(),
            aor: record.aor.clone(),
            address: record.address.to_string(),
            status: record.status.clone(),
            rtt: record
                .rtt_ms
                .map(|rtt| format!("{:.3}", rtt))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref()).context("loading settings")?;
        if let Some(dir) = &self.conf_dir {
            settings.asterisk.conf_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
        if self.log_spans {
            settings.logging.spans = true;
        }
        Ok(settings)
    }

    pub async fn execute(self) -> Result<()> {
        let settings = self.settings()?;

        let logging = LoggingConfig::from_settings(&settings.logging, "pjtune-optimizer")?;
        setup_logging(&logging)?;

        let runner = Arc::new(SystemRunner::new());

        match self.command.unwrap_or(Commands::Run) {
            Commands::Run => {
                log_welcome(&logging, env!("CARGO_PKG_VERSION"));
                info!(
                    conf_dir = %settings.asterisk.conf_dir.display(),
                    "🚀 starting codec optimization loop (press Ctrl+C to stop)"
                );
                let mut reconciler = ReconciliationLoop::new(runner, &settings)?;
                reconciler.run().await?;
            }
            Commands::Once { json } => {
                let mut reconciler = ReconciliationLoop::new(runner, &settings)?;
                let report = reconciler.run_cycle().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    for outcome in &report.outcomes {
                        let policy = outcome
                            .policy
                            .map(|p| p.to_string())
                            .unwrap_or_else(|| "unchanged".to_string());
                        println!(
                            "📞 {} ({}): {} → {}{}",
                            outcome.extension,
                            outcome.address,
                            outcome.sample,
                            policy,
                            if outcome.updated { " ✅" } else { "" }
                        );
                    }
                    println!(
                        "🔄 Reload: {}",
                        if report.reloaded { "✅ Yes" } else { "❌ No" }
                    );
                    println!("⏱  Next cycle in {}s", report.next_sleep.as_secs());
                }
            }
            Commands::Discover { json } => {
                let discovery = EndpointDiscovery::new(runner, settings.asterisk.cli_bin.clone());
                let endpoints = discovery.try_list_active_endpoints().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&endpoints)?);
                } else if endpoints.is_empty() {
                    println!("No active endpoints");
                } else {
                    let rows: Vec<EndpointRow> = endpoints.iter().map(EndpointRow::from).collect();
                    println!("{}", Table::new(rows));
                }
            }
            Commands::Probe {
                address,
                port,
                duration,
                udp,
                bitrate,
            } => {
                let mut request = settings
                    .probe_request(address)
                    .with_duration(duration.unwrap_or(DEFAULT_DURATION_SECS));
                if let Some(port) = port {
                    request = request.with_port(port);
                }
                if udp {
                    request = request.with_udp(bitrate);
                }
                let probe = BandwidthProbe::new(runner, settings.probe.bin.clone());
                let mbps = probe.try_measure(&request).await?;
                println!("📶 {}: {} Mbits/sec", request.address, mbps);
            }
            Commands::Settings => {
                print!("{}", toml::to_string_pretty(&settings)?);
            }
        }

        Ok(())
    }
}
