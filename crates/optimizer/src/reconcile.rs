//! The discover → probe → select → update → reload cycle

use crate::error::Result;
use crate::policy::{select_policy, CodecPolicy};
use crate::settings::Settings;
use pjsip_config::{ConfigStoreError, PjsipConfigStore, PjsipPaths};
use probe_core::{
    BandwidthProbe, BandwidthSample, CommandRunner, EndpointDiscovery, ReloadTrigger,
};
use serde::Serialize;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Where a cycle currently is; probing never overlaps with writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Probing,
    Reconciling,
}

/// What happened to one endpoint during a cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointOutcome {
    pub extension: String,
    pub address: Ipv4Addr,
    pub sample: BandwidthSample,
    pub policy: Option<CodecPolicy>,
    /// True when the endpoint's codec list was rewritten
    pub updated: bool,
}

/// Summary of one completed cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub outcomes: Vec<EndpointOutcome>,
    pub reloaded: bool,
    pub next_sleep: Duration,
}

impl CycleReport {
    pub fn discovered(&self) -> usize {
        self.outcomes.len()
    }

    pub fn updated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.updated).count()
    }
}

/// Periodically re-measures every active endpoint and rewrites its codec list.
///
/// Discovery and probe failures are absorbed (no endpoints, or no update for
/// that endpoint). Failures to read or write the configuration end the loop.
/// A failed reload is logged and the loop goes on.
pub struct ReconciliationLoop {
    discovery: EndpointDiscovery,
    probe: BandwidthProbe,
    reload: ReloadTrigger,
    paths: PjsipPaths,
    settings: Settings,
    phase: CyclePhase,
    cycles: u64,
}

impl ReconciliationLoop {
    pub fn new(runner: Arc<dyn CommandRunner>, settings: &Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            discovery: EndpointDiscovery::new(runner.clone(), settings.asterisk.cli_bin.clone()),
            probe: BandwidthProbe::new(runner.clone(), settings.probe.bin.clone()),
            reload: settings.reload_trigger(runner)?,
            paths: settings.paths(),
            settings: settings.clone(),
            phase: CyclePhase::Idle,
            cycles: 0,
        })
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one full cycle
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycles += 1;
        let span = info_span!("cycle", n = self.cycles);
        let result = self.cycle_inner().instrument(span).await;
        self.phase = CyclePhase::Idle;
        result
    }

    async fn cycle_inner(&mut self) -> Result<CycleReport> {
        self.phase = CyclePhase::Probing;
        let endpoints = self.discovery.list_active_endpoints().await;

        let mut measured = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let request = self.settings.probe_request(endpoint.address.to_string());
            let sample = self.probe.measure(&request).await;
            measured.push((endpoint, sample));
        }

        self.phase = CyclePhase::Reconciling;
        let mut store = PjsipConfigStore::open(&self.paths)?;
        let mut outcomes = Vec::with_capacity(measured.len());

        for (endpoint, sample) in measured {
            let policy = select_policy(&sample);
            let updated = match policy {
                Some(policy) => self.apply_policy(&mut store, &endpoint.extension, policy)?,
                None => {
                    info!(extension = %endpoint.extension, "no measurement, keeping current codecs");
                    false
                }
            };
            outcomes.push(EndpointOutcome {
                extension: endpoint.extension,
                address: endpoint.address,
                sample,
                policy,
                updated,
            });
        }

        let reloaded = match self.reload.reload().await {
            Ok(()) => true,
            Err(e) => {
                error!(command = %self.reload.command_line(), error = %e, "configuration reload failed");
                false
            }
        };

        let report = CycleReport {
            cycle: self.cycles,
            next_sleep: self.settings.schedule.sleep_for(outcomes.len()),
            outcomes,
            reloaded,
        };
        info!(
            discovered = report.discovered(),
            updated = report.updated(),
            reloaded = report.reloaded,
            "cycle complete"
        );
        Ok(report)
    }

    /// Rewrite the codec list of one extension and persist it; false when nothing changed
    fn apply_policy(
        &self,
        store: &mut PjsipConfigStore,
        extension: &str,
        policy: CodecPolicy,
    ) -> Result<bool> {
        let codecs = policy.codecs()?;

        let current = store
            .profile(extension)
            .and_then(|profile| profile.endpoint.get("allow").map(str::to_string));
        if current.as_deref() == Some(codecs.to_string().as_str()) {
            debug!(extension, %policy, "codec list already matches");
            return Ok(false);
        }

        match store.edit_user(extension, None, Some(&codecs)) {
            Ok(()) => {}
            Err(ConfigStoreError::NotFound(_)) => {
                warn!(extension, "registered endpoint has no managed configuration, skipping");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }
        store.persist()?;
        info!(extension, %policy, codecs = %codecs, "codec list updated");

        if let Some(profile) = store.profile(extension) {
            debug!("\n{}", profile);
        }
        Ok(true)
    }

    /// Cycle until Ctrl-C arrives during a sleep, or a cycle fails
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let report = self.run_cycle().await?;
            info!("next cycle in {}s", report.next_sleep.as_secs());

            tokio::select! {
                _ = tokio::time::sleep(report.next_sleep) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted, stopping after {} cycles", self.cycles);
                    return Ok(());
                }
            }
        }
    }
}
