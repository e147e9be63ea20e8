//! Settings shared by the pjtune binaries

use crate::error::{OptimizerError, Result};
use infra_common::{load_settings, LoggingSettings, ENV_PREFIX};
use pjsip_config::{AsteriskSettings, PjsipPaths};
use probe_core::bandwidth::DEFAULT_PORT;
use probe_core::{CommandRunner, ProbeRequest, ReloadTrigger};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub asterisk: AsteriskSettings,
    pub probe: ProbeSettings,
    pub schedule: ScheduleSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub bin: String,
    pub port: u16,
    pub duration_secs: u32,
    pub udp: bool,
    /// UDP target bitrate, e.g. `1M`
    pub bitrate: Option<String>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            bin: "iperf3".to_string(),
            port: DEFAULT_PORT,
            duration_secs: 3,
            udp: false,
            bitrate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Sleep budget per discovered endpoint
    pub per_endpoint_secs: u64,
    /// Lower bound on the sleep between cycles
    pub min_interval_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            per_endpoint_secs: 300,
            min_interval_secs: 60,
        }
    }
}

impl ScheduleSettings {
    /// Pause after a cycle that saw `endpoints` endpoints
    pub fn sleep_for(&self, endpoints: usize) -> Duration {
        let scaled = self.per_endpoint_secs.saturating_mul(endpoints as u64);
        Duration::from_secs(scaled.max(self.min_interval_secs))
    }
}

impl Settings {
    /// Defaults, then `file` (if given), then `PJTUNE__*` environment variables
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let settings: Settings = load_settings(file, ENV_PREFIX)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.asterisk.reload_command.is_empty() {
            return Err(OptimizerError::Settings(
                "asterisk.reload_command must name a program".to_string(),
            ));
        }
        if self.asterisk.cli_bin.trim().is_empty() {
            return Err(OptimizerError::Settings(
                "asterisk.cli_bin must not be empty".to_string(),
            ));
        }
        if self.probe.bin.trim().is_empty() {
            return Err(OptimizerError::Settings(
                "probe.bin must not be empty".to_string(),
            ));
        }
        if self.probe.duration_secs == 0 {
            return Err(OptimizerError::Settings(
                "probe.duration_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn paths(&self) -> PjsipPaths {
        self.asterisk.paths()
    }

    /// Probe parameters for `address` with the configured port, duration and transport
    pub fn probe_request(&self, address: impl Into<String>) -> ProbeRequest {
        let request = ProbeRequest::new(address)
            .with_port(self.probe.port)
            .with_duration(self.probe.duration_secs);
        if self.probe.udp {
            request.with_udp(self.probe.bitrate.clone())
        } else {
            request
        }
    }

    pub fn reload_trigger(&self, runner: Arc<dyn CommandRunner>) -> Result<ReloadTrigger> {
        let (program, args) = self.asterisk.reload_command.split_first().ok_or_else(|| {
            OptimizerError::Settings("asterisk.reload_command must name a program".to_string())
        })?;
        Ok(ReloadTrigger::new(runner, program.clone(), args.to_vec()))
    }
}
