//! Throughput measurement with an iperf3 client

use crate::error::{ProbeError, Result};
use crate::runner::{display_command, CommandRunner};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 5201;
pub const DEFAULT_DURATION_SECS: u32 = 10;

static INTERVAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\[\s*(?:\d+|SUM)\]\s+(?P<start>\d+(?:\.\d+)?)-\s*(?P<end>\d+(?:\.\d+)?)\s+sec\s+[\d.]+\s+[KMGT]?Bytes\s+(?P<value>[\d.]+)\s+(?P<unit>\S+/sec)",
    )
    .unwrap()
});

/// Result of one probe attempt, in Mbit/s.
///
/// `mbps == None` means the measurement failed; it is not the same as zero throughput.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BandwidthSample {
    pub mbps: Option<f64>,
}

impl BandwidthSample {
    pub fn measured(mbps: f64) -> Self {
        Self { mbps: Some(mbps) }
    }

    pub fn failed() -> Self {
        Self { mbps: None }
    }

    pub fn is_measured(&self) -> bool {
        self.mbps.is_some()
    }
}

impl fmt::Display for BandwidthSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mbps {
            Some(mbps) => write!(f, "{} Mbits/sec", mbps),
            None => write!(f, "unmeasured"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Tcp,
    Udp,
}

/// Parameters of one iperf3 client run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub address: String,
    pub port: u16,
    pub duration_secs: u32,
    pub transport: Transport,
    /// Target bitrate for UDP (`10M`, `100K`); ignored for TCP
    pub target_bitrate: Option<String>,
}

impl ProbeRequest {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: DEFAULT_PORT,
            duration_secs: DEFAULT_DURATION_SECS,
            transport: Transport::Tcp,
            target_bitrate: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    /// Switch to UDP, optionally with a target bitrate
    pub fn with_udp(mut self, target_bitrate: Option<String>) -> Self {
        self.transport = Transport::Udp;
        self.target_bitrate = target_bitrate;
        self
    }

    /// iperf3 client arguments for this request
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            self.address.clone(),
            "-p".to_string(),
            self.port.to_string(),
            "-t".to_string(),
            self.duration_secs.to_string(),
        ];
        if self.transport == Transport::Udp {
            args.push("-u".to_string());
            if let Some(bitrate) = &self.target_bitrate {
                args.push("-b".to_string());
                args.push(bitrate.clone());
            }
        }
        args
    }
}

/// Convert a throughput figure to Mbit/s. `None` for units we do not know.
pub fn to_mbps(value: f64, unit: &str) -> Option<f64> {
    match unit.to_ascii_lowercase().as_str() {
        "bits/sec" => Some(value / 1_000_000.0),
        "kbits/sec" => Some(value / 1000.0),
        "mbits/sec" => Some(value),
        "gbits/sec" => Some(value * 1000.0),
        "tbits/sec" => Some(value * 1000.0 * 1000.0),
        _ => None,
    }
}

/// Extract the average throughput from an iperf3 client report, in Mbit/s.
///
/// The summary is the interval starting at 0 that covers the longest span;
/// when sender and receiver lines cover the same span, the later (receiver)
/// line wins.
pub fn parse_iperf_summary(output: &str) -> Result<f64> {
    let mut best: Option<(f64, f64, &str)> = None;

    for caps in INTERVAL_REGEX.captures_iter(output) {
        let start: f64 = caps["start"].parse().unwrap_or(f64::NAN);
        let end: f64 = caps["end"].parse().unwrap_or(f64::NAN);
        let Ok(value) = caps["value"].parse::<f64>() else {
            continue;
        };
        if start != 0.0 || !end.is_finite() {
            continue;
        }
        let unit = caps.name("unit").map(|m| m.as_str()).unwrap_or("");
        match best {
            Some((best_end, _, _)) if end < best_end => {}
            _ => best = Some((end, value, unit)),
        }
    }

    let Some((_, value, unit)) = best else {
        return Err(ProbeError::UnexpectedOutput {
            program: "iperf3".to_string(),
            reason: "no throughput summary line".to_string(),
        });
    };

    to_mbps(value, unit).ok_or_else(|| ProbeError::UnknownUnit(unit.to_string()))
}

/// Measures throughput to an endpoint with an iperf3 client.
///
/// Probes are meant to run one at a time; concurrent runs share the link and
/// bias each other's readings.
pub struct BandwidthProbe {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl BandwidthProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Run the client and parse its report, reporting each failure cause separately
    pub async fn try_measure(&self, request: &ProbeRequest) -> Result<f64> {
        let args = request.args();
        info!(
            command = %display_command(&self.program, &args),
            "starting bandwidth probe to {}:{} ({:?}) for {}s",
            request.address,
            request.port,
            request.transport,
            request.duration_secs
        );
        let output = self
            .runner
            .run(&self.program, &args)
            .await?
            .into_success(&self.program)?;
        parse_iperf_summary(&output.stdout)
    }

    /// Measured throughput, or a failed sample if anything went wrong
    pub async fn measure(&self, request: &ProbeRequest) -> BandwidthSample {
        match self.try_measure(request).await {
            Ok(mbps) => {
                info!(address = %request.address, mbps, "bandwidth measured");
                BandwidthSample::measured(mbps)
            }
            Err(e) => {
                warn!(address = %request.address, error = %e, "bandwidth probe failed");
                BandwidthSample::failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP_REPORT: &str = "\
Connecting to host 10.0.0.5, port 5201
[  5] local 10.0.0.1 port 50912 connected to 10.0.0.5 port 5201
[ ID] Interval           Transfer     Bitrate         Retr  Cwnd
[  5]   0.00-1.00   sec   113 MBytes   948 Mbits/sec    0    407 KBytes
[  5]   1.00-2.00   sec   112 MBytes   941 Mbits/sec    0    407 KBytes
[  5]   2.00-3.00   sec   112 MBytes   942 Mbits/sec    0    407 KBytes
- - - - - - - - - - - - - - - - - - - - - - - - -
[ ID] Interval           Transfer     Bitrate         Retr
[  5]   0.00-3.00   sec   337 MBytes   943 Mbits/sec    0             sender
[  5]   0.00-3.04   sec   336 MBytes   929 Mbits/sec                  receiver

iperf Done.
";

    #[test]
    fn picks_the_summary_not_the_first_interval() {
        assert_eq!(parse_iperf_summary(TCP_REPORT).unwrap(), 929.0);
    }

    #[test]
    fn normalizes_units() {
        let kbits = "[  5]   0.00-10.00  sec  6.25 KBytes  5.00 Kbits/sec                  receiver\n";
        assert_eq!(parse_iperf_summary(kbits).unwrap(), 0.005);

        let gbits = "[  5]   0.00-10.00  sec  2.33 GBytes  2.00 Gbits/sec    0             sender\n";
        assert_eq!(parse_iperf_summary(gbits).unwrap(), 2000.0);

        let tbits = "[SUM]   0.00-10.00  sec  1.16 TBytes  1.00 Tbits/sec\n";
        assert_eq!(parse_iperf_summary(tbits).unwrap(), 1_000_000.0);
    }

    #[test]
    fn unknown_unit_is_an_error() {
        let report = "[  5]   0.00-10.00  sec  1.00 MBytes  3.00 Pbits/sec\n";
        assert!(matches!(
            parse_iperf_summary(report),
            Err(ProbeError::UnknownUnit(unit)) if unit == "Pbits/sec"
        ));
    }

    #[test]
    fn missing_summary_is_an_error() {
        let report = "iperf3: error - unable to connect to server: Connection refused\n";
        assert!(matches!(
            parse_iperf_summary(report),
            Err(ProbeError::UnexpectedOutput { .. })
        ));
    }

    #[test]
    fn udp_arguments_include_bitrate() {
        let request = ProbeRequest::new("10.0.0.5")
            .with_duration(3)
            .with_udp(Some("10M".to_string()));
        assert_eq!(
            request.args(),
            vec!["-c", "10.0.0.5", "-p", "5201", "-t", "3", "-u", "-b", "10M"]
        );
    }

    #[test]
    fn tcp_ignores_bitrate() {
        let mut request = ProbeRequest::new("10.0.0.5");
        request.target_bitrate = Some("10M".to_string());
        assert_eq!(
            request.args(),
            vec!["-c", "10.0.0.5", "-p", "5201", "-t", "10"]
        );
    }
}
