//! Discovery of registered endpoints from `pjsip show contacts`

use crate::error::{ProbeError, Result};
use crate::runner::{display_command, CommandRunner};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info, warn};

static CONTACT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Contact:\s+(?P<aor>\S+)/sips?:(?P<ext>[^@\s]+)@(?P<ip>\d{1,3}(?:\.\d{1,3}){3})(?::\d+)?\S*\s+(?P<hash>\S+)\s+(?P<status>\S+)\s+(?P<rtt>\S+)",
    )
    .unwrap()
});

/// A contact currently bound to an AOR, as reported by the server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointRecord {
    /// Address of record the contact is bound to
    pub aor: String,
    /// User part of the contact URI; the extension
    pub extension: String,
    pub address: Ipv4Addr,
    /// Qualify status token (`Avail`, `Unavail`, `NonQual`, ...)
    pub status: String,
    /// Last qualify round-trip time; `None` when not measured
    pub rtt_ms: Option<f64>,
}

fn parse_rtt(token: &str) -> Option<f64> {
    if token == "-" {
        return None;
    }
    token.parse::<f64>().ok().filter(|rtt| rtt.is_finite())
}

/// Parse the output of `pjsip show contacts`.
///
/// Lines that do not describe a contact (banners, column headers, the
/// `Objects found` footer) are skipped.
pub fn parse_contacts(output: &str) -> Vec<EndpointRecord> {
    output
        .lines()
        .filter_map(|line| {
            let caps = CONTACT_REGEX.captures(line)?;
            let address = caps["ip"].parse::<Ipv4Addr>().ok()?;
            Some(EndpointRecord {
                aor: caps["aor"].to_string(),
                extension: caps["ext"].to_string(),
                address,
                status: caps["status"].to_string(),
                rtt_ms: parse_rtt(&caps["rtt"]),
            })
        })
        .collect()
}

/// Lists active endpoints through the Asterisk CLI
pub struct EndpointDiscovery {
    runner: Arc<dyn CommandRunner>,
    cli_bin: String,
}

impl EndpointDiscovery {
    pub fn new(runner: Arc<dyn CommandRunner>, cli_bin: impl Into<String>) -> Self {
        Self {
            runner,
            cli_bin: cli_bin.into(),
        }
    }

    fn args() -> Vec<String> {
        vec!["-rx".to_string(), "pjsip show contacts".to_string()]
    }

    /// Run the discovery command, reporting each failure cause separately
    pub async fn try_list_active_endpoints(&self) -> Result<Vec<EndpointRecord>> {
        let args = Self::args();
        let output = self
            .runner
            .run(&self.cli_bin, &args)
            .await?
            .into_success(&self.cli_bin)?;

        let endpoints = parse_contacts(&output.stdout);
        if endpoints.is_empty()
            && !output.stdout.trim().is_empty()
            && !output.stdout.contains("Contact:")
            && !output.stdout.contains("No objects found")
        {
            return Err(ProbeError::UnexpectedOutput {
                program: display_command(&self.cli_bin, &args),
                reason: "no contact table in output".to_string(),
            });
        }

        debug!(count = endpoints.len(), "parsed contacts");
        Ok(endpoints)
    }

    /// Active endpoints, or an empty list if the command fails in any way
    pub async fn list_active_endpoints(&self) -> Vec<EndpointRecord> {
        match self.try_list_active_endpoints().await {
            Ok(endpoints) => {
                info!(count = endpoints.len(), "discovered active endpoints");
                endpoints
            }
            Err(e) => {
                warn!(error = %e, "endpoint discovery failed, treating as no endpoints");
                Vec::new()
            }
        }
    }
}
