//! # Probe-Core
//!
//! Talks to the outside world through external tools:
//!
//! - [`EndpointDiscovery`]: registered contacts from `asterisk -rx 'pjsip show contacts'`
//! - [`BandwidthProbe`]: throughput to an endpoint from an `iperf3` client run
//! - [`ReloadTrigger`]: asks the server to reload its configuration
//!
//! Discovery and probing never fail towards their caller: every tool failure is
//! logged and turned into an empty list or an unmeasured sample. The `try_*`
//! variants expose the underlying [`ProbeError`] for diagnostics.

pub mod bandwidth;
pub mod discovery;
pub mod error;
#[cfg(feature = "testing")]
pub mod mock;
pub mod reload;
pub mod runner;

pub use bandwidth::{parse_iperf_summary, to_mbps, BandwidthProbe, BandwidthSample, ProbeRequest, Transport};
pub use discovery::{parse_contacts, EndpointDiscovery, EndpointRecord};
pub use error::{ProbeError, Result};
pub use reload::ReloadTrigger;
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
