//! # Optimizer
//!
//! Keeps each registered PJSIP endpoint on a codec list suited to its link.
//!
//! Every cycle discovers the active endpoints, measures each one's throughput
//! with a short iperf3 run, maps the result to a [`CodecPolicy`], writes the
//! codec list through the configuration store and asks the server to reload.
//!
//! ```no_run
//! use optimizer::{ReconciliationLoop, Settings};
//! use probe_core::SystemRunner;
//! use std::sync::Arc;
//!
//! # async fn example() -> optimizer::Result<()> {
//! let settings = Settings::load(None)?;
//! let mut reconciler = ReconciliationLoop::new(Arc::new(SystemRunner::new()), &settings)?;
//! reconciler.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod policy;
pub mod reconcile;
pub mod settings;

pub use error::{OptimizerError, Result};
pub use policy::{select_policy, CodecPolicy};
pub use reconcile::{CyclePhase, CycleReport, EndpointOutcome, ReconciliationLoop};
pub use settings::{ProbeSettings, ScheduleSettings, Settings};
