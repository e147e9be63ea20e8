//! # PJSIP-Config
//!
//! Keeps the per-extension PJSIP configuration of an Asterisk server:
//!
//! - `pjsip_aor.conf`: contact records (`[<ext>]`)
//! - `pjsip_auth.conf`: credential records (`[<ext>-auth]`)
//! - `pjsip_endpoints.conf`: endpoint records (`[<ext>]`) referencing the other two by name
//! - `extensions.conf`: one `Dial` line per extension inside a marked region
//!
//! [`PjsipConfigStore`] loads all of them, applies add/edit/delete to all
//! stores together and writes them back with an explicit `persist()`.

pub mod bootstrap;
pub mod codec;
pub mod dialplan;
pub mod error;
pub mod paths;
pub mod profile;
pub mod section;
pub mod settings;
pub mod store;
pub mod validation;

pub use bootstrap::ensure_config_files;
pub use codec::{CodecList, DEFAULT_CODECS};
pub use dialplan::DialplanFile;
pub use error::{ConfigStoreError, Result};
pub use paths::PjsipPaths;
pub use profile::{
    auth_section_name, ContactRecord, CredentialRecord, EndpointConfig, ShowReport, UserProfile,
};
pub use section::{Section, SectionFile};
pub use settings::AsteriskSettings;
pub use store::PjsipConfigStore;
