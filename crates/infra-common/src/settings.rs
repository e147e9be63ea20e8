//! Layered settings loading.
//!
//! Settings are merged from three sources, later ones overriding earlier ones:
//!
//! 1. the `Default` impl of the settings type
//! 2. an optional TOML file
//! 3. environment variables named `<PREFIX>__<SECTION>__<KEY>`

use crate::errors::types::{Error, Result};
use config::{Config, Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Environment variables overriding settings are named `PJTUNE__<SECTION>__<KEY>`
pub const ENV_PREFIX: &str = "PJTUNE";

/// Load settings of type `T`, layering a TOML file and the environment over `T::default()`.
pub fn load_settings<T>(file: Option<&Path>, env_prefix: &str) -> Result<T>
where
    T: DeserializeOwned + Serialize + Default,
{
    let defaults = Config::try_from(&T::default())?;

    let mut builder = Config::builder().add_source(defaults);

    if let Some(path) = file {
        if !path.exists() {
            return Err(Error::Config(format!(
                "settings file {} does not exist",
                path.display()
            )));
        }
        builder = builder.add_source(File::from(path).format(FileFormat::Toml));
    }

    builder = builder.add_source(
        Environment::with_prefix(env_prefix)
            .separator("__")
            .try_parsing(true),
    );

    let settings = builder.build()?.try_deserialize::<T>()?;
    tracing::debug!(prefix = env_prefix, file = ?file, "settings loaded");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        network: Network,
        name: String,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(default)]
    struct Network {
        port: u16,
        udp: bool,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                network: Network::default(),
                name: "sample".to_string(),
            }
        }
    }

    impl Default for Network {
        fn default() -> Self {
            Self {
                port: 5201,
                udp: false,
            }
        }
    }

    #[test]
    fn defaults_without_file() {
        let loaded: Sample = load_settings(None, "INFRA_COMMON_TEST_UNSET").unwrap();
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[network]\nport = 6000").unwrap();

        let loaded: Sample = load_settings(Some(file.path()), "INFRA_COMMON_TEST_UNSET").unwrap();
        assert_eq!(loaded.network.port, 6000);
        assert!(!loaded.network.udp);
        assert_eq!(loaded.name, "sample");
    }

    #[test]
    fn missing_file_is_an_error() {
        let result: Result<Sample> =
            load_settings(Some(Path::new("/nonexistent/pjtune.toml")), "INFRA_COMMON_TEST_UNSET");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
