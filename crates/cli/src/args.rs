//! Command line definition of `pjsip-manager`

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

/// Codec order given to new users when `--codecs` is omitted
pub const DEFAULT_ADD_CODECS: &str = "opus,g729,ulaw,alaw,gsm";

/// Manage PJSIP users: endpoint, AOR and auth sections plus their dial-plan route
#[derive(Parser, Debug)]
#[command(name = "pjsip-manager", author, version, about, long_about = None)]
pub struct Cli {
    /// TOML settings file
    #[arg(short = 'C', long, global = true, env = "PJTUNE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Asterisk configuration directory (overrides asterisk.conf_dir)
    #[arg(short = 'd', long, global = true)]
    pub conf_dir: Option<PathBuf>,

    /// Log what is being changed
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a user
    Add {
        /// Numeric extension, e.g. 200
        extension: String,

        /// SIP password
        password: String,

        /// Comma-separated codec list, in order of preference
        #[arg(short, long, default_value = DEFAULT_ADD_CODECS)]
        codecs: String,
    },

    /// Change the password and/or codecs of a user
    #[command(group(
        ArgGroup::new("change")
            .required(true)
            .multiple(true)
            .args(["password", "codecs"])
    ))]
    Edit {
        extension: String,

        /// New SIP password
        #[arg(short, long)]
        password: Option<String>,

        /// New comma-separated codec list
        #[arg(short, long)]
        codecs: Option<String>,
    },

    /// Delete a user and its dial-plan route
    Del { extension: String },

    /// Show one user, or list all extensions
    Show { extension: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_uses_default_codecs() {
        let cli = Cli::try_parse_from(["pjsip-manager", "add", "200", "secret"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Add {
                extension: "200".to_string(),
                password: "secret".to_string(),
                codecs: DEFAULT_ADD_CODECS.to_string(),
            }
        );
    }

    #[test]
    fn edit_requires_a_change() {
        assert!(Cli::try_parse_from(["pjsip-manager", "edit", "200"]).is_err());

        let cli = Cli::try_parse_from(["pjsip-manager", "edit", "200", "--codecs", "gsm"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Edit {
                extension: "200".to_string(),
                password: None,
                codecs: Some("gsm".to_string()),
            }
        );
    }

    #[test]
    fn show_without_extension_lists() {
        let cli = Cli::try_parse_from(["pjsip-manager", "-d", "/tmp/ast", "show"]).unwrap();
        assert_eq!(cli.command, Command::Show { extension: None });
        assert_eq!(cli.conf_dir, Some(PathBuf::from("/tmp/ast")));
    }
}
