//! The three linked records that make up a user profile.
//!
//! All three are keyed by the extension: the contact and endpoint sections
//! are named `<ext>`, the credential section `<ext>-auth`. The endpoint refers
//! to the other two by those names (`aors = <ext>`, `auth = <ext>-auth`).

use crate::codec::CodecList;
use crate::error::{ConfigStoreError, Result};
use crate::section::Section;
use std::fmt;

pub const AUTH_SUFFIX: &str = "-auth";
pub const PASSWORD_MASK: &str = "********";

/// Name of the credential section for `extension`
pub fn auth_section_name(extension: &str) -> String {
    format!("{}{}", extension, AUTH_SUFFIX)
}

fn malformed(section: &str, message: impl Into<String>) -> ConfigStoreError {
    ConfigStoreError::Malformed {
        section: section.to_string(),
        message: message.into(),
    }
}

fn required<'a>(section: &'a Section, name: &str, key: &str) -> Result<&'a str> {
    section
        .get(key)
        .ok_or_else(|| malformed(name, format!("missing {}", key)))
}

/// Contact (AOR) record: how many registrations may bind and how often they are qualified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub max_contacts: u32,
    pub qualify_frequency: u32,
}

impl Default for ContactRecord {
    fn default() -> Self {
        Self {
            max_contacts: 1,
            qualify_frequency: 60,
        }
    }
}

impl ContactRecord {
    pub fn to_section(&self) -> Section {
        Section::new()
            .with("type", "aor")
            .with("max_contacts", self.max_contacts.to_string())
            .with("qualify_frequency", self.qualify_frequency.to_string())
    }

    pub fn from_section(name: &str, section: &Section) -> Result<Self> {
        let number = |key: &str| -> Result<u32> {
            required(section, name, key)?
                .parse()
                .map_err(|_| malformed(name, format!("{} is not a number", key)))
        };
        Ok(Self {
            max_contacts: number("max_contacts")?,
            qualify_frequency: number("qualify_frequency")?,
        })
    }
}

/// Credential record (`<ext>-auth`)
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub auth_type: String,
    pub username: String,
    pub password: String,
}

impl CredentialRecord {
    /// Username/password credential for `extension`
    pub fn userpass(extension: &str, password: &str) -> Self {
        Self {
            auth_type: "userpass".to_string(),
            username: extension.to_string(),
            password: password.to_string(),
        }
    }

    pub fn to_section(&self) -> Section {
        Section::new()
            .with("type", "auth")
            .with("auth_type", self.auth_type.as_str())
            .with("username", self.username.as_str())
            .with("password", self.password.as_str())
    }

    pub fn from_section(name: &str, section: &Section) -> Result<Self> {
        Ok(Self {
            auth_type: required(section, name, "auth_type")?.to_string(),
            username: required(section, name, "username")?.to_string(),
            password: required(section, name, "password")?.to_string(),
        })
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("auth_type", &self.auth_type)
            .field("username", &self.username)
            .field("password", &PASSWORD_MASK)
            .finish()
    }
}

/// Endpoint record: dial context, codec allow-list and references to the other two records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub context: String,
    pub allow: CodecList,
    /// Name of the contact section
    pub aors: String,
    /// Name of the credential section
    pub auth: String,
    pub direct_media: bool,
}

impl EndpointConfig {
    /// Endpoint for `extension` in the default context, media relayed through the server
    pub fn for_extension(extension: &str, allow: CodecList) -> Self {
        Self {
            context: "default".to_string(),
            allow,
            aors: extension.to_string(),
            auth: auth_section_name(extension),
            direct_media: false,
        }
    }

    pub fn to_section(&self) -> Section {
        Section::new()
            .with("type", "endpoint")
            .with("context", self.context.as_str())
            .with("disallow", "all")
            .with("allow", self.allow.to_string())
            .with("aors", self.aors.as_str())
            .with("auth", self.auth.as_str())
            .with("direct_media", if self.direct_media { "yes" } else { "no" })
    }

    pub fn from_section(name: &str, section: &Section) -> Result<Self> {
        let allow = CodecList::parse(required(section, name, "allow")?)
            .map_err(|e| malformed(name, e.to_string()))?;
        let direct_media = match section.get("direct_media") {
            None => true,
            Some(value) => matches!(value, "yes" | "true" | "on" | "1"),
        };
        Ok(Self {
            context: required(section, name, "context")?.to_string(),
            allow,
            aors: required(section, name, "aors")?.to_string(),
            auth: required(section, name, "auth")?.to_string(),
            direct_media,
        })
    }
}

/// Snapshot of everything stored for one extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub extension: String,
    pub endpoint: Section,
    pub contact: Option<Section>,
    pub credential: Option<Section>,
}

impl UserProfile {
    pub fn endpoint_config(&self) -> Result<EndpointConfig> {
        EndpointConfig::from_section(&self.extension, &self.endpoint)
    }

    pub fn contact_record(&self) -> Result<Option<ContactRecord>> {
        self.contact
            .as_ref()
            .map(|section| ContactRecord::from_section(&self.extension, section))
            .transpose()
    }

    pub fn credential_record(&self) -> Result<Option<CredentialRecord>> {
        let name = auth_section_name(&self.extension);
        self.credential
            .as_ref()
            .map(|section| CredentialRecord::from_section(&name, section))
            .transpose()
    }
}

fn write_options(f: &mut fmt::Formatter<'_>, section: &Section) -> fmt::Result {
    for (key, value) in section.iter() {
        match value {
            Some(value) => writeln!(f, "{:20} = {}", key, value)?,
            None => writeln!(f, "{}", key)?,
        }
    }
    Ok(())
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration of {}:", self.extension)?;
        writeln!(f, "{}", "=".repeat(40))?;

        writeln!(f, "\n[Endpoint]")?;
        write_options(f, &self.endpoint)?;

        writeln!(f, "\n[AOR]")?;
        if let Some(contact) = &self.contact {
            write_options(f, contact)?;
        }

        writeln!(f, "\n[Auth]")?;
        if let Some(credential) = &self.credential {
            writeln!(f, "{:20} = {}", "username", credential.get("username").unwrap_or(""))?;
            writeln!(f, "{:20} = {}", "password", PASSWORD_MASK)?;
        }
        Ok(())
    }
}

/// Result of a `show` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowReport {
    /// Full profile of one extension
    Profile(UserProfile),
    /// Keys of every endpoint record
    Extensions(Vec<String>),
    /// The requested extension has no endpoint record
    NotFound(String),
}

impl fmt::Display for ShowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShowReport::Profile(profile) => write!(f, "{}", profile),
            ShowReport::Extensions(extensions) => {
                writeln!(f, "Configured extensions:")?;
                writeln!(f, "{}", "=".repeat(40))?;
                for extension in extensions {
                    writeln!(f, "- {}", extension)?;
                }
                Ok(())
            }
            ShowReport::NotFound(extension) => writeln!(f, "Extension {} not found", extension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoint_section_layout() {
        let endpoint = EndpointConfig::for_extension("100", CodecList::default());
        let section = endpoint.to_section();
        let rendered: Vec<_> = section.iter().collect();
        assert_eq!(
            rendered,
            vec![
                ("type", Some("endpoint")),
                ("context", Some("default")),
                ("disallow", Some("all")),
                ("allow", Some("opus,alaw,ulaw,g729,gsm")),
                ("aors", Some("100")),
                ("auth", Some("100-auth")),
                ("direct_media", Some("no")),
            ]
        );
        assert_eq!(EndpointConfig::from_section("100", &section).unwrap(), endpoint);
    }

    #[test]
    fn credential_debug_masks_password() {
        let credential = CredentialRecord::userpass("100", "hunter2");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains(PASSWORD_MASK));
    }

    #[test]
    fn contact_requires_numeric_fields() {
        let section = Section::new()
            .with("type", "aor")
            .with("max_contacts", "many")
            .with("qualify_frequency", "60");
        let err = ContactRecord::from_section("100", &section).unwrap_err();
        assert!(matches!(err, ConfigStoreError::Malformed { .. }));
    }

    #[test]
    fn profile_rendering_masks_password() {
        let profile = UserProfile {
            extension: "100".to_string(),
            endpoint: EndpointConfig::for_extension("100", CodecList::default()).to_section(),
            contact: Some(ContactRecord::default().to_section()),
            credential: Some(CredentialRecord::userpass("100", "hunter2").to_section()),
        };
        let text = profile.to_string();
        assert!(text.starts_with("Configuration of 100:\n"));
        assert!(text.contains("allow                = opus,alaw,ulaw,g729,gsm\n"));
        assert!(text.contains("max_contacts         = 1\n"));
        assert!(text.contains("username             = 100\n"));
        assert!(text.contains("password             = ********\n"));
        assert!(!text.contains("hunter2"));
    }
}
