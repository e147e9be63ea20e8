//! The configuration store: three section files plus the dial-plan region,
//! mutated together and persisted together.

use crate::codec::CodecList;
use crate::dialplan::DialplanFile;
use crate::error::{ConfigStoreError, Result};
use crate::paths::PjsipPaths;
use crate::profile::{
    auth_section_name, ContactRecord, CredentialRecord, EndpointConfig, ShowReport, UserProfile,
};
use crate::section::SectionFile;
use crate::validation::{validate_extension, validate_password};
use tracing::{debug, info};

/// In-memory view of the PJSIP user configuration.
///
/// All files are read once by [`PjsipConfigStore::open`]. Mutations only touch
/// memory; [`PjsipConfigStore::persist`] rewrites the section files and then
/// the dial-plan. There is no locking: a concurrent writer between `open` and
/// `persist` is overwritten.
#[derive(Debug)]
pub struct PjsipConfigStore {
    paths: PjsipPaths,
    aors: SectionFile,
    auths: SectionFile,
    endpoints: SectionFile,
    dialplan: DialplanFile,
    dirty: bool,
}

impl PjsipConfigStore {
    /// Load every backing file named by `paths`
    pub fn open(paths: &PjsipPaths) -> Result<Self> {
        let store = Self {
            paths: paths.clone(),
            aors: SectionFile::load(&paths.aor)?,
            auths: SectionFile::load(&paths.auth)?,
            endpoints: SectionFile::load(&paths.endpoint)?,
            dialplan: DialplanFile::load(&paths.extensions)?,
            dirty: false,
        };
        debug!(
            endpoints = store.endpoints.len(),
            aors = store.aors.len(),
            auths = store.auths.len(),
            "configuration store loaded"
        );
        Ok(store)
    }

    pub fn paths(&self) -> &PjsipPaths {
        &self.paths
    }

    /// True when there are changes not yet written by [`PjsipConfigStore::persist`]
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.dialplan.is_dirty()
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.endpoints.contains(extension)
    }

    /// Keys of every endpoint record, in file order
    pub fn extensions(&self) -> Vec<String> {
        self.endpoints.names().map(str::to_string).collect()
    }

    /// Extensions routed by the managed dial-plan region
    pub fn routed_extensions(&self) -> Vec<String> {
        self.dialplan.routes()
    }

    /// Create the contact, credential and endpoint records for `extension`
    /// and route it in the dial-plan.
    ///
    /// Records that already exist are left as they are, so adding the same
    /// extension twice leaves a single set of records and a single route.
    pub fn add_user(
        &mut self,
        extension: &str,
        password: &str,
        codecs: Option<&CodecList>,
    ) -> Result<()> {
        validate_extension(extension)?;
        validate_password(password)?;

        let auth_name = auth_section_name(extension);
        let allow = codecs.cloned().unwrap_or_default();

        if self
            .aors
            .insert_if_absent(extension, ContactRecord::default().to_section())
        {
            self.dirty = true;
        } else {
            debug!(extension, "contact record exists, keeping it");
        }

        if self.auths.insert_if_absent(
            &auth_name,
            CredentialRecord::userpass(extension, password).to_section(),
        ) {
            self.dirty = true;
        } else {
            debug!(extension, "credential record exists, keeping it");
        }

        if self.endpoints.insert_if_absent(
            extension,
            EndpointConfig::for_extension(extension, allow).to_section(),
        ) {
            self.dirty = true;
        } else {
            debug!(extension, "endpoint record exists, keeping it");
        }

        self.dialplan.add_route(extension);

        info!(extension, "user configured");
        Ok(())
    }

    /// Change the password and/or codec list of an existing extension
    pub fn edit_user(
        &mut self,
        extension: &str,
        password: Option<&str>,
        codecs: Option<&CodecList>,
    ) -> Result<()> {
        if password.is_none() && codecs.is_none() {
            return Err(ConfigStoreError::Validation(
                "specify at least a password or a codec list".to_string(),
            ));
        }
        validate_extension(extension)?;
        if !self.endpoints.contains(extension) {
            return Err(ConfigStoreError::NotFound(extension.to_string()));
        }

        if let Some(password) = password {
            validate_password(password)?;
            let auth_name = auth_section_name(extension);
            match self.auths.get_mut(&auth_name) {
                Some(section) => section.set("password", password),
                None => {
                    info!(extension, "credential record missing, recreating it");
                    self.auths.insert(
                        &auth_name,
                        CredentialRecord::userpass(extension, password).to_section(),
                    );
                }
            }
            self.dirty = true;
        }

        if let Some(codecs) = codecs {
            if let Some(section) = self.endpoints.get_mut(extension) {
                section.set("allow", codecs.to_string());
                self.dirty = true;
            }
        }

        info!(extension, password_changed = password.is_some(), codecs = ?codecs.map(|c| c.to_string()), "user updated");
        Ok(())
    }

    /// Remove every record of `extension` and its dial-plan route.
    ///
    /// Missing records are not an error; deleting an unknown extension changes nothing.
    /// A non-numeric name (such as a credential name) is rejected.
    pub fn delete_user(&mut self, extension: &str) -> Result<()> {
        validate_extension(extension)?;
        let auth_name = auth_section_name(extension);
        let mut removed = 0;

        for name in [extension, auth_name.as_str()] {
            for file in [&mut self.aors, &mut self.auths, &mut self.endpoints] {
                if file.remove(name).is_some() {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            self.dirty = true;
        }

        let routes = self.dialplan.remove_route(extension);

        info!(extension, records = removed, routes, "user deleted");
        Ok(())
    }

    /// Everything stored for `extension`, if it has an endpoint record
    pub fn profile(&self, extension: &str) -> Option<UserProfile> {
        let endpoint = self.endpoints.get(extension)?;
        Some(UserProfile {
            extension: extension.to_string(),
            endpoint: endpoint.clone(),
            contact: self.aors.get(extension).cloned(),
            credential: self.auths.get(&auth_section_name(extension)).cloned(),
        })
    }

    /// Read-only lookup: one profile, or the list of all extensions
    pub fn show_user(&self, extension: Option<&str>) -> ShowReport {
        match extension {
            Some(extension) => match self.profile(extension) {
                Some(profile) => ShowReport::Profile(profile),
                None => ShowReport::NotFound(extension.to_string()),
            },
            None => ShowReport::Extensions(self.extensions()),
        }
    }

    /// Write the three section files, then the dial-plan.
    ///
    /// Not atomic across files: a failure part-way leaves the earlier files written.
    pub fn persist(&mut self) -> Result<()> {
        if !self.is_dirty() {
            debug!("configuration unchanged, nothing to persist");
            return Ok(());
        }
        self.aors.save()?;
        self.auths.save()?;
        self.endpoints.save()?;
        self.dirty = false;
        self.dialplan.save()?;
        info!("configuration persisted");
        Ok(())
    }
}
