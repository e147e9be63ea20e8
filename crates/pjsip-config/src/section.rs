//! Section-keyed option files (`[name]` headers followed by `key = value` lines).
//!
//! The format is the one Asterisk reads for `pjsip_*.conf`: blank lines and
//! full-line `;`/`#` comments are skipped, keys are case-folded to lowercase, a key without a
//! delimiter is stored without a value. Comments are not preserved on save.

use crate::error::{ConfigStoreError, Result};
use indexmap::IndexMap;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The options of a single section, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    options: IndexMap<String, Option<String>>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Value of `key`, `None` when the key is absent or has no value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// Set `key`, keeping its position if it already exists
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options
            .insert(key.into().to_ascii_lowercase(), Some(value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.options
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// One section file held fully in memory
#[derive(Debug, Clone)]
pub struct SectionFile {
    path: PathBuf,
    sections: IndexMap<String, Section>,
}

impl SectionFile {
    /// An empty file bound to `path`; nothing is written until [`SectionFile::save`]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sections: IndexMap::new(),
        }
    }

    /// Load and parse `path`. A missing file loads as empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(path, &text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "section file absent, starting empty");
                Ok(Self::empty(path))
            }
            Err(e) => Err(ConfigStoreError::io(path, e)),
        }
    }

    /// Parse `text` as the contents of `path`
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let path = path.into();
        let mut sections: IndexMap<String, Section> = IndexMap::new();
        let mut current: Option<String> = None;

        let parse_error = |line: usize, message: String| ConfigStoreError::Parse {
            path: path.clone(),
            line,
            message,
        };

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let Some(end) = rest.find(']') else {
                    return Err(parse_error(line_no, "unterminated section header".into()));
                };
                let name = rest[..end].trim();
                if name.is_empty() {
                    return Err(parse_error(line_no, "empty section name".into()));
                }
                if !rest[end + 1..].trim().is_empty() {
                    return Err(parse_error(
                        line_no,
                        format!("unexpected text after section header [{}]", name),
                    ));
                }
                if sections.contains_key(name) {
                    return Err(parse_error(line_no, format!("duplicate section [{}]", name)));
                }
                sections.insert(name.to_string(), Section::new());
                current = Some(name.to_string());
                continue;
            }

            let Some(section_name) = current.as_ref() else {
                return Err(parse_error(
                    line_no,
                    "option found before any section header".into(),
                ));
            };

            let (key, value) = match line.find(|c: char| c == '=' || c == ':') {
                Some(pos) => (line[..pos].trim(), Some(line[pos + 1..].trim().to_string())),
                None => (line, None),
            };
            if key.is_empty() {
                return Err(parse_error(line_no, "option without a name".into()));
            }
            let key = key.to_ascii_lowercase();

            let section = sections
                .get_mut(section_name)
                .ok_or_else(|| parse_error(line_no, "internal: section vanished".into()))?;
            if section.options.contains_key(&key) {
                return Err(parse_error(
                    line_no,
                    format!("duplicate option {} in [{}]", key, section_name),
                ));
            }
            section.options.insert(key, value);
        }

        Ok(Self { path, sections })
    }

    /// Render the file in the canonical layout, one blank line after each section
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, section) in &self.sections {
            let _ = writeln!(out, "[{}]", name);
            for (key, value) in section.iter() {
                match value {
                    Some(value) => {
                        let _ = writeln!(out, "{} = {}", key, value);
                    }
                    None => {
                        let _ = writeln!(out, "{}", key);
                    }
                }
            }
            out.push('\n');
        }
        out
    }

    /// Rewrite the whole file
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.render()).map_err(|e| ConfigStoreError::io(&self.path, e))?;
        debug!(path = %self.path.display(), sections = self.sections.len(), "section file saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.get_mut(name)
    }

    /// Insert `section` under `name` unless one already exists. Returns true if inserted.
    pub fn insert_if_absent(&mut self, name: &str, section: Section) -> bool {
        if self.sections.contains_key(name) {
            return false;
        }
        self.sections.insert(name.to_string(), section);
        true
    }

    /// Insert or replace `name`
    pub fn insert(&mut self, name: &str, section: Section) {
        self.sections.insert(name.to_string(), section);
    }

    /// Remove `name`, keeping the order of the remaining sections
    pub fn remove(&mut self, name: &str) -> Option<Section> {
        self.sections.shift_remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
