//! The managed region of `extensions.conf`.
//!
//! Only the lines between the `;EBANDI` and `;FIN_EBANDI` markers inside the
//! `[default]` context are owned by the store. Each owned line routes one
//! extension to its endpoint:
//!
//! ```text
//! [default]
//! ;EBANDI
//! exten => 100,1,Dial(PJSIP/100)
//! exten => 101,1,Dial(PJSIP/101)
//! ;FIN_EBANDI
//! ```
//!
//! Everything outside the region is preserved byte for byte. Changes are made
//! in memory and written back as a whole-file rewrite by [`DialplanFile::save`].

use crate::error::{ConfigStoreError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONTEXT: &str = "[default]";
pub const REGION_BEGIN: &str = ";EBANDI";
pub const REGION_END: &str = ";FIN_EBANDI";

static BEGIN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^;EBANDI[ \t\r]*$").unwrap());
static END_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^;FIN_EBANDI[ \t\r]*$").unwrap());
static CONTEXT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\[default\][^\n]*$").unwrap());
static ANY_ROUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^exten\s*=>\s*([0-9]+),[^\n]*Dial\(PJSIP/([0-9]+)\)").unwrap()
});

/// The dial action written for `extension`
pub fn dial_line(extension: &str) -> String {
    format!("exten => {},1,Dial(PJSIP/{})", extension, extension)
}

/// Pattern matching the whole line (and its newline) that dials `extension`
fn route_regex(extension: &str) -> Regex {
    let ext = regex::escape(extension);
    Regex::new(&format!(
        r"(?m)^exten\s*=>\s*{ext},[^\n]*Dial\(PJSIP/{ext}\)[^\n]*(?:\n|\z)"
    ))
    .expect("route pattern built from an escaped extension")
}

/// Byte range of the region body: from just after the begin marker line to the
/// start of the end marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    body_start: usize,
    body_end: usize,
}

/// `extensions.conf` held in memory
#[derive(Debug, Clone)]
pub struct DialplanFile {
    path: PathBuf,
    content: String,
    dirty: bool,
}

impl DialplanFile {
    /// Read `path`. A missing file loads as empty; the region is created on first change.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(ConfigStoreError::io(path, e)),
        };
        Ok(Self::from_content(path, content))
    }

    pub fn from_content(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// True when in-memory content differs from what was loaded or last saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn region(&self) -> Option<Region> {
        let begin = BEGIN_REGEX.find(&self.content)?;
        let end = END_REGEX.find_at(&self.content, begin.end())?;
        let body_start = (begin.end() + 1).min(end.start());
        Some(Region {
            body_start,
            body_end: end.start(),
        })
    }

    fn region_body(&self) -> &str {
        match self.region() {
            Some(region) => &self.content[region.body_start..region.body_end],
            None => "",
        }
    }

    /// Insert the marker pair if it is missing: right after the `[default]`
    /// header, or as a new `[default]` context at the end of the file.
    fn ensure_region(&mut self) -> Region {
        if let Some(region) = self.region() {
            return region;
        }

        let markers = format!("\n{}\n{}", REGION_BEGIN, REGION_END);
        match CONTEXT_REGEX.find(&self.content) {
            Some(header) => {
                info!(path = %self.path.display(), "adding managed region markers after [default]");
                self.content.insert_str(header.end(), &markers);
            }
            None => {
                info!(path = %self.path.display(), "adding [default] context with managed region");
                if !self.content.is_empty() && !self.content.ends_with('\n') {
                    self.content.push('\n');
                }
                self.content.push_str(DEFAULT_CONTEXT);
                self.content.push_str(&markers);
                self.content.push('\n');
            }
        }
        self.dirty = true;

        // The markers were just written as whole lines, so the region now exists.
        self.region().unwrap_or(Region {
            body_start: self.content.len(),
            body_end: self.content.len(),
        })
    }

    /// Extensions routed inside the managed region, in file order
    pub fn routes(&self) -> Vec<String> {
        ANY_ROUTE_REGEX
            .captures_iter(self.region_body())
            .filter(|caps| caps[1] == caps[2])
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Whether the managed region already dials `extension`
    pub fn has_route(&self, extension: &str) -> bool {
        route_regex(extension).is_match(self.region_body())
    }

    /// Append the dial line for `extension` just before the end marker.
    ///
    /// Returns false when the region already routes the extension.
    pub fn add_route(&mut self, extension: &str) -> bool {
        let region = self.ensure_region();
        if self.has_route(extension) {
            debug!(extension, "dial-plan route already present");
            return false;
        }
        let line = format!("{}\n", dial_line(extension));
        self.content.insert_str(region.body_end, &line);
        self.dirty = true;
        true
    }

    /// Remove every line in the managed region that dials `extension`.
    ///
    /// Returns the number of lines removed.
    pub fn remove_route(&mut self, extension: &str) -> usize {
        let region = self.ensure_region();
        let body = &self.content[region.body_start..region.body_end];
        let pattern = route_regex(extension);
        let removed = pattern.find_iter(body).count();
        if removed == 0 {
            return 0;
        }
        let new_body = pattern.replace_all(body, "").into_owned();
        self.content
            .replace_range(region.body_start..region.body_end, &new_body);
        self.dirty = true;
        removed
    }

    /// Rewrite the file if anything changed
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        fs::write(&self.path, &self.content).map_err(|e| ConfigStoreError::io(&self.path, e))?;
        self.dirty = false;
        debug!(path = %self.path.display(), "dial-plan saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(content: &str) -> DialplanFile {
        DialplanFile::from_content("extensions.conf", content)
    }

    #[test]
    fn appends_before_end_marker() {
        let mut plan = file("[general]\nstatic=yes\n\n[default]\n;EBANDI\n;FIN_EBANDI\n\n[other]\nexten => 9,1,Hangup()\n");
        assert!(plan.add_route("100"));
        assert!(plan.add_route("101"));
        assert_eq!(
            plan.content(),
            "[general]\nstatic=yes\n\n[default]\n;EBANDI\nexten => 100,1,Dial(PJSIP/100)\nexten => 101,1,Dial(PJSIP/101)\n;FIN_EBANDI\n\n[other]\nexten => 9,1,Hangup()\n"
        );
        assert!(plan.is_dirty());
    }

    #[test]
    fn add_is_idempotent() {
        let mut plan = file("[default]\n;EBANDI\n;FIN_EBANDI\n");
        assert!(plan.add_route("100"));
        assert!(!plan.add_route("100"));
        assert_eq!(plan.routes(), vec!["100"]);
    }

    #[test]
    fn migrates_missing_markers_after_default_header() {
        let mut plan = file("[default]\nexten => 5,1,Playback(hello)\n");
        plan.add_route("200");
        assert_eq!(
            plan.content(),
            "[default]\n;EBANDI\nexten => 200,1,Dial(PJSIP/200)\n;FIN_EBANDI\nexten => 5,1,Playback(hello)\n"
        );
    }

    #[test]
    fn creates_default_context_when_absent() {
        let mut plan = file("[general]\nstatic=yes");
        plan.add_route("300");
        assert_eq!(
            plan.content(),
            "[general]\nstatic=yes\n[default]\n;EBANDI\nexten => 300,1,Dial(PJSIP/300)\n;FIN_EBANDI\n"
        );
    }

    #[test]
    fn removes_only_exact_extension() {
        let mut plan = file(
            "[default]\n;EBANDI\nexten => 10,1,Dial(PJSIP/10)\nexten => 100,1,Dial(PJSIP/100)\nexten => 1000,1,Dial(PJSIP/1000)\n;FIN_EBANDI\n",
        );
        assert_eq!(plan.remove_route("100"), 1);
        assert_eq!(plan.routes(), vec!["10", "1000"]);
        assert_eq!(
            plan.content(),
            "[default]\n;EBANDI\nexten => 10,1,Dial(PJSIP/10)\nexten => 1000,1,Dial(PJSIP/1000)\n;FIN_EBANDI\n"
        );
    }

    #[test]
    fn lines_outside_region_are_untouched() {
        let original = "[default]\n;EBANDI\n;FIN_EBANDI\n[internal]\nexten => 100,1,Dial(PJSIP/100)\n";
        let mut plan = file(original);
        assert_eq!(plan.remove_route("100"), 0);
        assert!(!plan.has_route("100"));
        assert_eq!(plan.content(), original);
        assert!(!plan.is_dirty());
    }

    #[test]
    fn removing_unknown_extension_is_a_no_op() {
        let mut plan = file("[default]\n;EBANDI\nexten => 100,1,Dial(PJSIP/100)\n;FIN_EBANDI\n");
        assert_eq!(plan.remove_route("999"), 0);
        assert!(!plan.is_dirty());
    }

    #[test]
    fn dial_line_format() {
        assert_eq!(dial_line("42"), "exten => 42,1,Dial(PJSIP/42)");
    }
}
