//! First-run creation of the configuration skeleton

use crate::dialplan::{DEFAULT_CONTEXT, REGION_BEGIN, REGION_END};
use crate::error::{ConfigStoreError, Result};
use crate::paths::PjsipPaths;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `pjsip.conf`: a UDP transport and includes of the three section files
pub fn main_skeleton(paths: &PjsipPaths) -> String {
    format!(
        "[transport-udp]\ntype = transport\nprotocol = udp\nbind = 0.0.0.0:5060\n#include {}\n#include {}\n#include {}\n\n",
        file_name(&paths.endpoint),
        file_name(&paths.aor),
        file_name(&paths.auth),
    )
}

/// `extensions.conf`: an empty default context holding the managed region
pub fn extensions_skeleton() -> String {
    format!("{}\n{}\n{}\n", DEFAULT_CONTEXT, REGION_BEGIN, REGION_END)
}

/// Write `contents` to `path` only if the file does not exist yet
fn create_if_absent(path: &Path, contents: &str) -> Result<bool> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(contents.as_bytes())
                .map_err(|e| ConfigStoreError::io(path, e))?;
            info!(path = %path.display(), "created configuration file");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(ConfigStoreError::io(path, e)),
    }
}

/// Create any missing configuration file with its skeleton.
///
/// Existing files are never modified, so running this repeatedly is safe.
/// Returns the paths that were created.
pub fn ensure_config_files(paths: &PjsipPaths) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();

    if create_if_absent(&paths.main, &main_skeleton(paths))? {
        created.push(paths.main.clone());
    }
    if create_if_absent(&paths.extensions, &extensions_skeleton())? {
        created.push(paths.extensions.clone());
    }
    for path in paths.section_files() {
        if create_if_absent(path, "")? {
            created.push(path.to_path_buf());
        }
    }

    Ok(created)
}
