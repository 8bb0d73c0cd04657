use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Destination for exported documents (download folder, save dialog result, memory).
pub trait PersistTarget {
    /// Store `bytes` exactly as given. Returns where they ended up.
    fn persist(&mut self, bytes: &[u8], suggested_filename: &str) -> FlipbookResult<PathBuf>;
}

/// Writes exports to disk, either into a directory under the suggested name or to a fixed path.
#[derive(Clone, Debug)]
pub struct FilePersist {
    dest: FileDest,
    overwrite: bool,
}

#[derive(Clone, Debug)]
enum FileDest {
    Dir(PathBuf),
    Path(PathBuf),
}

impl FilePersist {
    /// Save as `<dir>/<suggested_filename>`.
    pub fn into_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dest: FileDest::Dir(dir.into()),
            overwrite: true,
        }
    }

    /// Save to exactly `path`, ignoring the suggested name.
    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            dest: FileDest::Path(path.into()),
            overwrite: true,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl PersistTarget for FilePersist {
    fn persist(&mut self, bytes: &[u8], suggested_filename: &str) -> FlipbookResult<PathBuf> {
        let path = match &self.dest {
            FileDest::Dir(dir) => {
                check_file_name(suggested_filename)?;
                dir.join(suggested_filename)
            }
            FileDest::Path(p) => p.clone(),
        };

        ensure_parent_dir(&path)?;
        if !self.overwrite && path.exists() {
            return Err(FlipbookError::validation(format!(
                "output file '{}' already exists",
                path.display()
            )));
        }
        std::fs::write(&path, bytes).with_context(|| format!("write '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "export written");
        Ok(path)
    }
}

/// Keeps exports in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPersist {
    saved: Vec<(String, Vec<u8>)>,
}

impl InMemoryPersist {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(filename, bytes)` pairs in save order.
    pub fn saved(&self) -> &[(String, Vec<u8>)] {
        &self.saved
    }
}

impl PersistTarget for InMemoryPersist {
    fn persist(&mut self, bytes: &[u8], suggested_filename: &str) -> FlipbookResult<PathBuf> {
        self.saved
            .push((suggested_filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(suggested_filename))
    }
}

fn check_file_name(name: &str) -> FlipbookResult<()> {
    let p = Path::new(name);
    if name.is_empty() || p.components().count() != 1 || p.file_name().is_none() {
        return Err(FlipbookError::validation(format!(
            "suggested filename '{name}' must be a plain file name"
        )));
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> FlipbookResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/export/persist.rs"]
mod tests;
