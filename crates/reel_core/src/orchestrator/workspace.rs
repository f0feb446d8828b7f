//! Per-output temporary working directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::logging::RunLogger;
use crate::process::CleanupWarning;

/// Temporary directory owned by one output. Removed on drop.
pub struct TempWorkspace {
    path: PathBuf,
    logger: Option<Arc<RunLogger>>,
}

impl TempWorkspace {
    /// Create `temp_<index>_<random>` inside `parent`.
    pub fn create(parent: &Path, index: usize) -> io::Result<Self> {
        let path = parent.join(format!("temp_{}_{}", index, random_suffix()));
        fs::create_dir_all(&path)?;
        tracing::debug!("Created workspace {}", path.display());
        Ok(Self { path, logger: None })
    }

    /// Report cleanup failures through the batch logger as well.
    pub fn with_logger(mut self, logger: Arc<RunLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("Removed workspace {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                let warning = CleanupWarning {
                    path: self.path.clone(),
                    source,
                };
                tracing::warn!("{}", warning);
                if let Some(logger) = &self.logger {
                    logger.warn(&warning.to_string());
                }
            }
        }
    }
}

/// Six random lowercase alphanumerics.
fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}
