use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The pair of local files one record works through: the downloaded original
/// and its resized copy. Both are removed when the value is dropped.
#[derive(Debug)]
pub struct ScratchFiles {
    source: PathBuf,
    resized: PathBuf,
}

impl ScratchFiles {
    pub fn new(dir: &Path) -> Self {
        ScratchFiles {
            source: dir.join(format!("orig-{}_orig", Uuid::new_v4())),
            resized: dir.join(format!("resized-{}", Uuid::new_v4())),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn resized(&self) -> &Path {
        &self.resized
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        tracing::info!("Cleaning up");

        remove_scratch_file(&self.source);
        remove_scratch_file(&self.resized);
    }
}

fn remove_scratch_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("removed {}", path.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!("failed to remove {}: {}", path.display(), err),
    }
}
