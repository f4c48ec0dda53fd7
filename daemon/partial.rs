// Destination file that only survives once the whole payload is in
use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::io::{Result, Write};
use std::path::{Path, PathBuf};

/// A destination reserved with an exclusive create.
///
/// Creation fails with `AlreadyExists` when the path is taken, which makes
/// the collision check and the reservation one atomic step. Unless
/// [`PartialFile::commit`] is reached, dropping the guard removes the file,
/// so a truncated transfer never leaves a file behind.
pub struct PartialFile {
    file: File,
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    pub fn create_new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok(PartialFile {
            file,
            path,
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.file.write_all(buf)
    }

    pub fn commit(mut self) -> Result<PathBuf> {
        self.file.sync_all()?;
        self.committed = true;
        Ok(std::mem::take(&mut self.path))
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("removed partial file {}", self.path.display()),
            Err(e) => warn!("could not remove partial file {}: {}", self.path.display(), e),
        }
    }
}
