// Local file to be sent; its size is fixed when it is opened
use crate::error::SendError;
use ft_core::FileName;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub struct SourceFile {
    file: File,
    path: PathBuf,
    name: FileName,
    size: u64,
}

impl SourceFile {
    pub fn open(path: &Path) -> Result<Self, SendError> {
        let not_found = |source| SendError::FileNotFound {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(not_found)?;
        let meta = file.metadata().map_err(not_found)?;
        if !meta.is_file() {
            return Err(SendError::NotAFile(path.to_path_buf()));
        }

        let name = FileName::from_path(path).map_err(|source| SendError::InvalidName {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(SourceFile {
            file,
            path: path.to_path_buf(),
            name,
            size: meta.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &FileName {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Read for SourceFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}
