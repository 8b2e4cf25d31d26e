use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ftml_logging::ftml_trace;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0:?} is not an existing directory")]
    NotADirectory(PathBuf),
    #[error("cannot stage {target:?}: {source}")]
    Stage {
        target: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot move staged file onto {target:?}: {source}")]
    Commit {
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Produces `{dir}/{filename}` by filling a hidden sibling temp file and renaming it.
///
/// The target either keeps its previous content or gets the complete new one.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: impl AsRef<[u8]>) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        self.write_with(filename, |file| {
            file.write_all(content.as_ref())
                .map_err(|source| PersistError::Stage { target, source })
        })
    }

    /// Streams into the staged file through `fill` (a zip writer, say) before the rename.
    pub fn write_with<F, E>(&self, filename: &str, fill: F) -> Result<PathBuf, E>
    where
        F: FnOnce(&mut File) -> Result<(), E>,
        E: From<PersistError>,
    {
        if !self.dir.is_dir() {
            return Err(PersistError::NotADirectory(self.dir.clone()).into());
        }
        let target = self.dir.join(filename);
        let stage = |source: io::Error| PersistError::Stage {
            target: target.clone(),
            source,
        };

        let mut staged = tempfile::Builder::new()
            .prefix(".ftml-")
            .tempfile_in(&self.dir)
            .map_err(stage)?;
        fill(staged.as_file_mut())?;
        staged.as_file_mut().sync_all().map_err(stage)?;
        staged.persist(&target).map_err(|err| PersistError::Commit {
            target: target.clone(),
            source: err.error,
        })?;

        ftml_trace!("persisted {:?}", target);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::{AtomicFileWriter, PersistError};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn rewrite_replaces_previous_content() {
        let temp = TempDir::new().unwrap();
        let writer = AtomicFileWriter::new(temp.path());

        let first = writer.write("B1.ftmap", "<old/>").unwrap();
        let second = writer.write("B1.ftmap", "<new/>").unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second).unwrap(), "<new/>");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_fill_leaves_nothing_behind() {
        let temp = TempDir::new().unwrap();
        let writer = AtomicFileWriter::new(temp.path());

        let result = writer.write_with("B1.zip", |_| -> Result<(), PersistError> {
            Err(PersistError::NotADirectory("simulated".into()))
        });
        assert!(result.is_err());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_directory_is_reported() {
        let temp = TempDir::new().unwrap();
        let writer = AtomicFileWriter::new(temp.path().join("absent"));
        let err = writer.write("B1.ftmap", "x").unwrap_err();
        assert!(matches!(err, PersistError::NotADirectory(_)));
    }
}
