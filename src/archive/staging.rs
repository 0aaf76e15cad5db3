use crate::error::{Result, SevenRunError};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TEMP_SUFFIX: &str = ".tmp";

/// An output file written under a temporary name and moved to its final
/// name only once the producer has succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    pub fn new(target: PathBuf) -> Result<Self> {
        let file_name = target.file_name().ok_or_else(|| SevenRunError::InvalidPath {
            path: target.display().to_string(),
        })?;

        let mut temp_name = OsString::from(file_name);
        temp_name.push(TEMP_SUFFIX);
        let temp = target.with_file_name(temp_name);

        Ok(Self { temp, target })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    pub fn target_path(&self) -> &Path {
        &self.target
    }

    /// Moves the temporary file over the final name, replacing any previous file.
    pub fn commit(self) -> Result<PathBuf> {
        if self.target.is_file() {
            fs::remove_file(&self.target)?;
        }
        fs::rename(&self.temp, &self.target)?;
        debug!(
            "moved {} -> {}",
            self.temp.display(),
            self.target.display()
        );
        Ok(self.target)
    }

    /// Removes whatever was written under the temporary name. A missing file
    /// is not an error.
    pub fn discard(&self) -> Result<()> {
        match fs::remove_file(&self.temp) {
            Ok(()) => {
                warn!("discarded partial output {}", self.temp.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SevenRunError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_name() {
        let staged = StagedFile::new(PathBuf::from("out/mod.7z")).unwrap();
        assert_eq!(staged.temp_path(), Path::new("out/mod.7z.tmp"));
        assert_eq!(staged.target_path(), Path::new("out/mod.7z"));
    }

    #[test]
    fn test_rejects_path_without_file_name() {
        assert!(StagedFile::new(PathBuf::from("/")).is_err());
    }

    #[test]
    fn test_commit_replaces_existing_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a.7z");
        fs::write(&target, b"old").unwrap();

        let staged = StagedFile::new(target.clone()).unwrap();
        fs::write(staged.temp_path(), b"new").unwrap();
        let temp = staged.temp_path().to_path_buf();

        let committed = staged.commit().unwrap();
        assert_eq!(committed, target);
        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert!(!temp.exists());
    }

    #[test]
    fn test_discard() {
        let dir = TempDir::new().unwrap();
        let staged = StagedFile::new(dir.path().join("a.zip")).unwrap();

        // Nothing written yet.
        assert!(staged.discard().is_ok());

        fs::write(staged.temp_path(), b"partial").unwrap();
        staged.discard().unwrap();
        assert!(!staged.temp_path().exists());
        assert!(!staged.target_path().exists());
    }
}
