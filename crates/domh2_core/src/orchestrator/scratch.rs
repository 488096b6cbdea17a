//! Exclusive per-trait scratch directories with guaranteed cleanup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// An exclusively-owned scratch directory for one trait job.
///
/// The directory name embeds the trait code and the process id, so
/// concurrent array tasks sharing a filesystem never collide. The
/// directory and everything in it are removed when the guard drops,
/// which covers every exit path of the trait's pipeline: success,
/// validation failure, and external-process failure alike.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create the scratch directory under `root`.
    pub fn create(root: &Path, trait_id: &str) -> io::Result<Self> {
        let path = root.join(format!("{}_{}", trait_id, std::process::id()));
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    /// Path of the scratch directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove scratch directory {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_and_drop_removes_directory() {
        let root = TempDir::new().unwrap();
        let path;
        {
            let scratch = ScratchDir::create(root.path(), "50_irnt").unwrap();
            path = scratch.path().to_path_buf();
            assert!(path.is_dir());
            // Contents are removed along with the directory
            fs::write(path.join("partial.bgz"), b"data").unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn name_embeds_trait_and_pid() {
        let root = TempDir::new().unwrap();
        let scratch = ScratchDir::create(root.path(), "21001").unwrap();
        let name = scratch.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("21001_"));
        assert!(name.ends_with(&std::process::id().to_string()));
    }

    #[test]
    fn drop_tolerates_already_removed_directory() {
        let root = TempDir::new().unwrap();
        let scratch = ScratchDir::create(root.path(), "X1").unwrap();
        fs::remove_dir_all(scratch.path()).unwrap();
        // Drop must not panic
        drop(scratch);
    }
}
