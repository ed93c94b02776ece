//! # Data File Location
//!
//! A [`StorePath`] is a data file location that has passed the confinement guard:
//! it lives under a known root directory, contains no `..` components, and none
//! of the entries between the root and the file is a symbolic link.
//!
//! The symlink check is repeated by [`StorePath::verify`] before every read and
//! write, since a link can be planted after the store was opened.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::StoreError;

/// A validated location for a store's backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePath {
    root: PathBuf,
    relative: PathBuf,
}

impl StorePath {
    /// Resolves `file` inside `root`.
    ///
    /// `file` must be a relative path without `..` components.
    pub fn confined(root: impl AsRef<Path>, file: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref();
        let file = file.as_ref();

        reject_traversal(root)?;
        if file.as_os_str().is_empty() {
            return Err(rejected("empty file name"));
        }
        if file.is_absolute() || file.has_root() {
            return Err(rejected("file name must be relative to the data directory"));
        }
        reject_traversal(file)?;
        if file.components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)) {
            return Err(rejected("file name contains unsupported components"));
        }

        let path = Self {
            root: root.to_path_buf(),
            relative: file.to_path_buf(),
        };
        path.verify()?;
        Ok(path)
    }

    /// Accepts a bare path; its parent directory becomes the confinement root.
    pub fn standalone(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        reject_traversal(path)?;
        let file = path
            .file_name()
            .ok_or_else(|| rejected("path does not name a file"))?;
        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::confined(root, file)
    }

    /// The full path of the data file.
    pub fn full_path(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    /// The directory the file is confined to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Re-checks that no entry below the root has become a symbolic link.
    pub fn verify(&self) -> Result<(), StoreError> {
        let mut current = self.root.clone();
        for component in self.relative.components() {
            current.push(component);
            match std::fs::symlink_metadata(&current) {
                Ok(meta) if meta.file_type().is_symlink() => {
                    return Err(rejected("symbolic links are not allowed"));
                }
                Ok(_) => {}
                // Nothing further down can exist.
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(StoreError::Io(e)),
            }
        }
        Ok(())
    }
}

fn reject_traversal(path: &Path) -> Result<(), StoreError> {
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(rejected("parent directory traversal is not allowed"));
    }
    Ok(())
}

fn rejected(reason: &str) -> StoreError {
    StoreError::PathRejected(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confined_path_joins_root_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = StorePath::confined(dir.path(), "inventory.json").unwrap();
        assert_eq!(path.full_path(), dir.path().join("inventory.json"));
        assert_eq!(path.root(), dir.path());
    }

    #[test]
    fn test_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = StorePath::confined(dir.path(), "../escape.json").unwrap_err();
        assert!(matches!(err, StoreError::PathRejected(_)));

        let err = StorePath::confined(dir.path().join("..").join("x"), "a.json").unwrap_err();
        assert!(matches!(err, StoreError::PathRejected(_)));

        let err = StorePath::standalone("data/../../etc/passwd").unwrap_err();
        assert!(matches!(err, StoreError::PathRejected(_)));
    }

    #[test]
    fn test_absolute_and_empty_file_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StorePath::confined(dir.path(), "/etc/passwd").is_err());
        assert!(StorePath::confined(dir.path(), "").is_err());
    }

    #[test]
    fn test_dots_inside_a_name_are_not_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StorePath::confined(dir.path(), "stock..backup.json").is_ok());
    }

    #[test]
    fn test_standalone_uses_parent_as_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("inventory.json");
        let path = StorePath::standalone(&file).unwrap();
        assert_eq!(path.root(), dir.path());
        assert_eq!(path.full_path(), file);

        let bare = StorePath::standalone("inventory.json").unwrap();
        assert_eq!(bare.root(), Path::new("."));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("real.json");
        std::fs::write(&target, "{}").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link.json")).unwrap();

        let err = StorePath::confined(dir.path(), "link.json").unwrap_err();
        assert!(matches!(err, StoreError::PathRejected(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_planted_after_open_is_caught_by_verify() {
        let dir = tempfile::tempdir().unwrap();
        let path = StorePath::confined(dir.path(), "inventory.json").unwrap();

        let target = dir.path().join("elsewhere.json");
        std::fs::write(&target, "{}").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("inventory.json")).unwrap();

        assert!(matches!(path.verify(), Err(StoreError::PathRejected(_))));
    }
}
