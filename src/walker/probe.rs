//! Metadata prober
//!
//! Paths are probed without following symlinks. A second, link-following
//! probe is only made when the walker has decided to expand a symlink, so a
//! path is stat'ed at most twice.

use crate::error::WalkError;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Type of filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
    /// Device, FIFO, socket or anything else
    Other,
}

impl EntryType {
    /// Classify a std file type
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            EntryType::Symlink
        } else if file_type.is_dir() {
            EntryType::Directory
        } else if file_type.is_file() {
            EntryType::File
        } else {
            EntryType::Other
        }
    }

    /// Check if this is a regular file
    pub fn is_file(&self) -> bool {
        *self == EntryType::File
    }

    /// Check if this is a directory
    pub fn is_dir(&self) -> bool {
        *self == EntryType::Directory
    }

    /// Check if this is a symbolic link
    pub fn is_symlink(&self) -> bool {
        *self == EntryType::Symlink
    }
}

/// Metadata captured when a path is probed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Entry type
    pub entry_type: EntryType,

    /// Size in bytes
    pub size: u64,

    /// Unix mode bits (type + permissions), if available
    pub mode: Option<u32>,

    /// Inode number, if available
    pub inode: Option<u64>,

    /// Last modification time
    pub modified: Option<SystemTime>,
}

impl Metadata {
    /// Check if the probed entry is a directory
    pub fn is_dir(&self) -> bool {
        self.entry_type.is_dir()
    }

    /// Check if the probed entry is a symlink (only from [`probe`])
    pub fn is_symlink(&self) -> bool {
        self.entry_type.is_symlink()
    }
}

impl From<fs::Metadata> for Metadata {
    fn from(meta: fs::Metadata) -> Self {
        #[cfg(unix)]
        let (mode, inode) = {
            use std::os::unix::fs::MetadataExt;
            (Some(meta.mode()), Some(meta.ino()))
        };
        #[cfg(not(unix))]
        let (mode, inode) = (None, None);

        Self {
            entry_type: EntryType::from_file_type(meta.file_type()),
            size: meta.len(),
            mode,
            inode,
            modified: meta.modified().ok(),
        }
    }
}

/// Probe a path without dereferencing symlinks
pub fn probe(path: &Path) -> Result<Metadata, WalkError> {
    fs::symlink_metadata(path)
        .map(Metadata::from)
        .map_err(|source| WalkError::Probe {
            path: path.to_path_buf(),
            source,
        })
}

/// Probe the target of a path, following symlinks
pub fn probe_target(path: &Path) -> Result<Metadata, WalkError> {
    fs::metadata(path)
        .map(Metadata::from)
        .map_err(|source| WalkError::Probe {
            path: path.to_path_buf(),
            source,
        })
}
