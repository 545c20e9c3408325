/*
 * This module abstracts the filesystem primitives the directory parser needs:
 * reporting the kind of a single path and listing the direct entries of one
 * directory. Listing reports failures on two levels. A directory that cannot
 * be opened fails as a whole, while an entry that cannot be inspected fails on
 * its own and leaves its siblings intact. `CoreSourceFileSystem` implements the
 * trait on top of `walkdir`; tests substitute in-memory fakes.
 */
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    // Symbolic links are reported as such and never resolved.
    Symlink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn new(path: PathBuf, kind: EntryKind) -> Self {
        DirectoryEntry { path, kind }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

pub trait SourceFileSystemOperations: Send + Sync {
    /* Reports the kind of `path` without following a final symbolic link. */
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind>;

    /*
     * Reports the kind of an import root. Unlike `entry_kind`, a root that is a
     * symbolic link is resolved to what it points at.
     */
    fn root_kind(&self, path: &Path) -> io::Result<EntryKind> {
        self.entry_kind(path)
    }

    /*
     * Lists the direct entries of `dir`. The outer error means the directory
     * itself could not be read; inner errors belong to single entries.
     */
    fn list_directory(&self, dir: &Path) -> io::Result<Vec<io::Result<DirectoryEntry>>>;
}

#[derive(Debug, Default)]
pub struct CoreSourceFileSystem {}

impl CoreSourceFileSystem {
    pub fn new() -> Self {
        CoreSourceFileSystem {}
    }
}

impl SourceFileSystemOperations for CoreSourceFileSystem {
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let file_type = fs::symlink_metadata(path)?.file_type();
        Ok(if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        })
    }

    fn root_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let metadata = fs::metadata(path)?;
        Ok(if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        })
    }

    fn list_directory(&self, dir: &Path) -> io::Result<Vec<io::Result<DirectoryEntry>>> {
        log::trace!("SourceFileSystem: Listing {dir:?}");
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_root_links(true)
            .follow_links(false)
            .sort_by_file_name();

        let mut entries = Vec::new();
        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    let kind = if file_type.is_symlink() {
                        EntryKind::Symlink
                    } else if file_type.is_dir() {
                        EntryKind::Directory
                    } else {
                        EntryKind::File
                    };
                    entries.push(Ok(DirectoryEntry::new(entry.into_path(), kind)));
                }
                // Depth 0 is the listed directory itself; failing there means it cannot be read.
                Err(err) if err.depth() == 0 => return Err(io::Error::from(err)),
                Err(err) => entries.push(Err(io::Error::from(err))),
            }
        }
        Ok(entries)
    }
}
