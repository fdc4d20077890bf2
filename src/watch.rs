//! Source change detection
//!
//! A [`WatchTarget`] is a directory tree plus a file-extension filter,
//! polled by the supervisor once per tick: a single recursive walk
//! compares modification times against the run's reference timestamp and
//! stops at the first file newer than it.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A watched directory tree with a file-extension filter
#[derive(Debug, Clone)]
pub struct WatchTarget {
    root: PathBuf,
    extensions: Vec<OsString>,
}

impl WatchTarget {
    /// Create a watch target over `root` matching the given extensions.
    ///
    /// Extensions are accepted with or without a leading dot.
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .map(|ext| OsString::from(ext.trim_start_matches('.')))
                .collect(),
        }
    }

    /// Watch the directory containing `script`.
    ///
    /// The filter is the script's own extension plus any configured
    /// extras, so a sketch split across helper files of the same language
    /// reloads when any of them changes.
    pub fn for_script(script: &Path, extra_extensions: &[String]) -> Self {
        let root = match script.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut extensions: Vec<OsString> = extra_extensions
            .iter()
            .map(|ext| OsString::from(ext.trim_start_matches('.')))
            .collect();
        if let Some(ext) = script.extension() {
            if !extensions.iter().any(|e| e == ext) {
                extensions.push(ext.to_os_string());
            }
        }

        Self { root, extensions }
    }

    /// Root of the watched tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree once and report whether any matching regular file was
    /// modified strictly after `reference`. Short-circuits on the first
    /// hit. Entries that vanish or deny access mid-walk are skipped.
    pub fn has_changed_since(&self, reference: SystemTime) -> bool {
        self.scan_dir(&self.root, reference)
    }

    fn scan_dir(&self, dir: &Path, reference: SystemTime) -> bool {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("skipping unreadable directory {}: {}", dir.display(), e);
                return false;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(_) => continue,
            };

            if file_type.is_dir() {
                if self.scan_dir(&path, reference) {
                    return true;
                }
            } else if file_type.is_file() && self.matches(&path) {
                let mtime = entry.metadata().and_then(|meta| meta.modified());
                if let Ok(mtime) = mtime {
                    if mtime > reference {
                        debug!("modified source file: {}", path.display());
                        return true;
                    }
                }
            }
        }

        false
    }

    fn matches(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => self.extensions.iter().any(|e| e == ext),
            None => false,
        }
    }
}
