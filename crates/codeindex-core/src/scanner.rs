//! Source tree walker.
//!
//! Collects files whose extension is on the allow-list, pruning any directory
//! that matches the deny-list. Results are sorted so repeated scans of an
//! unchanged tree produce identical chunk keys.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ScanSettings;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct FileScanner {
    extensions: HashSet<String>,
    excluded_dirs: Vec<Vec<String>>,
}

impl FileScanner {
    /// `extensions` are matched case-insensitively and may be given with or
    /// without the leading dot. `excluded_dirs` are matched case-sensitively
    /// against directory names; an entry like `wwwroot/lib` matches that run
    /// of consecutive directories.
    pub fn new<E, D>(extensions: E, excluded_dirs: D) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| {
                let e = e.as_ref().trim().to_lowercase();
                if e.starts_with('.') { e } else { format!(".{e}") }
            })
            .collect();
        let excluded_dirs = excluded_dirs
            .into_iter()
            .map(|d| d.as_ref().split(['/', '\\']).filter(|s| !s.is_empty()).map(str::to_string).collect::<Vec<_>>())
            .filter(|segments| !segments.is_empty())
            .collect();
        Self { extensions, excluded_dirs }
    }

    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self::new(&settings.extensions, &settings.excluded_dirs)
    }

    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = resolve_root(root)?;
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !self.is_excluded(&root, e.path()));

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            // Symlinks are not followed during the walk; a link to a file still counts.
            let is_file = entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file());
            if is_file && self.is_allowed(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        info!(root = %root.display(), files = files.len(), "scan finished");
        Ok(files)
    }

    fn is_allowed(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|e| self.extensions.contains(&format!(".{}", e.to_lowercase())))
    }

    fn is_excluded(&self, root: &Path, dir: &Path) -> bool {
        let segments = relative_segments(root, dir);
        // Parents were already checked on the way down, so only runs ending here matter.
        let excluded = self.excluded_dirs.iter().any(|pattern| segments.ends_with(pattern));
        if excluded {
            debug!(dir = %dir.display(), "pruning excluded directory");
        }
        excluded
    }
}

/// Text after the last dot of the file name. Unlike `Path::extension`, a
/// dotfile such as `.txt` has the extension `txt`.
fn extension_of(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()?.rsplit_once('.').map(|(_, ext)| ext)
}

/// Checks that `root` is an existing directory and returns its canonical form.
pub fn resolve_root(root: &Path) -> Result<PathBuf> {
    if !root.exists() {
        return Err(Error::NotFound(format!("scan root {} does not exist", root.display())));
    }
    if !root.is_dir() {
        return Err(Error::InvalidArgument(format!("scan root {} is not a directory", root.display())));
    }
    root.canonicalize().map_err(|source| Error::Read { path: root.to_path_buf(), source })
}

/// Path of `path` relative to `root`, joined with `/` regardless of platform.
pub fn document_name(root: &Path, path: &Path) -> String {
    relative_segments(root, path).join("/")
}

fn relative_segments(root: &Path, path: &Path) -> Vec<String> {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
