//! Path rebasing for converted targets.
//!
//! CMake reports absolute paths, or paths relative to a target's source
//! directory. The emitted statements want paths relative to the subproject
//! source root, or to the subproject's build directory for generated files.

use std::path::{Component, Path, PathBuf};

use crate::util::fs::{is_inside, relative_path};

/// Root directories used to rebase paths of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseRoots {
    /// Source root of the CMake subproject.
    pub source_root: PathBuf,
    /// Build root of the outer build.
    pub build_root: PathBuf,
    /// Subdirectory of the subproject inside the outer build.
    pub subdir: PathBuf,
    /// Install prefix the subproject is configured with.
    pub install_prefix: PathBuf,
}

impl RebaseRoots {
    /// The build directory generated paths are made relative to.
    pub fn scoped_build_dir(&self) -> PathBuf {
        normalize_lexically(&self.build_root.join(&self.subdir))
    }

    /// Rebase a source, generated file or include directory.
    ///
    /// Relative paths are first resolved against `target_source_dir`.
    pub fn rebase(&self, path: &str, target_source_dir: &Path) -> String {
        let path = Path::new(path);
        let absolute = if path.is_absolute() {
            normalize_lexically(path)
        } else {
            normalize_lexically(&target_source_dir.join(path))
        };

        if !absolute.is_absolute() {
            return path_string(&absolute);
        }

        let source_root = normalize_lexically(&self.source_root);
        if is_inside(&absolute, &source_root) {
            return path_string(&relative_path(&source_root, &absolute));
        }

        let build_root = normalize_lexically(&self.build_root);
        if is_inside(&absolute, &build_root) {
            return path_string(&relative_path(&self.scoped_build_dir(), &absolute));
        }

        path_string(&absolute)
    }

    /// Directory of a target's build outputs, relative to the scoped build dir.
    pub fn build_dir_include(&self, target_build_dir: &Path) -> String {
        let dir = normalize_lexically(target_build_dir);
        path_string(&relative_path(&self.scoped_build_dir(), &dir))
    }

    /// Make an install directory relative to the install prefix when inside it.
    pub fn rebase_install_dir(&self, dir: &str) -> String {
        let path = Path::new(dir);
        if dir.is_empty() || !path.is_absolute() {
            return dir.to_string();
        }

        let path = normalize_lexically(path);
        let prefix = normalize_lexically(&self.install_prefix);
        if is_inside(&path, &prefix) {
            path_string(&relative_path(&prefix, &path))
        } else {
            dir.to_string()
        }
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn path_string(path: &Path) -> String {
    let s = path.to_string_lossy();
    if s.is_empty() {
        ".".to_string()
    } else {
        s.into_owned()
    }
}
