use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against `cwd`.
///
/// Absolute paths are returned verbatim. Relative paths are joined onto `cwd`
/// and normalized lexically, so `out/../dist` becomes `<cwd>/dist`.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        normalize(&cwd.join(path))
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into its parent.
///
/// The filesystem is never consulted, so symlinks are not resolved. `..` at the
/// root stays at the root; leading `..` on a relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
        }
    }
    out
}
