use nix::unistd::{AccessFlags, access};
use std::path::{Path, PathBuf};

/// Names starting with `/` or `.` are executed as paths and never searched.
pub fn is_direct_path(name: &str) -> bool {
    name.starts_with('/') || name.starts_with('.')
}

/// Search the colon-separated `search_path` for an executable called `name`.
///
/// Empty segments are skipped. A name with an inner `/` such as `bin/ls` is
/// joined onto each segment like any other. Returns the first `segment/name`
/// that is a regular file the caller may execute, or `None` when nothing
/// matches or there is no search path at all.
pub fn resolve(name: &str, search_path: Option<&str>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    let search_path = search_path?;

    let found = search_path
        .split(':')
        .filter(|segment| !segment.is_empty())
        .map(|segment| Path::new(segment).join(name))
        .find(|candidate| is_executable(candidate));

    tracing::debug!(command = name, resolved = ?found, "searched PATH");
    found
}

fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}
