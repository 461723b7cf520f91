//! Node path helpers.

/// Root of every coordination tree.
pub const ROOT: &str = "/";

/// A path is valid when it is absolute, has no empty segments and no trailing slash.
pub fn is_valid(path: &str) -> bool {
    if path == ROOT {
        return true;
    }
    path.starts_with('/') && !path.ends_with('/') && !path[1..].split('/').any(str::is_empty)
}

/// Parent of `path`, or `None` for the root.
pub fn parent_of(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Join a child name onto a parent path.
pub fn join(parent: &str, child: &str) -> String {
    if parent == ROOT {
        format!("/{child}")
    } else {
        format!("{parent}/{child}")
    }
}
