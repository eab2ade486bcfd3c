//! String-level path checks.
//!
//! Both checks run on decoded text before anything is joined to the root
//! directory. They must stay ahead of filesystem normalization.

use crate::validator::outcome::{Rejection, Stage};

/// True if `path` starts with `.`, `/` or `\`.
///
/// Covers `.`, `..`, hidden files, absolute paths and Windows-style roots.
pub fn is_escaping(path: &str) -> bool {
    path.starts_with(['.', '/', '\\'])
}

/// True if any component is `..` when both `/` and `\` count as separators.
pub fn has_parent_component(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Reject a normalized request path that could leave the root.
pub fn check_traversal(path: &str) -> Result<(), Rejection> {
    if is_escaping(path) {
        return Err(Rejection::security(
            Stage::TraversalChecking,
            format!("path escapes root: {path:?}"),
        ));
    }
    Ok(())
}

/// Reject a canonical file path that could leave the root once joined.
pub fn check_file_path(file_path: &str) -> Result<(), Rejection> {
    if is_escaping(file_path) || has_parent_component(file_path) || file_path.contains('\0') {
        return Err(Rejection::security(
            Stage::TraversalChecking,
            format!("file path escapes root: {file_path:?}"),
        ));
    }
    Ok(())
}

/// Remove `prefix` and the following separator from `path`.
///
/// `prefix` is expected without surrounding slashes. An empty prefix strips
/// nothing. A path that does not continue with `/` right after the prefix is a
/// mismatch, reported as a security rejection like any other tampering.
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Result<&'a str, Rejection> {
    if prefix.is_empty() {
        return Ok(path);
    }
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(|| {
            Rejection::security(
                Stage::PrefixChecking,
                format!("path {path:?} does not start with prefix {prefix:?}"),
            )
        })
}
