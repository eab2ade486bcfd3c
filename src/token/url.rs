//! Request target normalization.

use percent_encoding::percent_decode_str;

use crate::validator::outcome::{Rejection, Stage};

/// Extract and decode the path of a request target.
///
/// Accepts origin-form (`/dl/a/b?x=1`) and absolute-form
/// (`http://host/dl/a/b`). The query string and fragment are dropped, the
/// leading `/` removed, the rest percent-decoded and trailing `/` trimmed.
///
/// Decoding does not resolve `.` or `..` segments; that would hide exactly the
/// inputs the traversal guard has to see.
pub fn normalize_request_path(target: &str) -> Result<String, Rejection> {
    let path = strip_query(strip_authority(target));

    let Some(rest) = path.strip_prefix('/') else {
        return Err(Rejection::bad_request(
            Stage::Normalizing,
            format!("request target has no absolute path: {target:?}"),
        ));
    };
    if rest.is_empty() {
        return Err(Rejection::bad_request(Stage::Normalizing, "empty path"));
    }

    if let Some(pos) = malformed_escape(rest) {
        return Err(Rejection::bad_request(
            Stage::Normalizing,
            format!("malformed percent-escape at byte {pos} in {rest:?}"),
        ));
    }

    let decoded = percent_decode_str(rest).decode_utf8().map_err(|_| {
        Rejection::bad_request(
            Stage::Normalizing,
            format!("percent-decoded path is not UTF-8: {rest:?}"),
        )
    })?;

    let trimmed = decoded.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Rejection::bad_request(
            Stage::Normalizing,
            format!("path is empty after decoding: {rest:?}"),
        ));
    }

    Ok(trimmed.to_string())
}

/// Drop `scheme://authority` from an absolute-form target.
fn strip_authority(target: &str) -> &str {
    let Some(scheme_end) = target.find("://") else {
        return target;
    };
    // A "://" after the first '/' belongs to the path, not to a scheme.
    if target[..scheme_end].contains('/') {
        return target;
    }
    let after = &target[scheme_end + 3..];
    match after.find('/') {
        Some(slash) => &after[slash..],
        None => "",
    }
}

fn strip_query(path: &str) -> &str {
    match path.find(['?', '#']) {
        Some(end) => &path[..end],
        None => path,
    }
}

/// Position of the first `%` not followed by two hex digits.
///
/// `percent_decode_str` passes such sequences through unchanged; a malformed
/// escape is a client error here.
fn malformed_escape(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() >= i + 3
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Some(i);
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    None
}
