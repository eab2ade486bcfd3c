//! Splitting the post-prefix remainder into a [`DownloadToken`].

use crate::validator::outcome::{Rejection, Stage};

/// Expiry field of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry {
    /// The field exactly as it appeared in the URL. This is what gets signed.
    pub hex: String,
    /// Decoded unix timestamp, `None` if the field is not valid hex.
    pub timestamp: Option<u64>,
}

impl Expiry {
    pub fn parse(hex: &str) -> Self {
        Self {
            hex: hex.to_string(),
            timestamp: parse_hex_timestamp(hex),
        }
    }
}

/// The `signature/expiry/path` part of a signed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadToken {
    pub signature: String,
    pub expiry: Expiry,
    /// Canonical relative path, see [`normalize_file_path`].
    pub file_path: String,
}

/// Parse `<signature>/<expiry-hex>/<file-path>`.
///
/// Only the first two `/` delimit fields; the file path keeps the rest.
pub fn parse_token(remainder: &str) -> Result<DownloadToken, Rejection> {
    let mut parts = remainder.splitn(3, '/');
    let (Some(signature), Some(expiry), Some(file)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(Rejection::bad_request(
            Stage::Parsing,
            format!("expected signature/expiry/path, got {remainder:?}"),
        ));
    };

    if signature.is_empty() || expiry.is_empty() {
        return Err(Rejection::bad_request(
            Stage::Parsing,
            format!("empty token field in {remainder:?}"),
        ));
    }

    Ok(DownloadToken {
        signature: signature.to_string(),
        expiry: Expiry::parse(expiry),
        file_path: normalize_file_path(file),
    })
}

/// Lexically normalize a relative path.
///
/// Drops empty and `.` segments, lets `..` consume the preceding normal
/// segment and keeps `..` that have nothing left to consume. An empty result
/// becomes `.`. Never touches the filesystem.
pub fn normalize_file_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Strict base-16 parse: ASCII hex digits only, must fit in a `u64`.
fn parse_hex_timestamp(hex: &str) -> Option<u64> {
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::outcome::RejectKind;

    #[test]
    fn splits_into_three_fields() {
        let token = parse_token("0123abcd/5f5e1000/reports/2024/q1.pdf").unwrap();
        assert_eq!(token.signature, "0123abcd");
        assert_eq!(token.expiry.hex, "5f5e1000");
        assert_eq!(token.expiry.timestamp, Some(0x5f5e1000));
        assert_eq!(token.file_path, "reports/2024/q1.pdf");
    }

    #[test]
    fn file_path_is_normalized() {
        let token = parse_token("sig/ff/a//b/./c/../d.txt").unwrap();
        assert_eq!(token.file_path, "a/b/d.txt");

        let token = parse_token("sig/ff/a/../../etc/passwd").unwrap();
        assert_eq!(token.file_path, "../etc/passwd");
    }

    #[test]
    fn missing_fields_are_bad_requests() {
        for remainder in ["sig", "sig/ff", "/ff/file", "sig//file"] {
            let err = parse_token(remainder).unwrap_err();
            assert_eq!(err.kind, RejectKind::BadRequest, "{remainder}");
        }
    }

    #[test]
    fn empty_file_field_normalizes_to_dot() {
        assert_eq!(parse_token("sig/ff/").unwrap().file_path, ".");
    }

    #[test]
    fn invalid_hex_has_no_timestamp() {
        for hex in ["zz", "12g4", "+1f", "-1", " 1f", "1_0", "10000000000000000"] {
            assert_eq!(Expiry::parse(hex).timestamp, None, "{hex}");
        }
        assert_eq!(Expiry::parse("00FF").timestamp, Some(255));
    }

    #[test]
    fn normalize_matches_posix_semantics() {
        assert_eq!(normalize_file_path("a/b/../c"), "a/c");
        assert_eq!(normalize_file_path("./a"), "a");
        assert_eq!(normalize_file_path(".."), "..");
        assert_eq!(normalize_file_path("../../a"), "../../a");
        assert_eq!(normalize_file_path("/../a"), "/a");
        assert_eq!(normalize_file_path(""), ".");
        assert_eq!(normalize_file_path("a\\..\\b"), "a\\..\\b");
    }
}
