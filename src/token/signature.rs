//! Link signatures.
//!
//! `signature = hex(DIGEST(secret + "/" + file_path + expiry_hex))`, lowercase.
//! `file_path` is the canonical path and `expiry_hex` the field as written in
//! the URL, not its decoded value.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::{DigestAlgorithm, DownloadConfig};
use crate::token::guard::check_file_path;
use crate::token::parser::{normalize_file_path, DownloadToken};
use crate::validator::outcome::{Rejection, Stage};

/// Characters escaped inside one path segment of an issued link.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Compute the lowercase hex signature for a file path and expiry field.
pub fn compute_signature(
    digest: DigestAlgorithm,
    secret: &str,
    file_path: &str,
    expiry_hex: &str,
) -> String {
    let message: [&[u8]; 4] = [secret.as_bytes(), b"/", file_path.as_bytes(), expiry_hex.as_bytes()];
    match digest {
        DigestAlgorithm::Md5 => {
            let mut ctx = md5::Context::new();
            for chunk in message {
                ctx.consume(chunk);
            }
            hex::encode(ctx.compute().0)
        }
        DigestAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            for chunk in message {
                hasher.update(chunk);
            }
            hex::encode(hasher.finalize())
        }
    }
}

fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    bool::from(a.ct_eq(b))
}

/// Check the supplied signature against the one recomputed from `config`.
pub fn verify(config: &DownloadConfig, token: &DownloadToken) -> Result<(), Rejection> {
    let expected_len = config.digest.hex_len();
    if token.signature.len() != expected_len {
        return Err(Rejection::security(
            Stage::Verifying,
            format!(
                "signature has {} characters, {} needs {expected_len}",
                token.signature.len(),
                config.digest.as_str()
            ),
        ));
    }

    let expected = compute_signature(
        config.digest,
        &config.secret,
        &token.file_path,
        &token.expiry.hex,
    );
    if constant_time_equal(expected.as_bytes(), token.signature.as_bytes()) {
        Ok(())
    } else {
        Err(Rejection::security(
            Stage::Verifying,
            format!("signature mismatch for {:?}", token.file_path),
        ))
    }
}

/// A freshly issued link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLink {
    pub signature: String,
    pub expiry_hex: String,
    /// Canonical path the signature covers.
    pub file_path: String,
    /// `/<prefix>/<signature>/<expiry-hex>/<file-path>`, percent-encoded.
    pub path: String,
}

/// Issue a link for `file_path` stamped with `timestamp`.
///
/// The validator accepts the link while `|now - timestamp| <= timeout`, so the
/// timestamp is usually the issue time. The path is normalized first so that
/// the signature matches what the validator recomputes; paths that would be
/// refused by the traversal guard are refused here too.
pub fn sign_link(
    config: &DownloadConfig,
    file_path: &str,
    timestamp: u64,
) -> Result<SignedLink, Rejection> {
    let file_path = normalize_file_path(file_path);
    check_file_path(&file_path)?;

    let expiry_hex = format!("{timestamp:x}");
    let signature = compute_signature(config.digest, &config.secret, &file_path, &expiry_hex);

    let encoded = file_path
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");

    let prefix = config.prefix();
    let path = if prefix.is_empty() {
        format!("/{signature}/{expiry_hex}/{encoded}")
    } else {
        format!("/{prefix}/{signature}/{expiry_hex}/{encoded}")
    };

    Ok(SignedLink {
        signature,
        expiry_hex,
        file_path,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::parser::Expiry;

    fn config(digest: DigestAlgorithm) -> DownloadConfig {
        DownloadConfig {
            secret: "s3cr3t".into(),
            uri_prefix: "/dl/".into(),
            digest,
            ..Default::default()
        }
    }

    #[test]
    fn md5_matches_legacy_construction() {
        let sig = compute_signature(DigestAlgorithm::Md5, "s3cr3t", "reports/q1.pdf", "5f5e1000");
        let expected = format!("{:x}", md5::compute("s3cr3t/reports/q1.pdf5f5e1000"));
        assert_eq!(sig, expected);
        assert_eq!(sig.len(), DigestAlgorithm::Md5.hex_len());
    }

    #[test]
    fn known_digests() {
        assert_eq!(
            compute_signature(DigestAlgorithm::Md5, "", "", ""),
            // md5("/")
            "6666cd76f96956469e7be39d750cc7d9"
        );
        assert_eq!(
            compute_signature(DigestAlgorithm::Sha256, "", "", ""),
            // sha256("/")
            "8a5edab282632443219e051e4ade2d1d5bbc671c781051bf1437897cbdfea0f1"
        );
    }

    #[test]
    fn verify_accepts_only_exact_signature() {
        let config = config(DigestAlgorithm::Md5);
        let mut token = DownloadToken {
            signature: compute_signature(config.digest, &config.secret, "a.txt", "ff"),
            expiry: Expiry::parse("ff"),
            file_path: "a.txt".into(),
        };
        assert!(verify(&config, &token).is_ok());

        token.signature = token.signature.to_uppercase();
        assert!(verify(&config, &token).is_err());

        token.signature = "deadbeef".into();
        assert!(verify(&config, &token).is_err());
    }

    #[test]
    fn signature_length_must_match_digest() {
        let md5 = config(DigestAlgorithm::Md5);
        let token = DownloadToken {
            signature: compute_signature(DigestAlgorithm::Sha256, &md5.secret, "a.txt", "ff"),
            expiry: Expiry::parse("ff"),
            file_path: "a.txt".into(),
        };
        let err = verify(&md5, &token).unwrap_err();
        assert_eq!(err.reason.stage, Stage::Verifying);
        assert!(err.reason.detail.contains("md5 needs 32"), "{}", err.reason.detail);

        let sha256 = config(DigestAlgorithm::Sha256);
        assert!(verify(&sha256, &token).is_ok());
    }

    #[test]
    fn expiry_is_signed_as_written() {
        let config = config(DigestAlgorithm::Md5);
        let token = DownloadToken {
            signature: compute_signature(config.digest, &config.secret, "a.txt", "ff"),
            expiry: Expiry::parse("00ff"),
            file_path: "a.txt".into(),
        };
        assert!(verify(&config, &token).is_err());
    }

    #[test]
    fn sign_link_encodes_segments() {
        let link = sign_link(&config(DigestAlgorithm::Sha256), "./docs/my report#1.pdf", 255).unwrap();
        assert_eq!(link.expiry_hex, "ff");
        assert_eq!(link.file_path, "docs/my report#1.pdf");
        assert_eq!(link.signature.len(), 64);
        assert_eq!(
            link.path,
            format!("/dl/{}/ff/docs/my%20report%231.pdf", link.signature)
        );
    }

    #[test]
    fn sign_link_refuses_escaping_paths() {
        assert!(sign_link(&config(DigestAlgorithm::Md5), "../etc/passwd", 1).is_err());
        assert!(sign_link(&config(DigestAlgorithm::Md5), "/etc/passwd", 1).is_err());
    }
}
