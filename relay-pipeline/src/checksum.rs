//! Content hashes for downloaded artifacts.
//!
//! The algorithm is chosen by the length of the expected hex digest:
//! 32 characters → MD5, 64 characters → SHA-256.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Sha256,
}

impl Algorithm {
    pub fn for_expected(expected: &str) -> Option<Self> {
        match expected.trim().len() {
            32 => Some(Algorithm::Md5),
            64 => Some(Algorithm::Sha256),
            _ => None,
        }
    }
}

/// Lower-case hex digest of the file at `path`.
pub fn file_digest(path: &Path, algorithm: Algorithm) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; 64 * 1024];
    match algorithm {
        Algorithm::Md5 => {
            let mut ctx = md5::Context::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                ctx.consume(&buf[..n]);
            }
            Ok(format!("{:x}", ctx.compute()))
        }
        Algorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
    }
}

/// Case-insensitive digest comparison.
pub fn matches(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn algorithm_by_length() {
        assert_eq!(Algorithm::for_expected(&"a".repeat(32)), Some(Algorithm::Md5));
        assert_eq!(Algorithm::for_expected(&"a".repeat(64)), Some(Algorithm::Sha256));
        assert_eq!(Algorithm::for_expected("abc"), None);
    }

    #[test]
    fn known_digests_of_hello() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hello.txt");
        std::fs::write(&path, "hello").unwrap();
        assert_eq!(
            file_digest(&path, Algorithm::Md5).unwrap(),
            "5d41402abc4b2a76b9719d911017c592"
        );
        assert_eq!(
            file_digest(&path, Algorithm::Sha256).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn comparison_ignores_case() {
        assert!(matches("5D41402ABC4B2A76B9719D911017C592", "5d41402abc4b2a76b9719d911017c592"));
        assert!(!matches("00", "01"));
    }
}
