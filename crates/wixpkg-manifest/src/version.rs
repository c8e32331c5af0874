//! Product version encoding
//!
//! Windows Installer only accepts `major.minor.build` with major and minor in
//! `0..=255` and build in `0..=65535`. Human versions are folded into that range.

use crate::errors::ManifestError;
use std::fmt;
use std::str::FromStr;

/// Three-field version accepted by the installer compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionTriple {
    pub major: u8,
    pub minor: u8,
    pub build: u16,
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

impl FromStr for VersionTriple {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        encode_version(s)
    }
}

const BUILD_MODULUS: u64 = 65536;

/// Value of an all-digit string reduced modulo 65536, for parts of any length
///
/// 256 divides 65536, so major and minor can be reduced further afterwards.
fn fold_digits(digits: &str) -> u64 {
    digits
        .bytes()
        .fold(0, |acc, b| (acc * 10 + u64::from(b - b'0')) % BUILD_MODULUS)
}

/// Encode a `YYYY.MM.DD`, `X.Y.Z` or `X.Y.Z.B` version string
pub fn encode_version(version: &str) -> Result<VersionTriple, ManifestError> {
    let format_error = || ManifestError::VersionFormat(version.to_string());

    let raw_parts: Vec<&str> = version.split('.').collect();
    if !(3..=4).contains(&raw_parts.len()) {
        return Err(format_error());
    }

    let mut parts = Vec::with_capacity(raw_parts.len());
    for part in &raw_parts {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format_error());
        }
        parts.push(fold_digits(part));
    }

    // Date-based: keep the last two digits of the year
    let major = if raw_parts.len() == 3 && raw_parts[0].len() == 4 {
        parts[0] % 100
    } else {
        parts[0] % 256
    };
    let minor = parts[1] % 256;
    let build = match parts.get(3) {
        Some(&extra) => (parts[2] * 1000 + extra) % BUILD_MODULUS,
        None => parts[2],
    };

    let triple = VersionTriple {
        major: major as u8,
        minor: minor as u8,
        build: build as u16,
    };
    tracing::debug!("Encoded version '{}' as {}", version, triple);
    Ok(triple)
}
