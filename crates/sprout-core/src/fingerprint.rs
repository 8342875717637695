//! Change detection for the configuration script.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

const PREFIX: &str = "xxh3:";

/// XXH3-128 of a configuration script's bytes.
///
/// Equal fingerprints mean byte-identical sources (up to hash collisions,
/// which only ever cost a skipped recompile of identical-looking text).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u128);

impl Fingerprint {
    pub fn of(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{:032x}", self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:08x}..)", (self.0 >> 96) as u32)
    }
}

impl FromStr for Fingerprint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| format!("missing '{PREFIX}' prefix"))?;
        if hex.len() != 32 || !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(format!("expected 32 lowercase hex digits, got '{hex}'"));
        }
        u128::from_str_radix(hex, 16)
            .map(Fingerprint)
            .map_err(|e| e.to_string())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ConfigurationSource
// ---------------------------------------------------------------------------

/// The user's configuration script as read for one load cycle.
#[derive(Debug, Clone)]
pub struct ConfigurationSource {
    pub path: PathBuf,
    pub text: String,
}

impl ConfigurationSource {
    pub fn read(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self {
                path: path.to_path_buf(),
                text,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConfigError::SourceMissing(path.to_path_buf()))
            }
            Err(e) => Err(ConfigError::env("read configuration source", path, e)),
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self.text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn deterministic() {
        assert_eq!(Fingerprint::of(b"fn config() {}"), Fingerprint::of(b"fn config() {}"));
    }

    #[test]
    fn single_byte_change_differs() {
        let a = Fingerprint::of(b"PartialConfig::new().with_renderer(GenericTaskRenderer)");
        let b = Fingerprint::of(b"PartialConfig::new().with_renderer(GenericTaskRendereR)");
        assert_ne!(a, b);
        assert_ne!(Fingerprint::of(b""), Fingerprint::of(b" "));
    }

    #[test]
    fn display_is_prefixed_hex() {
        let s = Fingerprint::of(b"x").to_string();
        assert!(s.starts_with("xxh3:"));
        assert_eq!(s.len(), PREFIX.len() + 32);
        assert_eq!(s.parse::<Fingerprint>().unwrap(), Fingerprint::of(b"x"));
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in [
            "",
            "deadbeef",
            "xxh3:",
            "xxh3:xyz",
            "xxh3:0123456789ABCDEF0123456789ABCDEF",
            "xxh3:0123456789abcdef0123456789abcdef00",
        ] {
            assert!(bad.parse::<Fingerprint>().is_err(), "{bad}");
        }
    }

    #[test]
    fn source_fingerprint_matches_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sprout.config.rs");
        std::fs::write(&path, "export_config!(config);").unwrap();
        let src = ConfigurationSource::read(&path).unwrap();
        assert_eq!(src.fingerprint(), Fingerprint::of(b"export_config!(config);"));
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = ConfigurationSource::read(&dir.path().join("nope.rs")).unwrap_err();
        assert!(matches!(err, ConfigError::SourceMissing(_)));
    }
}
