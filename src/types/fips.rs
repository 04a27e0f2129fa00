use std::fmt;
use std::sync::Arc;

use anyhow::{Result, bail};

/// Canonical county identity key: a 5-digit zero-padded FIPS code.
/// Keeps the padded text behind an `Arc` so indexes and frames can clone it
/// cheaply without re-deriving the padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FipsCode(Arc<str>);

impl FipsCode {
    /// Parse from text, restoring leading zeros lost by numeric round-trips
    /// ("8017" -> "08017").
    pub fn new(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        if trimmed.is_empty() || trimmed.len() > 5 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            bail!("invalid FIPS code: {:?}", code);
        }
        Ok(Self(Arc::from(format!("{trimmed:0>5}").as_str())))
    }

    pub fn from_u32(code: u32) -> Result<Self> {
        if code > 99_999 {
            bail!("FIPS code out of range: {}", code);
        }
        Ok(Self(Arc::from(format!("{code:05}").as_str())))
    }

    /// Accept float-typed codes (spreadsheet and GeoJSON feeds deliver
    /// "8017.0"); reject anything fractional or non-finite.
    pub fn from_f64(code: f64) -> Result<Self> {
        if !code.is_finite() || code.fract() != 0.0 || !(0.0..=99_999.0).contains(&code) {
            bail!("invalid FIPS code: {}", code);
        }
        Self::from_u32(code as u32)
    }

    /// Two-digit state prefix, e.g. "46" for "46102".
    #[inline] pub fn state_fips(&self) -> &str { &self.0[..2] }

    #[inline] pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for FipsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
