//! Resolution tiers.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors in a tier definition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TierError {
    /// The definition is not of the form `name=scale`.
    #[error("invalid tier {0:?}: expected NAME=SCALE")]
    Syntax(String),

    /// The name cannot be used as a directory name.
    #[error("invalid tier name {0:?}")]
    InvalidName(String),

    /// The scale is not a positive finite number.
    #[error("invalid scale {scale} for tier {name:?}")]
    InvalidScale {
        /// Tier name.
        name: String,
        /// Offending scale.
        scale: f32,
    },

    /// Two tiers share a name and would write into the same directory.
    #[error("duplicate tier name {0:?}")]
    Duplicate(String),

    /// No tier was given.
    #[error("at least one tier is required")]
    Empty,
}

/// An output resolution: a directory name and the scale applied to the
/// base font size.
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    /// Subdirectory of the output directory receiving this tier's images.
    pub name: String,
    /// Multiplier applied to the rendered size.
    pub scale: f32,
}

impl Tier {
    /// Creates a tier, validating its name and scale.
    pub fn new(name: impl Into<String>, scale: f32) -> Result<Self, TierError> {
        let name = name.into();
        if !crate::data::is_valid_key(&name) {
            return Err(TierError::InvalidName(name));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(TierError::InvalidScale { name, scale });
        }
        Ok(Self { name, scale })
    }

    /// Android density buckets, relative to `mdpi`.
    pub fn defaults() -> Vec<Tier> {
        [
            ("ldpi", 0.75),
            ("mdpi", 1.0),
            ("hdpi", 1.5),
            ("xhdpi", 2.0),
            ("xxhdpi", 3.0),
            ("xxxhdpi", 4.0),
        ]
        .into_iter()
        .map(|(name, scale)| Tier {
            name: name.to_string(),
            scale,
        })
        .collect()
    }
}

impl FromStr for Tier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, scale) = s
            .split_once('=')
            .ok_or_else(|| TierError::Syntax(s.to_string()))?;
        let scale: f32 = scale
            .trim()
            .parse()
            .map_err(|_| TierError::Syntax(s.to_string()))?;
        Tier::new(name.trim(), scale)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.scale)
    }
}

/// Checks that a tier list is non-empty and free of duplicate names.
pub fn validate_tiers(tiers: &[Tier]) -> Result<(), TierError> {
    if tiers.is_empty() {
        return Err(TierError::Empty);
    }
    let mut seen = HashSet::new();
    for tier in tiers {
        if !seen.insert(tier.name.as_str()) {
            return Err(TierError::Duplicate(tier.name.clone()));
        }
    }
    Ok(())
}
