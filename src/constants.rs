//! # Constants and type definitions for telemap
//!
//! This module centralizes the **palette tokens**, **window defaults**, and **common type
//! definitions** shared by the grouping, filtering, registry, and reconciliation layers.
//!
//! ## Overview
//!
//! - Default colour tokens (unassigned, selected, symbolized, mortality)
//! - Interaction defaults (initial opacity, last-N window size)
//! - Core type aliases used across the crate
//! - The [`FeatureId`] identifier shared by features and markers
//!
//! Colour tokens are kept as lower-case CSS strings; the renderer is responsible for
//! interpreting them.

use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

use ahash::RandomState;

use crate::features::TelemetryPoint;

// -------------------------------------------------------------------------------------------------
// Interaction defaults
// -------------------------------------------------------------------------------------------------

/// Global marker opacity of a freshly opened map view
pub const DEFAULT_OPACITY: f64 = 0.9;

/// Number of fixes kept per animal by the "last N fixes" window
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Reserved code value matching null or empty category fields
pub const BLANK_CODE: &str = "(Blank)";

/// Status code that switches a marker to the mortality palette
pub const MORTALITY_STATUS: &str = "mortality";

// -------------------------------------------------------------------------------------------------
// Palette tokens
// -------------------------------------------------------------------------------------------------

/// Fill of markers without a resolvable colour, also used to dim non-focused animals
pub const UNASSIGNED_FILL: &str = "#b29f9f";

/// Outline paired with [`UNASSIGNED_FILL`]
pub const UNASSIGNED_OUTLINE: &str = "#ffffff";

/// Outline of highlighted markers (focused animal or single selected marker)
pub const SELECTED_OUTLINE: &str = "#ffff00";

/// Outline of symbolized markers
pub const SYMBOLIZED_OUTLINE: &str = "#000000";

/// Fill of fixes reported with a mortality status
pub const MORTALITY_FILL: &str = "#ff0000";

/// Outline paired with [`MORTALITY_FILL`]
pub const MORTALITY_OUTLINE: &str = "#ffffff";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Identifier of a tracked animal
pub type AnimalId = String;
/// A CSS colour token (`#rrggbb`, `rgb(..)`, or a colour name), lower-cased
pub type ColorToken = String;
/// Longitude in degrees
pub type Longitude = f64;
/// Latitude in degrees
pub type Latitude = f64;

/// Hash map with the crate-wide fast hasher
pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;
/// Hash set with the crate-wide fast hasher
pub type FastHashSet<T> = HashSet<T, RandomState>;

/// A small, inline-optimized container for the fixes of a single animal.
pub type Fixes = SmallVec<[TelemetryPoint; 8]>;

// -------------------------------------------------------------------------------------------------
// Identifiers
// -------------------------------------------------------------------------------------------------

/// Identifier of a feature, device, or collar.
///
/// Backends emit these either as JSON numbers or strings:
/// - A numeric id (e.g. `Int(1234)`)
/// - An opaque id (e.g. `"5f0c-ab12"`)
///
/// Integers order before strings so sorting on mixed columns stays total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    /// Integer identifier
    Int(u64),
    /// String identifier
    String(String),
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureId::Int(n) => write!(f, "{n}"),
            FeatureId::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for FeatureId {
    fn from(n: u64) -> Self {
        FeatureId::Int(n)
    }
}

impl From<String> for FeatureId {
    fn from(s: String) -> Self {
        FeatureId::String(s)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        FeatureId::String(s.to_string())
    }
}

impl std::str::FromStr for FeatureId {
    type Err = std::convert::Infallible;

    /// Parse a `FeatureId` from a string.
    /// - Pure digits → `Int(u64)`
    /// - Otherwise  → `String(String)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FeatureId::from_raw(s))
    }
}

impl FeatureId {
    /// Infallible parse of a raw cell or query value.
    pub fn from_raw(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<u64>() {
            Ok(n) => FeatureId::Int(n),
            Err(_) => FeatureId::String(s.to_string()),
        }
    }
}
