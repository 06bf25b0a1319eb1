//! # Colour tokens and the base palette
//!
//! Parsing of the `"fill,outline"` colour tokens carried by features, and the fixed palette
//! pairs used by style resolution.
//!
//! ## Colour tokens
//! -----------------
//! A token is split at its **last** comma. Each side must be a CSS-like colour:
//! - a hex colour `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`,
//! - a functional `rgb(..)` / `rgba(..)` colour,
//! - a colour name (`red`, `steelblue`, ...).
//!
//! Both sides are trimmed and lower-cased. Anything else is rejected and the marker falls back
//! to the unassigned pair.
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{
    ColorToken, MORTALITY_FILL, MORTALITY_OUTLINE, MORTALITY_STATUS, SELECTED_OUTLINE,
    SYMBOLIZED_OUTLINE, UNASSIGNED_FILL, UNASSIGNED_OUTLINE,
};
use crate::telemap_errors::TelemapError;

static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#[0-9a-f]{3,4}|#[0-9a-f]{6}|#[0-9a-f]{8}|rgba?\([^()]*\)|[a-z]+)$")
        .expect("valid colour regex")
});

/// A fill colour and its outline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorPair {
    pub fill: ColorToken,
    pub outline: ColorToken,
}

impl ColorPair {
    pub fn new(fill: impl Into<ColorToken>, outline: impl Into<ColorToken>) -> Self {
        ColorPair {
            fill: fill.into(),
            outline: outline.into(),
        }
    }
}

impl fmt::Display for ColorPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.fill, self.outline)
    }
}

/// Validate and normalise a single colour.
///
/// Return
/// ----------
/// * the trimmed, lower-cased colour, or [`TelemapError::InvalidColorToken`].
pub fn parse_color(color: &str) -> Result<ColorToken, TelemapError> {
    let normalized = color.trim().to_ascii_lowercase();
    if COLOR_RE.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(TelemapError::InvalidColorToken(color.to_string()))
    }
}

/// Parse a `"fill,outline"` token, split at its last comma.
///
/// Arguments
/// -----------------
/// * `token` – the raw `category_color_token` value.
///
/// Return
/// ----------
/// * the [`ColorPair`], or [`TelemapError::InvalidColorToken`] if the token has no comma or
///   either side is not a colour.
pub fn parse_color_token(token: &str) -> Result<ColorPair, TelemapError> {
    let (fill, outline) = token
        .rsplit_once(',')
        .ok_or_else(|| TelemapError::InvalidColorToken(token.to_string()))?;
    Ok(ColorPair {
        fill: parse_color(fill)?,
        outline: parse_color(outline)?,
    })
}

/// Fixed colours used by base and resolved styles.
///
/// Fields
/// -----------------
/// * `unassigned` – fallback pair, also the "hidden" pair of dimmed markers.
/// * `mortality` – pair of fixes whose status is a mortality.
/// * `selected_outline` – outline of highlighted markers.
/// * `symbolized_outline` – outline of symbolized markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub unassigned: ColorPair,
    pub mortality: ColorPair,
    pub selected_outline: ColorToken,
    pub symbolized_outline: ColorToken,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            unassigned: ColorPair::new(UNASSIGNED_FILL, UNASSIGNED_OUTLINE),
            mortality: ColorPair::new(MORTALITY_FILL, MORTALITY_OUTLINE),
            selected_outline: SELECTED_OUTLINE.to_string(),
            symbolized_outline: SYMBOLIZED_OUTLINE.to_string(),
        }
    }
}

impl Palette {
    /// Base colours of a render object.
    ///
    /// Rules, first match wins:
    /// 1. `status_code` is a mortality (case-insensitive) → [`Palette::mortality`];
    /// 2. `category_color_token` parses → that pair;
    /// 3. otherwise → [`Palette::unassigned`].
    pub fn base_pair(&self, status_code: Option<&str>, color_token: Option<&str>) -> ColorPair {
        if status_code.is_some_and(|s| s.trim().eq_ignore_ascii_case(MORTALITY_STATUS)) {
            return self.mortality.clone();
        }
        color_token
            .and_then(|token| parse_color_token(token).ok())
            .unwrap_or_else(|| self.unassigned.clone())
    }

    /// Check every colour of the palette.
    pub(crate) fn validate(&self) -> Result<(), TelemapError> {
        for color in [
            &self.unassigned.fill,
            &self.unassigned.outline,
            &self.mortality.fill,
            &self.mortality.outline,
            &self.selected_outline,
            &self.symbolized_outline,
        ] {
            parse_color(color)?;
        }
        Ok(())
    }

    /// Trim and lower-case every colour in place.
    pub(crate) fn normalize(&mut self) {
        for color in [
            &mut self.unassigned.fill,
            &mut self.unassigned.outline,
            &mut self.mortality.fill,
            &mut self.mortality.outline,
            &mut self.selected_outline,
            &mut self.symbolized_outline,
        ] {
            *color = color.trim().to_ascii_lowercase();
        }
    }
}
