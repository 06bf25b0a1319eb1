//! # Map view parameters
//!
//! This module defines the [`MapParams`] configuration struct and its builder, which control
//! how the live map windows fixes, which opacity a fresh view starts with, and which fixed
//! colours the styling rules use.
//!
//! ## Parameters
//!
//! - `window_size` – number of fixes kept per animal by the "last N fixes" window (10).
//! - `default_opacity` – global marker opacity of a fresh view, also the base style opacity (0.9).
//! - `palette` – unassigned, mortality, selected and symbolized colours.
//!
//! ## Example
//!
//! ```rust,no_run
//! use telemap::map_params::MapParams;
//!
//! let params = MapParams::builder()
//!     .window_size(25)
//!     .default_opacity(0.75)
//!     .selected_outline("#00ffff")
//!     .build()
//!     .unwrap();
//! println!("{params:#}");
//! ```
//!
//! ## See also
//!
//! * [`Telemap`](crate::telemap::Telemap) – consumes these parameters.
//! * [`Palette`] – the fixed colour set.
use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;

use crate::constants::{ColorToken, DEFAULT_OPACITY, DEFAULT_WINDOW_SIZE};
use crate::markers::palette::{ColorPair, Palette};
use crate::telemap_errors::TelemapError;

/// Configuration of a map view.
///
/// Validation rules (see [`MapParamsBuilder::build`]):
/// * `window_size ≥ 1`
/// * `0 ≤ default_opacity ≤ 1`
/// * every palette entry is a valid colour.
#[derive(Debug, Clone, PartialEq)]
pub struct MapParams {
    pub window_size: usize,
    pub default_opacity: f64,
    pub palette: Palette,
}

impl MapParams {
    /// Equivalent to [`MapParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`MapParamsBuilder`] starting from the defaults.
    pub fn builder() -> MapParamsBuilder {
        MapParamsBuilder::new()
    }
}

impl Default for MapParams {
    fn default() -> Self {
        MapParams {
            window_size: DEFAULT_WINDOW_SIZE,
            default_opacity: DEFAULT_OPACITY,
            palette: Palette::default(),
        }
    }
}

/// Builder for [`MapParams`], with validation.
#[derive(Debug, Clone)]
pub struct MapParamsBuilder {
    params: MapParams,
}

impl Default for MapParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MapParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: MapParams::default(),
        }
    }

    pub fn window_size(mut self, v: usize) -> Self {
        self.params.window_size = v;
        self
    }
    pub fn default_opacity(mut self, v: f64) -> Self {
        self.params.default_opacity = v;
        self
    }
    pub fn palette(mut self, v: Palette) -> Self {
        self.params.palette = v;
        self
    }

    // --- Palette entries ---
    pub fn unassigned(
        mut self,
        fill: impl Into<ColorToken>,
        outline: impl Into<ColorToken>,
    ) -> Self {
        self.params.palette.unassigned = ColorPair::new(fill, outline);
        self
    }
    pub fn mortality(
        mut self,
        fill: impl Into<ColorToken>,
        outline: impl Into<ColorToken>,
    ) -> Self {
        self.params.palette.mortality = ColorPair::new(fill, outline);
        self
    }
    pub fn selected_outline(mut self, v: impl Into<ColorToken>) -> Self {
        self.params.palette.selected_outline = v.into();
        self
    }
    pub fn symbolized_outline(mut self, v: impl Into<ColorToken>) -> Self {
        self.params.palette.symbolized_outline = v.into();
        self
    }

    /// Return true iff `0 <= x <= 1` (NaN is rejected).
    #[inline]
    fn unit_interval(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
            && matches!(x.partial_cmp(&1.0), Some(Less) | Some(Equal))
    }

    /// Validate and produce the [`MapParams`].
    ///
    /// Validation rules
    /// -----------------
    /// * `window_size >= 1` – a zero window would hide every fix.
    /// * `0.0 <= default_opacity <= 1.0`, NaN rejected.
    /// * Every palette colour passes [`parse_color`](crate::markers::palette::parse_color);
    ///   the stored colours are lower-cased.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(MapParams)` if all values are valid.
    /// * `Err(TelemapError::InvalidMapParameter)` otherwise.
    pub fn build(mut self) -> Result<MapParams, TelemapError> {
        let p = &mut self.params;

        if p.window_size == 0 {
            return Err(TelemapError::InvalidMapParameter(
                "window_size must be >= 1".into(),
            ));
        }
        if !Self::unit_interval(p.default_opacity) {
            return Err(TelemapError::InvalidMapParameter(
                "default_opacity must be within [0, 1]".into(),
            ));
        }
        p.palette
            .validate()
            .map_err(|err| TelemapError::InvalidMapParameter(format!("palette: {err}")))?;
        p.palette.normalize();

        Ok(self.params)
    }
}

impl fmt::Display for MapParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 40;
            writeln!(f, "Map View Parameters")?;
            writeln!(f, "-------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Window]")?;
            line!(
                "window_size        = {}",
                self.window_size,
                "Fixes kept per animal"
            )?;
            line!(
                "default_opacity    = {:.2}",
                self.default_opacity,
                "Initial global opacity"
            )?;

            writeln!(f, "\n[Palette]")?;
            line!(
                "unassigned         = {}",
                self.palette.unassigned,
                "Fallback and dimmed markers"
            )?;
            line!(
                "mortality          = {}",
                self.palette.mortality,
                "Mortality status"
            )?;
            line!(
                "selected_outline   = {}",
                self.palette.selected_outline,
                "Highlighted markers"
            )?;
            line!(
                "symbolized_outline = {}",
                self.palette.symbolized_outline,
                "Symbolized markers"
            )?;
            Ok(())
        } else {
            write!(
                f,
                "MapParams(window_size={}, default_opacity={:.2}, unassigned={}, mortality={}, selected={}, symbolized={})",
                self.window_size,
                self.default_opacity,
                self.palette.unassigned,
                self.palette.mortality,
                self.palette.selected_outline,
                self.palette.symbolized_outline,
            )
        }
    }
}
