//! # Markers
//!
//! Render-facing records, one per render object on the map.
//!
//! ## Overview
//! -----------------
//! * [`Marker`] – id, animal, kind, the base style resolved at build time, the style last
//!   applied to the render layer, and the render handle the marker exclusively owns.
//! * [`MarkerRef`] – the handle-free descriptor of a marker kept in
//!   [`MarkerState`](crate::state::MarkerState).
//! * [`palette`](crate::markers::palette) – colour token parsing and fixed palette pairs.
//! * [`registry`](crate::markers::registry) – [`build_markers`](crate::markers::registry::build_markers)
//!   and the [`MarkerRegistry`](crate::markers::registry::MarkerRegistry) index.
//!
//! Markers are created once per registry build and never patched incrementally: a reload
//! rebuilds the registry wholesale. Only `current_style` changes in between.
use std::fmt;

use crate::constants::{AnimalId, ColorToken, FeatureId};

pub mod palette;
pub mod registry;

/// The three kinds of render objects.
///
/// * `Point` – a restylable circle for a historical fix.
/// * `LatestPoint` – the most recent fix, drawn with a custom SVG icon.
/// * `Track` – the polyline of an animal; only its line colour is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKind {
    Point,
    LatestPoint,
    Track,
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarkerKind::Point => "point",
            MarkerKind::LatestPoint => "latest_point",
            MarkerKind::Track => "track",
        };
        write!(f, "{name}")
    }
}

/// Visual attributes of a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub fill: ColorToken,
    pub outline: ColorToken,
    pub opacity: f64,
    pub to_front: bool,
}

impl MarkerStyle {
    pub fn new(fill: impl Into<ColorToken>, outline: impl Into<ColorToken>, opacity: f64) -> Self {
        MarkerStyle {
            fill: fill.into(),
            outline: outline.into(),
            opacity,
            to_front: false,
        }
    }

    /// Drop the attributes a kind does not render.
    ///
    /// Tracks only carry a line colour: their outline follows the fill and they never move to
    /// the front, so those attributes can never differ between two track styles.
    pub fn normalized_for(mut self, kind: MarkerKind) -> Self {
        if kind == MarkerKind::Track {
            self.outline = self.fill.clone();
            self.to_front = false;
        }
        self
    }
}

/// Handle-free description of a marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerRef {
    pub kind: MarkerKind,
    pub id: FeatureId,
    pub animal_id: Option<AnimalId>,
}

/// One render object on the map.
///
/// `H` is the render handle type supplied by the embedding application; see
/// [`RenderHandle`](crate::reconcile::RenderHandle).
#[derive(Debug)]
pub struct Marker<H> {
    pub id: FeatureId,
    pub animal_id: Option<AnimalId>,
    pub kind: MarkerKind,
    pub base_style: MarkerStyle,
    pub current_style: MarkerStyle,
    pub handle: H,
}

impl<H> Marker<H> {
    /// A fresh marker; `current_style` starts equal to `base_style`, normalised for `kind`.
    pub fn new(
        kind: MarkerKind,
        id: FeatureId,
        animal_id: Option<AnimalId>,
        base_style: MarkerStyle,
        handle: H,
    ) -> Self {
        let base_style = base_style.normalized_for(kind);
        Marker {
            id,
            animal_id,
            kind,
            current_style: base_style.clone(),
            base_style,
            handle,
        }
    }

    pub fn animal_key(&self) -> &str {
        self.animal_id.as_deref().unwrap_or("")
    }

    pub fn reference(&self) -> MarkerRef {
        MarkerRef {
            kind: self.kind,
            id: self.id.clone(),
            animal_id: self.animal_id.clone(),
        }
    }
}
