//! # Marker registry
//!
//! Builds the [`Marker`] records of a feature-set load and indexes them by `(kind, id)`.
//!
//! ## Build rules
//! -----------------
//! * Each render object of each layer is visited exactly once, in layer order: tracks first,
//!   then points, then latest points.
//! * The base fill/outline come from [`Palette::base_pair`]; the base opacity is the view's
//!   default opacity; `to_front` starts `false`.
//! * `current_style` starts equal to `base_style`.
//! * A second object with an id already registered for the same kind is skipped with a `warn`,
//!   so ids stay unique within a kind.
//!
//! The registry is rebuilt wholesale on every reload and never patched.
use tracing::{debug, warn};

use super::palette::Palette;
use super::{Marker, MarkerKind, MarkerRef, MarkerStyle};
use crate::constants::{AnimalId, FastHashMap, FeatureId};
use crate::features::{TelemetryPoint, TelemetryTrack};
use crate::map_params::MapParams;

/// A render object handed over by the map layer, with the properties needed to style it.
#[derive(Debug, Clone)]
pub struct RenderObject<H> {
    pub id: FeatureId,
    pub animal_id: Option<AnimalId>,
    pub status_code: Option<String>,
    pub color_token: Option<String>,
    pub handle: H,
}

impl<H> RenderObject<H> {
    /// Wrap the render object drawn for `point`.
    pub fn from_point(point: &TelemetryPoint, handle: H) -> Self {
        RenderObject {
            id: point.id.clone(),
            animal_id: point.properties.animal_id.clone(),
            status_code: point.properties.status_code.clone(),
            color_token: point.properties.category_color_token.clone(),
            handle,
        }
    }

    /// Wrap the render object drawn for `track`.
    pub fn from_track(track: &TelemetryTrack, handle: H) -> Self {
        RenderObject {
            id: track.id.clone(),
            animal_id: track.properties.animal_id.clone(),
            status_code: track.properties.status_code.clone(),
            color_token: track.properties.category_color_token.clone(),
            handle,
        }
    }

    fn base_style(&self, palette: &Palette, opacity: f64) -> MarkerStyle {
        let pair = palette.base_pair(self.status_code.as_deref(), self.color_token.as_deref());
        MarkerStyle::new(pair.fill, pair.outline, opacity)
    }
}

/// All markers of the current load, indexed by `(kind, id)`.
#[derive(Debug)]
pub struct MarkerRegistry<H> {
    markers: Vec<Marker<H>>,
    index: FastHashMap<(MarkerKind, FeatureId), usize>,
}

impl<H> Default for MarkerRegistry<H> {
    fn default() -> Self {
        MarkerRegistry {
            markers: Vec::new(),
            index: FastHashMap::default(),
        }
    }
}

impl<H> MarkerRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a marker; returns `false` if its `(kind, id)` is already taken.
    fn insert(&mut self, marker: Marker<H>) -> bool {
        let key = (marker.kind, marker.id.clone());
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.markers.len());
        self.markers.push(marker);
        true
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, kind: MarkerKind, id: &FeatureId) -> Option<&Marker<H>> {
        let slot = self.index.get(&(kind, id.clone()))?;
        self.markers.get(*slot)
    }

    pub fn get_mut(&mut self, kind: MarkerKind, id: &FeatureId) -> Option<&mut Marker<H>> {
        let slot = self.index.get(&(kind, id.clone()))?;
        self.markers.get_mut(*slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker<H>> {
        self.markers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Marker<H>> {
        self.markers.iter_mut()
    }

    /// Handle-free descriptors of every marker, in registry order.
    pub fn references(&self) -> Vec<MarkerRef> {
        self.markers.iter().map(Marker::reference).collect()
    }

    /// Number of markers of `kind`.
    pub fn count(&self, kind: MarkerKind) -> usize {
        self.markers.iter().filter(|m| m.kind == kind).count()
    }
}

/// Build the markers of one feature-set load.
///
/// Arguments
/// -----------------
/// * `tracks` – render objects of the track layer.
/// * `points` – render objects of the point layer (historical fixes).
/// * `latest` – render objects of the latest-point layer.
/// * `params` – palette and default opacity of the view.
///
/// Return
/// ----------
/// * A fresh [`MarkerRegistry`] with one marker per render object, minus duplicate ids.
pub fn build_markers<H, T, P, L>(
    tracks: T,
    points: P,
    latest: L,
    params: &MapParams,
) -> MarkerRegistry<H>
where
    T: IntoIterator<Item = RenderObject<H>>,
    P: IntoIterator<Item = RenderObject<H>>,
    L: IntoIterator<Item = RenderObject<H>>,
{
    let mut registry = MarkerRegistry::new();
    let layers = [
        (MarkerKind::Track, tracks.into_iter().collect::<Vec<_>>()),
        (MarkerKind::Point, points.into_iter().collect()),
        (MarkerKind::LatestPoint, latest.into_iter().collect()),
    ];

    for (kind, objects) in layers {
        for object in objects {
            let base = object.base_style(&params.palette, params.default_opacity);
            let id = object.id.clone();
            let marker = Marker::new(kind, object.id, object.animal_id, base, object.handle);
            if !registry.insert(marker) {
                warn!("skipping duplicate {kind} marker id {id}");
            }
        }
    }

    debug!(
        "built {} markers ({} tracks, {} points, {} latest)",
        registry.len(),
        registry.count(MarkerKind::Track),
        registry.count(MarkerKind::Point),
        registry.count(MarkerKind::LatestPoint)
    );
    registry
}
