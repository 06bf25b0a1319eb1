//! # Marker state store
//!
//! Interaction state of one map view and the pure transition function over it.
//!
//! ## Overview
//! -----------------
//! * [`MarkerState`] – loaded markers, global opacity, marker and animal selection, focused
//!   animal, and the per-animal symbolize map.
//! * [`MarkerAction`] – the closed set of transitions dispatched by the UI.
//! * [`reduce`] – `(state, action) → state'`, exhaustive over [`MarkerAction`], no side effects.
//!
//! ## Invariants
//! -----------------
//! * `SelectMarkers` / `UnselectMarkers` are set union / difference, hence idempotent.
//! * `selected_marker_ids` is never validated against the loaded markers.
//! * `symbolize_map` entries for animals that are no longer loaded are kept; they are inert.
//! * `opacity` always lies in `[0, 1]`.
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{AnimalId, ColorToken, FeatureId, DEFAULT_OPACITY};
use crate::markers::MarkerRef;

/// Colour override of one animal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbolization {
    pub color: ColorToken,
    /// Also recolour the latest-point marker of the animal.
    pub apply_to_latest: bool,
}

/// Interaction state of a map view.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerState {
    pub markers: Vec<MarkerRef>,
    pub opacity: f64,
    pub selected_marker_ids: BTreeSet<FeatureId>,
    pub selected_animal_ids: Vec<AnimalId>,
    pub focused_animal_id: Option<AnimalId>,
    pub symbolize_map: BTreeMap<AnimalId, Symbolization>,
}

impl Default for MarkerState {
    fn default() -> Self {
        Self::with_opacity(DEFAULT_OPACITY)
    }
}

impl MarkerState {
    /// Initial state with a custom starting opacity, clamped to `[0, 1]`.
    pub fn with_opacity(opacity: f64) -> Self {
        MarkerState {
            markers: Vec::new(),
            opacity: if opacity.is_nan() {
                DEFAULT_OPACITY
            } else {
                opacity.clamp(0.0, 1.0)
            },
            selected_marker_ids: BTreeSet::new(),
            selected_animal_ids: Vec::new(),
            focused_animal_id: None,
            symbolize_map: BTreeMap::new(),
        }
    }

    /// The single selected marker id, if exactly one is selected.
    pub fn single_selected(&self) -> Option<&FeatureId> {
        match self.selected_marker_ids.len() {
            1 => self.selected_marker_ids.iter().next(),
            _ => None,
        }
    }
}

/// Transitions of [`MarkerState`].
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerAction {
    /// Replace the loaded markers.
    SetMarkers(Vec<MarkerRef>),
    /// Add ids to the marker selection.
    SelectMarkers(Vec<FeatureId>),
    /// Remove ids from the marker selection.
    UnselectMarkers(Vec<FeatureId>),
    /// Replace the animal selection.
    SelectAnimals(Vec<AnimalId>),
    FocusAnimal(AnimalId),
    ResetFocus,
    /// Insert or replace the colour override of one animal.
    SymbolizeGroup {
        animal_id: AnimalId,
        color: ColorToken,
        apply_to_latest: bool,
    },
    /// Replace the global opacity; clamped to `[0, 1]`, NaN ignored.
    SetOpacity(f64),
    /// Clear the marker selection.
    ResetSelection,
    /// Clear the symbolize map.
    ResetSymbolize,
    /// Back to the initial state.
    ResetAll,
}

/// Apply `action` to `state`.
///
/// `ResetAll` returns the default initial state; use [`MarkerState::with_opacity`] and
/// `SetMarkers` to rebuild a view with custom parameters.
pub fn reduce(state: &MarkerState, action: MarkerAction) -> MarkerState {
    let mut next = state.clone();
    match action {
        MarkerAction::SetMarkers(markers) => next.markers = markers,
        MarkerAction::SelectMarkers(ids) => next.selected_marker_ids.extend(ids),
        MarkerAction::UnselectMarkers(ids) => {
            for id in &ids {
                next.selected_marker_ids.remove(id);
            }
        }
        MarkerAction::SelectAnimals(ids) => next.selected_animal_ids = ids,
        MarkerAction::FocusAnimal(id) => next.focused_animal_id = Some(id),
        MarkerAction::ResetFocus => next.focused_animal_id = None,
        MarkerAction::SymbolizeGroup {
            animal_id,
            color,
            apply_to_latest,
        } => {
            next.symbolize_map.insert(
                animal_id,
                Symbolization {
                    color,
                    apply_to_latest,
                },
            );
        }
        MarkerAction::SetOpacity(opacity) => {
            if !opacity.is_nan() {
                next.opacity = opacity.clamp(0.0, 1.0);
            }
        }
        MarkerAction::ResetSelection => next.selected_marker_ids.clear(),
        MarkerAction::ResetSymbolize => next.symbolize_map.clear(),
        MarkerAction::ResetAll => return MarkerState::default(),
    }
    next
}
