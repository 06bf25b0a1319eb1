//! # Style resolution and reconciliation
//!
//! Computes the intended style of every marker from the interaction state and pushes only the
//! differences to the render layer.
//!
//! ## Style rules
//! -----------------
//! Applied in order, later rules override earlier ones attribute by attribute:
//!
//! 1. **Base** – the style resolved when the registry was built.
//! 2. **Symbolize** – the animal has a `symbolize_map` entry and the marker is a point, or a
//!    latest point with `apply_to_latest`: fill = symbolize colour, outline = symbolized outline.
//! 3. **Highlight** – the marker's animal is the focused one, or the marker is the only selected
//!    marker: outline = selected outline, `to_front = true`.
//! 4. **Dim** – an animal is focused, the animal selection is empty or contains it, and the
//!    marker belongs to another animal: fill and outline = unassigned pair.
//!
//! Rules 3 and 4 never both apply to one marker. Dim runs after symbolize, so a symbolized
//! animal loses its colour while another animal is focused.
//!
//! The global opacity of the state applies to every point and latest point. Tracks keep their
//! base opacity and are normalised with [`MarkerStyle::normalized_for`].
//!
//! ## Render updates
//! -----------------
//! Each kind has one application function of uniform signature:
//!
//! | kind           | application                                    |
//! |----------------|------------------------------------------------|
//! | `Point`        | [`RenderHandle::restyle`], then [`RenderHandle::bring_to_front`] if `to_front` |
//! | `LatestPoint`  | [`RenderHandle::replace_icon`] with a rebuilt SVG |
//! | `Track`        | [`RenderHandle::set_line_color`]              |
//!
//! A marker is written only when its resolved style differs from `current_style`. A marker
//! whose handle is detached from the map is skipped and keeps its `current_style`; the next
//! registry rebuild replaces it.
use std::fmt;

use tracing::{debug, trace};

use crate::markers::palette::Palette;
use crate::markers::registry::MarkerRegistry;
use crate::markers::{Marker, MarkerKind, MarkerStyle};
use crate::state::MarkerState;

/// Custom graphic of a latest-point marker.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestIcon {
    pub svg: String,
    /// Draw above the other markers.
    pub raised: bool,
}

impl LatestIcon {
    /// Icon drawn for `style`: a filled circle with a heavier outline than regular points.
    pub fn from_style(style: &MarkerStyle) -> Self {
        let svg = format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24">"#,
                r#"<circle cx="12" cy="12" r="8" fill="{fill}" fill-opacity="{opacity}" "#,
                r#"stroke="{outline}" stroke-width="3"/></svg>"#
            ),
            fill = style.fill,
            outline = style.outline,
            opacity = style.opacity,
        );
        LatestIcon {
            svg,
            raised: style.to_front,
        }
    }
}

/// Render object owned by one marker, implemented by the embedding map layer.
pub trait RenderHandle {
    /// `false` once the object was removed from its layer out of band.
    fn is_attached(&self) -> bool;

    /// Restyle a point primitive in place.
    fn restyle(&mut self, fill: &str, outline: &str, opacity: f64);

    fn bring_to_front(&mut self);

    /// Replace the icon definition of a latest-point marker.
    fn replace_icon(&mut self, icon: LatestIcon);

    /// Recolour a track polyline.
    fn set_line_color(&mut self, color: &str);
}

/// Render-update function of a marker kind.
pub type ApplyFn<H> = fn(&mut H, &MarkerStyle);

fn apply_point<H: RenderHandle>(handle: &mut H, style: &MarkerStyle) {
    handle.restyle(&style.fill, &style.outline, style.opacity);
    if style.to_front {
        handle.bring_to_front();
    }
}

fn apply_latest_point<H: RenderHandle>(handle: &mut H, style: &MarkerStyle) {
    handle.replace_icon(LatestIcon::from_style(style));
}

fn apply_track<H: RenderHandle>(handle: &mut H, style: &MarkerStyle) {
    handle.set_line_color(&style.fill);
}

impl MarkerKind {
    /// Entry of the kind-keyed application table.
    pub fn applier<H: RenderHandle>(self) -> ApplyFn<H> {
        match self {
            MarkerKind::Point => apply_point::<H>,
            MarkerKind::LatestPoint => apply_latest_point::<H>,
            MarkerKind::Track => apply_track::<H>,
        }
    }
}

/// Intended style of `marker` under `state`.
///
/// Arguments
/// -----------------
/// * `marker` – any registered marker; only its kind, ids and base style are read.
/// * `state` – the interaction state.
/// * `palette` – fixed colours of the view.
///
/// Return
/// ----------
/// * The target [`MarkerStyle`], already normalised for the marker's kind.
///
/// See also
/// ------------
/// * [`reconcile`] – Applies the resolved styles.
pub fn resolve_style<H>(marker: &Marker<H>, state: &MarkerState, palette: &Palette) -> MarkerStyle {
    let mut style = marker.base_style.clone();
    style.to_front = false;
    let animal = marker.animal_id.as_deref();

    // 2. symbolize
    if let Some(symbol) = animal.and_then(|a| state.symbolize_map.get(a)) {
        let applies = match marker.kind {
            MarkerKind::Point => true,
            MarkerKind::LatestPoint => symbol.apply_to_latest,
            MarkerKind::Track => false,
        };
        if applies {
            style.fill = symbol.color.clone();
            style.outline = palette.symbolized_outline.clone();
        }
    }

    // 3. highlight
    let focused = state.focused_animal_id.as_deref();
    let is_focused = focused.is_some() && animal == focused;
    if is_focused || state.single_selected() == Some(&marker.id) {
        style.outline = palette.selected_outline.clone();
        style.to_front = true;
    }

    // 4. dim
    if let Some(focused) = focused {
        let selection_allows = state.selected_animal_ids.is_empty()
            || state.selected_animal_ids.iter().any(|a| a == focused);
        if selection_allows && animal != Some(focused) {
            style.fill = palette.unassigned.fill.clone();
            style.outline = palette.unassigned.outline.clone();
        }
    }

    if marker.kind != MarkerKind::Track {
        style.opacity = state.opacity;
    }
    style.normalized_for(marker.kind)
}

/// Counters of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Markers visited.
    pub examined: usize,
    /// Markers whose render object received an update.
    pub updated: usize,
    /// Markers already matching their resolved style.
    pub unchanged: usize,
    /// Markers needing an update whose handle was detached.
    pub skipped_stale: usize,
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examined={}, updated={}, unchanged={}, skipped_stale={}",
            self.examined, self.updated, self.unchanged, self.skipped_stale
        )
    }
}

/// Bring every marker of `registry` in line with `state`.
///
/// Arguments
/// -----------------
/// * `registry` – the markers of the current load; `current_style` is updated in place.
/// * `state` – the interaction state after the last transition.
/// * `palette` – fixed colours of the view.
///
/// Return
/// ----------
/// * A [`ReconcileReport`]. A transition that changes nothing relevant to any marker yields
///   `updated == 0`.
pub fn reconcile<H: RenderHandle>(
    registry: &mut MarkerRegistry<H>,
    state: &MarkerState,
    palette: &Palette,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for marker in registry.iter_mut() {
        report.examined += 1;
        let target = resolve_style(marker, state, palette);
        if target == marker.current_style {
            report.unchanged += 1;
            continue;
        }
        if !marker.handle.is_attached() {
            trace!("skipping detached {} marker {}", marker.kind, marker.id);
            report.skipped_stale += 1;
            continue;
        }
        let apply = marker.kind.applier::<H>();
        apply(&mut marker.handle, &target);
        marker.current_style = target;
        report.updated += 1;
    }

    debug!("reconciled markers: {report}");
    report
}

#[cfg(test)]
mod reconcile_test {
    use super::*;
    use crate::constants::{
        FeatureId, SELECTED_OUTLINE, SYMBOLIZED_OUTLINE, UNASSIGNED_FILL, UNASSIGNED_OUTLINE,
    };
    use crate::state::{reduce, MarkerAction};

    #[derive(Debug, Default)]
    struct Recorder {
        detached: bool,
        calls: Vec<String>,
    }

    impl RenderHandle for Recorder {
        fn is_attached(&self) -> bool {
            !self.detached
        }
        fn restyle(&mut self, fill: &str, outline: &str, opacity: f64) {
            self.calls.push(format!("restyle {fill} {outline} {opacity}"));
        }
        fn bring_to_front(&mut self) {
            self.calls.push("front".into());
        }
        fn replace_icon(&mut self, icon: LatestIcon) {
            self.calls.push(format!("icon raised={}", icon.raised));
        }
        fn set_line_color(&mut self, color: &str) {
            self.calls.push(format!("line {color}"));
        }
    }

    fn marker(kind: MarkerKind, id: u64, animal: &str) -> Marker<Recorder> {
        Marker::new(
            kind,
            FeatureId::Int(id),
            Some(animal.to_string()),
            MarkerStyle::new("#00ff44", "#ffffff", 0.9),
            Recorder::default(),
        )
    }

    fn symbolized(animal: &str, apply_to_latest: bool) -> MarkerState {
        reduce(
            &MarkerState::default(),
            MarkerAction::SymbolizeGroup {
                animal_id: animal.into(),
                color: "#ff0000".into(),
                apply_to_latest,
            },
        )
    }

    #[test]
    fn test_base_style_untouched() {
        let palette = Palette::default();
        let m = marker(MarkerKind::Point, 1, "A1");
        assert_eq!(resolve_style(&m, &MarkerState::default(), &palette), m.base_style);
    }

    #[test]
    fn test_symbolize_point_not_latest() {
        let palette = Palette::default();
        let state = symbolized("A1", false);

        let point = resolve_style(&marker(MarkerKind::Point, 1, "A1"), &state, &palette);
        assert_eq!(point.fill, "#ff0000");
        assert_eq!(point.outline, SYMBOLIZED_OUTLINE);

        let latest = marker(MarkerKind::LatestPoint, 1, "A1");
        assert_eq!(resolve_style(&latest, &state, &palette), latest.base_style);

        let state = symbolized("A1", true);
        assert_eq!(resolve_style(&latest, &state, &palette).fill, "#ff0000");
    }

    #[test]
    fn test_highlight_over_symbolize() {
        let palette = Palette::default();
        let state = reduce(&symbolized("A1", false), MarkerAction::FocusAnimal("A1".into()));
        let style = resolve_style(&marker(MarkerKind::Point, 1, "A1"), &state, &palette);
        assert_eq!(style.fill, "#ff0000");
        assert_eq!(style.outline, SELECTED_OUTLINE);
        assert!(style.to_front);
    }

    #[test]
    fn test_single_selected_marker_highlighted() {
        let palette = Palette::default();
        let m = marker(MarkerKind::Point, 4, "A2");
        let one = reduce(
            &MarkerState::default(),
            MarkerAction::SelectMarkers(vec![FeatureId::Int(4)]),
        );
        assert_eq!(resolve_style(&m, &one, &palette).outline, SELECTED_OUTLINE);

        let two = reduce(&one, MarkerAction::SelectMarkers(vec![FeatureId::Int(5)]));
        assert_eq!(resolve_style(&m, &two, &palette).outline, "#ffffff");
    }

    #[test]
    fn test_dim_other_animals() {
        let palette = Palette::default();
        let state = reduce(&symbolized("A2", false), MarkerAction::FocusAnimal("A1".into()));
        let other = resolve_style(&marker(MarkerKind::Point, 2, "A2"), &state, &palette);
        assert_eq!(other.fill, UNASSIGNED_FILL);
        assert_eq!(other.outline, UNASSIGNED_OUTLINE);
        assert!(!other.to_front);

        // focused animal outside the animal selection: nothing dims
        let state = reduce(&state, MarkerAction::SelectAnimals(vec!["A3".into()]));
        let other = resolve_style(&marker(MarkerKind::Point, 2, "A2"), &state, &palette);
        assert_eq!(other.fill, "#ff0000");
    }

    #[test]
    fn test_track_normalised() {
        let palette = Palette::default();
        let track = marker(MarkerKind::Track, 9, "A1");
        assert_eq!(track.base_style.outline, "#00ff44");

        let state = reduce(&MarkerState::default(), MarkerAction::FocusAnimal("A1".into()));
        let state = reduce(&state, MarkerAction::SetOpacity(0.3));
        assert_eq!(resolve_style(&track, &state, &palette), track.base_style);
    }

    #[test]
    fn test_kind_table() {
        let style = MarkerStyle {
            to_front: true,
            ..MarkerStyle::new("#ff0000", "#000000", 0.5)
        };
        let mut handle = Recorder::default();
        MarkerKind::Point.applier::<Recorder>()(&mut handle, &style);
        MarkerKind::LatestPoint.applier::<Recorder>()(&mut handle, &style);
        MarkerKind::Track.applier::<Recorder>()(&mut handle, &style);
        assert_eq!(
            handle.calls,
            vec![
                "restyle #ff0000 #000000 0.5",
                "front",
                "icon raised=true",
                "line #ff0000"
            ]
        );
    }

    #[test]
    fn test_latest_icon_svg() {
        let icon = LatestIcon::from_style(&MarkerStyle::new("#ff0000", "#ffffff", 0.9));
        assert!(icon.svg.starts_with("<svg"));
        assert!(icon.svg.contains(r##"fill="#ff0000""##));
        assert!(icon.svg.contains(r##"stroke="#ffffff""##));
        assert!(!icon.raised);
    }
}
