mod common;

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use approx::assert_relative_eq;
use common::{attach, point, track, two_animals_twelve_fixes, RenderLog};
use telemap::code_filter::apply_filter;
use telemap::constants::{
    FeatureId, SELECTED_OUTLINE, SYMBOLIZED_OUTLINE, UNASSIGNED_FILL, UNASSIGNED_OUTLINE,
};
use telemap::features::{LonLat, PropertyKey, TelemetryPoint};
use telemap::grouping::window::{split_all, window_last_n};
use telemap::grouping::{flatten, group};
use telemap::map_params::MapParams;
use telemap::markers::palette::Palette;
use telemap::markers::{Marker, MarkerKind, MarkerStyle};
use telemap::reconcile::resolve_style;
use telemap::state::{reduce, MarkerAction, MarkerState};
use telemap::telemap::{LayerQuery, Telemap};
use telemap::GroupSetExt;

fn style_marker(kind: MarkerKind, id: u64, animal: &str) -> Marker<()> {
    Marker::new(
        kind,
        FeatureId::Int(id),
        Some(animal.to_string()),
        MarkerStyle::new("#00ff44", "#ffffff", 0.9),
        (),
    )
}

#[test]
fn scenario_a_window_last_ten() {
    let (points, tracks) = two_animals_twelve_fixes();
    let groups = group(&points, None, &PropertyKey::AnimalId);
    let windowed = window_last_n(&groups, &tracks, 10);

    assert_eq!(windowed.groups.len(), 2);
    for g in &windowed.groups {
        assert_eq!(g.count, 10);
        // the latest ten: days 3..=12
        let days: HashSet<u64> = g
            .features
            .iter()
            .map(|p| match &p.id {
                FeatureId::Int(n) => n % 100,
                FeatureId::String(_) => unreachable!(),
            })
            .collect();
        assert_eq!(days, (3..=12).collect());
    }
    assert_eq!(windowed.groups.total_fixes(), 20);

    let kept_coords: usize = windowed.tracks.iter().map(|t| t.coordinates.len()).sum();
    assert_eq!(windowed.tracks.len(), 2);
    assert_eq!(kept_coords, 20);
}

#[test]
fn scenario_b_sentinels_excluded() {
    let (mut points, _) = two_animals_twelve_fixes();
    let before = group(&points, None, &PropertyKey::AnimalId).total_fixes();

    points.push(point(900, "A1", 0.0, 0.0, 20));
    points.push(point(901, "A3", 0.0, 0.0, 21));
    let groups = group(&points, None, &PropertyKey::AnimalId);

    assert_eq!(groups.total_fixes(), before);
    assert_eq!(groups.len(), 2);
}

#[test]
fn scenario_c_symbolize_point_not_latest() {
    let palette = Palette::default();
    let state = reduce(
        &MarkerState::default(),
        MarkerAction::SymbolizeGroup {
            animal_id: "A1".into(),
            color: "#ff0000".into(),
            apply_to_latest: false,
        },
    );

    let point = style_marker(MarkerKind::Point, 1, "A1");
    let resolved = resolve_style(&point, &state, &palette);
    assert_eq!(resolved.fill, "#ff0000");
    assert_eq!(resolved.outline, SYMBOLIZED_OUTLINE);

    let latest = style_marker(MarkerKind::LatestPoint, 2, "A1");
    assert_eq!(resolve_style(&latest, &state, &palette), latest.base_style);
}

#[test]
fn scenario_d_focus_dims_others() {
    let palette = Palette::default();
    let state = reduce(&MarkerState::default(), MarkerAction::FocusAnimal("A1".into()));
    assert!(state.selected_animal_ids.is_empty());

    let other = resolve_style(&style_marker(MarkerKind::Point, 2, "A2"), &state, &palette);
    assert_eq!(other.fill, UNASSIGNED_FILL);
    assert_eq!(other.outline, UNASSIGNED_OUTLINE);

    let focused = resolve_style(&style_marker(MarkerKind::Point, 1, "A1"), &state, &palette);
    assert_eq!(focused.outline, SELECTED_OUTLINE);
    assert!(focused.to_front);
}

#[test]
fn precedence_highlight_keeps_symbolize_fill() {
    let palette = Palette::default();
    let state = reduce(
        &MarkerState::default(),
        MarkerAction::SymbolizeGroup {
            animal_id: "A1".into(),
            color: "#ff0000".into(),
            apply_to_latest: true,
        },
    );
    let state = reduce(&state, MarkerAction::FocusAnimal("A1".into()));

    for kind in [MarkerKind::Point, MarkerKind::LatestPoint] {
        let resolved = resolve_style(&style_marker(kind, 1, "A1"), &state, &palette);
        assert_eq!(resolved.fill, "#ff0000");
        assert_eq!(resolved.outline, SELECTED_OUTLINE);
    }
}

#[test]
fn dim_overrides_symbolize_of_other_animal() {
    let palette = Palette::default();
    let state = reduce(
        &MarkerState::default(),
        MarkerAction::SymbolizeGroup {
            animal_id: "A2".into(),
            color: "#ff0000".into(),
            apply_to_latest: true,
        },
    );
    let state = reduce(&state, MarkerAction::FocusAnimal("A1".into()));
    let resolved = resolve_style(&style_marker(MarkerKind::Point, 5, "A2"), &state, &palette);
    assert_eq!(resolved.fill, UNASSIGNED_FILL);
}

#[test]
fn opacity_applies_uniformly() {
    let palette = Palette::default();
    let state = reduce(&MarkerState::default(), MarkerAction::SetOpacity(0.35));
    let state = reduce(&state, MarkerAction::FocusAnimal("A1".into()));
    for (kind, animal) in [
        (MarkerKind::Point, "A1"),
        (MarkerKind::Point, "A2"),
        (MarkerKind::LatestPoint, "A2"),
    ] {
        let resolved = resolve_style(&style_marker(kind, 1, animal), &state, &palette);
        assert_relative_eq!(resolved.opacity, 0.35);
    }
}

#[test]
fn partition_and_idempotence() {
    let (mut points, _) = two_animals_twelve_fixes();
    points.push(point(900, "A1", 0.0, 0.0, 20));
    points.push(point(300, "A3", -110.0, 50.0, 2));

    let groups = group(&points, None, &PropertyKey::AnimalId);
    let flat = flatten(&groups);

    let non_sentinel: Vec<&TelemetryPoint> =
        points.iter().filter(|p| !p.coordinates.is_sentinel()).collect();
    assert_eq!(flat.len(), non_sentinel.len());
    let ids: HashSet<&FeatureId> = flat.iter().map(|p| &p.id).collect();
    assert_eq!(ids.len(), flat.len());
    assert!(non_sentinel.iter().all(|p| ids.contains(&p.id)));

    let regrouped = group(&flat, None, &PropertyKey::AnimalId);
    let summary = |gs: &[telemap::grouping::TelemetryGroup]| -> Vec<(String, usize)> {
        gs.iter().map(|g| (g.key.clone(), g.count)).collect()
    };
    assert_eq!(summary(&regrouped), summary(&groups));
    assert_eq!(regrouped, groups);
}

#[test]
fn windowing_latest_and_other_partition_group() {
    let (points, tracks) = two_animals_twelve_fixes();
    let groups = group(&points, None, &PropertyKey::AnimalId);
    let windowed = window_last_n(&groups, &tracks, 10);
    let (latest, other) = split_all(&windowed.groups);

    assert_eq!(latest.len(), windowed.groups.len());
    for g in &windowed.groups {
        let l: Vec<_> = latest.iter().filter(|p| p.animal_key() == g.key).collect();
        let o: Vec<_> = other.iter().filter(|p| p.animal_key() == g.key).collect();
        assert_eq!(l.len(), 1);
        assert!(o.iter().all(|p| p.id != l[0].id));

        let mut union: Vec<_> = l.iter().chain(o.iter()).map(|p| p.id.clone()).collect();
        let mut expected: Vec<_> = g.features.iter().map(|p| p.id.clone()).collect();
        union.sort();
        expected.sort();
        assert_eq!(union, expected);
    }
}

#[test]
fn track_consistency_never_fabricates() {
    let (points, mut tracks) = two_animals_twelve_fixes();
    // a foreign coordinate and a track of an animal without fixes
    tracks[0].coordinates.insert(3, LonLat::new(-1.0, -1.0));
    tracks.push(track(777, "A9", vec![LonLat::new(-120.01, 54.01)]));

    let groups = group(&points, None, &PropertyKey::AnimalId);
    let windowed = window_last_n(&groups, &tracks, 10);

    assert_eq!(windowed.tracks.len(), 2);
    for t in &windowed.tracks {
        let kept: Vec<LonLat> = windowed
            .groups
            .iter()
            .flat_map(|g| g.features.iter())
            .filter(|p| p.animal_key() == t.animal_key())
            .map(|p| p.coordinates)
            .collect();
        assert!(t.coordinates.iter().all(|c| kept.contains(c)));
    }
}

#[test]
fn filter_identity() {
    let (points, tracks) = two_animals_twelve_fixes();
    assert_eq!(apply_filter(&[], &points), points);
    assert_eq!(apply_filter(&[], &tracks), tracks);
}

#[test]
fn end_to_end_scenario_a_on_the_map() {
    let (points, tracks) = two_animals_twelve_fixes();
    let log = Rc::new(RefCell::new(RenderLog::default()));
    let mut map = Telemap::new(MapParams::default());
    map.set_features(points, tracks);

    let report = map.mount(&LayerQuery::windowed(10), attach(&log));
    // 2 tracks, 2 latest points, 18 other points
    assert_eq!(report.examined, 22);
    assert_eq!(map.registry().count(MarkerKind::Track), 2);
    assert_eq!(map.registry().count(MarkerKind::LatestPoint), 2);
    assert_eq!(map.registry().count(MarkerKind::Point), 18);
    assert_eq!(log.borrow().writes(), 0);
}
