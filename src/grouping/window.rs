//! # Latest-fix split and "last N fixes" windowing
//!
//! ## Overview
//! -----------------
//! * [`split`] / [`split_all`] – separate the most recent fix of each animal (rendered as a
//!   distinct latest-point marker) from the rest of its fixes.
//! * [`window_last_n`] – keep the `n` most recent fixes per group, then trim each animal's
//!   track to the coordinates of the kept fixes.
//!
//! ## Tie-breaking
//! -----------------
//! * The latest fix is the one with the maximum `date_recorded`; on equal dates the **first**
//!   one in group order wins. Undated fixes never beat a dated one.
//! * "Other" is computed by removing the latest fix **by id**, so two fixes sharing the latest
//!   timestamp never both disappear from the "other" set.
//! * Windowing sorts by date **descending** with a stable sort, so equal dates keep group order.
//!
//! ## Track consistency
//! -----------------
//! Points and tracks are fetched independently. A track coordinate is kept only if it is
//! value-equal (bit-for-bit `f64` on both axes) to a kept fix of the same animal; no coordinate
//! is ever fabricated. A track whose animal has no kept fix, or whose trimmed coordinate list
//! is empty, is dropped.
use std::cmp::Ordering;

use tracing::debug;

use super::TelemetryGroup;
use crate::constants::{FastHashMap, FastHashSet, Fixes};
use crate::features::{CoordKey, TelemetryPoint, TelemetryTrack};

/// Split one group into its latest fix and the other fixes.
///
/// Return
/// ----------
/// * `(None, [])` for an empty group.
/// * `(Some(latest), other)` otherwise, with `other` in group order.
pub fn split(group: &TelemetryGroup) -> (Option<TelemetryPoint>, Vec<TelemetryPoint>) {
    let mut latest: Option<&TelemetryPoint> = None;
    for point in &group.features {
        let newer = match latest {
            None => true,
            Some(best) => {
                point.properties.date_recorded.partial_cmp(&best.properties.date_recorded)
                    == Some(Ordering::Greater)
            }
        };
        if newer {
            latest = Some(point);
        }
    }

    let Some(latest) = latest else {
        return (None, Vec::new());
    };
    let other = group
        .features
        .iter()
        .filter(|p| p.id != latest.id)
        .cloned()
        .collect();
    (Some(latest.clone()), other)
}

/// Apply [`split`] to every group.
///
/// Return
/// ----------
/// * `(latest, other)` – one latest fix per non-empty group, and all remaining fixes, both in
///   group order.
pub fn split_all(groups: &[TelemetryGroup]) -> (Vec<TelemetryPoint>, Vec<TelemetryPoint>) {
    let mut latest = Vec::with_capacity(groups.len());
    let mut other = Vec::new();
    for group in groups {
        let (last, rest) = split(group);
        latest.extend(last);
        other.extend(rest);
    }
    (latest, other)
}

/// Result of [`window_last_n`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowedLayers {
    pub groups: Vec<TelemetryGroup>,
    pub tracks: Vec<TelemetryTrack>,
}

fn window_group(group: &TelemetryGroup, n: usize) -> TelemetryGroup {
    if group.count < n {
        return group.clone();
    }
    let mut features: Fixes = group.features.clone();
    // stable: equal dates keep group order
    features.sort_by(|a, b| {
        b.properties
            .date_recorded
            .partial_cmp(&a.properties.date_recorded)
            .unwrap_or(Ordering::Equal)
    });
    features.truncate(n);
    group.with_features(features)
}

/// Keep the last `n` fixes of each group and trim tracks to match.
///
/// Arguments
/// -----------------
/// * `groups` – output of [`group`](crate::grouping::group).
/// * `tracks` – the track layer, matched to groups through the animal id.
/// * `n` – window size (10 on the live map).
///
/// Return
/// ----------
/// * A [`WindowedLayers`] with:
///   * groups of at most `n - 1` fixes returned unchanged,
///   * larger groups reduced to their `n` most recent fixes, most recent first,
///   * each track reduced to the coordinates of its animal's kept fixes, in track order.
///
/// See also
/// ------------
/// * [`split_all`] – Usually applied to the windowed groups to extract latest fixes.
pub fn window_last_n(
    groups: &[TelemetryGroup],
    tracks: &[TelemetryTrack],
    n: usize,
) -> WindowedLayers {
    let groups: Vec<TelemetryGroup> = groups.iter().map(|g| window_group(g, n)).collect();

    let mut kept: FastHashMap<&str, FastHashSet<CoordKey>> = FastHashMap::default();
    for point in groups.iter().flat_map(|g| g.features.iter()) {
        kept.entry(point.animal_key())
            .or_default()
            .insert(point.coordinates.key());
    }

    let tracks: Vec<TelemetryTrack> = tracks
        .iter()
        .filter_map(|track| {
            let allowed = kept.get(track.animal_key())?;
            let coordinates: Vec<_> = track
                .coordinates
                .iter()
                .filter(|c| allowed.contains(&c.key()))
                .copied()
                .collect();
            (!coordinates.is_empty()).then(|| TelemetryTrack {
                id: track.id.clone(),
                coordinates,
                properties: track.properties.clone(),
            })
        })
        .collect();

    debug!(
        "windowed {} groups to the last {n} fixes, {} tracks kept",
        groups.len(),
        tracks.len()
    );
    WindowedLayers { groups, tracks }
}
