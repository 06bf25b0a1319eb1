//! # Grouping engine
//!
//! Partitions telemetry fixes per animal and derives the windows rendered on the map.
//!
//! ## Overview
//! -----------------
//! * [`group`] – drops `(0, 0)` sentinel fixes and partitions the rest by a [`PropertyKey`]
//!   (the animal id by default), in first-seen order, with an optional **stable** sort.
//! * [`flatten`] – concatenates the groups back into a flat list, group by group.
//! * [`window`](crate::grouping::window) – latest-fix split and "last N fixes" windowing,
//!   including value-matching of tracks against the kept fixes.
//! * [`stats`](crate::grouping::stats) – size statistics over a group set.
//!
//! ## Invariants
//! -----------------
//! * Every non-sentinel input fix lands in exactly one group.
//! * `group(flatten(group(f))) == group(f)` for the default grouping key.
//! * Groups and the fixes inside them keep their discovery order unless a sort is requested.
use tracing::debug;

use crate::constants::{AnimalId, FastHashMap, FeatureId, Fixes};
use crate::features::{PropertyKey, TelemetryPoint};

pub mod stats;
pub mod window;

/// The fixes of one grouping key, with the identifiers of its first fix.
///
/// Fields
/// -----------------
/// * `key` – value of the grouping field; the empty string gathers fixes where it is null.
/// * `animal_id`, `device_id`, `collar_id` – copied from the first fix of the group.
/// * `count` – number of fixes, always `features.len()`.
/// * `features` – the fixes in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryGroup {
    pub key: String,
    pub animal_id: Option<AnimalId>,
    pub device_id: Option<FeatureId>,
    pub collar_id: Option<FeatureId>,
    pub count: usize,
    pub features: Fixes,
}

impl TelemetryGroup {
    fn open(key: String, first: &TelemetryPoint) -> Self {
        TelemetryGroup {
            key,
            animal_id: first.properties.animal_id.clone(),
            device_id: first.properties.device_id.clone(),
            collar_id: first.properties.collar_id.clone(),
            count: 0,
            features: Fixes::new(),
        }
    }

    fn push(&mut self, point: TelemetryPoint) {
        self.features.push(point);
        self.count = self.features.len();
    }

    /// Replace the fixes of the group, keeping `count` in sync.
    pub(crate) fn with_features(&self, features: Fixes) -> Self {
        TelemetryGroup {
            key: self.key.clone(),
            animal_id: self.animal_id.clone(),
            device_id: self.device_id.clone(),
            collar_id: self.collar_id.clone(),
            count: features.len(),
            features,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Partition fixes into per-key groups.
///
/// Arguments
/// -----------------
/// * `features` – the raw fixes, sentinels included.
/// * `sort` – optional field of each group's **first** fix to sort the groups by (ascending,
///   stable: ties keep discovery order).
/// * `group_by` – field whose value partitions the fixes ([`PropertyKey::AnimalId`] by default).
///
/// Return
/// ----------
/// * The groups, in first-seen order unless `sort` is given. Empty input yields no groups.
///
/// See also
/// ------------
/// * [`flatten`] – Inverse operation.
/// * [`window::window_last_n`] – Windowing over the groups.
pub fn group<'a, I>(
    features: I,
    sort: Option<&PropertyKey>,
    group_by: &PropertyKey,
) -> Vec<TelemetryGroup>
where
    I: IntoIterator<Item = &'a TelemetryPoint>,
{
    let mut groups: Vec<TelemetryGroup> = Vec::new();
    let mut index: FastHashMap<String, usize> = FastHashMap::default();
    let mut sentinels = 0usize;

    for point in features {
        if point.coordinates.is_sentinel() {
            sentinels += 1;
            continue;
        }
        let key = point.properties.code_value(group_by).unwrap_or_default();
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(TelemetryGroup::open(key, point));
                groups.len() - 1
            }
        };
        groups[slot].push(point.clone());
    }

    if let Some(field) = sort {
        groups.sort_by(|a, b| {
            let lhs = a.features[0].properties.field_value(field);
            let rhs = b.features[0].properties.field_value(field);
            lhs.total_cmp(&rhs)
        });
    }

    debug!(
        "grouped fixes by {group_by}: {} groups, {sentinels} sentinel fixes excluded",
        groups.len()
    );
    groups
}

/// Concatenate the fixes of every group, in group order.
pub fn flatten(groups: &[TelemetryGroup]) -> Vec<TelemetryPoint> {
    groups
        .iter()
        .flat_map(|g| g.features.iter().cloned())
        .collect()
}
