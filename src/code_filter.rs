//! # Code filter engine
//!
//! Boolean filter over the category/code fields of a feature layer.
//!
//! ## Semantics
//! -----------------
//! A feature passes a [`CategoryFilter`] when its value for the filter's key is one of the
//! allowed codes, or when the value is null/blank and the filter allows [`BLANK_CODE`].
//! Filters are **OR within a category** and **AND across categories**:
//!
//! ```text
//! passes(f) = ∀ filter ∈ filters: value(f, filter.key) ∈ filter.allowed
//! ```
//!
//! An empty filter list is the identity. A filter with an empty allowed list lets nothing
//! through.
//!
//! The engine works on anything implementing [`CodeFields`], so the same filters apply to the
//! point and track layers.
use itertools::Itertools;

use crate::constants::BLANK_CODE;
use crate::features::{CodeFields, PropertyKey};

/// Allowed codes of one category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryFilter {
    pub key: PropertyKey,
    pub allowed: Vec<String>,
}

impl CategoryFilter {
    pub fn new<S: Into<String>>(key: PropertyKey, allowed: impl IntoIterator<Item = S>) -> Self {
        CategoryFilter {
            key,
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a single feature passes this category.
    pub fn matches<T: CodeFields + ?Sized>(&self, feature: &T) -> bool {
        match feature.code_value(&self.key) {
            Some(value) => self.allowed.iter().any(|code| *code == value),
            None => self.allowed.iter().any(|code| code == BLANK_CODE),
        }
    }
}

/// Whether `feature` passes every filter.
pub fn passes<T: CodeFields + ?Sized>(filters: &[CategoryFilter], feature: &T) -> bool {
    filters.iter().all(|filter| filter.matches(feature))
}

/// Keep the features that pass every category filter, in input order.
///
/// Arguments
/// -----------------
/// * `filters` – the category filters; an empty slice keeps everything.
/// * `features` – a point or track layer.
///
/// Return
/// ----------
/// * A new vector with the passing features.
pub fn apply_filter<T: CodeFields + Clone>(filters: &[CategoryFilter], features: &[T]) -> Vec<T> {
    if filters.is_empty() {
        return features.to_vec();
    }
    features
        .iter()
        .filter(|f| passes(filters, *f))
        .cloned()
        .collect()
}

/// Fold flat `(key, code)` UI selections into one [`CategoryFilter`] per key.
///
/// Categories appear in first-seen order; codes keep their selection order and duplicates
/// are dropped.
pub fn group_selections<I>(selections: I) -> Vec<CategoryFilter>
where
    I: IntoIterator<Item = (PropertyKey, String)>,
{
    let selections: Vec<(PropertyKey, String)> = selections.into_iter().collect();
    let keys: Vec<&PropertyKey> = selections.iter().map(|(k, _)| k).unique().collect();

    keys.into_iter()
        .map(|key| CategoryFilter {
            key: key.clone(),
            allowed: selections
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, code)| code.clone())
                .unique()
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod code_filter_test {
    use std::collections::BTreeMap;

    use super::*;
    use crate::features::{LonLat, TelemetryPoint, TelemetryProperties, TelemetryTrack};

    fn point(id: u64, unit: Option<&str>, status: Option<&str>) -> TelemetryPoint {
        let mut codes = BTreeMap::new();
        codes.insert("population_unit".to_string(), unit.map(str::to_string));
        TelemetryPoint::new(
            id,
            LonLat::new(-1.0, 1.0),
            TelemetryProperties {
                status_code: status.map(str::to_string),
                codes,
                ..Default::default()
            },
        )
    }

    fn unit() -> PropertyKey {
        PropertyKey::Code("population_unit".into())
    }

    fn layer() -> Vec<TelemetryPoint> {
        vec![
            point(1, Some("Hart"), Some("Alive")),
            point(2, Some("Moberly"), Some("Mortality")),
            point(3, None, Some("Alive")),
            point(4, Some(""), None),
        ]
    }

    fn ids(points: &[TelemetryPoint]) -> Vec<String> {
        points.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_empty_filters_is_identity() {
        assert_eq!(apply_filter(&[], &layer()), layer());
    }

    #[test]
    fn test_or_within_category() {
        let filters = [CategoryFilter::new(unit(), ["Hart", "Moberly"])];
        assert_eq!(ids(&apply_filter(&filters, &layer())), vec!["1", "2"]);
    }

    #[test]
    fn test_blank_token() {
        let filters = [CategoryFilter::new(unit(), [BLANK_CODE])];
        assert_eq!(ids(&apply_filter(&filters, &layer())), vec!["3", "4"]);
    }

    #[test]
    fn test_and_across_categories() {
        let filters = [
            CategoryFilter::new(unit(), ["Hart", BLANK_CODE]),
            CategoryFilter::new(PropertyKey::StatusCode, ["Alive"]),
        ];
        assert_eq!(ids(&apply_filter(&filters, &layer())), vec!["1", "3"]);
    }

    #[test]
    fn test_empty_allowed_list_rejects_all() {
        let filters = [CategoryFilter::new(unit(), Vec::<String>::new())];
        assert!(apply_filter(&filters, &layer()).is_empty());
    }

    #[test]
    fn test_filter_tracks() {
        let track = TelemetryTrack::new(
            7u64,
            vec![LonLat::new(1.0, 1.0)],
            TelemetryProperties {
                status_code: Some("Alive".into()),
                ..Default::default()
            },
        );
        let filters = [CategoryFilter::new(PropertyKey::StatusCode, ["Alive"])];
        assert_eq!(apply_filter(&filters, &[track.clone()]), vec![track]);
    }

    #[test]
    fn test_group_selections() {
        let filters = group_selections(vec![
            (PropertyKey::StatusCode, "Alive".to_string()),
            (unit(), "Hart".to_string()),
            (PropertyKey::StatusCode, "Mortality".to_string()),
            (PropertyKey::StatusCode, "Alive".to_string()),
        ]);
        assert_eq!(
            filters,
            vec![
                CategoryFilter::new(PropertyKey::StatusCode, ["Alive", "Mortality"]),
                CategoryFilter::new(unit(), ["Hart"]),
            ]
        );
    }
}
