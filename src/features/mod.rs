//! # Telemetry features: typed model and ingestion
//!
//! Typed representation of the raw location **fixes** and movement **tracks** delivered by
//! the data-fetch layer, plus the readers that turn wire documents into those types.
//!
//! Modules
//! -----------------
//! * [`geojson_reader`](crate::features::geojson_reader) – GeoJSON `FeatureCollection` decoding (points and tracks).
//! * [`csv_reader`](crate::features::csv_reader) – Flat CSV point exports.
//! * [`feature_file`](crate::features::feature_file) – **Public** traits exposing `new_from_*` / `add_from_*`
//!   helpers on `Vec<TelemetryPoint>` and `Vec<TelemetryTrack>`.
//!
//! Data Model
//! -----------------
//! * [`TelemetryPoint`] – one fix: id, `[lon, lat]`, identifying properties.
//! * [`TelemetryTrack`] – ordered coordinates of an animal plus the same properties. Tracks are
//!   fetched independently of points and are only ever matched to them **by value**.
//! * [`TelemetryProperties`] – named properties plus an explicit `code → value` map for every
//!   other category column.
//! * [`PropertyKey`] – closed set of addressable fields, used by grouping, sorting and filtering.
//!
//! Malformed data
//! -----------------
//! Readers never fail on a single bad feature: unparseable dates become `None`, features with
//! an unexpected geometry are skipped with a `warn`, and the `(0, 0)` "no fix" sentinel is kept
//! here and excluded later by [`group`](crate::grouping::group).
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use hifitime::Epoch;
use ordered_float::OrderedFloat;
use serde::Deserialize;

use crate::constants::{AnimalId, FeatureId, Latitude, Longitude};
use crate::telemap_errors::TelemapError;

pub mod csv_reader;
pub mod feature_file;
pub mod geojson_reader;

/// Hashable, value-comparable key of a coordinate pair.
pub type CoordKey = (OrderedFloat<f64>, OrderedFloat<f64>);

/// A `[lon, lat]` position in degrees.
///
/// Deserializes from a GeoJSON position array; extra members (elevation) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct LonLat {
    pub lon: Longitude,
    pub lat: Latitude,
}

impl LonLat {
    pub fn new(lon: Longitude, lat: Latitude) -> Self {
        LonLat { lon, lat }
    }

    /// `(0, 0)` marks a fix without a position.
    pub fn is_sentinel(&self) -> bool {
        self.lon == 0.0 && self.lat == 0.0
    }

    /// Key used to match track coordinates against point coordinates.
    pub fn key(&self) -> CoordKey {
        (OrderedFloat(self.lon), OrderedFloat(self.lat))
    }
}

impl TryFrom<Vec<f64>> for LonLat {
    type Error = TelemapError;

    fn try_from(position: Vec<f64>) -> Result<Self, Self::Error> {
        match position.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok(LonLat::new(*lon, *lat)),
            _ => Err(TelemapError::InvalidCoordinate(format!("{position:?}"))),
        }
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lon, self.lat)
    }
}

/// Addressable field of a feature.
///
/// The named variants map to the typed members of [`TelemetryProperties`]; everything else
/// is looked up in the `codes` map through [`PropertyKey::Code`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    #[default]
    AnimalId,
    DeviceId,
    CollarId,
    DateRecorded,
    StatusCode,
    ColorToken,
    Code(String),
}

impl FromStr for PropertyKey {
    type Err = TelemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Ok(match key {
            "" => return Err(TelemapError::InvalidPropertyKey(s.to_string())),
            "animal_id" | "critter_id" => PropertyKey::AnimalId,
            "device_id" => PropertyKey::DeviceId,
            "collar_id" => PropertyKey::CollarId,
            "date_recorded" => PropertyKey::DateRecorded,
            "status_code" => PropertyKey::StatusCode,
            "category_color_token" | "map_colour" => PropertyKey::ColorToken,
            other => PropertyKey::Code(other.to_string()),
        })
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::AnimalId => write!(f, "animal_id"),
            PropertyKey::DeviceId => write!(f, "device_id"),
            PropertyKey::CollarId => write!(f, "collar_id"),
            PropertyKey::DateRecorded => write!(f, "date_recorded"),
            PropertyKey::StatusCode => write!(f, "status_code"),
            PropertyKey::ColorToken => write!(f, "category_color_token"),
            PropertyKey::Code(name) => write!(f, "{name}"),
        }
    }
}

/// Value of a [`PropertyKey`] on one feature, with a total order for sorting.
///
/// Variants order as `Null < Id < Date < Text`; values of the same variant compare naturally.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Id(FeatureId),
    Date(Epoch),
    Text(String),
}

impl FieldValue {
    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Id(_) => 1,
            FieldValue::Date(_) => 2,
            FieldValue::Text(_) => 3,
        }
    }

    /// Total order used by the stable group sort.
    pub fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (FieldValue::Id(a), FieldValue::Id(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Identifying and category properties of a feature.
///
/// Fields
/// -----------------
/// * `animal_id` – grouping key of the animal wearing the device (`None` when unassigned).
/// * `device_id`, `collar_id` – hardware identifiers.
/// * `date_recorded` – fix timestamp (UTC); `None` if absent or unparseable.
/// * `status_code` – animal status (e.g. `"Alive"`, `"Mortality"`).
/// * `category_color_token` – `"fill,outline"` colour pair, split at the last comma.
/// * `codes` – every other scalar property, keyed by its wire name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryProperties {
    pub animal_id: Option<AnimalId>,
    pub device_id: Option<FeatureId>,
    pub collar_id: Option<FeatureId>,
    pub date_recorded: Option<Epoch>,
    pub status_code: Option<String>,
    pub category_color_token: Option<String>,
    pub codes: BTreeMap<String, Option<String>>,
}

impl TelemetryProperties {
    /// Animal identifier, or the empty string for unassigned devices.
    pub fn animal_key(&self) -> &str {
        self.animal_id.as_deref().unwrap_or("")
    }

    /// Typed value of `key`, used for sorting.
    pub fn field_value(&self, key: &PropertyKey) -> FieldValue {
        let text = |v: &Option<String>| match v {
            Some(s) => FieldValue::Text(s.clone()),
            None => FieldValue::Null,
        };
        let id = |v: &Option<FeatureId>| match v {
            Some(id) => FieldValue::Id(id.clone()),
            None => FieldValue::Null,
        };
        match key {
            PropertyKey::AnimalId => text(&self.animal_id),
            PropertyKey::DeviceId => id(&self.device_id),
            PropertyKey::CollarId => id(&self.collar_id),
            PropertyKey::DateRecorded => match self.date_recorded {
                Some(epoch) => FieldValue::Date(epoch),
                None => FieldValue::Null,
            },
            PropertyKey::StatusCode => text(&self.status_code),
            PropertyKey::ColorToken => text(&self.category_color_token),
            PropertyKey::Code(name) => match self.codes.get(name) {
                Some(Some(value)) => FieldValue::Text(value.clone()),
                _ => FieldValue::Null,
            },
        }
    }

    /// String form of `key`, used for grouping and code filtering.
    ///
    /// Null and empty values both yield `None`.
    pub fn code_value(&self, key: &PropertyKey) -> Option<String> {
        let value = match self.field_value(key) {
            FieldValue::Null => return None,
            FieldValue::Id(id) => id.to_string(),
            FieldValue::Date(epoch) => epoch.to_string(),
            FieldValue::Text(text) => text,
        };
        (!value.trim().is_empty()).then_some(value)
    }
}

/// Access to the category/code fields of a feature.
///
/// Implemented by points and tracks so the same filter applies to both layers.
pub trait CodeFields {
    fn properties(&self) -> &TelemetryProperties;

    fn code_value(&self, key: &PropertyKey) -> Option<String> {
        self.properties().code_value(key)
    }
}

/// One recorded location/time sample of a tracking device.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPoint {
    pub id: FeatureId,
    pub coordinates: LonLat,
    pub properties: TelemetryProperties,
}

impl TelemetryPoint {
    pub fn new(
        id: impl Into<FeatureId>,
        coordinates: LonLat,
        properties: TelemetryProperties,
    ) -> Self {
        TelemetryPoint {
            id: id.into(),
            coordinates,
            properties,
        }
    }

    pub fn animal_key(&self) -> &str {
        self.properties.animal_key()
    }
}

impl CodeFields for TelemetryPoint {
    fn properties(&self) -> &TelemetryProperties {
        &self.properties
    }
}

/// The ordered polyline of an animal's fixes over a time window.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryTrack {
    pub id: FeatureId,
    pub coordinates: Vec<LonLat>,
    pub properties: TelemetryProperties,
}

impl TelemetryTrack {
    pub fn new(
        id: impl Into<FeatureId>,
        coordinates: Vec<LonLat>,
        properties: TelemetryProperties,
    ) -> Self {
        TelemetryTrack {
            id: id.into(),
            coordinates,
            properties,
        }
    }

    pub fn animal_key(&self) -> &str {
        self.properties.animal_key()
    }
}

impl CodeFields for TelemetryTrack {
    fn properties(&self) -> &TelemetryProperties {
        &self.properties
    }
}
