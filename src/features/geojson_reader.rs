//! # GeoJSON reader for telemetry features
//!
//! Decodes the `FeatureCollection` documents served by the data-fetch layer into
//! [`TelemetryPoint`]s (`Point` geometries) and [`TelemetryTrack`]s (`LineString` geometries).
//!
//! ## Expected shape
//! -----------------
//! ```text
//! { "type": "FeatureCollection",
//!   "features": [
//!     { "id": 7, "geometry": { "type": "Point", "coordinates": [-122.1, 54.3] },
//!       "properties": { "animal_id": "A1", "device_id": 101, "collar_id": "c-9",
//!                       "date_recorded": "2021-01-01T00:00:00", "status_code": "Alive",
//!                       "map_colour": "#00ff44,#ffffff", "population_unit": "Hart Ranges" } } ] }
//! ```
//!
//! A bare JSON array of features is accepted too.
//!
//! ## Error Handling
//! -----------------
//! - A document that is not JSON, or whose root is neither a collection nor an array, is a
//!   contract violation and returns a [`TelemapError`].
//! - A single feature without a usable geometry, or whose geometry does not match the
//!   requested layer, is skipped with a `warn`; the rest of the document is still ingested.
//! - Identifying properties of an unexpected JSON type never drop a fix. Scalars are read as
//!   text (negative or fractional ids become string ids), containers default to `None`, and
//!   a `date_recorded` that is not a date string becomes `None`.
//! - A missing feature `id` falls back to the feature's position in the document.
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::constants::FeatureId;
use crate::features::{LonLat, TelemetryPoint, TelemetryProperties, TelemetryTrack};
use crate::telemap_errors::TelemapError;
use crate::time::parse_date_lenient;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum RawGeometry {
    Point(LonLat),
    LineString(Vec<LonLat>),
}

#[derive(Debug, Default, Deserialize)]
struct RawProperties {
    #[serde(default, deserialize_with = "lenient_id")]
    animal_id: Option<FeatureId>,
    #[serde(default, deserialize_with = "lenient_id")]
    device_id: Option<FeatureId>,
    #[serde(default, deserialize_with = "lenient_id")]
    collar_id: Option<FeatureId>,
    #[serde(default, deserialize_with = "lenient_text")]
    date_recorded: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    status_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    category_color_token: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<FeatureId>,
    geometry: Option<RawGeometry>,
    #[serde(default, deserialize_with = "lenient_properties")]
    properties: Option<RawProperties>,
}

/// Scalar JSON value as a code string; containers are not codes.
fn scalar_code(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        Value::Number(n) => Some(Some(n.to_string())),
        Value::Bool(b) => Some(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Any scalar as text; containers and `null` become `None`.
fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_code(&value).flatten())
}

/// Any scalar as a [`FeatureId`]: unsigned integers stay numeric, the rest become strings.
fn lenient_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<FeatureId>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_code(&value).flatten().map(|raw| FeatureId::from_raw(&raw)))
}

/// A `properties` member that is not an object decodes as absent.
fn lenient_properties<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RawProperties>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl From<RawProperties> for TelemetryProperties {
    fn from(raw: RawProperties) -> Self {
        let RawProperties {
            animal_id,
            device_id,
            collar_id,
            date_recorded,
            status_code,
            category_color_token,
            mut extra,
        } = raw;

        // Wire aliases, resolved by hand so they survive the flattened map.
        let animal_id = animal_id
            .or_else(|| {
                extra
                    .remove("critter_id")
                    .and_then(|v| scalar_code(&v).flatten())
                    .map(|raw| FeatureId::from_raw(&raw))
            })
            .map(|id| id.to_string());
        let category_color_token = category_color_token.or_else(|| {
            extra
                .remove("map_colour")
                .and_then(|v| scalar_code(&v).flatten())
        });

        let codes = extra
            .iter()
            .filter_map(|(k, v)| scalar_code(v).map(|code| (k.clone(), code)))
            .collect();

        TelemetryProperties {
            animal_id,
            device_id,
            collar_id,
            date_recorded: parse_date_lenient(date_recorded.as_deref()),
            status_code,
            category_color_token,
            codes,
        }
    }
}

/// Split a document into its raw feature values.
fn collection_features(json: &str) -> Result<Vec<Value>, TelemapError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(features) => Ok(features),
        Value::Object(mut root) => {
            let kind = root.get("type").and_then(Value::as_str).unwrap_or("");
            if kind != "FeatureCollection" {
                return Err(TelemapError::NotAFeatureCollection(kind.to_string()));
            }
            match root.remove("features") {
                Some(Value::Array(features)) => Ok(features),
                Some(Value::Null) | None => Ok(Vec::new()),
                Some(other) => Err(TelemapError::NotAFeatureCollection(other.to_string())),
            }
        }
        other => Err(TelemapError::NotAFeatureCollection(other.to_string())),
    }
}

type DecodedFeature = (FeatureId, RawGeometry, TelemetryProperties);

/// Decode every feature, skipping the ones that do not parse.
fn decode_features(json: &str) -> Result<Vec<DecodedFeature>, TelemapError> {
    let features = collection_features(json)?;
    let mut decoded = Vec::with_capacity(features.len());

    for (index, value) in features.into_iter().enumerate() {
        let raw: RawFeature = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("skipping undecodable feature #{index}: {err}");
                continue;
            }
        };
        let Some(geometry) = raw.geometry else {
            warn!("skipping feature #{index} without geometry");
            continue;
        };
        let id = raw.id.unwrap_or(FeatureId::Int(index as u64));
        let properties = raw.properties.map(Into::into).unwrap_or_default();
        decoded.push((id, geometry, properties));
    }

    Ok(decoded)
}

/// Decode the `Point` features of a GeoJSON document.
///
/// Arguments
/// -----------------
/// * `json` – a `FeatureCollection` (or bare feature array) as text.
///
/// Return
/// ----------
/// * `Ok(Vec<TelemetryPoint>)` in document order; `(0, 0)` sentinel fixes are kept.
/// * `Err(TelemapError)` if the document itself is malformed.
pub fn parse_points(json: &str) -> Result<Vec<TelemetryPoint>, TelemapError> {
    Ok(decode_features(json)?
        .into_iter()
        .filter_map(|(id, geometry, properties)| match geometry {
            RawGeometry::Point(coordinates) => Some(TelemetryPoint {
                id,
                coordinates,
                properties,
            }),
            RawGeometry::LineString(_) => {
                warn!("skipping LineString feature {id} in a point layer");
                None
            }
        })
        .collect())
}

/// Decode the `LineString` features of a GeoJSON document.
///
/// Return
/// ----------
/// * `Ok(Vec<TelemetryTrack>)` in document order.
/// * `Err(TelemapError)` if the document itself is malformed.
pub fn parse_tracks(json: &str) -> Result<Vec<TelemetryTrack>, TelemapError> {
    Ok(decode_features(json)?
        .into_iter()
        .filter_map(|(id, geometry, properties)| match geometry {
            RawGeometry::LineString(coordinates) => Some(TelemetryTrack {
                id,
                coordinates,
                properties,
            }),
            RawGeometry::Point(_) => {
                warn!("skipping Point feature {id} in a track layer");
                None
            }
        })
        .collect())
}
