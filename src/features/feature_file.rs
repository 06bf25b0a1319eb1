//! # Feature ingestion helpers
//!
//! Constructors that **create** a layer from a source (`new_from_*`) and appenders that
//! **extend** an existing one (`add_from_*`), implemented directly on `Vec<TelemetryPoint>`
//! and `Vec<TelemetryTrack>`.
//!
//! ## Sources
//! -----------------
//! - GeoJSON text or file, for both points and tracks ([`FeatureFile`]).
//! - CSV exports, points only ([`PointFile`]).
//!
//! ## Duplicates & ordering
//! -----------------
//! - **No deduplication** is performed by any `add_*` method; re-ingesting the same document
//!   produces duplicate ids, which the marker registry later skips with a `warn`.
//! - Features are appended in document order.
//!
//! ## See also
//! ------------
//! * [`parse_points`] / [`parse_tracks`] – Underlying GeoJSON decoding.
//! * [`read_points_csv`] – Underlying CSV decoding.
use std::fs::File;

use camino::Utf8Path;
use tracing::debug;

use super::csv_reader::read_points_csv;
use super::geojson_reader::{parse_points, parse_tracks};
use super::{TelemetryPoint, TelemetryTrack};
use crate::telemap_errors::TelemapError;

/// Build or extend a feature layer from GeoJSON.
///
/// The `*_file` variants read the whole file and delegate to the text variants.
pub trait FeatureFile: Sized {
    /// Decode a GeoJSON document into a new layer.
    ///
    /// Arguments
    /// -----------------
    /// * `json` – a `FeatureCollection` (or bare feature array) as text.
    ///
    /// Return
    /// ----------
    /// * the decoded layer, or a [`TelemapError`] if the document is malformed.
    fn new_from_geojson(json: &str) -> Result<Self, TelemapError>;

    /// Append the features of a GeoJSON document to this layer.
    fn add_from_geojson(&mut self, json: &str) -> Result<(), TelemapError>;

    /// Read a GeoJSON file into a new layer.
    fn new_from_geojson_file(path: &Utf8Path) -> Result<Self, TelemapError> {
        let json = std::fs::read_to_string(path)?;
        Self::new_from_geojson(&json)
    }

    /// Append the features of a GeoJSON file to this layer.
    fn add_from_geojson_file(&mut self, path: &Utf8Path) -> Result<(), TelemapError> {
        let json = std::fs::read_to_string(path)?;
        self.add_from_geojson(&json)
    }
}

impl FeatureFile for Vec<TelemetryPoint> {
    fn new_from_geojson(json: &str) -> Result<Self, TelemapError> {
        let points = parse_points(json)?;
        debug!("loaded {} telemetry points", points.len());
        Ok(points)
    }

    fn add_from_geojson(&mut self, json: &str) -> Result<(), TelemapError> {
        self.extend(parse_points(json)?);
        Ok(())
    }
}

impl FeatureFile for Vec<TelemetryTrack> {
    fn new_from_geojson(json: &str) -> Result<Self, TelemapError> {
        let tracks = parse_tracks(json)?;
        debug!("loaded {} telemetry tracks", tracks.len());
        Ok(tracks)
    }

    fn add_from_geojson(&mut self, json: &str) -> Result<(), TelemapError> {
        self.extend(parse_tracks(json)?);
        Ok(())
    }
}

/// Build or extend a point layer from a CSV export.
///
/// Note
/// ----
/// * Required columns are `longitude` and `latitude`; see
///   [`csv_reader`](crate::features::csv_reader) for the full column set.
pub trait PointFile: Sized {
    fn new_from_csv(path: &Utf8Path) -> Result<Self, TelemapError>;

    fn add_from_csv(&mut self, path: &Utf8Path) -> Result<(), TelemapError>;
}

impl PointFile for Vec<TelemetryPoint> {
    fn new_from_csv(path: &Utf8Path) -> Result<Self, TelemapError> {
        read_points_csv(File::open(path)?)
    }

    fn add_from_csv(&mut self, path: &Utf8Path) -> Result<(), TelemapError> {
        self.extend(read_points_csv(File::open(path)?)?);
        Ok(())
    }
}
