//! # CSV reader for point exports
//!
//! Minimal reader for flat telemetry exports, one fix per row.
//!
//! ## Expected columns
//! -----------------
//! - `longitude`, `latitude` – required, decimal degrees.
//! - `id` – optional; falls back to the row index.
//! - `animal_id` (or `critter_id`), `device_id`, `collar_id`, `date_recorded`, `status_code`,
//!   `map_colour` (or `category_color_token`) – optional.
//! - Any other column is kept as a category code on [`TelemetryProperties::codes`].
//!
//! Columns are resolved by **name** once from the header, then by **index** per row.
//! Empty cells read as null.
//!
//! ## Error Handling
//! -----------------
//! - A missing coordinate column returns [`TelemapError::MissingColumn`]; a structurally
//!   broken CSV returns [`TelemapError::CsvError`].
//! - A row whose coordinates do not parse is skipped with a `warn`.
use std::collections::BTreeMap;
use std::io;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::warn;

use crate::constants::FeatureId;
use crate::features::{LonLat, TelemetryPoint, TelemetryProperties};
use crate::telemap_errors::TelemapError;
use crate::time::parse_date_lenient;

/// Column positions resolved from the header row.
#[derive(Debug, Default)]
struct Columns {
    id: Option<usize>,
    lon: usize,
    lat: usize,
    animal_id: Option<usize>,
    device_id: Option<usize>,
    collar_id: Option<usize>,
    date_recorded: Option<usize>,
    status_code: Option<usize>,
    color_token: Option<usize>,
    codes: Vec<(usize, String)>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self, TelemapError> {
        let mut lon = None;
        let mut lat = None;
        let mut columns = Columns::default();

        for (idx, name) in header.iter().enumerate() {
            match name {
                "id" => columns.id = Some(idx),
                "longitude" | "lon" => lon = Some(idx),
                "latitude" | "lat" => lat = Some(idx),
                "animal_id" | "critter_id" => columns.animal_id = Some(idx),
                "device_id" => columns.device_id = Some(idx),
                "collar_id" => columns.collar_id = Some(idx),
                "date_recorded" => columns.date_recorded = Some(idx),
                "status_code" => columns.status_code = Some(idx),
                "map_colour" | "category_color_token" => columns.color_token = Some(idx),
                other => columns.codes.push((idx, other.to_string())),
            }
        }

        let missing = |c: &str| TelemapError::MissingColumn(c.to_string());
        columns.lon = lon.ok_or_else(|| missing("longitude"))?;
        columns.lat = lat.ok_or_else(|| missing("latitude"))?;
        Ok(columns)
    }
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_row(record: &StringRecord, columns: &Columns, row: usize) -> Option<TelemetryPoint> {
    let lon = record.get(columns.lon)?.parse::<f64>().ok()?;
    let lat = record.get(columns.lat)?.parse::<f64>().ok()?;
    let coordinates = LonLat::try_from(vec![lon, lat]).ok()?;

    let id_of = |idx| cell(record, idx).map(|v| FeatureId::from_raw(&v));

    let codes: BTreeMap<String, Option<String>> = columns
        .codes
        .iter()
        .map(|(idx, name)| (name.clone(), cell(record, Some(*idx))))
        .collect();

    Some(TelemetryPoint {
        id: id_of(columns.id).unwrap_or(FeatureId::Int(row as u64)),
        coordinates,
        properties: TelemetryProperties {
            animal_id: cell(record, columns.animal_id),
            device_id: id_of(columns.device_id),
            collar_id: id_of(columns.collar_id),
            date_recorded: parse_date_lenient(cell(record, columns.date_recorded).as_deref()),
            status_code: cell(record, columns.status_code),
            category_color_token: cell(record, columns.color_token),
            codes,
        },
    })
}

/// Read telemetry points from a CSV export.
///
/// Arguments
/// -----------------
/// * `reader` – any byte source (file, buffer, HTTP body).
///
/// Return
/// ----------
/// * `Ok(Vec<TelemetryPoint>)` in row order; `(0, 0)` sentinel fixes are kept.
/// * `Err(TelemapError)` if the header lacks coordinates or the CSV is malformed.
pub fn read_points_csv<R: io::Read>(reader: R) -> Result<Vec<TelemetryPoint>, TelemapError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::from_header(rdr.headers()?)?;

    let mut points = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        match parse_row(&record, &columns, row) {
            Some(point) => points.push(point),
            None => warn!("skipping CSV row {row}: unreadable coordinates"),
        }
    }
    Ok(points)
}

#[cfg(test)]
mod csv_reader_test {
    use super::*;

    const EXPORT: &str = "\
id,animal_id,device_id,collar_id,date_recorded,status_code,map_colour,longitude,latitude,species
10,A1,101,c-1,2021-01-01T00:00:00,Alive,\"#00ff44,#ffffff\",-122.5,54.1,Caribou
11,A1,101,c-1,2021-01-02T00:00:00,,,-122.6,54.2,
12,A2,abc,,2021-01-02T00:00:00,Mortality,,north,54.2,Moose
,A2,102,,,,,0,0,Moose
";

    #[test]
    fn test_read_points_csv() {
        let points = read_points_csv(EXPORT.as_bytes()).unwrap();
        assert_eq!(points.len(), 3);

        let first = &points[0];
        assert_eq!(first.id, FeatureId::Int(10));
        assert_eq!(first.coordinates, LonLat::new(-122.5, 54.1));
        assert_eq!(first.properties.animal_id.as_deref(), Some("A1"));
        assert_eq!(first.properties.device_id, Some(FeatureId::Int(101)));
        assert_eq!(first.properties.collar_id, Some(FeatureId::String("c-1".into())));
        assert_eq!(
            first.properties.category_color_token.as_deref(),
            Some("#00ff44,#ffffff")
        );
        assert_eq!(
            first.properties.codes.get("species"),
            Some(&Some("Caribou".to_string()))
        );

        let second = &points[1];
        assert_eq!(second.properties.status_code, None);
        assert_eq!(second.properties.codes.get("species"), Some(&None));

        // Row 2 has an unreadable longitude; row 3 falls back to its index for the id.
        let sentinel = &points[2];
        assert_eq!(sentinel.id, FeatureId::Int(3));
        assert!(sentinel.coordinates.is_sentinel());
        assert!(sentinel.properties.date_recorded.is_none());
    }

    #[test]
    fn test_missing_coordinate_column() {
        let err = read_points_csv("id,animal_id\n1,A1\n".as_bytes()).unwrap_err();
        assert_eq!(err, TelemapError::MissingColumn("longitude".into()));

        let err = read_points_csv("id,lon\n1,-122.5\n".as_bytes()).unwrap_err();
        assert_eq!(err, TelemapError::MissingColumn("latitude".into()));
    }
}
