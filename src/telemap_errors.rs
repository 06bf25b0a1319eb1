use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemapError {
    #[error("Invalid GeoJSON document: {0}")]
    GeoJsonError(#[from] serde_json::Error),

    #[error("Invalid CSV point export: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Expected a FeatureCollection, found: {0}")]
    NotAFeatureCollection(String),

    #[error("Required CSV column missing: {0}")]
    MissingColumn(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid property key: {0}")]
    InvalidPropertyKey(String),

    #[error("Invalid colour token: {0}")]
    InvalidColorToken(String),

    #[error("Invalid map parameter: {0}")]
    InvalidMapParameter(String),
}

impl PartialEq for TelemapError {
    fn eq(&self, other: &Self) -> bool {
        use TelemapError::*;
        match (self, other) {
            // Wrapped sources are not comparable: equal if same variant
            (GeoJsonError(_), GeoJsonError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (IoError(_), IoError(_)) => true,

            (NotAFeatureCollection(a), NotAFeatureCollection(b)) => a == b,
            (MissingColumn(a), MissingColumn(b)) => a == b,
            (InvalidCoordinate(a), InvalidCoordinate(b)) => a == b,
            (InvalidDate(a), InvalidDate(b)) => a == b,
            (InvalidPropertyKey(a), InvalidPropertyKey(b)) => a == b,
            (InvalidColorToken(a), InvalidColorToken(b)) => a == b,
            (InvalidMapParameter(a), InvalidMapParameter(b)) => a == b,

            _ => false,
        }
    }
}
