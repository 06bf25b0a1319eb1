use hifitime::Epoch;
use std::str::FromStr;

use crate::telemap_errors::TelemapError;

/// Parse a `date_recorded` value into an [`Epoch`] (UTC).
///
/// Accepted shapes
/// -----------------
/// * `YYYY-MM-DDTHH:mm:ss` with optional fractional seconds
/// * the same with a space instead of `T`
/// * a trailing `Z` or `+00:00` UTC designator
/// * a bare `YYYY-MM-DD` date (midnight UTC)
///
/// Argument
/// --------
/// * `date`: the raw string as emitted by the backend
///
/// Return
/// ------
/// * the parsed epoch, or [`TelemapError::InvalidDate`]
pub fn parse_date_recorded(date: &str) -> Result<Epoch, TelemapError> {
    let trimmed = date.trim();
    if trimmed.is_empty() {
        return Err(TelemapError::InvalidDate(date.to_string()));
    }

    let without_zone = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix("+00:00"))
        .unwrap_or(trimmed);

    let mut normalized = without_zone.replacen(' ', "T", 1);
    if normalized.len() == 10 {
        normalized.push_str("T00:00:00");
    }

    Epoch::from_str(&normalized).map_err(|_| TelemapError::InvalidDate(date.to_string()))
}

/// Lenient variant of [`parse_date_recorded`]: malformed or absent dates become `None`.
///
/// `None` orders before every real epoch, so undated fixes never win the "latest" slot
/// against a dated one.
pub fn parse_date_lenient(date: Option<&str>) -> Option<Epoch> {
    let raw = date?;
    match parse_date_recorded(raw) {
        Ok(epoch) => Some(epoch),
        Err(err) => {
            tracing::debug!("dropping unparseable date_recorded: {err}");
            None
        }
    }
}
