use serde_json::Value;

use crate::error::ValidationError;
use crate::io_struct::RecordPayload;

/// Column order expected by the fitted artifacts. This order is a contract;
/// the extractor always emits rows in it.
pub const FEATURE_COLUMNS: [&str; 5] = ["Rooms", "Distance", "Bathroom", "Car", "Landsize"];

/// Columns parsed as integers in form mode.
const INTEGER_COLUMNS: [&str; 3] = ["Rooms", "Bathroom", "Car"];

/// One validated input record, fields in pipeline column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub rooms: f64,
    pub distance: f64,
    pub bathroom: f64,
    pub car: f64,
    pub landsize: f64,
}

impl FeatureRecord {
    pub fn as_row(&self) -> [f64; 5] {
        [
            self.rooms,
            self.distance,
            self.bathroom,
            self.car,
            self.landsize,
        ]
    }

    fn from_row(row: [f64; 5]) -> Self {
        FeatureRecord {
            rooms: row[0],
            distance: row[1],
            bathroom: row[2],
            car: row[3],
            landsize: row[4],
        }
    }
}

/// Extract records from a JSON body: a single object or an array of objects.
///
/// Extraction is all-or-nothing: if any record misses a required key the
/// whole batch fails, naming every missing key. Extra keys are ignored.
pub fn records_from_json(body: &[u8]) -> Result<Vec<FeatureRecord>, ValidationError> {
    let value: Value = serde_json::from_slice(body)?;
    let payload: RecordPayload =
        serde_json::from_value(value).map_err(|_| ValidationError::PayloadShape)?;
    let records = payload.into_records();

    let missing: Vec<String> = FEATURE_COLUMNS
        .into_iter()
        .filter(|column| records.iter().any(|record| !record.contains_key(*column)))
        .map(str::to_owned)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    records
        .iter()
        .map(|record| {
            let mut row = [0.0; 5];
            for (i, column) in FEATURE_COLUMNS.into_iter().enumerate() {
                let value = &record[column];
                row[i] = value.as_f64().ok_or_else(|| ValidationError::InvalidNumber {
                    field: column.to_owned(),
                    value: value.to_string(),
                })?;
            }
            Ok(FeatureRecord::from_row(row))
        })
        .collect()
}

/// Extract exactly one record from a form-encoded body. No batch support.
///
/// `Rooms`, `Bathroom` and `Car` must parse as integers; `Distance` and
/// `Landsize` as reals. When a field repeats, the first occurrence wins.
pub fn record_from_form(body: &[u8]) -> Result<FeatureRecord, ValidationError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;

    let missing: Vec<String> = FEATURE_COLUMNS
        .into_iter()
        .filter(|column| !pairs.iter().any(|(key, _)| key == column))
        .map(str::to_owned)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let mut row = [0.0; 5];
    for (i, column) in FEATURE_COLUMNS.into_iter().enumerate() {
        let raw = pairs
            .iter()
            .find(|(key, _)| key == column)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default();
        row[i] = parse_form_field(column, raw)?;
    }
    Ok(FeatureRecord::from_row(row))
}

fn parse_form_field(field: &str, raw: &str) -> Result<f64, ValidationError> {
    let parsed = if INTEGER_COLUMNS.contains(&field) {
        raw.parse::<i64>().ok().map(|v| v as f64)
    } else {
        raw.parse::<f64>().ok()
    };
    parsed.ok_or_else(|| ValidationError::InvalidNumber {
        field: field.to_owned(),
        value: raw.to_owned(),
    })
}
