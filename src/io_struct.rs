use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON prediction payload is either one record or a list of records.
/// The shape is resolved once at the extraction boundary; downstream code
/// only ever sees a batch.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SingleOrBatch<T> {
    Single(T),
    Batch(Vec<T>),
}

pub type RecordPayload = SingleOrBatch<serde_json::Map<String, Value>>;

impl RecordPayload {
    pub fn into_records(self) -> Vec<serde_json::Map<String, Value>> {
        match self {
            SingleOrBatch::Single(record) => vec![record],
            SingleOrBatch::Batch(records) => records,
        }
    }
}

/// Successful JSON response: one class and one probability vector per input
/// record, order preserved.
#[derive(Debug, Deserialize, Serialize)]
pub struct PredictResponse {
    pub classes: Vec<usize>,
    pub probabilities: Vec<Vec<f64>>,
}

/// JSON error body for failed API-mode requests.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
