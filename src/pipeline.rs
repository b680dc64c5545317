use ndarray::{Array2, Axis};

use crate::artifacts::ArtifactBundle;
use crate::error::InferenceError;
use crate::features::{FEATURE_COLUMNS, FeatureRecord};

/// Human labels for the three price segments, indexed by class.
pub const CLASS_LABELS: [&str; 3] = ["Barata", "Media", "Cara"];

/// One classified record: argmax class, its label and the full distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_index: usize,
    pub label: &'static str,
    pub probabilities: Vec<f64>,
}

/// The fixed impute -> scale -> predict -> argmax chain over the loaded
/// artifacts. Owns the bundle; handlers share the pipeline behind
/// `web::Data`, so it is never mutated after construction.
#[derive(Debug)]
pub struct InferencePipeline {
    bundle: ArtifactBundle,
}

impl InferencePipeline {
    pub fn new(bundle: ArtifactBundle) -> Self {
        InferencePipeline { bundle }
    }

    /// Classify a batch. All-or-nothing: any stage failure fails the whole
    /// request, no partial results and no retries.
    pub fn run(&self, records: &[FeatureRecord]) -> Result<Vec<Prediction>, InferenceError> {
        let x = table(records);
        let x = self.bundle.imputer.transform(x)?;
        let x = self.bundle.scaler.transform(x)?;
        let probs = self.bundle.network.predict(&x)?;
        if probs.ncols() != CLASS_LABELS.len() {
            return Err(InferenceError::OutputArity {
                expected: CLASS_LABELS.len(),
                got: probs.ncols(),
            });
        }

        Ok(probs
            .axis_iter(Axis(0))
            .map(|row| {
                let probabilities = row.to_vec();
                let class_index = argmax(&probabilities);
                Prediction {
                    class_index,
                    label: CLASS_LABELS[class_index],
                    probabilities,
                }
            })
            .collect())
    }
}

fn table(records: &[FeatureRecord]) -> Array2<f64> {
    let mut flat = Vec::with_capacity(records.len() * FEATURE_COLUMNS.len());
    for record in records {
        flat.extend_from_slice(&record.as_row());
    }
    Array2::from_shape_vec((records.len(), FEATURE_COLUMNS.len()), flat).unwrap()
}

/// Index of the maximum value; the first (lowest) index wins exact ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = i;
        }
    }
    best
}
