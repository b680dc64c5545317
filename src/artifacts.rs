use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, ensure};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Fitted imputer: per-column fill values learned at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    pub statistics: Vec<f64>,
}

fn default_strategy() -> String {
    "mean".to_owned()
}

impl Imputer {
    pub fn n_features(&self) -> usize {
        self.statistics.len()
    }

    /// Replace NaN entries with the fitted per-column statistic. Runs
    /// unconditionally as the first pipeline stage; the artifacts were
    /// fitted expecting it.
    pub fn transform(&self, mut x: Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        check_width(self.n_features(), x.ncols())?;
        for ((_, column), value) in x.indexed_iter_mut() {
            if value.is_nan() {
                *value = self.statistics[column];
            }
        }
        Ok(x)
    }
}

/// Fitted standard scaler: per-column mean and scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize columns against the fitted parameters. Must run strictly
    /// after imputation; the stage order is a contract of the artifacts.
    pub fn transform(&self, mut x: Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        check_width(self.n_features(), x.ncols())?;
        for ((_, column), value) in x.indexed_iter_mut() {
            *value = (*value - self.mean[column]) / self.scale[column];
        }
        Ok(x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Softmax,
    Identity,
}

/// On-disk form of one dense layer, weights row-major `in x out`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

/// On-disk form of the trained classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug)]
struct DenseLayer {
    weights: Array2<f64>,
    bias: Array1<f64>,
    activation: Activation,
}

impl DenseLayer {
    fn from_spec(spec: LayerSpec) -> anyhow::Result<Self> {
        let rows = spec.weights.len();
        ensure!(rows > 0, "layer has an empty weight matrix");
        let cols = spec.weights[0].len();
        ensure!(cols > 0, "layer has zero-width weight rows");
        ensure!(
            spec.weights.iter().all(|row| row.len() == cols),
            "layer weight rows have inconsistent widths"
        );
        ensure!(
            spec.bias.len() == cols,
            "layer bias has {} entries, weights have {} columns",
            spec.bias.len(),
            cols
        );

        let flat: Vec<f64> = spec.weights.into_iter().flatten().collect();
        let weights = Array2::from_shape_vec((rows, cols), flat)?;
        Ok(DenseLayer {
            weights,
            bias: Array1::from_vec(spec.bias),
            activation: spec.activation,
        })
    }

    fn n_inputs(&self) -> usize {
        self.weights.nrows()
    }

    fn n_outputs(&self) -> usize {
        self.weights.ncols()
    }

    fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.dot(&self.weights);
        for mut row in out.axis_iter_mut(Axis(0)) {
            row += &self.bias;
        }
        match self.activation {
            Activation::Relu => out.mapv_inplace(|v| v.max(0.0)),
            Activation::Softmax => softmax_rows(&mut out),
            Activation::Identity => {}
        }
        out
    }
}

fn softmax_rows(x: &mut Array2<f64>) {
    for mut row in x.axis_iter_mut(Axis(0)) {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
}

/// Trained feed-forward classifier, compiled from its on-disk spec with the
/// layer dimensions validated once at load.
#[derive(Debug)]
pub struct Network {
    layers: Vec<DenseLayer>,
}

impl Network {
    pub fn from_spec(spec: NetworkSpec) -> anyhow::Result<Self> {
        ensure!(!spec.layers.is_empty(), "classifier has no layers");
        let layers = spec
            .layers
            .into_iter()
            .map(DenseLayer::from_spec)
            .collect::<anyhow::Result<Vec<_>>>()?;
        for pair in layers.windows(2) {
            ensure!(
                pair[0].n_outputs() == pair[1].n_inputs(),
                "layer dimensions do not chain: {} outputs feed {} inputs",
                pair[0].n_outputs(),
                pair[1].n_inputs()
            );
        }
        Ok(Network { layers })
    }

    pub fn n_inputs(&self) -> usize {
        self.layers[0].n_inputs()
    }

    pub fn n_outputs(&self) -> usize {
        self.layers[self.layers.len() - 1].n_outputs()
    }

    /// Forward pass: one row per record, one column per class.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        check_width(self.n_inputs(), x.ncols())?;
        let mut out = x.to_owned();
        for layer in &self.layers {
            out = layer.forward(&out);
        }
        Ok(out)
    }
}

fn check_width(expected: usize, got: usize) -> Result<(), InferenceError> {
    if expected != got {
        return Err(InferenceError::WidthMismatch { expected, got });
    }
    Ok(())
}

/// The three artifacts loaded once at startup and never mutated afterwards.
#[derive(Debug)]
pub struct ArtifactBundle {
    pub imputer: Imputer,
    pub scaler: Scaler,
    pub network: Network,
}

impl ArtifactBundle {
    /// Load all three artifacts and cross-check that they were fitted on the
    /// same feature width.
    pub fn load(model: &Path, imputer: &Path, scaler: &Path) -> anyhow::Result<Self> {
        let imputer: Imputer = read_json(imputer)?;
        let scaler: Scaler = read_json(scaler)?;
        let spec: NetworkSpec = read_json(model)?;
        let network = Network::from_spec(spec)
            .with_context(|| format!("invalid classifier artifact {}", model.display()))?;

        ensure!(
            scaler.mean.len() == scaler.scale.len(),
            "scaler mean and scale lengths differ"
        );
        ensure!(
            scaler.scale.iter().all(|s| *s != 0.0),
            "scaler contains zero scale entries"
        );
        let width = network.n_inputs();
        ensure!(
            imputer.n_features() == width,
            "imputer was fitted on {} features, classifier expects {}",
            imputer.n_features(),
            width
        );
        ensure!(
            scaler.n_features() == width,
            "scaler was fitted on {} features, classifier expects {}",
            scaler.n_features(),
            width
        );
        Ok(ArtifactBundle {
            imputer,
            scaler,
            network,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file =
        File::open(path).with_context(|| format!("cannot open artifact {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse artifact {}", path.display()))
}
