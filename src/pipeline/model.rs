//! Opaque regression models loaded from serialized artifacts.
//!
//! The pipeline treats a model as a callable that maps one scaled feature
//! row to one scaled scalar. Two artifact kinds exist: a feed-forward
//! network over the tabular row, and a single-layer LSTM that consumes the
//! row as a length-1 sequence. Training happens elsewhere; artifacts carry
//! fitted weights only.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Input handed to a model after scaling and shape adaptation.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelInput {
    /// A single scaled feature row.
    Tabular(Vec<f64>),
    /// The same row reinterpreted as a sequence of time steps.
    Sequence(Vec<Vec<f64>>),
}

/// A fitted regression model producing one scaled scalar.
pub trait RegressionModel: Send + Sync {
    fn name(&self) -> &str;

    /// Width of one input row.
    fn input_dim(&self) -> usize;

    /// Whether the pipeline must reshape the scaled vector into a length-1
    /// sequence before invoking the model.
    fn wants_sequence(&self) -> bool;

    fn predict(&self, input: &ModelInput) -> Result<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Tanh,
    Identity,
}

impl Activation {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Identity => x,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Row-major weights, one row per output unit.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    fn in_dim(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn out_dim(&self) -> usize {
        self.weights.len()
    }

    pub(crate) fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(self.out_dim());
        for (row, bias) in self.weights.iter().zip(&self.bias) {
            if row.len() != input.len() {
                return Err(Error::ShapeMismatch {
                    context: "dense layer input",
                    expected: row.len(),
                    actual: input.len(),
                });
            }
            let z: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias;
            out.push(self.activation.apply(z));
        }
        Ok(out)
    }

    fn validate(&self, context: &'static str) -> Result<()> {
        if self.weights.is_empty() {
            return Err(Error::Model(format!("{context}: layer has no units")));
        }
        if self.bias.len() != self.out_dim() {
            return Err(Error::ShapeMismatch {
                context: "dense layer bias",
                expected: self.out_dim(),
                actual: self.bias.len(),
            });
        }
        let width = self.in_dim();
        if width == 0 || self.weights.iter().any(|row| row.len() != width) {
            return Err(Error::Model(format!("{context}: ragged weight matrix")));
        }
        Ok(())
    }
}

/// Feed-forward network over the tabular feature row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseModel {
    pub name: String,
    pub layers: Vec<DenseLayer>,
}

impl DenseModel {
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::Model(format!("{}: model has no layers", self.name)));
        }
        let mut width = None;
        for layer in &self.layers {
            layer.validate("dense model")?;
            if let Some(w) = width {
                if layer.in_dim() != w {
                    return Err(Error::ShapeMismatch {
                        context: "dense model layer chain",
                        expected: w,
                        actual: layer.in_dim(),
                    });
                }
            }
            width = Some(layer.out_dim());
        }
        if width != Some(1) {
            return Err(Error::Model(format!(
                "{}: final layer must emit one value",
                self.name
            )));
        }
        Ok(())
    }
}

impl RegressionModel for DenseModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_dim(&self) -> usize {
        self.layers.first().map(DenseLayer::in_dim).unwrap_or(0)
    }

    fn wants_sequence(&self) -> bool {
        false
    }

    fn predict(&self, input: &ModelInput) -> Result<f64> {
        let row = match input {
            ModelInput::Tabular(row) => row,
            ModelInput::Sequence(_) => {
                return Err(Error::Model(format!(
                    "{}: expected tabular input, got a sequence",
                    self.name
                )))
            }
        };
        let mut state = row.clone();
        for layer in &self.layers {
            state = layer.forward(&state)?;
        }
        scalar_output(&state)
    }
}

/// Single-layer LSTM with a dense head.
///
/// Gate weights are stacked input/forget/cell/output, `4 * hidden_dim`
/// rows. The pipeline always feeds a length-1 sequence, but the recurrence
/// handles longer ones the same way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrentModel {
    pub name: String,
    pub input_dim: usize,
    pub hidden_dim: usize,
    /// `4 * hidden_dim x input_dim` input projection.
    pub w_ih: Vec<Vec<f64>>,
    /// `4 * hidden_dim x hidden_dim` recurrent projection.
    pub w_hh: Vec<Vec<f64>>,
    /// `4 * hidden_dim` gate biases.
    pub bias: Vec<f64>,
    /// Maps the final hidden state to one value.
    pub head: DenseLayer,
}

impl RecurrentModel {
    pub fn validate(&self) -> Result<()> {
        let gates = 4 * self.hidden_dim;
        if self.hidden_dim == 0 || self.input_dim == 0 {
            return Err(Error::Model(format!("{}: zero-sized dimensions", self.name)));
        }
        if self.w_ih.len() != gates || self.w_ih.iter().any(|r| r.len() != self.input_dim) {
            return Err(Error::ShapeMismatch {
                context: "recurrent input projection",
                expected: gates,
                actual: self.w_ih.len(),
            });
        }
        if self.w_hh.len() != gates || self.w_hh.iter().any(|r| r.len() != self.hidden_dim) {
            return Err(Error::ShapeMismatch {
                context: "recurrent hidden projection",
                expected: gates,
                actual: self.w_hh.len(),
            });
        }
        if self.bias.len() != gates {
            return Err(Error::ShapeMismatch {
                context: "recurrent gate bias",
                expected: gates,
                actual: self.bias.len(),
            });
        }
        self.head.validate("recurrent head")?;
        if self.head.in_dim() != self.hidden_dim || self.head.out_dim() != 1 {
            return Err(Error::ShapeMismatch {
                context: "recurrent head",
                expected: self.hidden_dim,
                actual: self.head.in_dim(),
            });
        }
        Ok(())
    }

    fn step(&self, x: &[f64], h: &mut [f64], c: &mut [f64]) -> Result<()> {
        if x.len() != self.input_dim {
            return Err(Error::ShapeMismatch {
                context: "recurrent step input",
                expected: self.input_dim,
                actual: x.len(),
            });
        }
        let gates = 4 * self.hidden_dim;
        let mut z = vec![0.0; gates];
        for (j, zj) in z.iter_mut().enumerate() {
            let from_input: f64 = self.w_ih[j].iter().zip(x).map(|(w, v)| w * v).sum();
            let from_hidden: f64 = self.w_hh[j].iter().zip(h.iter()).map(|(w, v)| w * v).sum();
            *zj = from_input + from_hidden + self.bias[j];
        }
        for j in 0..self.hidden_dim {
            let input_gate = sigmoid(z[j]);
            let forget_gate = sigmoid(z[self.hidden_dim + j]);
            let candidate = z[2 * self.hidden_dim + j].tanh();
            let output_gate = sigmoid(z[3 * self.hidden_dim + j]);
            c[j] = forget_gate * c[j] + input_gate * candidate;
            h[j] = output_gate * c[j].tanh();
        }
        Ok(())
    }
}

impl RegressionModel for RecurrentModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn wants_sequence(&self) -> bool {
        true
    }

    fn predict(&self, input: &ModelInput) -> Result<f64> {
        let steps = match input {
            ModelInput::Sequence(steps) => steps,
            ModelInput::Tabular(_) => {
                return Err(Error::Model(format!(
                    "{}: expected sequence input, got a tabular row",
                    self.name
                )))
            }
        };
        if steps.is_empty() {
            return Err(Error::Model(format!("{}: empty input sequence", self.name)));
        }
        let mut h = vec![0.0; self.hidden_dim];
        let mut c = vec![0.0; self.hidden_dim];
        for x in steps {
            self.step(x, &mut h, &mut c)?;
        }
        scalar_output(&self.head.forward(&h)?)
    }
}

fn scalar_output(out: &[f64]) -> Result<f64> {
    if out.len() != 1 {
        return Err(Error::ShapeMismatch {
            context: "model output",
            expected: 1,
            actual: out.len(),
        });
    }
    Ok(out[0])
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// On-disk model artifact, discriminated by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelArtifact {
    Dense(DenseModel),
    Recurrent(RecurrentModel),
}

/// Load and validate a model artifact.
pub fn load_model(path: &Path) -> Result<Box<dyn RegressionModel>> {
    let raw = fs::read_to_string(path)?;
    let artifact: ModelArtifact = serde_json::from_str(&raw)?;
    match artifact {
        ModelArtifact::Dense(model) => {
            model.validate()?;
            Ok(Box::new(model))
        }
        ModelArtifact::Recurrent(model) => {
            model.validate()?;
            Ok(Box::new(model))
        }
    }
}
