//! Dual-target prediction pipeline.
//!
//! Holds the two fitted (model, output scaler) pairs and the input scaler
//! they share. Everything is loaded once at process start and treated as
//! read-only for the process lifetime; concurrent cycles may share a
//! predictor behind an `Arc` without locking.

use crate::error::{Error, Result};
use crate::features::{self, FeatureVector, FEATURE_DIM};
use crate::pipeline::model::{load_model, ModelInput, RegressionModel};
use crate::pipeline::scaler::Scaler;
use std::fmt;
use std::path::Path;

/// Which price a pipeline predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    High,
    Low,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::High => "high",
            Target::Low => "low",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One target's model and its inverse output transform.
struct TargetPipeline {
    model: Box<dyn RegressionModel>,
    output_scaler: Scaler,
}

impl TargetPipeline {
    fn validate(&self, target: Target) -> Result<()> {
        if self.model.input_dim() != FEATURE_DIM {
            return Err(Error::ShapeMismatch {
                context: "model input width",
                expected: FEATURE_DIM,
                actual: self.model.input_dim(),
            });
        }
        if self.output_scaler.len() != 1 {
            return Err(Error::ShapeMismatch {
                context: "output scaler width",
                expected: 1,
                actual: self.output_scaler.len(),
            });
        }
        tracing::debug!(
            target = %target,
            model = self.model.name(),
            sequence = self.model.wants_sequence(),
            "target pipeline validated"
        );
        Ok(())
    }
}

/// The two independently-scaled regression pipelines.
pub struct PricePredictor {
    input_scaler: Scaler,
    high: TargetPipeline,
    low: TargetPipeline,
}

impl fmt::Debug for PricePredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PricePredictor")
            .field("input_scaler", &self.input_scaler)
            .field("high", &self.high.model.name())
            .field("low", &self.low.model.name())
            .finish()
    }
}

impl PricePredictor {
    /// Assemble a predictor from already-loaded parts, validating every
    /// shape and the input scaler's column order against the feature
    /// schema. Construction is the only place this is checked; `predict`
    /// assumes it holds.
    pub fn new(
        input_scaler: Scaler,
        high_model: Box<dyn RegressionModel>,
        high_scaler: Scaler,
        low_model: Box<dyn RegressionModel>,
        low_scaler: Scaler,
    ) -> Result<Self> {
        let expected = features::column_names();
        if input_scaler.columns != expected {
            return Err(Error::SchemaMismatch {
                expected,
                actual: input_scaler.columns.clone(),
            });
        }
        let predictor = Self {
            input_scaler,
            high: TargetPipeline {
                model: high_model,
                output_scaler: high_scaler,
            },
            low: TargetPipeline {
                model: low_model,
                output_scaler: low_scaler,
            },
        };
        predictor.high.validate(Target::High)?;
        predictor.low.validate(Target::Low)?;
        Ok(predictor)
    }

    /// Load the five artifacts from a directory:
    /// `x_scaler.json`, `y_high_scaler.json`, `y_low_scaler.json`,
    /// `high_model.json`, `low_model.json`.
    pub fn load(dir: &Path) -> Result<Self> {
        let input_scaler = Scaler::load(&dir.join("x_scaler.json"))?;
        let high_scaler = Scaler::load(&dir.join("y_high_scaler.json"))?;
        let low_scaler = Scaler::load(&dir.join("y_low_scaler.json"))?;
        let high_model = load_model(&dir.join("high_model.json"))?;
        let low_model = load_model(&dir.join("low_model.json"))?;
        let predictor = Self::new(input_scaler, high_model, high_scaler, low_model, low_scaler)?;
        tracing::info!(dir = %dir.display(), "models and scalers loaded");
        Ok(predictor)
    }

    /// Predict one price in original units.
    ///
    /// Scales the feature vector with the shared input scaler, adapts the
    /// shape for sequence models, invokes the target's model and inverts
    /// the target's output scaling.
    pub fn predict(&self, target: Target, features: &FeatureVector) -> Result<f64> {
        let scaled = self.input_scaler.transform(features.values())?;
        let pipeline = match target {
            Target::High => &self.high,
            Target::Low => &self.low,
        };
        let input = if pipeline.model.wants_sequence() {
            ModelInput::Sequence(vec![scaled])
        } else {
            ModelInput::Tabular(scaled)
        };
        let raw = pipeline.model.predict(&input)?;
        pipeline.output_scaler.inverse_transform_one(raw)
    }
}
