//! Fitted min-max scalers.
//!
//! Scalers are fitted offline alongside the models and shipped as JSON
//! artifacts. At inference time they are loaded once and never refit: a
//! scaler maps each column into the unit range the model was trained on,
//! and the inverse maps a scaled model output back into price units.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A per-column min-max transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    /// Column names in the order the scaler was fit on.
    pub columns: Vec<String>,
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
}

impl Scaler {
    pub fn new(columns: Vec<String>, data_min: Vec<f64>, data_max: Vec<f64>) -> Result<Self> {
        let scaler = Self {
            columns,
            data_min,
            data_max,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let scaler: Scaler = serde_json::from_str(&raw)?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::Model("scaler has no columns".to_string()));
        }
        if self.data_min.len() != self.columns.len() {
            return Err(Error::ShapeMismatch {
                context: "scaler data_min",
                expected: self.columns.len(),
                actual: self.data_min.len(),
            });
        }
        if self.data_max.len() != self.columns.len() {
            return Err(Error::ShapeMismatch {
                context: "scaler data_max",
                expected: self.columns.len(),
                actual: self.data_max.len(),
            });
        }
        for (i, (min, max)) in self.data_min.iter().zip(&self.data_max).enumerate() {
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(Error::Model(format!(
                    "scaler column '{}' has invalid fitted range [{min}, {max}]",
                    self.columns[i]
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Map raw values into the fitted unit range, column by column.
    ///
    /// A column fitted on a constant (zero range) maps to 0.
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.len() {
            return Err(Error::ShapeMismatch {
                context: "scaler transform",
                expected: self.len(),
                actual: values.len(),
            });
        }
        Ok(values
            .iter()
            .zip(self.data_min.iter().zip(&self.data_max))
            .map(|(v, (min, max))| {
                let range = max - min;
                if range == 0.0 {
                    0.0
                } else {
                    (v - min) / range
                }
            })
            .collect())
    }

    /// Map one scaled model output back into original units.
    ///
    /// Only valid for single-column target scalers.
    pub fn inverse_transform_one(&self, value: f64) -> Result<f64> {
        if self.len() != 1 {
            return Err(Error::ShapeMismatch {
                context: "scaler inverse transform",
                expected: 1,
                actual: self.len(),
            });
        }
        Ok(value * (self.data_max[0] - self.data_min[0]) + self.data_min[0])
    }
}
