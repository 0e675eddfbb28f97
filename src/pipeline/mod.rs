//! Prediction pipeline: fitted scalers, opaque models, and the
//! dual-target predictor that ties them together.

pub mod model;
pub mod predictor;
pub mod scaler;


pub use model::{
    load_model, Activation, DenseLayer, DenseModel, ModelArtifact, ModelInput, RecurrentModel,
    RegressionModel,
};
pub use predictor::{PricePredictor, Target};
pub use scaler::Scaler;
