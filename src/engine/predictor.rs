//! The opaque per-band predictor contract.

use ndarray::{Array1, Array2, ArrayView2};

use crate::error::EngineError;

/// Output of one band predictor over a block of pixels.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Predicted TOA signal, one entry per pixel.
    pub value: Array1<f64>,
    /// Sensitivity of the predicted signal to every input feature,
    /// dimensioned (`num_features`, `num_points`).
    pub sensitivity: Array2<f64>,
}

/// A trained statistical surrogate for one spectral band's forward model.
///
/// The engine treats predictors as black boxes: any regression technique
/// qualifies as long as it maps a (`num_features`, `num_points`) input matrix
/// to one value per pixel and one sensitivity per feature and pixel. The row
/// layout of the input matrix is fixed by the engine's assembly step; a
/// predictor must have been trained against exactly that layout.
pub trait Predictor: Send + Sync {
    /// Evaluate the surrogate over a (`num_features`, `num_points`) matrix.
    ///
    /// `do_unc` switches the sensitivity output between gradient and
    /// uncertainty semantics; the distinction is owned entirely by the
    /// implementation. The returned [`Prediction`] is shaped like the input:
    /// `value` has `num_points` entries and `sensitivity` one row per input
    /// feature.
    fn predict(
        &self,
        features: ArrayView2<'_, f64>,
        do_unc: bool,
    ) -> Result<Prediction, EngineError>;
}
