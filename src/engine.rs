//! Forward TOA emulation over per-band statistical surrogates.
//!
//! One trained predictor per spectral band stands in for a physics-based
//! radiative-transfer solver. For every selected band the engine stacks an
//! input matrix of shape (`num_features`, `num_points`) and hands it to that
//! band's predictor. Rows are stacked in a fixed order the predictors were
//! trained against:
//!
//! - surface block: 3 BRDF kernel weight rows or 1 reflectance row, present
//!   only when the caller asks for surface sensitivity, otherwise absent;
//! - 3 atmospheric state rows, in the caller's order;
//! - 5 geometry rows: sza, vza, saa, vaa, elevation.
//!
//! Because the surface rows are included or omitted before the predictor
//! runs, the sensitivity matrix a predictor returns is already the Jacobian
//! the caller sees; no rows are stripped afterwards.

mod bands;
mod features;
mod geometry;
mod predictor;


use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView2, ArrayView3};
use rayon::prelude::*;

pub use bands::BandSelection;
pub use geometry::{Geometry, GeometryInput};
pub use predictor::{Prediction, Predictor};

use crate::error::EngineError;
use features::{BandAxis, SurfaceModel, ATMOSPHERE_ROWS, GEOMETRY_ROWS};

/// Uncertainty switch forwarded to every predictor call. The engine always
/// asks for gradients; uncertainty output is the emulator owner's business.
const DO_UNC: bool = false;

/// Per-band engine output, index-aligned with the resolved band order.
#[derive(Debug, Clone)]
pub struct BandOutputs {
    /// Predicted TOA signal per band, each of length `num_points`.
    pub values: Vec<Array1<f64>>,
    /// Jacobian per band, each dimensioned (`num_features`, `num_points`)
    /// where `num_features` is 8 plus the surface rows (0, 1, or 3).
    pub gradients: Vec<Array2<f64>>,
}

/// Forward-model emulation engine for one sensor.
///
/// Owns an ordered, index-aligned registry of band names and opaque
/// per-band predictors, fixed at construction. All evaluation state is
/// per-call, so a shared engine is safe to use from several threads.
pub struct EmulationEngine {
    sensor: String,
    emulator_names: Vec<String>,
    emulators: Vec<Box<dyn Predictor>>,
}

impl std::fmt::Debug for EmulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmulationEngine")
            .field("sensor", &self.sensor)
            .field("emulator_names", &self.emulator_names)
            .field("n_bands", &self.n_bands())
            .finish_non_exhaustive()
    }
}

impl EmulationEngine {
    /// Build an engine from already-loaded band emulators.
    ///
    /// `emulator_names` and `emulators` must be index-aligned; band `i` is
    /// served by `emulators[i]` under the name `emulator_names[i]`.
    pub fn new(
        sensor: impl Into<String>,
        emulator_names: Vec<String>,
        emulators: Vec<Box<dyn Predictor>>,
    ) -> Result<Self, EngineError> {
        if emulator_names.len() != emulators.len() {
            return Err(EngineError::RegistryMismatch {
                names: emulator_names.len(),
                emulators: emulators.len(),
            });
        }
        Ok(Self {
            sensor: sensor.into(),
            emulator_names,
            emulators,
        })
    }

    /// The sensor this engine was built for.
    pub fn sensor(&self) -> &str {
        &self.sensor
    }

    /// Band emulator names, in band order.
    pub fn emulator_names(&self) -> &[String] {
        &self.emulator_names
    }

    /// Number of registered bands.
    pub fn n_bands(&self) -> usize {
        self.emulators.len()
    }

    /// Predict the TOA signal and its Jacobian from a BRDF kernel surface.
    ///
    /// `kernel_weights` is dimensioned (3, bands, `num_points`): the
    /// isotropic, volumetric, and geometric kernel weights for each band and
    /// pixel. Its band axis either spans every registered band (sliced by
    /// absolute band index) or exactly the selected bands (sliced by
    /// position within `bands`). `atmosphere` is (3, `num_points`) and
    /// shared across bands.
    ///
    /// With `gradient_kernels` set, each input matrix carries the band's 3
    /// kernel rows ahead of the atmosphere and geometry rows and the
    /// returned Jacobians are (11, `num_points`); without it the surface
    /// rows are omitted entirely and the Jacobians are (8, `num_points`).
    ///
    /// Returns one value vector and one Jacobian per resolved band, in
    /// resolved order.
    pub fn emulator_kernel_atmosphere(
        &self,
        kernel_weights: ArrayView3<'_, f64>,
        atmosphere: ArrayView2<'_, f64>,
        geometry: &Geometry,
        gradient_kernels: bool,
        bands: &BandSelection,
    ) -> Result<BandOutputs, EngineError> {
        self.run(
            SurfaceModel::Kernels(kernel_weights),
            atmosphere,
            geometry,
            gradient_kernels,
            bands,
        )
    }

    /// Predict the TOA signal and its Jacobian from a pre-combined
    /// reflectance surface.
    ///
    /// `reflectance` is dimensioned (bands, `num_points`), with the same
    /// full-length-or-pre-sliced band axis convention as
    /// [`emulator_kernel_atmosphere`](Self::emulator_kernel_atmosphere).
    /// With `gradient_refl` set, each input matrix carries the band's single
    /// reflectance row and the Jacobians are (9, `num_points`); without it
    /// they are (8, `num_points`).
    pub fn emulator_reflectance_atmosphere(
        &self,
        reflectance: ArrayView2<'_, f64>,
        atmosphere: ArrayView2<'_, f64>,
        geometry: &Geometry,
        gradient_refl: bool,
        bands: &BandSelection,
    ) -> Result<BandOutputs, EngineError> {
        self.run(
            SurfaceModel::Reflectance(reflectance),
            atmosphere,
            geometry,
            gradient_refl,
            bands,
        )
    }

    /// Shared evaluation pipeline for both surface descriptions.
    ///
    /// All range and shape validation happens up front; no emulator runs
    /// unless every input checks out, so a failing call has no partial
    /// effects. Band evaluations are independent and run on the rayon pool,
    /// collected back in resolved-band order.
    fn run(
        &self,
        surface: SurfaceModel<'_>,
        atmosphere: ArrayView2<'_, f64>,
        geometry: &Geometry,
        gradient_surface: bool,
        bands: &BandSelection,
    ) -> Result<BandOutputs, EngineError> {
        let n_bands = self.n_bands();
        let resolved = bands.resolve(n_bands)?;

        // The atmosphere fixes the pixel count every other input must match.
        if atmosphere.nrows() != ATMOSPHERE_ROWS {
            return Err(EngineError::ParameterRows {
                name: "atmosphere",
                expected: ATMOSPHERE_ROWS,
                actual: atmosphere.nrows(),
            });
        }
        let n_points = atmosphere.ncols();

        let band_axis = surface.validate(n_points, n_bands, resolved.len())?;
        let geometry_block = geometry.broadcast(n_points)?;
        debug!("validated engine inputs for {n_points} pixels");

        let surface_rows = if gradient_surface { surface.rows() } else { 0 };
        info!(
            "emulating {} of {n_bands} {} bands over {n_points} pixels ({} feature rows)",
            resolved.len(),
            self.sensor,
            surface_rows + ATMOSPHERE_ROWS + GEOMETRY_ROWS,
        );

        let mut results = Vec::new();
        resolved
            .as_slice()
            .par_iter()
            .enumerate()
            .map(|(position, &band)| {
                let surface_block = gradient_surface.then(|| {
                    surface.band_block(match band_axis {
                        BandAxis::Absolute => band,
                        BandAxis::Positional => position,
                    })
                });
                let x = features::assemble(surface_block, atmosphere, geometry_block.view());
                self.emulators[band].predict(x.view(), DO_UNC)
            })
            .collect_into_vec(&mut results);

        let mut values = Vec::with_capacity(results.len());
        let mut gradients = Vec::with_capacity(results.len());
        for result in results {
            let Prediction { value, sensitivity } = result?;
            values.push(value);
            gradients.push(sensitivity);
        }
        Ok(BandOutputs { values, gradients })
    }
}
