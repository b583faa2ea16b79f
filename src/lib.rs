//! Per-band TOA forward-model emulation.
//!
//! NOTE: only this module touches `pyo3` and `numpy`. The engine lives in
//! the other modules, which stay pure Rust and carry the unit tests.

pub(crate) mod engine;
pub(crate) mod error;

use engine::{
    BandOutputs, BandSelection, EmulationEngine, Geometry, GeometryInput, Prediction, Predictor,
};
use error::EngineError;
use ndarray::ArrayView2;
use numpy::{PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3, ToPyArray};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

impl From<EngineError> for PyErr {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::BandOutOfRange { .. }
            | EngineError::PixelCountMismatch { .. }
            | EngineError::ParameterRows { .. }
            | EngineError::SurfaceBandAxis { .. }
            | EngineError::RegistryMismatch { .. } => PyValueError::new_err(e.to_string()),
            EngineError::Emulator(_) => PyRuntimeError::new_err(e.to_string()),
        }
    }
}

/// Bridge from the engine's predictor contract to a duck-typed Python
/// emulator object exposing `predict(x, do_unc) -> (value, sensitivity)`.
///
/// The engine evaluates bands with the GIL released; each call reacquires
/// it for the duration of the Python `predict`.
#[derive(Debug)]
struct PyEmulator {
    emulator: Py<PyAny>,
}

impl Predictor for PyEmulator {
    fn predict(
        &self,
        features: ArrayView2<'_, f64>,
        do_unc: bool,
    ) -> Result<Prediction, EngineError> {
        Python::with_gil(|py| -> Result<Prediction, EngineError> {
            let x = features.to_pyarray(py);
            let output = self
                .emulator
                .bind(py)
                .call_method1("predict", (x, do_unc))
                .map_err(|err| EngineError::Emulator(err.to_string()))?;
            let (value, sensitivity): (PyReadonlyArray1<'_, f64>, PyReadonlyArray2<'_, f64>) =
                output
                    .extract()
                    .map_err(|err| EngineError::Emulator(err.to_string()))?;
            Ok(Prediction {
                value: value.as_array().to_owned(),
                sensitivity: sensitivity.as_array().to_owned(),
            })
        })
    }
}

/// A geometry argument from Python: a per-pixel float64 array, or one
/// scalar shared by every pixel. Tried array-first so that only true
/// scalars (including numpy 0-d arrays) broadcast.
#[derive(FromPyObject)]
enum AngleArg<'py> {
    /// Per-pixel values; must match the pixel count of the state arrays.
    PerPixel(PyReadonlyArray1<'py, f64>),
    /// A scalar broadcast over all pixels.
    Scalar(f64),
}

impl AngleArg<'_> {
    fn into_input(self) -> GeometryInput {
        match self {
            AngleArg::PerPixel(values) => GeometryInput::PerPixel(values.as_array().to_owned()),
            AngleArg::Scalar(value) => GeometryInput::Scalar(value),
        }
    }
}

/// The band selection from Python: a single index or a sequence of indices.
#[derive(FromPyObject)]
enum BandsArg {
    /// One band index.
    Single(isize),
    /// An explicit list of band indices.
    Subset(Vec<isize>),
}

/// Map the optional Python `bands` argument onto a core selection.
///
/// Negative indices are rejected with the same range error as too-large
/// ones; there is no Python-style wraparound.
fn resolve_bands_arg(
    bands: Option<BandsArg>,
    n_bands: usize,
) -> Result<BandSelection, EngineError> {
    let checked = |band: isize| {
        usize::try_from(band).map_err(|_| EngineError::BandOutOfRange { band, n_bands })
    };
    match bands {
        None => Ok(BandSelection::All),
        Some(BandsArg::Single(band)) => Ok(BandSelection::Single(checked(band)?)),
        Some(BandsArg::Subset(bands)) => Ok(BandSelection::Subset(
            bands.into_iter().map(checked).collect::<Result<_, _>>()?,
        )),
    }
}

/// Convert engine output into the Python-facing pair of lists.
fn into_band_lists(
    py: Python<'_>,
    outputs: BandOutputs,
) -> (Vec<Bound<'_, PyArray1<f64>>>, Vec<Bound<'_, PyArray2<f64>>>) {
    let values = outputs
        .values
        .iter()
        .map(|value| value.to_pyarray(py))
        .collect();
    let gradients = outputs
        .gradients
        .iter()
        .map(|gradient| gradient.to_pyarray(py))
        .collect();
    (values, gradients)
}

/// Forward-model emulation engine for one sensor.
///
/// Holds one trained emulator per spectral band and evaluates them over
/// blocks of pixels, returning the predicted TOA signal and its Jacobian
/// per band. Emulators are duck-typed Python objects exposing
/// `predict(x, do_unc) -> (value, sensitivity)`; loading them from storage
/// stays on the Python side.
#[pyclass]
#[derive(Debug)]
struct AtmosphericEmulationEngine {
    inner: EmulationEngine,
}

#[pymethods]
impl AtmosphericEmulationEngine {
    /// Build an engine from already-loaded band emulators.
    ///
    /// `emulator_names` and `emulators` must have the same length; band `i`
    /// is served by `emulators[i]` under the name `emulator_names[i]`.
    #[new]
    fn new(
        sensor: String,
        emulator_names: Vec<String>,
        emulators: Vec<Py<PyAny>>,
    ) -> PyResult<Self> {
        let emulators = emulators
            .into_iter()
            .map(|emulator| Box::new(PyEmulator { emulator }) as Box<dyn Predictor>)
            .collect();
        Ok(Self {
            inner: EmulationEngine::new(sensor, emulator_names, emulators)?,
        })
    }

    /// Sensor identifier this engine was built for.
    #[getter]
    fn sensor(&self) -> String {
        self.inner.sensor().to_string()
    }

    /// Band emulator names, in band order.
    #[getter]
    fn emulator_names(&self) -> Vec<String> {
        self.inner.emulator_names().to_vec()
    }

    /// Number of registered bands.
    #[getter]
    fn n_bands(&self) -> usize {
        self.inner.n_bands()
    }

    /// Predict the TOA signal and its Jacobian from a BRDF kernel surface.
    ///
    /// `kernel_weights` has shape (3, bands, `num_points`): the isotropic,
    /// volumetric, and geometric kernel weights per band and pixel. Its band
    /// axis either spans every registered band (indexed by absolute band id)
    /// or exactly the bands in `bands` (indexed positionally).
    ///
    /// `atmosphere` has shape (3, `num_points`) and is shared across bands.
    ///
    /// `sza`, `vza`, `saa`, `vaa`, and `elevation` are each a scalar or an
    /// array of length `num_points`, in any combination.
    ///
    /// With `gradient_kernels` the emulators see the band's 3 kernel rows
    /// ahead of the atmosphere and geometry rows, and each returned gradient
    /// has shape (11, `num_points`); without it the surface rows are omitted
    /// entirely and the gradients have shape (8, `num_points`).
    ///
    /// `bands` selects which emulators run: `None` for all bands, an int for
    /// one, or a list of ints evaluated in the given order.
    ///
    /// Returns `(values, gradients)`: two lists with one entry per selected
    /// band, values of length `num_points` each.
    #[pyo3(signature = (kernel_weights, atmosphere, sza, vza, saa, vaa, elevation, gradient_kernels=false, bands=None))]
    #[allow(clippy::too_many_arguments)]
    fn emulator_kernel_atmosphere<'py>(
        &self,
        py: Python<'py>,
        kernel_weights: PyReadonlyArray3<'py, f64>,
        atmosphere: PyReadonlyArray2<'py, f64>,
        sza: AngleArg<'py>,
        vza: AngleArg<'py>,
        saa: AngleArg<'py>,
        vaa: AngleArg<'py>,
        elevation: AngleArg<'py>,
        gradient_kernels: bool,
        bands: Option<BandsArg>,
    ) -> PyResult<(Vec<Bound<'py, PyArray1<f64>>>, Vec<Bound<'py, PyArray2<f64>>>)> {
        let selection = resolve_bands_arg(bands, self.inner.n_bands())?;
        let geometry = Geometry::new(
            sza.into_input(),
            vza.into_input(),
            saa.into_input(),
            vaa.into_input(),
            elevation.into_input(),
        );
        let kernel_weights = kernel_weights.as_array();
        let atmosphere = atmosphere.as_array();

        // The band emulators reacquire the GIL per predict call, so it must
        // be free while this thread blocks on the band pool.
        let outputs = py.allow_threads(|| {
            self.inner.emulator_kernel_atmosphere(
                kernel_weights,
                atmosphere,
                &geometry,
                gradient_kernels,
                &selection,
            )
        })?;
        Ok(into_band_lists(py, outputs))
    }

    /// Predict the TOA signal and its Jacobian from a pre-combined
    /// reflectance surface.
    ///
    /// `reflectance` has shape (bands, `num_points`), with the same
    /// full-length-or-pre-sliced band axis convention as
    /// `emulator_kernel_atmosphere`. With `gradient_refl` the emulators see
    /// the band's single reflectance row and each returned gradient has
    /// shape (9, `num_points`); without it, (8, `num_points`). All other
    /// arguments and the return value behave as in
    /// `emulator_kernel_atmosphere`.
    #[pyo3(signature = (reflectance, atmosphere, sza, vza, saa, vaa, elevation, gradient_refl=false, bands=None))]
    #[allow(clippy::too_many_arguments)]
    fn emulator_reflectance_atmosphere<'py>(
        &self,
        py: Python<'py>,
        reflectance: PyReadonlyArray2<'py, f64>,
        atmosphere: PyReadonlyArray2<'py, f64>,
        sza: AngleArg<'py>,
        vza: AngleArg<'py>,
        saa: AngleArg<'py>,
        vaa: AngleArg<'py>,
        elevation: AngleArg<'py>,
        gradient_refl: bool,
        bands: Option<BandsArg>,
    ) -> PyResult<(Vec<Bound<'py, PyArray1<f64>>>, Vec<Bound<'py, PyArray2<f64>>>)> {
        let selection = resolve_bands_arg(bands, self.inner.n_bands())?;
        let geometry = Geometry::new(
            sza.into_input(),
            vza.into_input(),
            saa.into_input(),
            vaa.into_input(),
            elevation.into_input(),
        );
        let reflectance = reflectance.as_array();
        let atmosphere = atmosphere.as_array();

        let outputs = py.allow_threads(|| {
            self.inner.emulator_reflectance_atmosphere(
                reflectance,
                atmosphere,
                &geometry,
                gradient_refl,
                &selection,
            )
        })?;
        Ok(into_band_lists(py, outputs))
    }
}

/// A Python module implemented in Rust.
#[pymodule]
fn atmos_emulation_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<AtmosphericEmulationEngine>()?;
    Ok(())
}
