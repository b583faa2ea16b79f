//! Illumination and viewing geometry broadcasting.

use ndarray::{Array1, Array2};

use crate::error::EngineError;

/// One geometry quantity, either shared by every pixel or given per pixel.
///
/// Per-pixel values must already have the common pixel count; no other
/// length is accepted (see [`Geometry::broadcast`]).
#[derive(Debug, Clone)]
pub enum GeometryInput {
    /// A single value broadcast over all pixels.
    Scalar(f64),
    /// One value per pixel.
    PerPixel(Array1<f64>),
}

impl From<f64> for GeometryInput {
    fn from(value: f64) -> Self {
        GeometryInput::Scalar(value)
    }
}

impl From<Array1<f64>> for GeometryInput {
    fn from(values: Array1<f64>) -> Self {
        GeometryInput::PerPixel(values)
    }
}

/// The illumination/observation configuration for a block of pixels.
///
/// Angles are in degrees and elevation in km, but the engine never interprets
/// them; they pass straight through to the band emulators. The five
/// quantities are independent: any mix of scalars and per-pixel arrays works.
#[derive(Debug, Clone)]
pub struct Geometry {
    /// Solar zenith angle.
    pub sza: GeometryInput,
    /// View zenith angle.
    pub vza: GeometryInput,
    /// Solar azimuth angle.
    pub saa: GeometryInput,
    /// View azimuth angle.
    pub vaa: GeometryInput,
    /// Surface elevation.
    pub elevation: GeometryInput,
}

impl Geometry {
    /// Bundle the five geometry quantities.
    pub fn new(
        sza: impl Into<GeometryInput>,
        vza: impl Into<GeometryInput>,
        saa: impl Into<GeometryInput>,
        vaa: impl Into<GeometryInput>,
        elevation: impl Into<GeometryInput>,
    ) -> Self {
        Self {
            sza: sza.into(),
            vza: vza.into(),
            saa: saa.into(),
            vaa: vaa.into(),
            elevation: elevation.into(),
        }
    }

    /// Broadcast all five quantities to a (5, `n_points`) block.
    ///
    /// Row order is (sza, vza, saa, vaa, elevation), the tail of the
    /// emulator input layout. A per-pixel array whose length differs from
    /// `n_points` is a shape error naming the offending angle.
    pub(crate) fn broadcast(&self, n_points: usize) -> Result<Array2<f64>, EngineError> {
        let rows: [(&'static str, &GeometryInput); 5] = [
            ("sza", &self.sza),
            ("vza", &self.vza),
            ("saa", &self.saa),
            ("vaa", &self.vaa),
            ("elevation", &self.elevation),
        ];

        let mut block = Array2::zeros((rows.len(), n_points));
        for ((name, input), mut row) in rows.into_iter().zip(block.rows_mut()) {
            match input {
                GeometryInput::Scalar(value) => row.fill(*value),
                GeometryInput::PerPixel(values) => {
                    if values.len() != n_points {
                        return Err(EngineError::PixelCountMismatch {
                            name,
                            expected: n_points,
                            actual: values.len(),
                        });
                    }
                    row.assign(values);
                }
            }
        }
        Ok(block)
    }
}
