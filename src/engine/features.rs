//! Surface-feature blocks and emulator input assembly.

use ndarray::{s, Array2, ArrayView2, ArrayView3, Axis};

use crate::error::EngineError;

/// Rows contributed by the atmospheric state (e.g. AOT, water vapour, ozone).
pub(crate) const ATMOSPHERE_ROWS: usize = 3;
/// Rows contributed by the viewing/illumination geometry.
pub(crate) const GEOMETRY_ROWS: usize = 5;
/// Rows contributed by a BRDF kernel surface description.
pub(crate) const KERNEL_ROWS: usize = 3;
/// Rows contributed by a pre-combined reflectance surface description.
pub(crate) const REFLECTANCE_ROWS: usize = 1;

/// How a surface array's band axis is addressed when slicing per band.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BandAxis {
    /// The axis spans every registered band; slice by absolute band index.
    Absolute,
    /// The axis spans exactly the selected bands; slice by position within
    /// the selection.
    Positional,
}

/// A band-indexed description of the surface reflectance state.
///
/// Either three BRDF kernel weight rows per band (isotropic, volumetric,
/// geometric) or a single pre-combined reflectance row per band. The wrapped
/// views keep their caller-side layout; slicing happens per band during
/// assembly.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SurfaceModel<'a> {
    /// Kernel weights dimensioned (3, bands, pixels).
    Kernels(ArrayView3<'a, f64>),
    /// Reflectance dimensioned (bands, pixels).
    Reflectance(ArrayView2<'a, f64>),
}

impl<'a> SurfaceModel<'a> {
    /// Rows this surface description contributes to the feature layout.
    pub(crate) fn rows(&self) -> usize {
        match self {
            SurfaceModel::Kernels(_) => KERNEL_ROWS,
            SurfaceModel::Reflectance(_) => REFLECTANCE_ROWS,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SurfaceModel::Kernels(_) => "kernel_weights",
            SurfaceModel::Reflectance(_) => "reflectance",
        }
    }

    fn band_axis_len(&self) -> usize {
        match self {
            SurfaceModel::Kernels(kernels) => kernels.len_of(Axis(1)),
            SurfaceModel::Reflectance(reflectance) => reflectance.nrows(),
        }
    }

    fn n_points(&self) -> usize {
        match self {
            SurfaceModel::Kernels(kernels) => kernels.len_of(Axis(2)),
            SurfaceModel::Reflectance(reflectance) => reflectance.ncols(),
        }
    }

    /// Check the wrapped array against the pixel count and band selection,
    /// and decide how its band axis is addressed.
    ///
    /// A band axis spanning the full registry is always taken as absolute,
    /// even when the selection happens to have the same length; an axis
    /// matching neither length is rejected rather than guessed at.
    pub(crate) fn validate(
        &self,
        n_points: usize,
        n_bands: usize,
        n_selected: usize,
    ) -> Result<BandAxis, EngineError> {
        if let SurfaceModel::Kernels(kernels) = self {
            let terms = kernels.len_of(Axis(0));
            if terms != KERNEL_ROWS {
                return Err(EngineError::ParameterRows {
                    name: self.name(),
                    expected: KERNEL_ROWS,
                    actual: terms,
                });
            }
        }
        if self.n_points() != n_points {
            return Err(EngineError::PixelCountMismatch {
                name: self.name(),
                expected: n_points,
                actual: self.n_points(),
            });
        }

        let axis = self.band_axis_len();
        if axis == n_bands {
            Ok(BandAxis::Absolute)
        } else if axis == n_selected {
            Ok(BandAxis::Positional)
        } else {
            Err(EngineError::SurfaceBandAxis {
                axis,
                n_bands,
                n_selected,
            })
        }
    }

    /// Slice the surface-feature block for one band: (3, pixels) in kernel
    /// mode, (1, pixels) in reflectance mode.
    pub(crate) fn band_block(&self, index: usize) -> ArrayView2<'a, f64> {
        match *self {
            SurfaceModel::Kernels(kernels) => kernels.index_axis_move(Axis(1), index),
            SurfaceModel::Reflectance(reflectance) => reflectance
                .index_axis_move(Axis(0), index)
                .insert_axis(Axis(0)),
        }
    }
}

/// Assemble one band's emulator input matrix.
///
/// Row order is fixed: the surface block first (when present), then the
/// three atmosphere rows in their given order, then the five geometry rows
/// as (sza, vza, saa, vaa, elevation). The per-band emulators are trained
/// against exactly this layout, so the order must never change.
pub(crate) fn assemble(
    surface_block: Option<ArrayView2<'_, f64>>,
    atmosphere: ArrayView2<'_, f64>,
    geometry_block: ArrayView2<'_, f64>,
) -> Array2<f64> {
    let n_points = atmosphere.ncols();
    let surface_rows = surface_block.map_or(0, |block| block.nrows());

    let mut x = Array2::zeros((surface_rows + ATMOSPHERE_ROWS + GEOMETRY_ROWS, n_points));
    if let Some(block) = surface_block {
        x.slice_mut(s![..surface_rows, ..]).assign(&block);
    }
    x.slice_mut(s![surface_rows..surface_rows + ATMOSPHERE_ROWS, ..])
        .assign(&atmosphere);
    x.slice_mut(s![surface_rows + ATMOSPHERE_ROWS.., ..])
        .assign(&geometry_block);
    x
}
