//! Band selection and validation.

use smallvec::{smallvec, SmallVec};

use crate::error::EngineError;

/// Resolved band indices. Inline capacity covers typical optical sensors;
/// larger selections spill to the heap.
pub(crate) type BandList = SmallVec<[usize; 8]>;

/// Which of the engine's registered bands to evaluate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BandSelection {
    /// Every registered band, in registry order.
    #[default]
    All,
    /// A single band.
    Single(usize),
    /// An explicit list of bands; order preserved, duplicates allowed.
    Subset(Vec<usize>),
}

impl BandSelection {
    /// Resolve the selection into a concrete ordered index list.
    ///
    /// Every index is checked against `n_bands` here, before any emulator
    /// runs, so an invalid selection can never leave partial results behind.
    pub(crate) fn resolve(&self, n_bands: usize) -> Result<BandList, EngineError> {
        let resolved: BandList = match self {
            BandSelection::All => (0..n_bands).collect(),
            BandSelection::Single(band) => smallvec![*band],
            BandSelection::Subset(bands) => SmallVec::from_slice(bands),
        };
        if let Some(&band) = resolved.iter().find(|&&band| band >= n_bands) {
            return Err(EngineError::BandOutOfRange {
                band: band as isize,
                n_bands,
            });
        }
        Ok(resolved)
    }
}
