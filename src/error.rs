/// Possible emulation engine errors.
#[derive(Debug)]
pub enum EngineError {
    /// A requested band index is outside the registered band range
    BandOutOfRange {
        /// The offending index, as given by the caller
        band: isize,
        /// Number of bands registered with the engine
        n_bands: usize,
    },
    /// A per-pixel input disagrees with the pixel count of the other inputs
    PixelCountMismatch {
        /// Name of the offending argument
        name: &'static str,
        /// Pixel count fixed by the primary state array
        expected: usize,
        /// Pixel count of the offending argument
        actual: usize,
    },
    /// An input has the wrong number of parameter rows
    ParameterRows {
        /// Name of the offending argument
        name: &'static str,
        /// Required row count
        expected: usize,
        /// Row count of the offending argument
        actual: usize,
    },
    /// A surface array's band axis matches neither the registered band count
    /// nor the number of selected bands
    SurfaceBandAxis {
        /// Band-axis length of the supplied surface array
        axis: usize,
        /// Number of bands registered with the engine
        n_bands: usize,
        /// Number of bands resolved from the selection
        n_selected: usize,
    },
    /// The band name and emulator lists are not index-aligned
    RegistryMismatch {
        /// Number of band names supplied
        names: usize,
        /// Number of emulators supplied
        emulators: usize,
    },
    /// A band emulator reported a failure
    Emulator(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::BandOutOfRange { band, n_bands } => {
                write!(
                    f,
                    "band index {band} is out of range for an engine with {n_bands} bands"
                )
            }
            EngineError::PixelCountMismatch {
                name,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "`{name}` covers {actual} pixels where {expected} were expected"
                )
            }
            EngineError::ParameterRows {
                name,
                expected,
                actual,
            } => {
                write!(f, "`{name}` must have {expected} rows, got {actual}")
            }
            EngineError::SurfaceBandAxis {
                axis,
                n_bands,
                n_selected,
            } => {
                write!(
                    f,
                    "surface band axis has length {axis}, matching neither the \
                     {n_bands} registered bands nor the {n_selected} selected bands"
                )
            }
            EngineError::RegistryMismatch { names, emulators } => {
                write!(f, "{names} band names supplied for {emulators} emulators")
            }
            EngineError::Emulator(reason) => write!(f, "band emulator failed: {reason}"),
        }
    }
}

impl std::error::Error for EngineError {}
