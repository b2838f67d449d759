//! Data module - measurement sets and CSV loading

mod loader;
mod measurement;
mod processor;

pub use loader::{DataLoader, LoaderError};
pub use measurement::MeasurementSet;
pub(crate) use measurement::min_max;
pub use processor::{DataProcessor, ExtractedPairs, ProcessorError};
