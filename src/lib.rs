//! Roofline performance model: achievable performance of hardware platforms
//! across an arithmetic-intensity sweep, with CSV ingestion and chart
//! rendering around the core engine.

pub mod cli;
pub mod config;
pub mod core;
#[cfg(feature = "python")]
pub mod engine;
pub mod error;
pub mod ingest;
pub mod render;
pub mod report;

pub use crate::core::model::{MeasuredPoint, Platform, Workload};
pub use crate::core::roofline::{roofline, roofline_normalized, Roofline, COST_SCALE};
pub use crate::core::sweep::{default_sweep, intensity_sweep, log2_space};
pub use crate::error::{IngestError, RenderError, RooflineError};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn _lowlevel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<engine::RooflineEngine>()?;
    Ok(())
}
