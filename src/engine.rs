use numpy::ndarray::Array1;
use numpy::{PyArray1, PyArray2, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::core::roofline::{roofline, roofline_normalized};
use crate::core::sweep::{intensity_sweep, DEFAULT_START, DEFAULT_STOP};
use crate::error::RooflineError;

impl From<RooflineError> for PyErr {
    fn from(err: RooflineError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Python wrapper around the roofline engine with a fixed intensity sweep
#[pyclass]
pub struct RooflineEngine {
    intensity: Vec<f64>,
}

#[pymethods]
impl RooflineEngine {
    #[new]
    #[pyo3(signature = (start = DEFAULT_START, stop = DEFAULT_STOP))]
    pub fn new(start: i32, stop: i32) -> PyResult<Self> {
        Ok(RooflineEngine {
            intensity: intensity_sweep(start, stop)?,
        })
    }

    /// The intensity sweep (FLOP/byte) shared by every computation
    pub fn intensity<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_owned_array(py, Array1::from(self.intensity.clone()))
    }

    /// Achievable performance, shape [n_platforms, n_intensity]
    pub fn compute<'py>(
        &self,
        py: Python<'py>,
        peak_performance: PyReadonlyArray1<'py, f64>,
        peak_bandwidth: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let performance = contiguous(&peak_performance)?;
        let bandwidth = contiguous(&peak_bandwidth)?;
        let result = roofline(performance, bandwidth, &self.intensity)?;
        Ok(PyArray2::from_owned_array(py, result))
    }

    /// Cost-normalized achievable performance, shape [n_platforms, n_intensity]
    pub fn compute_normalized<'py>(
        &self,
        py: Python<'py>,
        peak_performance: PyReadonlyArray1<'py, f64>,
        peak_bandwidth: PyReadonlyArray1<'py, f64>,
        cost: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let result = roofline_normalized(
            contiguous(&peak_performance)?,
            contiguous(&peak_bandwidth)?,
            contiguous(&cost)?,
            &self.intensity,
        )?;
        Ok(PyArray2::from_owned_array(py, result))
    }
}

fn contiguous<'a>(array: &'a PyReadonlyArray1<'_, f64>) -> PyResult<&'a [f64]> {
    array
        .as_slice()
        .map_err(|_| PyValueError::new_err("arrays must be contiguous 1-D float64"))
}
