use std::fmt::Display;

use ndarray::{Array2, ArrayView1, Axis, Zip};
use tracing::debug;

use crate::core::model::Platform;
use crate::error::RooflineError;

/// Fixed unit scale of the cost normalization: values become
/// `value * COST_SCALE / cost`, i.e. MFLOP/s per cost unit for GFLOP/s input.
pub const COST_SCALE: f64 = 1e3;

/// One ceiling rescaled by the cost normalization.
pub(crate) fn cost_scaled(value: f64, cost: f64) -> f64 {
    value * COST_SCALE / cost
}

/// Achievable performance of every platform at every intensity point.
///
/// Returns an N×M matrix (rows follow the platform order, columns follow
/// `intensity`) where each cell is
/// `min(peak_performance[p], peak_bandwidth[p] * intensity[i])`.
///
/// All inputs are validated before anything is computed: the two peak
/// sequences must have the same non-zero length, the sweep must not be empty,
/// and every value must be a positive finite number.
pub fn roofline(
    peak_performance: &[f64],
    peak_bandwidth: &[f64],
    intensity: &[f64],
) -> Result<Array2<f64>, RooflineError> {
    validate(peak_performance, peak_bandwidth, intensity)?;

    let performance = ArrayView1::from(peak_performance).insert_axis(Axis(1));
    let bandwidth = ArrayView1::from(peak_bandwidth).insert_axis(Axis(1));
    let intensity = ArrayView1::from(intensity).insert_axis(Axis(0));

    // [N,1] x [1,M] -> [N,M] memory-bound roof, then clamp by the compute roof
    let mut achievable = &bandwidth * &intensity;
    Zip::from(&mut achievable)
        .and_broadcast(&performance)
        .for_each(|cell, &peak| *cell = cell.min(peak));

    Ok(achievable)
}

/// Cost-normalized variant of [`roofline`].
///
/// Both ceilings are rescaled by `COST_SCALE / cost` and fed to the same
/// minimum formula.
pub fn roofline_normalized(
    peak_performance: &[f64],
    peak_bandwidth: &[f64],
    cost: &[f64],
    intensity: &[f64],
) -> Result<Array2<f64>, RooflineError> {
    ensure_same_len(peak_performance.len(), peak_bandwidth.len())?;
    if cost.len() != peak_performance.len() {
        return Err(RooflineError::invalid(format!(
            "{} cost values for {} platforms",
            cost.len(),
            peak_performance.len()
        )));
    }
    for (idx, &c) in cost.iter().enumerate() {
        ensure_positive(format_args!("cost[{idx}]"), c)?;
    }

    let performance: Vec<f64> = peak_performance
        .iter()
        .zip(cost)
        .map(|(&p, &c)| cost_scaled(p, c))
        .collect();
    let bandwidth: Vec<f64> = peak_bandwidth
        .iter()
        .zip(cost)
        .map(|(&b, &c)| cost_scaled(b, c))
        .collect();

    roofline(&performance, &bandwidth, intensity)
}

/// The computed model handed to the renderer and the table report.
#[derive(Debug, Clone, PartialEq)]
pub struct Roofline {
    platforms: Vec<String>,
    intensity: Vec<f64>,
    achievable: Array2<f64>,
    normalized: Option<Array2<f64>>,
}

impl Roofline {
    /// Computes the raw matrix and, when `normalize` is set, the
    /// cost-normalized one. Every platform needs a cost to normalize.
    pub fn compute(
        platforms: &[Platform],
        intensity: Vec<f64>,
        normalize: bool,
    ) -> Result<Self, RooflineError> {
        let performance: Vec<f64> = platforms.iter().map(Platform::peak_performance).collect();
        let bandwidth: Vec<f64> = platforms.iter().map(Platform::peak_bandwidth).collect();

        let achievable = roofline(&performance, &bandwidth, &intensity)?;

        let normalized = if normalize {
            let scaled = platforms
                .iter()
                .map(Platform::normalized)
                .collect::<Result<Vec<_>, _>>()?;
            let performance: Vec<f64> = scaled.iter().map(Platform::peak_performance).collect();
            let bandwidth: Vec<f64> = scaled.iter().map(Platform::peak_bandwidth).collect();
            Some(roofline(&performance, &bandwidth, &intensity)?)
        } else {
            None
        };

        debug!(
            platforms = platforms.len(),
            points = intensity.len(),
            normalized = normalized.is_some(),
            "computed roofline"
        );

        Ok(Roofline {
            platforms: platforms.iter().map(|p| p.name().to_string()).collect(),
            intensity,
            achievable,
            normalized,
        })
    }

    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn achievable(&self) -> &Array2<f64> {
        &self.achievable
    }

    pub fn normalized(&self) -> Option<&Array2<f64>> {
        self.normalized.as_ref()
    }
}

fn validate(
    peak_performance: &[f64],
    peak_bandwidth: &[f64],
    intensity: &[f64],
) -> Result<(), RooflineError> {
    ensure_same_len(peak_performance.len(), peak_bandwidth.len())?;
    if peak_performance.is_empty() {
        return Err(RooflineError::invalid("at least one platform is required"));
    }
    if intensity.is_empty() {
        return Err(RooflineError::invalid("intensity sweep is empty"));
    }
    for (idx, &v) in peak_performance.iter().enumerate() {
        ensure_positive(format_args!("peak_performance[{idx}]"), v)?;
    }
    for (idx, &v) in peak_bandwidth.iter().enumerate() {
        ensure_positive(format_args!("peak_bandwidth[{idx}]"), v)?;
    }
    for (idx, &v) in intensity.iter().enumerate() {
        ensure_positive(format_args!("intensity[{idx}]"), v)?;
    }
    Ok(())
}

fn ensure_same_len(performance: usize, bandwidth: usize) -> Result<(), RooflineError> {
    if performance != bandwidth {
        return Err(RooflineError::invalid(format!(
            "{performance} peak performance values but {bandwidth} peak bandwidth values"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_positive(what: impl Display, value: f64) -> Result<(), RooflineError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(RooflineError::invalid(format!(
            "{what} must be a positive finite number, got {value}"
        )));
    }
    Ok(())
}
