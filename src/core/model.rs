use crate::core::roofline::{cost_scaled, ensure_positive};
use crate::error::RooflineError;

/// A hardware platform: compute ceiling, memory bandwidth and optional cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    name: String,
    peak_performance: f64,
    peak_bandwidth: f64,
    cost: Option<f64>,
}

impl Platform {
    /// Peak performance in GFLOP/s, peak bandwidth in GB/s.
    pub fn new(
        name: impl Into<String>,
        peak_performance: f64,
        peak_bandwidth: f64,
        cost: Option<f64>,
    ) -> Result<Self, RooflineError> {
        let name = name.into();
        ensure_named(&name)?;
        ensure_positive(format_args!("{name}: peak performance"), peak_performance)?;
        ensure_positive(format_args!("{name}: peak bandwidth"), peak_bandwidth)?;
        if let Some(cost) = cost {
            ensure_positive(format_args!("{name}: cost"), cost)?;
        }
        Ok(Platform {
            name,
            peak_performance,
            peak_bandwidth,
            cost,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn peak_performance(&self) -> f64 {
        self.peak_performance
    }

    pub fn peak_bandwidth(&self) -> f64 {
        self.peak_bandwidth
    }

    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    /// Intensity (FLOP/byte) where the platform stops being memory bound.
    pub fn ridge_point(&self) -> f64 {
        self.peak_performance / self.peak_bandwidth
    }

    /// Same platform with both ceilings rescaled by `COST_SCALE / cost`.
    ///
    /// The ridge point is unchanged; the result carries no cost so it cannot
    /// be normalized twice.
    pub fn normalized(&self) -> Result<Platform, RooflineError> {
        let cost = self.cost.ok_or_else(|| {
            RooflineError::invalid(format!(
                "platform '{}' has no cost; normalization needs one",
                self.name
            ))
        })?;
        Ok(Platform {
            name: self.name.clone(),
            peak_performance: cost_scaled(self.peak_performance, cost),
            peak_bandwidth: cost_scaled(self.peak_bandwidth, cost),
            cost: None,
        })
    }
}

/// A measured performance point annotated on a workload marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredPoint {
    pub label: String,
    /// GFLOP/s
    pub performance: f64,
}

/// A software workload placed on the intensity axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    name: String,
    arithmetic_intensity: f64,
    points: Vec<MeasuredPoint>,
}

impl Workload {
    pub fn new(
        name: impl Into<String>,
        arithmetic_intensity: f64,
        points: Vec<MeasuredPoint>,
    ) -> Result<Self, RooflineError> {
        let name = name.into();
        ensure_named(&name)?;
        ensure_positive(
            format_args!("{name}: arithmetic intensity"),
            arithmetic_intensity,
        )?;
        for point in &points {
            ensure_positive(
                format_args!("{name}: measured point '{}'", point.label),
                point.performance,
            )?;
        }
        Ok(Workload {
            name,
            arithmetic_intensity,
            points,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arithmetic_intensity(&self) -> f64 {
        self.arithmetic_intensity
    }

    pub fn points(&self) -> &[MeasuredPoint] {
        &self.points
    }
}

fn ensure_named(name: &str) -> Result<(), RooflineError> {
    if name.trim().is_empty() {
        return Err(RooflineError::invalid("name must not be empty"));
    }
    Ok(())
}
