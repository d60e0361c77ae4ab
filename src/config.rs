//! Run configuration with TOML file and environment variable support.
//!
//! Layering, lowest precedence first: built-in defaults, a TOML file,
//! `ROOFLINE_*` environment variables, then explicit overrides (CLI flags).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::sweep::{
    ensure_exponent, intensity_sweep, log2_space, DEFAULT_START, DEFAULT_STOP,
};
use crate::error::RooflineError;

/// Visual style of the rendered chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlotStyle {
    #[default]
    Classic,
    /// Hand-drawn look: monospace text, heavy strokes, sparse grid.
    Sketch,
}

impl FromStr for PlotStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" | "default" => Ok(PlotStyle::Classic),
            "sketch" | "xkcd" => Ok(PlotStyle::Sketch),
            _ => bail!("Unknown plot style: {}", s),
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RooflineConfig {
    pub sweep: SweepConfig,
    pub plot: PlotConfig,
}

/// Bounds of the intensity sweep, as base-2 exponents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    pub start: i32,
    pub stop: i32,
    /// Overrides the default one-point-per-exponent count.
    pub points: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            stop: DEFAULT_STOP,
            points: None,
        }
    }
}

impl SweepConfig {
    /// Materialize the intensity values described by this config.
    pub fn intensity(&self) -> Result<Vec<f64>, RooflineError> {
        ensure_exponent("start", self.start)?;
        ensure_exponent("stop", self.stop)?;
        match self.points {
            Some(num) => log2_space(f64::from(self.start), f64::from(self.stop), num),
            None => intensity_sweep(self.start, self.stop),
        }
    }
}

/// Output file and chart geometry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlotConfig {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub style: PlotStyle,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("roofline.png"),
            width: 1600,
            height: 800,
            style: PlotStyle::Classic,
        }
    }
}

/// Configuration builder with environment variable support
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: RooflineConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file, replacing everything set so far.
    pub fn from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        self.config = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(self)
    }

    /// Load overrides from `ROOFLINE_*` environment variables.
    pub fn from_env(self) -> Result<Self> {
        self.from_env_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`ConfigBuilder::from_env`] with an injectable variable lookup.
    pub fn from_env_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(start) = lookup("ROOFLINE_SWEEP_START") {
            self.config.sweep.start = start
                .trim()
                .parse()
                .with_context(|| format!("ROOFLINE_SWEEP_START='{start}'"))?;
        }

        if let Some(stop) = lookup("ROOFLINE_SWEEP_STOP") {
            self.config.sweep.stop = stop
                .trim()
                .parse()
                .with_context(|| format!("ROOFLINE_SWEEP_STOP='{stop}'"))?;
        }

        if let Some(points) = lookup("ROOFLINE_SWEEP_POINTS") {
            self.config.sweep.points = Some(
                points
                    .trim()
                    .parse()
                    .with_context(|| format!("ROOFLINE_SWEEP_POINTS='{points}'"))?,
            );
        }

        if let Some(output) = lookup("ROOFLINE_OUTPUT") {
            self.config.plot.output = PathBuf::from(output);
        }

        if let Some(width) = lookup("ROOFLINE_PLOT_WIDTH") {
            self.config.plot.width = width
                .trim()
                .parse()
                .with_context(|| format!("ROOFLINE_PLOT_WIDTH='{width}'"))?;
        }

        if let Some(height) = lookup("ROOFLINE_PLOT_HEIGHT") {
            self.config.plot.height = height
                .trim()
                .parse()
                .with_context(|| format!("ROOFLINE_PLOT_HEIGHT='{height}'"))?;
        }

        if let Some(style) = lookup("ROOFLINE_PLOT_STYLE") {
            self.config.plot.style = style
                .trim()
                .parse()
                .with_context(|| format!("ROOFLINE_PLOT_STYLE='{style}'"))?;
        }

        Ok(self)
    }

    pub fn with_sweep_start(mut self, start: i32) -> Self {
        self.config.sweep.start = start;
        self
    }

    pub fn with_sweep_stop(mut self, stop: i32) -> Self {
        self.config.sweep.stop = stop;
        self
    }

    pub fn with_sweep_points(mut self, points: usize) -> Self {
        self.config.sweep.points = Some(points);
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.config.plot.output = output.into();
        self
    }

    pub fn with_style(mut self, style: PlotStyle) -> Self {
        self.config.plot.style = style;
        self
    }

    /// Validate configuration
    pub fn validate(self) -> Result<Self> {
        let config = &self.config;

        ensure_exponent("start", config.sweep.start)?;
        ensure_exponent("stop", config.sweep.stop)?;

        if config.sweep.points == Some(0) {
            bail!("Sweep must contain at least one point");
        }

        if config.plot.width == 0 || config.plot.height == 0 {
            bail!(
                "Plot size {}x{} must be non-zero",
                config.plot.width,
                config.plot.height
            );
        }

        if OutputFormat::from_path(&config.plot.output).is_none() {
            bail!(
                "Unsupported output file {}: expected a .png or .svg extension",
                config.plot.output.display()
            );
        }

        Ok(self)
    }

    pub fn build(self) -> RooflineConfig {
        self.config
    }
}

/// Image format picked from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(OutputFormat::Png),
            "svg" => Some(OutputFormat::Svg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_match_classic_sweep() {
        let config = ConfigBuilder::new().validate().unwrap().build();
        assert_eq!(config.sweep.start, -4);
        assert_eq!(config.sweep.stop, 6);
        assert_eq!(config.sweep.intensity().unwrap().len(), 11);
        assert_eq!(config.plot.output, PathBuf::from("roofline.png"));
        assert_eq!(config.plot.style, PlotStyle::Classic);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sweep]\nstart = -2\n\n[plot]\nstyle = \"sketch\"").unwrap();

        let config = ConfigBuilder::new().from_file(file.path()).unwrap().build();
        assert_eq!(config.sweep.start, -2);
        assert_eq!(config.sweep.stop, 6);
        assert_eq!(config.plot.style, PlotStyle::Sketch);
        assert_eq!(config.plot.width, 1600);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sweep]\nstart = \"low\"").unwrap();
        assert!(ConfigBuilder::new().from_file(file.path()).is_err());
    }

    #[test]
    fn env_overrides_sweep_and_output() {
        let vars: HashMap<&str, &str> = [
            ("ROOFLINE_SWEEP_START", "-8"),
            ("ROOFLINE_SWEEP_STOP", "10"),
            ("ROOFLINE_SWEEP_POINTS", "37"),
            ("ROOFLINE_OUTPUT", "out/chart.svg"),
            ("ROOFLINE_PLOT_STYLE", "xkcd"),
        ]
        .into_iter()
        .collect();

        let config = ConfigBuilder::new()
            .from_env_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap()
            .validate()
            .unwrap()
            .build();
        assert_eq!(config.sweep.start, -8);
        assert_eq!(config.sweep.stop, 10);
        assert_eq!(config.sweep.intensity().unwrap().len(), 37);
        assert_eq!(config.plot.output, PathBuf::from("out/chart.svg"));
        assert_eq!(config.plot.style, PlotStyle::Sketch);
    }

    #[test]
    fn env_with_bad_number_fails() {
        let result = ConfigBuilder::new()
            .from_env_vars(|k| (k == "ROOFLINE_PLOT_WIDTH").then(|| "wide".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn env_with_unknown_style_fails() {
        let err = ConfigBuilder::new()
            .from_env_vars(|k| (k == "ROOFLINE_PLOT_STYLE").then(|| "comic".to_string()))
            .unwrap_err();
        assert!(format!("{err:#}").contains("ROOFLINE_PLOT_STYLE='comic'"));
    }

    #[test]
    fn overrides_win_over_env() {
        let config = ConfigBuilder::new()
            .from_env_vars(|k| (k == "ROOFLINE_SWEEP_START").then(|| "-1".to_string()))
            .unwrap()
            .with_sweep_start(0)
            .with_sweep_stop(3)
            .build();
        assert_eq!(config.sweep.intensity().unwrap(), vec![1.0, 2.0, 4.0, 8.0]);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(ConfigBuilder::new().with_sweep_start(-61).validate().is_err());
        assert!(ConfigBuilder::new().with_sweep_stop(i32::MIN).validate().is_err());
        assert!(ConfigBuilder::new().with_sweep_points(0).validate().is_err());
        assert!(ConfigBuilder::new().with_output("chart.gif").validate().is_err());
        assert!(ConfigBuilder::new().with_output("chart").validate().is_err());
        assert!(ConfigBuilder::new().with_output("chart.SVG").validate().is_ok());
    }

    #[test]
    fn output_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.png")), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_path(Path::new("a/b.svg")), Some(OutputFormat::Svg));
        assert_eq!(OutputFormat::from_path(Path::new("a.pdf")), None);
    }
}
