//! Log2-log2 roofline chart rendering with plotters.

use ndarray::Array2;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use tracing::info;

use crate::config::{OutputFormat, PlotConfig, PlotStyle};
use crate::core::model::Workload;
use crate::core::roofline::Roofline;
use crate::error::RenderError;

const X_DESC: &str = "Arithmetic Intensity (FLOP/byte)";
const DASHES: usize = 12;

struct Theme {
    font: &'static str,
    stroke: u32,
    point_size: u32,
    light_grid: bool,
}

impl Theme {
    fn for_style(style: PlotStyle) -> Self {
        match style {
            PlotStyle::Classic => Theme {
                font: "sans-serif",
                stroke: 2,
                point_size: 3,
                light_grid: true,
            },
            PlotStyle::Sketch => Theme {
                font: "monospace",
                stroke: 4,
                point_size: 5,
                light_grid: false,
            },
        }
    }
}

struct Panel<'a> {
    title: &'a str,
    y_desc: &'a str,
    matrix: &'a Array2<f64>,
    /// Measured points are in GFLOP/s and only make sense on the raw panel.
    measured: bool,
}

/// Render the chart to `plot.output`; `.svg` selects the SVG backend,
/// anything else a PNG bitmap.
pub fn render(
    roofline: &Roofline,
    workloads: &[Workload],
    plot: &PlotConfig,
) -> Result<(), RenderError> {
    if let Some(dir) = plot.output.parent() {
        if !dir.as_os_str().is_empty() && !dir.is_dir() {
            return Err(RenderError::MissingDirectory(dir.to_path_buf()));
        }
    }

    let size = (plot.width, plot.height);
    match OutputFormat::from_path(&plot.output) {
        Some(OutputFormat::Svg) => {
            let root = SVGBackend::new(&plot.output, size).into_drawing_area();
            draw(&root, roofline, workloads, plot.style).map_err(draw_error)?;
            root.present().map_err(draw_error)?;
        }
        _ => {
            let root = BitMapBackend::new(&plot.output, size).into_drawing_area();
            draw(&root, roofline, workloads, plot.style).map_err(draw_error)?;
            root.present().map_err(draw_error)?;
        }
    }
    info!("Wrote roofline chart to {}", plot.output.display());
    Ok(())
}

fn draw_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Draw(err.to_string())
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    roofline: &Roofline,
    workloads: &[Workload],
    style: PlotStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let theme = Theme::for_style(style);

    let raw = Panel {
        title: "Roofline Model",
        y_desc: "Achievable Performance (GFLOP/s)",
        matrix: roofline.achievable(),
        measured: true,
    };

    match roofline.normalized() {
        Some(normalized) => {
            let panels = root.split_evenly((1, 2));
            let scaled = Panel {
                title: "Normalized Roofline Model",
                y_desc: "Normalized Achievable Performance (MFLOP/s/$)",
                matrix: normalized,
                measured: false,
            };
            draw_panel(&panels[0], &raw, roofline, workloads, &theme)?;
            draw_panel(&panels[1], &scaled, roofline, workloads, &theme)?;
        }
        None => draw_panel(root, &raw, roofline, workloads, &theme)?,
    }
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel<'_>,
    roofline: &Roofline,
    workloads: &[Workload],
    theme: &Theme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let intensity = roofline.intensity();
    let (x_min, x_max) = x_bounds(intensity, workloads);
    let measured: &[Workload] = if panel.measured { workloads } else { &[] };
    let (y_min, y_max) = y_bounds(panel.matrix, measured);

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, (theme.font, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(
            (x_min..x_max).log_scale().base(2.0),
            (y_min..y_max).log_scale().base(2.0),
        )?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(X_DESC)
        .y_desc(panel.y_desc)
        .axis_desc_style((theme.font, 16))
        .x_label_formatter(&format_tick)
        .y_label_formatter(&format_tick);
    if !theme.light_grid {
        mesh.light_line_style(WHITE.stroke_width(0));
    }
    mesh.draw()?;

    let stroke = theme.stroke;
    for (idx, (name, row)) in roofline
        .platforms()
        .iter()
        .zip(panel.matrix.rows())
        .enumerate()
    {
        let color = Palette99::pick(idx).to_rgba();
        let points: Vec<(f64, f64)> = intensity.iter().copied().zip(row.iter().copied()).collect();
        chart
            .draw_series(
                LineSeries::new(points, color.stroke_width(stroke)).point_size(theme.point_size),
            )?
            .label(name.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke))
            });
    }

    for (idx, workload) in workloads.iter().enumerate() {
        let color = workload_color(idx, workloads.len());
        let ai = workload.arithmetic_intensity();
        chart
            .draw_series(
                dash_segments(y_min, y_max, DASHES)
                    .into_iter()
                    .map(move |(lo, hi)| {
                        PathElement::new(vec![(ai, lo), (ai, hi)], color.stroke_width(stroke))
                    }),
            )?
            .label(workload.name())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 8, y)], color.stroke_width(stroke))
            });

        if panel.measured {
            chart.draw_series(workload.points().iter().map(|point| {
                EmptyElement::at((ai, point.performance))
                    + Cross::new((0, 0), 6, color.stroke_width(2))
                    + Text::new(
                        point.label.clone(),
                        (8, -14),
                        (theme.font, 13).into_font(),
                    )
            }))?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

/// Spread workload marker colors over the hue wheel, stopping short of
/// wrapping back to the first hue.
fn workload_color(idx: usize, count: usize) -> RGBAColor {
    let hue = if count <= 1 {
        0.0
    } else {
        0.8 * idx as f64 / (count - 1) as f64
    };
    HSLColor(hue, 0.85, 0.45).to_rgba()
}

/// Powers of two enclosing every positive value with one extra power of
/// two of headroom on each side. Falls back to `(1, 2)` when there is
/// nothing to enclose.
pub fn pow2_bounds<I: IntoIterator<Item = f64>>(values: I) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return (1.0, 2.0);
    }
    (
        (min.log2().floor() - 1.0).exp2(),
        (max.log2().ceil() + 1.0).exp2(),
    )
}

/// X range covering the sweep and every workload intensity.
pub fn x_bounds(intensity: &[f64], workloads: &[Workload]) -> (f64, f64) {
    pow2_bounds(
        intensity
            .iter()
            .copied()
            .chain(workloads.iter().map(Workload::arithmetic_intensity)),
    )
}

/// Y range covering the matrix and every measured point.
pub fn y_bounds(matrix: &Array2<f64>, workloads: &[Workload]) -> (f64, f64) {
    pow2_bounds(
        matrix.iter().copied().chain(
            workloads
                .iter()
                .flat_map(|w| w.points().iter().map(|p| p.performance)),
        ),
    )
}

/// `count` dashes between `lo` and `hi`, evenly spaced in log2 so they look
/// uniform on a log axis. Dashes and gaps have the same length.
pub fn dash_segments(lo: f64, hi: f64, count: usize) -> Vec<(f64, f64)> {
    if count == 0 {
        return Vec::new();
    }
    let (l0, l1) = (lo.log2(), hi.log2());
    let step = (l1 - l0) / (2 * count - 1) as f64;
    (0..count)
        .map(|k| {
            let start = l0 + (2 * k) as f64 * step;
            (start.exp2(), (start + step).exp2())
        })
        .collect()
}

/// Axis tick label: integers without decimals, small values trimmed.
pub fn format_tick(value: &f64) -> String {
    let v = *value;
    if v >= 1.0 && v.fract() == 0.0 {
        format!("{v:.0}")
    } else if v >= 0.001 {
        let s = format!("{v:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        format!("{v:.1e}")
    }
}
