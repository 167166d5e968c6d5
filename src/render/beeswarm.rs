//! Beeswarm summary plot
//!
//! One row per feature, importance-ordered, each point one sample:
//! x = attribution score, color = feature value (blue low, red high).

use super::palette::{percentile_bounds, percentile_norm, value_color};
use super::PlotConfig;
use crate::data::FeatureTable;
use crate::error::{ExplainError, Result};
use crate::explain::AttributionSummary;
use ndarray::Array2;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::path::Path;

const COLORBAR_WIDTH: i32 = 70;
const POINT_RADIUS: i32 = 3;
const ROW_HALF_HEIGHT: f64 = 0.4;

/// Render the attribution summary beeswarm to a PNG file.
///
/// `scores` must be the per-sample scores for a single class, aligned
/// with `table` row for row and column for column. Any existing file at
/// `path` is overwritten.
pub fn render_beeswarm(
    scores: &Array2<f64>,
    table: &FeatureTable,
    title: &str,
    cfg: &PlotConfig,
    path: &Path,
) -> Result<()> {
    if scores.nrows() != table.n_rows() || scores.ncols() != table.n_features() {
        return Err(ExplainError::ShapeError {
            expected: format!("{} x {} scores", table.n_rows(), table.n_features()),
            actual: format!("{} x {} scores", scores.nrows(), scores.ncols()),
        });
    }
    if scores.ncols() == 0 {
        return Err(ExplainError::ValidationError(
            "cannot render a summary plot with no features".to_string(),
        ));
    }

    draw(scores, table, title, cfg, path)
        .map_err(|e| ExplainError::RenderError(format!("{}: {e}", path.display())))
}

fn draw(
    scores: &Array2<f64>,
    table: &FeatureTable,
    title: &str,
    cfg: &PlotConfig,
    path: &Path,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let (width, height) = cfg.summary_size;
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let (plot_area, legend_area) = root.split_horizontally(width as i32 - COLORBAR_WIDTH);

    let ranking = AttributionSummary::from_scores(scores).ranking();
    let n_disp = ranking.len().min(cfg.max_display);
    let displayed: Vec<usize> = ranking[..n_disp].iter().map(|&(f, _)| f).collect();

    // Shared x range over the displayed features, zero always included
    let mut x_min = 0.0f64;
    let mut x_max = 0.0f64;
    for &f in &displayed {
        for &v in scores.column(f) {
            if v.is_finite() {
                x_min = x_min.min(v);
                x_max = x_max.max(v);
            }
        }
    }
    if x_max - x_min < 1e-12 {
        x_min = -1.0;
        x_max = 1.0;
    }
    let pad = (x_max - x_min) * 0.05;
    let x_range = (x_min - pad)..(x_max + pad);

    let row_name = {
        let names = table.names().to_vec();
        let displayed = displayed.clone();
        move |row: usize| -> String {
            // Row 0 sits at the bottom; most important feature on top
            let rank = n_disp - 1 - row;
            names[displayed[rank]].clone()
        }
    };

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(title, ("sans-serif", 26))
        .margin(12)
        .x_label_area_size(55)
        .y_label_area_size(170)
        .build_cartesian_2d(x_range, -0.5f64..(n_disp as f64 - 0.5))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n_disp)
        .y_label_formatter(&|y: &f64| {
            let row = y.round();
            if (y - row).abs() < 1e-6 && row >= 0.0 && (row as usize) < n_disp {
                row_name(row as usize)
            } else {
                String::new()
            }
        })
        .x_desc("Attribution value (impact on model output)")
        .label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    // Zero reference line
    chart.draw_series(LineSeries::new(
        vec![(0.0, -0.5), (0.0, n_disp as f64 - 0.5)],
        BLACK.mix(0.3),
    ))?;

    for (rank, &feature) in displayed.iter().enumerate() {
        let row_center = (n_disp - 1 - rank) as f64;
        let col_scores: Vec<f64> = scores.column(feature).iter().copied().collect();
        let col_values: Vec<f64> = table.matrix().column(feature).iter().copied().collect();
        let offsets = swarm_offsets(&col_scores);
        let (lo, hi) = percentile_bounds(&col_values);

        chart.draw_series(col_scores.iter().zip(&col_values).zip(&offsets).map(
            |((&score, &value), &offset)| {
                let color = value_color(percentile_norm(value, lo, hi));
                Circle::new(
                    (score, row_center + offset),
                    POINT_RADIUS,
                    color.mix(0.8).filled(),
                )
            },
        ))?;
    }

    draw_colorbar(&legend_area)?;

    root.present()?;
    Ok(())
}

/// Deterministic vertical spread: scores are binned along x and stacked
/// symmetrically around the row center within each bin.
fn swarm_offsets(scores: &[f64]) -> Vec<f64> {
    const N_BINS: usize = 48;

    let finite: Vec<f64> = scores.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return vec![0.0; scores.len()];
    }
    let lo = finite.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = (hi - lo).max(1e-12);

    let bin_of = |v: f64| -> usize {
        (((v - lo) / span) * (N_BINS - 1) as f64).round() as usize
    };

    let mut counts = [0usize; N_BINS];
    for &v in scores {
        if v.is_finite() {
            counts[bin_of(v)] += 1;
        }
    }
    let max_stack = counts.iter().copied().max().unwrap_or(1);
    let step = ROW_HALF_HEIGHT / ((max_stack / 2).max(1) as f64 + 1.0);

    let mut seen = [0usize; N_BINS];
    scores
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return 0.0;
            }
            let b = bin_of(v);
            let k = seen[b];
            seen[b] += 1;
            // 0, +s, -s, +2s, -2s, ...
            let magnitude = ((k + 1) / 2) as f64 * step;
            let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
            if k == 0 {
                0.0
            } else {
                (sign * magnitude).clamp(-ROW_HALF_HEIGHT, ROW_HALF_HEIGHT)
            }
        })
        .collect()
}

/// Vertical feature-value gradient with High/Low end labels.
fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (w, h) = area.dim_in_pixel();
    let x0 = (w as i32 - COLORBAR_WIDTH) / 2;
    let x1 = x0 + 16;
    let top = 80;
    let bottom = h as i32 - 80;
    let strip = (bottom - top).max(1);

    for i in 0..strip {
        let t = 1.0 - i as f64 / strip as f64;
        area.draw(&Rectangle::new(
            [(x0, top + i), (x1, top + i + 1)],
            value_color(t).filled(),
        ))?;
    }

    let label_style = ("sans-serif", 14).into_font().color(&BLACK.mix(0.8));
    area.draw(&Text::new("High", (x0 - 4, top - 20), label_style.clone()))?;
    area.draw(&Text::new("Low", (x0 - 4, bottom + 8), label_style))?;

    area.draw(&Rectangle::new([(x0, top), (x1, bottom)], BLACK.mix(0.2)))?;
    Ok(())
}
