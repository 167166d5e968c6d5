//! Mean-absolute-attribution bar chart

use super::palette::BAR_FILL;
use super::PlotConfig;
use crate::error::{ExplainError, Result};
use crate::explain::AttributionSummary;
use ndarray::Array2;
use plotters::prelude::*;
use std::path::Path;

/// Render the mean |score| importance bars to a PNG file.
///
/// Features are ordered by importance, most important on top. Any
/// existing file at `path` is overwritten.
pub fn render_bar(
    scores: &Array2<f64>,
    feature_names: &[String],
    title: &str,
    cfg: &PlotConfig,
    path: &Path,
) -> Result<()> {
    if scores.ncols() != feature_names.len() {
        return Err(ExplainError::ShapeError {
            expected: format!("{} feature names", scores.ncols()),
            actual: format!("{} feature names", feature_names.len()),
        });
    }
    if scores.ncols() == 0 {
        return Err(ExplainError::ValidationError(
            "cannot render a bar chart with no features".to_string(),
        ));
    }

    draw(scores, feature_names, title, cfg, path)
        .map_err(|e| ExplainError::RenderError(format!("{}: {e}", path.display())))
}

fn draw(
    scores: &Array2<f64>,
    feature_names: &[String],
    title: &str,
    cfg: &PlotConfig,
    path: &Path,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let (width, height) = cfg.bar_size;
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let ranking = AttributionSummary::from_scores(scores).ranking();
    let n_disp = ranking.len().min(cfg.max_display);
    let displayed = &ranking[..n_disp];

    let max_val = displayed
        .iter()
        .map(|&(_, v)| v)
        .fold(0.0f64, f64::max)
        .max(1e-12);

    // Segment 0 sits at the bottom; most important feature on top
    let label_for = |segment: u32| -> String {
        (n_disp - 1)
            .checked_sub(segment as usize)
            .and_then(|rank| displayed.get(rank))
            .map(|&(f, _)| feature_names[f].clone())
            .unwrap_or_default()
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(12)
        .x_label_area_size(55)
        .y_label_area_size(170)
        .build_cartesian_2d(0.0..max_val * 1.08, (0u32..n_disp as u32).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_label_formatter(&|seg: &SegmentValue<u32>| match seg {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => label_for(*i),
            _ => String::new(),
        })
        .x_desc("mean(|attribution value|)")
        .label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    chart.draw_series(displayed.iter().enumerate().map(|(rank, &(_, value))| {
        let segment = (n_disp - 1 - rank) as u32;
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(segment)),
                (value, SegmentValue::Exact(segment + 1)),
            ],
            BAR_FILL.mix(0.9).filled(),
        );
        bar.set_margin(6, 6, 0, 0);
        bar
    }))?;

    root.present()?;
    Ok(())
}
