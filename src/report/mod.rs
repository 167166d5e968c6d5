//! End-to-end attribution report
//!
//! One parameterized procedure: load the model and the held-out feature
//! table, subsample deterministically, compute exact TreeSHAP scores for
//! the class of interest, and write the summary and bar artifacts.

use crate::data::{load_labels, sample_rows, FeatureTable};
use crate::error::{ExplainError, Result};
use crate::explain::TreeExplainer;
use crate::model::ModelArtifact;
use crate::render::{render_bar, render_beeswarm, PlotConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Default row cap for the attribution sample.
pub const DEFAULT_SAMPLE_CAP: usize = 500;
/// Default sampling seed.
pub const DEFAULT_SEED: u64 = 42;
/// Default class of interest (the positive class of a binary model).
pub const DEFAULT_CLASS_OF_INTEREST: usize = 1;

/// Configuration for one attribution report run.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Dataset identity, used in output filenames (e.g. "credit")
    pub dataset_label: String,
    /// Plot title override; derived from the label when absent
    pub title: Option<String>,
    /// Serialized model artifact
    pub model_path: PathBuf,
    /// Held-out feature table (CSV with header)
    pub features_path: PathBuf,
    /// Optional label vector (CSV, single column); logged, not explained
    pub labels_path: Option<PathBuf>,
    /// Directory receiving the two PNG artifacts
    pub output_dir: PathBuf,
    /// Row cap for the attribution sample
    pub sample_cap: usize,
    /// Sampling seed
    pub seed: u64,
    /// Class whose scores feed the plots
    pub class_of_interest: usize,
    /// Artifact geometry
    pub plot: PlotConfig,
}

impl ReportConfig {
    /// Create a config with the default cap, seed, and class of interest.
    pub fn new(
        dataset_label: &str,
        model_path: impl Into<PathBuf>,
        features_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dataset_label: dataset_label.to_string(),
            title: None,
            model_path: model_path.into(),
            features_path: features_path.into(),
            labels_path: None,
            output_dir: output_dir.into(),
            sample_cap: DEFAULT_SAMPLE_CAP,
            seed: DEFAULT_SEED,
            class_of_interest: DEFAULT_CLASS_OF_INTEREST,
            plot: PlotConfig::default(),
        }
    }

    /// Set the label vector path
    pub fn with_labels_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.labels_path = Some(path.into());
        self
    }

    /// Set the plot title
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Set the sample cap
    pub fn with_sample_cap(mut self, cap: usize) -> Self {
        self.sample_cap = cap;
        self
    }

    /// Set the sampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the class of interest
    pub fn with_class_of_interest(mut self, class: usize) -> Self {
        self.class_of_interest = class;
        self
    }

    /// Set the artifact geometry
    pub fn with_plot(mut self, plot: PlotConfig) -> Self {
        self.plot = plot;
        self
    }

    /// The title used on both plots.
    pub fn resolved_title(&self) -> String {
        match &self.title {
            Some(t) => t.clone(),
            None => {
                let mut chars = self.dataset_label.chars();
                let capitalized = match chars.next() {
                    Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                };
                format!("{} Model", capitalized)
            }
        }
    }

    /// Output path of the beeswarm summary artifact.
    pub fn summary_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("shap_summary_{}.png", self.dataset_label))
    }

    /// Output path of the bar chart artifact.
    pub fn bar_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("shap_bar_{}.png", self.dataset_label))
    }
}

/// Where a report run wrote its artifacts, and what it explained.
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub summary_path: PathBuf,
    pub bar_path: PathBuf,
    pub rows_used: usize,
    pub n_features: usize,
}

/// Run the full attribution report.
///
/// Fail-fast: any load, validation, attribution, or render failure
/// propagates, and failures before the render phase leave no output
/// files behind. Reruns with unchanged inputs overwrite both artifacts
/// deterministically.
pub fn run_report(cfg: &ReportConfig) -> Result<ReportArtifacts> {
    info!(
        features = %cfg.features_path.display(),
        model = %cfg.model_path.display(),
        "loading data and model"
    );

    let table = FeatureTable::from_csv(&cfg.features_path)?;

    if let Some(labels_path) = &cfg.labels_path {
        let labels = load_labels(labels_path)?;
        if labels.len() != table.n_rows() {
            return Err(ExplainError::ShapeError {
                expected: format!("{} labels", table.n_rows()),
                actual: format!("{} labels", labels.len()),
            });
        }
        let mean = labels.iter().sum::<f64>() / labels.len().max(1) as f64;
        info!(rows = labels.len(), mean_label = mean, "labels loaded");
    }

    let artifact = ModelArtifact::load(&cfg.model_path)?;
    artifact.validate_features(&table)?;

    let model = &artifact.model;
    if cfg.class_of_interest >= model.n_classes() {
        return Err(ExplainError::InvalidClassIndex {
            requested: cfg.class_of_interest,
            n_classes: model.n_classes(),
        });
    }

    let sample = sample_rows(&table, cfg.sample_cap, cfg.seed);
    info!(
        rows = sample.n_rows(),
        total = table.n_rows(),
        cap = cfg.sample_cap,
        "using {} rows for attribution analysis",
        sample.n_rows()
    );

    let start = Instant::now();
    let explainer = TreeExplainer::new(model)?;
    let attributions = explainer.shap_values(&sample.matrix().view())?;
    let scores = attributions.class(cfg.class_of_interest)?;
    info!(elapsed = ?start.elapsed(), "attribution scores computed");

    ensure_output_dir(&cfg.output_dir)?;

    let title = cfg.resolved_title();
    let summary_path = cfg.summary_path();
    render_beeswarm(
        scores,
        &sample,
        &format!("SHAP Summary Plot - {title}"),
        &cfg.plot,
        &summary_path,
    )?;

    let bar_path = cfg.bar_path();
    render_bar(
        scores,
        sample.names(),
        &format!("Mean Attribution Magnitude - {title}"),
        &cfg.plot,
        &bar_path,
    )?;

    info!(
        summary = %summary_path.display(),
        bar = %bar_path.display(),
        "artifacts written"
    );

    Ok(ReportArtifacts {
        summary_path,
        bar_path,
        rows_used: sample.n_rows(),
        n_features: sample.n_features(),
    })
}

/// Create the results directory if it does not exist yet.
fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        ExplainError::RenderError(format!("cannot create output dir {}: {e}", dir.display()))
    })
}
