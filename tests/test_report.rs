//! Integration test: full attribution report (load -> sample -> explain -> render)

use lucidtree::prelude::*;
use ndarray::{Array1, Array2};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Deterministic synthetic credit-style rows: {age, income, balance}.
fn synth_rows(n: usize) -> (Array2<f64>, Array1<f64>) {
    let mut x = Array2::zeros((n, 3));
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let age = 20.0 + (i % 47) as f64;
        let income = 30_000.0 + ((i * 137) % 60_000) as f64;
        let balance = ((i * 31) % 200) as f64 - 100.0;
        x[[i, 0]] = age;
        x[[i, 1]] = income;
        x[[i, 2]] = balance;
        y[i] = if income / 1000.0 + balance * 0.1 > 55.0 {
            1.0
        } else {
            0.0
        };
    }
    (x, y)
}

fn write_features_csv(path: &Path, x: &Array2<f64>) {
    let mut file = fs::File::create(path).unwrap();
    writeln!(file, "age,income,balance").unwrap();
    for row in x.rows() {
        writeln!(file, "{},{},{}", row[0], row[1], row[2]).unwrap();
    }
}

fn write_labels_csv(path: &Path, y: &Array1<f64>) {
    let mut file = fs::File::create(path).unwrap();
    writeln!(file, "target").unwrap();
    for v in y.iter() {
        writeln!(file, "{}", v).unwrap();
    }
}

fn train_artifact(x: &Array2<f64>, y: &Array1<f64>) -> ModelArtifact {
    let mut forest = ForestClassifier::new(20)
        .with_random_state(7)
        .with_max_depth(6);
    forest.fit(&x.view(), y).unwrap();
    ModelArtifact::new(
        "credit",
        vec!["age".to_string(), "income".to_string(), "balance".to_string()],
        forest,
    )
    .unwrap()
}

/// Everything a report run needs, staged on disk in a temp dir.
struct Fixture {
    dir: TempDir,
    model_path: std::path::PathBuf,
    features_path: std::path::PathBuf,
    labels_path: std::path::PathBuf,
}

fn stage_fixture(n_rows: usize) -> Fixture {
    let dir = TempDir::new().unwrap();
    let (x, y) = synth_rows(n_rows);

    let features_path = dir.path().join("credit_X_test.csv");
    write_features_csv(&features_path, &x);

    let labels_path = dir.path().join("credit_y_test.csv");
    write_labels_csv(&labels_path, &y);

    let model_path = dir.path().join("best_model_credit.bin");
    train_artifact(&x, &y).save(&model_path).unwrap();

    Fixture {
        dir,
        model_path,
        features_path,
        labels_path,
    }
}

#[test]
fn test_end_to_end_produces_two_pngs() {
    let fx = stage_fixture(1000);
    let out_dir = fx.dir.path().join("results");

    let cfg = ReportConfig::new("credit", &fx.model_path, &fx.features_path, &out_dir)
        .with_labels_path(&fx.labels_path);
    let artifacts = run_report(&cfg).unwrap();

    assert_eq!(artifacts.rows_used, 500, "1000 rows should be capped at 500");
    assert_eq!(artifacts.n_features, 3);
    assert_eq!(artifacts.summary_path, out_dir.join("shap_summary_credit.png"));
    assert_eq!(artifacts.bar_path, out_dir.join("shap_bar_credit.png"));

    for path in [&artifacts.summary_path, &artifacts.bar_path] {
        let meta = fs::metadata(path).unwrap();
        assert!(meta.len() > 0, "{} is empty", path.display());
    }
}

#[test]
fn test_small_table_skips_sampling() {
    let fx = stage_fixture(10);
    let out_dir = fx.dir.path().join("results");

    let cfg = ReportConfig::new("credit", &fx.model_path, &fx.features_path, &out_dir);
    let artifacts = run_report(&cfg).unwrap();

    assert_eq!(artifacts.rows_used, 10, "below the cap the sampler is a no-op");
    assert!(artifacts.summary_path.exists());
    assert!(artifacts.bar_path.exists());
}

#[test]
fn test_missing_model_fails_before_any_output() {
    let fx = stage_fixture(50);
    let out_dir = fx.dir.path().join("results");

    let cfg = ReportConfig::new(
        "credit",
        fx.dir.path().join("no_such_model.bin"),
        &fx.features_path,
        &out_dir,
    );
    let result = run_report(&cfg);

    assert!(matches!(result, Err(ExplainError::ModelError(_))));
    assert!(
        !out_dir.exists(),
        "a failed run must not create the output directory"
    );
}

#[test]
fn test_rerun_overwrites_byte_identically() {
    let fx = stage_fixture(800);
    let out_dir = fx.dir.path().join("results");

    let cfg = ReportConfig::new("credit", &fx.model_path, &fx.features_path, &out_dir);

    run_report(&cfg).unwrap();
    let summary_a = fs::read(cfg.summary_path()).unwrap();
    let bar_a = fs::read(cfg.bar_path()).unwrap();

    run_report(&cfg).unwrap();
    let summary_b = fs::read(cfg.summary_path()).unwrap();
    let bar_b = fs::read(cfg.bar_path()).unwrap();

    assert_eq!(summary_a, summary_b, "summary artifact is not deterministic");
    assert_eq!(bar_a, bar_b, "bar artifact is not deterministic");
}

#[test]
fn test_class_out_of_range_is_rejected() {
    let fx = stage_fixture(50);
    let out_dir = fx.dir.path().join("results");

    let cfg = ReportConfig::new("credit", &fx.model_path, &fx.features_path, &out_dir)
        .with_class_of_interest(5);
    let result = run_report(&cfg);

    assert!(matches!(
        result,
        Err(ExplainError::InvalidClassIndex {
            requested: 5,
            n_classes: 2
        })
    ));
    assert!(!out_dir.exists());
}

#[test]
fn test_label_length_mismatch_is_rejected() {
    let fx = stage_fixture(50);
    let out_dir = fx.dir.path().join("results");

    let (_, y_short) = synth_rows(20);
    let short_labels = fx.dir.path().join("short_labels.csv");
    write_labels_csv(&short_labels, &y_short);

    let cfg = ReportConfig::new("credit", &fx.model_path, &fx.features_path, &out_dir)
        .with_labels_path(&short_labels);
    let result = run_report(&cfg);

    assert!(matches!(result, Err(ExplainError::ShapeError { .. })));
}

#[test]
fn test_feature_schema_mismatch_is_rejected() {
    let fx = stage_fixture(50);
    let out_dir = fx.dir.path().join("results");

    // Same width, different column names
    let renamed = fx.dir.path().join("renamed.csv");
    let (x, _) = synth_rows(50);
    let mut file = fs::File::create(&renamed).unwrap();
    writeln!(file, "a,b,c").unwrap();
    for row in x.rows() {
        writeln!(file, "{},{},{}", row[0], row[1], row[2]).unwrap();
    }

    let cfg = ReportConfig::new("credit", &fx.model_path, &renamed, &out_dir);
    let result = run_report(&cfg);

    assert!(matches!(result, Err(ExplainError::ValidationError(_))));
    assert!(!out_dir.exists());
}

#[test]
fn test_custom_cap_and_seed_are_honored() {
    let fx = stage_fixture(300);
    let out_dir = fx.dir.path().join("results");

    let cfg = ReportConfig::new("fraud", &fx.model_path, &fx.features_path, &out_dir)
        .with_sample_cap(100)
        .with_seed(7);
    let artifacts = run_report(&cfg).unwrap();

    assert_eq!(artifacts.rows_used, 100);
    assert_eq!(artifacts.summary_path, out_dir.join("shap_summary_fraud.png"));
    assert_eq!(artifacts.bar_path, out_dir.join("shap_bar_fraud.png"));
}
