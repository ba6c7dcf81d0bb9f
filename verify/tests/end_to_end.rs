//! Full verification runs over synthetic catalogs written to disk.

use shared::SourceCatalog;
use test_helpers::{observed_field, output_path};
use verify::checks::CheckInputs;
use verify::report::render;
use verify::runner::{checks_from_config, prepare_inputs, run_checks, CheckSet};
use verify::{MetricBundle, Verdict, VerifyConfig};

fn run_all(
    measured: &SourceCatalog,
    reference: &SourceCatalog,
    config: &VerifyConfig,
) -> MetricBundle {
    let dir = tempfile::tempdir().unwrap();
    let measured_path = dir.path().join("measured.csv");
    let reference_path = dir.path().join("reference.json");
    measured.save_csv(&measured_path).unwrap();
    reference.save_json(&reference_path).unwrap();

    let (measured, reference) = prepare_inputs(&measured_path, &reference_path, config).unwrap();
    let checks = checks_from_config(config, CheckSet::All).unwrap();
    let inputs = CheckInputs {
        measured: &measured,
        reference: &reference,
    };
    run_checks(&checks, &inputs, &config.dataset).unwrap()
}

#[test]
fn good_catalog_meets_every_requirement() {
    let (measured, reference) = observed_field(600, 3.0, 0, 101);
    let config = VerifyConfig {
        dataset: "synthetic_good".to_string(),
        ..VerifyConfig::default()
    };

    let bundle = run_all(&measured, &reference, &config);
    assert!(bundle.all_passed(), "{}", render(&bundle));
    assert_eq!(bundle.dataset, "synthetic_good");
    assert!(bundle.get("abs_astrometry_median").is_some());
    assert!(bundle.get("rel_astrometry_median_20pm2arcmin").is_some());
    assert_eq!(bundle.get("completeness").unwrap().value, Some(1.0));

    let path = output_path("synthetic_good_metrics.json");
    bundle.save_to_file(&path).unwrap();
    assert_eq!(MetricBundle::load_from_file(&path).unwrap(), bundle);
}

#[test]
fn noisy_catalog_with_fakes_fails() {
    let (measured, reference) = observed_field(600, 60.0, 200, 102);
    let bundle = run_all(&measured, &reference, &VerifyConfig::default());

    assert!(!bundle.all_passed());
    let failed: Vec<&str> = bundle.failures().iter().map(|m| m.metric.as_str()).collect();
    assert!(failed.contains(&"abs_astrometry_median"), "{failed:?}");
    assert!(failed.contains(&"false_positive_rate"), "{failed:?}");
    assert!(!failed.contains(&"completeness"), "{failed:?}");

    let report = render(&bundle);
    assert!(report.lines().last().unwrap().ends_with("FAIL"));
}

#[test]
fn empty_magnitude_window_reports_not_computed() {
    let (measured, reference) = observed_field(200, 3.0, 0, 103);
    let config = VerifyConfig {
        magnitude_range: shared::range_arg::MagnitudeRange::new(5.0, 6.0).unwrap(),
        ..VerifyConfig::default()
    };

    let bundle = run_all(&measured, &reference, &config);
    let checked: Vec<_> = bundle.measurements.iter().filter_map(|m| m.verdict).collect();
    assert!(!checked.is_empty());
    assert!(checked.iter().all(|v| *v == Verdict::NotComputed));
    assert!(!bundle.all_passed());
}
