//! Plain-text rendering of a metric bundle.

use crate::metrics::{Measurement, MetricBundle};
use crate::requirement::Verdict;

const HEADERS: [&str; 5] = ["metric", "value", "unit", "requirement", "verdict"];

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e9 => format!("{v:.0}"),
        Some(v) => format!("{v:.3}"),
        None => "-".to_string(),
    }
}

fn row(m: &Measurement) -> [String; 5] {
    let requirement = m
        .requirement
        .as_ref()
        .map(|r| format!("{} {}", r.comparison.symbol(), r.threshold))
        .unwrap_or_default();
    let verdict = m.verdict.map(|v| v.to_string()).unwrap_or_default();
    [
        m.metric.clone(),
        format_value(m.value),
        m.unit.clone(),
        requirement,
        verdict,
    ]
}

/// Aligned table of every measurement followed by a pass/fail summary
pub fn render(bundle: &MetricBundle) -> String {
    let rows: Vec<[String; 5]> = bundle.measurements.iter().map(row).collect();

    let mut widths = HEADERS.map(str::len);
    for r in &rows {
        for (w, cell) in widths.iter_mut().zip(r) {
            *w = (*w).max(cell.len());
        }
    }

    let mut lines = vec![format!(
        "Verification report: {} ({})",
        bundle.dataset,
        bundle.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )];

    let header = HEADERS.map(String::from);
    for r in std::iter::once(&header).chain(&rows) {
        let line = r
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                if i == 1 {
                    format!("{cell:>w$}")
                } else {
                    format!("{cell:<w$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }

    let verdicts: Vec<Verdict> = bundle.measurements.iter().filter_map(|m| m.verdict).collect();
    let count = |v: Verdict| verdicts.iter().filter(|x| **x == v).count();
    lines.push(format!(
        "{} passed, {} failed, {} not computed: {}",
        count(Verdict::Pass),
        count(Verdict::Fail),
        count(Verdict::NotComputed),
        if bundle.all_passed() { "PASS" } else { "FAIL" }
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::Requirement;

    #[test]
    fn test_render_table() {
        let mut bundle = MetricBundle::new("rc2");
        bundle.extend([
            Measurement::info("abs_astrometry_matches", Some(812.0), "count"),
            Measurement::checked(
                Requirement::at_most("abs_astrometry_median", "median", 50.0, "mas"),
                Some(11.8123),
            ),
            Measurement::checked(Requirement::at_least("completeness", "c", 0.9, ""), None),
        ]);

        let text = render(&bundle);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Verification report: rc2"));
        assert!(lines[1].starts_with("metric"));
        assert!(lines[2].contains("812"));
        assert!(lines[3].contains("11.812"));
        assert!(lines[3].contains("<= 50"));
        assert!(lines[3].ends_with("PASS"));
        assert!(lines[4].ends_with("N/A"));
        assert_eq!(lines[5], "1 passed, 0 failed, 1 not computed: FAIL");
    }

    #[test]
    fn test_columns_align() {
        let mut bundle = MetricBundle::new("align");
        bundle.extend([
            Measurement::info("a", Some(1.5), "mas"),
            Measurement::info("a_much_longer_metric", Some(22.25), "mas"),
        ]);
        let text = render(&bundle);
        let lines: Vec<&str> = text.lines().collect();
        let unit_col = lines[2].find("mas").unwrap();
        assert_eq!(lines[3].find("mas").unwrap(), unit_col);
        assert!(text.ends_with("0 passed, 0 failed, 0 not computed: PASS\n"));
    }
}
