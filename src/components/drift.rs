//! Column-wise distribution drift between a reference and a current table.
//!
//! Small samples use hypothesis tests (Kolmogorov–Smirnov for numbers,
//! chi-square for categories) and drift when the p-value falls under the
//! threshold. Large samples use distances (normed Wasserstein for numbers,
//! Jensen–Shannon for categories) and drift when the distance reaches the
//! threshold. The dataset drifts when the share of drifted columns reaches
//! the configured drift share.

use crate::constants::{
    DRIFT_DISTANCE_THRESHOLD, DRIFT_LARGE_SAMPLE, DRIFT_P_VALUE_THRESHOLD, DRIFT_SHARE_THRESHOLD,
};
use crate::domain::Table;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

pub const DRIFTED_COLUMNS_COUNT: &str = "DriftedColumnsCount";
pub const VALUE_DRIFT: &str = "ValueDrift";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numerical,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatTest {
    KsPValue,
    WassersteinNormed,
    ChiSquarePValue,
    JensenShannon,
}

impl StatTest {
    pub fn select(kind: ColumnKind, reference_size: usize) -> Self {
        let large = reference_size > DRIFT_LARGE_SAMPLE;
        match (kind, large) {
            (ColumnKind::Numerical, false) => Self::KsPValue,
            (ColumnKind::Numerical, true) => Self::WassersteinNormed,
            (ColumnKind::Categorical, false) => Self::ChiSquarePValue,
            (ColumnKind::Categorical, true) => Self::JensenShannon,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::KsPValue => "ks_p_value",
            Self::WassersteinNormed => "wasserstein_normed",
            Self::ChiSquarePValue => "chi_square_p_value",
            Self::JensenShannon => "jensen_shannon_distance",
        }
    }

    pub fn is_p_value(self) -> bool {
        matches!(self, Self::KsPValue | Self::ChiSquarePValue)
    }

    pub fn default_threshold(self) -> f64 {
        if self.is_p_value() {
            DRIFT_P_VALUE_THRESHOLD
        } else {
            DRIFT_DISTANCE_THRESHOLD
        }
    }

    pub fn is_drift(self, score: f64, threshold: f64) -> bool {
        if self.is_p_value() {
            score < threshold
        } else {
            score >= threshold
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub column: String,
    pub kind: ColumnKind,
    pub method: StatTest,
    pub threshold: f64,
    pub score: Option<f64>,
    pub drifted: bool,
}

/// Column kinds declared by the schema, and the thresholds to apply.
#[derive(Debug, Clone, Default)]
pub struct DriftOptions {
    pub numerical_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    /// Columns present in both tables but never tested.
    pub excluded_columns: Vec<String>,
    pub drift_share: Option<f64>,
    pub stattest_threshold: Option<f64>,
}

impl DriftOptions {
    fn drift_share(&self) -> f64 {
        self.drift_share.unwrap_or(DRIFT_SHARE_THRESHOLD)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub metric_name: String,
    pub config: serde_json::Value,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub metrics: Vec<MetricResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub n_features: Option<usize>,
    pub n_drifted_features: usize,
    pub dataset_drift: bool,
    pub drift_share: f64,
    pub drift_count: usize,
    pub drift_share_threshold: f64,
}

enum Samples<'a> {
    Numerical(Vec<f64>, Vec<f64>),
    Categorical(Vec<&'a str>, Vec<&'a str>),
}

fn samples<'a>(
    name: &str,
    reference: &'a Table,
    current: &'a Table,
    options: &DriftOptions,
) -> Samples<'a> {
    let declared_categorical = options.categorical_columns.iter().any(|c| c == name);
    let declared_numerical = options.numerical_columns.iter().any(|c| c == name);

    if !declared_categorical {
        if let (Some(r), Some(c)) = (reference.numeric_values(name), current.numeric_values(name)) {
            return Samples::Numerical(r, c);
        }
        if declared_numerical {
            tracing::warn!(column = name, "declared numerical but holds non-numeric values, testing as categorical");
        }
    }

    Samples::Categorical(
        reference.present_values(name).unwrap_or_default(),
        current.present_values(name).unwrap_or_default(),
    )
}

pub fn column_drift(
    name: &str,
    reference: &Table,
    current: &Table,
    options: &DriftOptions,
) -> ColumnDrift {
    let samples = samples(name, reference, current, options);
    let (kind, reference_size, current_size) = match &samples {
        Samples::Numerical(r, c) => (ColumnKind::Numerical, r.len(), c.len()),
        Samples::Categorical(r, c) => (ColumnKind::Categorical, r.len(), c.len()),
    };
    let method = StatTest::select(kind, reference_size);
    let threshold = options
        .stattest_threshold
        .unwrap_or_else(|| method.default_threshold());

    let score = if reference_size == 0 || current_size == 0 {
        None
    } else {
        Some(match (&samples, method) {
            (Samples::Numerical(r, c), StatTest::KsPValue) => ks_p_value(r, c),
            (Samples::Numerical(r, c), _) => wasserstein_normed(r, c),
            (Samples::Categorical(r, c), StatTest::ChiSquarePValue) => chi_square_p_value(r, c),
            (Samples::Categorical(r, c), _) => jensen_shannon_distance(r, c),
        })
    };

    ColumnDrift {
        column: name.to_string(),
        kind,
        method,
        threshold,
        drifted: score.is_some_and(|s| method.is_drift(s, threshold)),
        score,
    }
}

/// Tests every column present in both tables, in reference order.
pub fn build_report(reference: &Table, current: &Table, options: &DriftOptions) -> DriftReport {
    let columns: Vec<ColumnDrift> = reference
        .headers()
        .iter()
        .filter(|h| current.has_column(h) && !options.excluded_columns.contains(h))
        .map(|h| column_drift(h, reference, current, options))
        .collect();

    let count = columns.iter().filter(|c| c.drifted).count();
    let share = if columns.is_empty() {
        0.0
    } else {
        count as f64 / columns.len() as f64
    };
    let drift_share = options.drift_share();

    let mut metrics = Vec::with_capacity(columns.len() + 1);
    metrics.push(MetricResult {
        metric_name: format!("{}(drift_share={})", DRIFTED_COLUMNS_COUNT, drift_share),
        config: json!({"type": DRIFTED_COLUMNS_COUNT, "drift_share": drift_share}),
        value: json!({"count": count, "share": share}),
    });
    for column in columns {
        metrics.push(MetricResult {
            metric_name: format!(
                "{}(column={},method={},threshold={})",
                VALUE_DRIFT,
                column.column,
                column.method.name(),
                column.threshold
            ),
            config: json!({
                "type": VALUE_DRIFT,
                "column": column.column,
                "kind": column.kind,
                "method": column.method.name(),
                "threshold": column.threshold,
            }),
            value: json!({"score": column.score, "drifted": column.drifted}),
        });
    }

    DriftReport { metrics }
}

/// Reads the drifted-columns metric out of a saved report.
///
/// `reference_columns`, when known, is the authoritative feature count;
/// otherwise it is inferred from `count / share`.
pub fn parse_drift_report(
    report: &serde_json::Value,
    reference_columns: Option<usize>,
) -> DriftSummary {
    let empty = Vec::new();
    let metrics = report
        .get("metrics")
        .and_then(|m| m.as_array())
        .unwrap_or(&empty);

    let drifted_metric = metrics.iter().find(|m| {
        let cfg_type = m
            .pointer("/config/type")
            .and_then(|t| t.as_str())
            .unwrap_or("");
        let metric_name = m.get("metric_name").and_then(|n| n.as_str()).unwrap_or("");
        cfg_type.ends_with(DRIFTED_COLUMNS_COUNT) || metric_name.contains(DRIFTED_COLUMNS_COUNT)
    });

    let Some(metric) = drifted_metric else {
        return DriftSummary {
            n_features: reference_columns,
            n_drifted_features: 0,
            dataset_drift: false,
            drift_share: 0.0,
            drift_count: 0,
            drift_share_threshold: DRIFT_SHARE_THRESHOLD,
        };
    };

    let count = metric.pointer("/value/count").and_then(|c| c.as_f64());
    let share = metric.pointer("/value/share").and_then(|s| s.as_f64());

    let n_features = reference_columns.or_else(|| match (count, share) {
        (Some(count), Some(share)) if share != 0.0 => Some((count / share).round() as usize),
        _ => None,
    });

    let drift_share_threshold = metric
        .pointer("/config/drift_share")
        .and_then(|t| t.as_f64())
        .unwrap_or(DRIFT_SHARE_THRESHOLD);

    let drift_count = count.map(|c| c as usize).unwrap_or(0);
    DriftSummary {
        n_features,
        n_drifted_features: drift_count,
        dataset_drift: share.is_some_and(|s| s >= drift_share_threshold),
        drift_share: share.unwrap_or(0.0),
        drift_count,
        drift_share_threshold,
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Largest gap between the two empirical CDFs.
pub fn ks_statistic(reference: &[f64], current: &[f64]) -> f64 {
    let a = sorted(reference);
    let b = sorted(current);
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n1 - j as f64 / n2).abs());
    }
    d
}

/// Asymptotic two-sample KS p-value.
pub fn ks_p_value(reference: &[f64], current: &[f64]) -> f64 {
    let d = ks_statistic(reference, current);
    let (n1, n2) = (reference.len() as f64, current.len() as f64);
    let en = (n1 * n2 / (n1 + n2)).sqrt();
    kolmogorov_q((en + 0.12 + 0.11 / en) * d)
}

fn kolmogorov_q(lambda: f64) -> f64 {
    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous: f64 = 0.0;

    for j in 1..=100 {
        let j = j as f64;
        let term = fac * (a2 * j * j).exp();
        sum += term;
        if term.abs() <= 0.001 * previous || term.abs() <= 1.0e-8 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous = term.abs();
    }
    // series did not converge: distributions are indistinguishable
    1.0
}

/// Earth mover's distance divided by the reference standard deviation.
pub fn wasserstein_normed(reference: &[f64], current: &[f64]) -> f64 {
    let a = sorted(reference);
    let b = sorted(current);
    let mut all: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    all.sort_by(|x, y| x.total_cmp(y));

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut distance = 0.0;
    for window in all.windows(2) {
        while i < a.len() && a[i] <= window[0] {
            i += 1;
        }
        while j < b.len() && b[j] <= window[0] {
            j += 1;
        }
        distance += (i as f64 / n1 - j as f64 / n2).abs() * (window[1] - window[0]);
    }

    let mean = a.iter().sum::<f64>() / n1;
    let std = (a.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n1).sqrt();
    distance / std.max(0.001)
}

fn frequencies<'a>(values: &[&'a str]) -> BTreeMap<&'a str, f64> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(*value).or_insert(0.0) += 1.0;
    }
    counts
}

/// Chi-square test of homogeneity over the union of observed categories.
pub fn chi_square_p_value(reference: &[&str], current: &[&str]) -> f64 {
    let ref_counts = frequencies(reference);
    let cur_counts = frequencies(current);
    let mut categories: Vec<&str> = ref_counts.keys().chain(cur_counts.keys()).copied().collect();
    categories.sort_unstable();
    categories.dedup();

    if categories.len() < 2 {
        return 1.0;
    }

    let (n1, n2) = (reference.len() as f64, current.len() as f64);
    let total = n1 + n2;
    let mut statistic = 0.0;
    for category in &categories {
        let o1 = ref_counts.get(category).copied().unwrap_or(0.0);
        let o2 = cur_counts.get(category).copied().unwrap_or(0.0);
        let column_total = o1 + o2;
        for (observed, row_total) in [(o1, n1), (o2, n2)] {
            let expected = row_total * column_total / total;
            if expected > 0.0 {
                statistic += (observed - expected).powi(2) / expected;
            }
        }
    }

    let dof = (categories.len() - 1) as f64;
    gamma_q(dof / 2.0, statistic / 2.0)
}

/// Jensen–Shannon distance (natural log) between category proportions.
pub fn jensen_shannon_distance(reference: &[&str], current: &[&str]) -> f64 {
    let ref_counts = frequencies(reference);
    let cur_counts = frequencies(current);
    let (n1, n2) = (reference.len() as f64, current.len() as f64);

    let mut categories: Vec<&str> = ref_counts.keys().chain(cur_counts.keys()).copied().collect();
    categories.sort_unstable();
    categories.dedup();

    let mut divergence = 0.0;
    for category in categories {
        let p = ref_counts.get(category).copied().unwrap_or(0.0) / n1;
        let q = cur_counts.get(category).copied().unwrap_or(0.0) / n2;
        let m = (p + q) / 2.0;
        if p > 0.0 {
            divergence += 0.5 * p * (p / m).ln();
        }
        if q > 0.0 {
            divergence += 0.5 * q * (q / m).ln();
        }
    }
    divergence.max(0.0).sqrt()
}

const GAMMA_EPS: f64 = 1.0e-12;
const GAMMA_FPMIN: f64 = 1.0e-300;
const GAMMA_ITERATIONS: usize = 500;

fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut series = 1.000_000_000_190_015;
    for c in COEFFICIENTS {
        y += 1.0;
        series += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * series / x).ln()
}

/// Regularized upper incomplete gamma function Q(a, x).
fn gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    let prefix = (-x + a * x.ln() - ln_gamma(a)).exp();

    if x < a + 1.0 {
        let mut ap = a;
        let mut delta = 1.0 / a;
        let mut sum = delta;
        for _ in 0..GAMMA_ITERATIONS {
            ap += 1.0;
            delta *= x / ap;
            sum += delta;
            if delta.abs() < sum.abs() * GAMMA_EPS {
                break;
            }
        }
        (1.0 - sum * prefix).clamp(0.0, 1.0)
    } else {
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / GAMMA_FPMIN;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..=GAMMA_ITERATIONS {
            let an = -(i as f64) * (i as f64 - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < GAMMA_FPMIN {
                d = GAMMA_FPMIN;
            }
            c = b + an / c;
            if c.abs() < GAMMA_FPMIN {
                c = GAMMA_FPMIN;
            }
            d = 1.0 / d;
            let delta = d * c;
            h *= delta;
            if (delta - 1.0).abs() < GAMMA_EPS {
                break;
            }
        }
        (prefix * h).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        let mut table = Table::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            table
                .push_row(row.iter().map(|c| c.to_string()).collect())
                .unwrap();
        }
        table
    }

    #[test]
    fn ks_statistic_of_identical_samples_is_zero() {
        let sample = [1.0, 2.0, 2.0, 3.0, 5.0];
        assert_eq!(ks_statistic(&sample, &sample), 0.0);
        assert_eq!(ks_p_value(&sample, &sample), 1.0);
    }

    #[test]
    fn ks_detects_shifted_samples() {
        let reference: Vec<f64> = (0..50).map(f64::from).collect();
        let current: Vec<f64> = (100..150).map(f64::from).collect();

        assert_eq!(ks_statistic(&reference, &current), 1.0);
        assert!(ks_p_value(&reference, &current) < 1.0e-6);
    }

    #[test]
    fn wasserstein_of_constant_shift() {
        let reference = [0.0, 1.0, 2.0, 3.0];
        let current = [1.0, 2.0, 3.0, 4.0];
        let std = (1.25f64).sqrt();

        let distance = wasserstein_normed(&reference, &current);
        assert!((distance - 1.0 / std).abs() < 1.0e-9);
    }

    #[test]
    fn gamma_q_matches_known_chi_square_tail() {
        // chi-square with 1 degree of freedom at 3.841 has p close to 0.05
        let p = gamma_q(0.5, 3.841_458_820_694_124 / 2.0);
        assert!((p - 0.05).abs() < 1.0e-6, "p = {p}");

        // 4 degrees of freedom at 9.488 also sits at 0.05
        let p = gamma_q(2.0, 9.487_729_036_781_154 / 2.0);
        assert!((p - 0.05).abs() < 1.0e-6, "p = {p}");
    }

    #[test]
    fn chi_square_separates_same_and_different_mixes() {
        let same: Vec<&str> = ["Asia", "Europe", "Africa"].repeat(20);
        assert!(chi_square_p_value(&same, &same) > 0.99);

        let reference: Vec<&str> = ["Asia"; 40].into_iter().chain(["Europe"; 40]).collect();
        let current: Vec<&str> = ["Asia"; 5].into_iter().chain(["Europe"; 75]).collect();
        assert!(chi_square_p_value(&reference, &current) < 0.001);

        assert_eq!(chi_square_p_value(&["Asia"], &["Asia", "Asia"]), 1.0);
    }

    #[test]
    fn jensen_shannon_bounds() {
        assert_eq!(jensen_shannon_distance(&["a", "b"], &["a", "b"]), 0.0);

        let disjoint = jensen_shannon_distance(&["a", "a"], &["b", "b"]);
        assert!((disjoint - std::f64::consts::LN_2.sqrt()).abs() < 1.0e-12);
    }

    #[test]
    fn report_counts_drifted_columns() {
        let mut reference_rows: Vec<Vec<String>> = Vec::new();
        let mut current_rows: Vec<Vec<String>> = Vec::new();
        for i in 0..60 {
            let continent = if i % 2 == 0 { "Asia" } else { "Europe" };
            reference_rows.push(vec![i.to_string(), continent.to_string()]);
            current_rows.push(vec![(i + 1000).to_string(), continent.to_string()]);
        }
        let mut reference = Table::new(vec!["wage".into(), "continent".into()]);
        let mut current = reference.clone();
        for row in reference_rows {
            reference.push_row(row).unwrap();
        }
        for row in current_rows {
            current.push_row(row).unwrap();
        }

        let options = DriftOptions {
            numerical_columns: vec!["wage".into()],
            categorical_columns: vec!["continent".into()],
            ..Default::default()
        };
        let report = build_report(&reference, &current, &options);

        assert_eq!(report.metrics.len(), 3);
        assert_eq!(report.metrics[0].value["count"], 1);
        assert_eq!(report.metrics[0].value["share"], 0.5);
        assert_eq!(report.metrics[1].config["method"], "ks_p_value");
        assert_eq!(report.metrics[1].value["drifted"], true);
        assert_eq!(report.metrics[2].config["method"], "chi_square_p_value");
        assert_eq!(report.metrics[2].value["drifted"], false);

        let summary = parse_drift_report(&serde_json::to_value(&report).unwrap(), Some(2));
        assert_eq!(summary.n_features, Some(2));
        assert_eq!(summary.n_drifted_features, 1);
        assert!(summary.dataset_drift);
    }

    #[test]
    fn excluded_columns_are_skipped() {
        let reference = table(&["case_id", "wage"], &[&["A1", "10"], &["A2", "11"]]);
        let current = table(&["case_id", "wage"], &[&["B1", "10"], &["B2", "11"]]);
        let options = DriftOptions {
            excluded_columns: vec!["case_id".into()],
            ..Default::default()
        };

        let report = build_report(&reference, &current, &options);

        assert_eq!(report.metrics.len(), 2);
        assert_eq!(report.metrics[1].config["column"], "wage");
    }

    #[test]
    fn declared_categorical_numbers_use_category_tests() {
        let reference = table(&["code"], &[&["1"], &["2"], &["1"]]);
        let options = DriftOptions {
            categorical_columns: vec!["code".into()],
            ..Default::default()
        };

        let drift = column_drift("code", &reference, &reference, &options);
        assert_eq!(drift.kind, ColumnKind::Categorical);
        assert_eq!(drift.method, StatTest::ChiSquarePValue);
    }

    #[test]
    fn empty_columns_have_no_score() {
        let reference = table(&["wage"], &[&["na"], &[""]]);
        let current = table(&["wage"], &[&["10"]]);

        let drift = column_drift("wage", &reference, &current, &DriftOptions::default());
        assert_eq!(drift.score, None);
        assert!(!drift.drifted);
    }

    #[test]
    fn threshold_override_applies() {
        let reference = table(&["wage"], &[&["1"], &["2"], &["3"]]);
        let options = DriftOptions {
            stattest_threshold: Some(0.2),
            ..Default::default()
        };

        let drift = column_drift("wage", &reference, &reference, &options);
        assert_eq!(drift.threshold, 0.2);
    }

    #[test]
    fn parse_without_drift_metric_falls_back() {
        let summary = parse_drift_report(&json!({"metrics": []}), Some(7));
        assert_eq!(summary.n_features, Some(7));
        assert_eq!(summary.n_drifted_features, 0);
        assert!(!summary.dataset_drift);
        assert_eq!(summary.drift_share_threshold, 0.5);
    }

    #[test]
    fn parse_infers_feature_count_and_default_threshold() {
        let report = json!({
            "metrics": [{
                "metric_name": "DriftedColumnsCount(drift_share=0.5)",
                "config": {"type": "metrics:DriftedColumnsCount"},
                "value": {"count": 3.0, "share": 0.3}
            }]
        });

        let summary = parse_drift_report(&report, None);
        assert_eq!(summary.n_features, Some(10));
        assert_eq!(summary.drift_count, 3);
        assert_eq!(summary.drift_share_threshold, 0.5);
        assert!(!summary.dataset_drift);
    }

    #[test]
    fn parse_with_zero_share_has_unknown_feature_count() {
        let report = json!({
            "metrics": [{
                "metric_name": "DriftedColumnsCount",
                "config": {"type": "DriftedColumnsCount", "drift_share": 0.25},
                "value": {"count": 0, "share": 0.0}
            }]
        });

        let summary = parse_drift_report(&report, None);
        assert_eq!(summary.n_features, None);
        assert_eq!(summary.drift_share_threshold, 0.25);
        assert!(!summary.dataset_drift);
    }
}
