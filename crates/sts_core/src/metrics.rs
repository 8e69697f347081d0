//! Regression evaluation metrics
//!
//! Provides:
//! - RMSE: root-mean-square error
//! - MAE: mean absolute error
//! - R²: coefficient of determination
//! - Pearson r: linear correlation
//! - Spearman ρ: rank correlation (average ranks for ties)
//!
//! Correlations (and R²) of a constant vector are undefined and come back as
//! NaN rather than an error.

use crate::errors::MetricError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named evaluation metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Rmse,
    Mae,
    R2,
    PearsonR,
    SpearmanR,
}

impl Metric {
    /// Metrics reported by default after training
    pub const DEFAULT_SET: [Metric; 3] = [Metric::Rmse, Metric::PearsonR, Metric::SpearmanR];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Rmse => "rmse",
            Metric::Mae => "mae",
            Metric::R2 => "r2",
            Metric::PearsonR => "pearsonr",
            Metric::SpearmanR => "spearmanr",
        }
    }

    /// Decimal places used when printing this metric
    pub fn decimals(&self) -> usize {
        match self {
            Metric::Rmse | Metric::Mae => 2,
            Metric::R2 | Metric::PearsonR | Metric::SpearmanR => 4,
        }
    }

    /// Compute the metric for predictions against ground truth
    pub fn compute(&self, truth: &[f64], predicted: &[f64]) -> Result<f64, MetricError> {
        check_inputs(truth, predicted)?;
        Ok(match self {
            Metric::Rmse => rmse(truth, predicted),
            Metric::Mae => mae(truth, predicted),
            Metric::R2 => r2(truth, predicted),
            Metric::PearsonR => pearson(truth, predicted),
            Metric::SpearmanR => spearman(truth, predicted),
        })
    }

    /// `RMSE = 0.12` style report line
    pub fn format_line(&self, value: f64) -> String {
        format!(
            "{} = {:.*}",
            self.as_str().to_uppercase(),
            self.decimals(),
            value
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rmse" | "root_mean_squared_error" => Ok(Metric::Rmse),
            "mae" | "mean_absolute_error" => Ok(Metric::Mae),
            "r2" => Ok(Metric::R2),
            "pearsonr" => Ok(Metric::PearsonR),
            "spearmanr" => Ok(Metric::SpearmanR),
            _ => Err(MetricError::UnknownMetric(s.to_string())),
        }
    }
}

fn check_inputs(truth: &[f64], predicted: &[f64]) -> Result<(), MetricError> {
    if truth.len() != predicted.len() {
        return Err(MetricError::LengthMismatch {
            truth: truth.len(),
            predicted: predicted.len(),
        });
    }
    if truth.is_empty() {
        return Err(MetricError::Empty);
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn rmse(truth: &[f64], predicted: &[f64]) -> f64 {
    let mse = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / truth.len() as f64;
    mse.sqrt()
}

fn mae(truth: &[f64], predicted: &[f64]) -> f64 {
    truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / truth.len() as f64
}

fn r2(truth: &[f64], predicted: &[f64]) -> f64 {
    let m = mean(truth);
    let ss_tot: f64 = truth.iter().map(|t| (t - m).powi(2)).sum();
    if ss_tot == 0.0 {
        return f64::NAN;
    }
    let ss_res: f64 = truth.iter().zip(predicted).map(|(t, p)| (t - p).powi(2)).sum();
    1.0 - ss_res / ss_tot
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let mx = mean(x);
    let my = mean(y);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

fn spearman(x: &[f64], y: &[f64]) -> f64 {
    pearson(&average_ranks(x), &average_ranks(y))
}

/// 1-based ranks; tied values share the mean of the ranks they span
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Metric values in the order they were requested
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationReport {
    entries: Vec<(Metric, f64)>,
}

impl EvaluationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every metric in `metrics` for one prediction set
    pub fn compute(
        metrics: &[Metric],
        truth: &[f64],
        predicted: &[f64],
    ) -> Result<Self, MetricError> {
        let mut report = Self::new();
        for metric in metrics {
            report.insert(*metric, metric.compute(truth, predicted)?);
        }
        Ok(report)
    }

    /// Insert or replace a metric value
    pub fn insert(&mut self, metric: Metric, value: f64) {
        match self.entries.iter_mut().find(|(m, _)| *m == metric) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((metric, value)),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.entries
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One formatted line per metric
    pub fn lines(&self) -> Vec<String> {
        self.iter().map(|(m, v)| m.format_line(v)).collect()
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rmse_and_mae() {
        let truth = [1.0, 2.0, 3.0, 4.0];
        let pred = [1.0, 2.0, 3.0, 6.0];
        assert!(close(Metric::Rmse.compute(&truth, &pred).unwrap(), 1.0));
        assert!(close(Metric::Mae.compute(&truth, &pred).unwrap(), 0.5));
    }

    #[test]
    fn test_perfect_predictions() {
        let truth = [0.0, 0.25, 0.5, 0.75, 1.0];
        assert!(close(Metric::Rmse.compute(&truth, &truth).unwrap(), 0.0));
        assert!(close(Metric::R2.compute(&truth, &truth).unwrap(), 1.0));
        assert!(close(Metric::PearsonR.compute(&truth, &truth).unwrap(), 1.0));
        assert!(close(Metric::SpearmanR.compute(&truth, &truth).unwrap(), 1.0));
    }

    #[test]
    fn test_pearson_negative_linear() {
        let x = [1.0, 2.0, 3.0];
        let y = [6.0, 4.0, 2.0];
        assert!(close(Metric::PearsonR.compute(&x, &y).unwrap(), -1.0));
    }

    #[test]
    fn test_spearman_monotonic_nonlinear() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 8.0, 27.0, 64.0];
        assert!(close(Metric::SpearmanR.compute(&x, &y).unwrap(), 1.0));
        assert!(Metric::PearsonR.compute(&x, &y).unwrap() < 1.0);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 30.0]), vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(average_ranks(&[0.5, 0.5, 0.5]), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_constant_input_is_nan() {
        let truth = [0.5, 0.5, 0.5];
        let pred = [0.1, 0.2, 0.3];
        assert!(Metric::PearsonR.compute(&truth, &pred).unwrap().is_nan());
        assert!(Metric::SpearmanR.compute(&truth, &pred).unwrap().is_nan());
        assert!(Metric::R2.compute(&truth, &pred).unwrap().is_nan());
    }

    #[test]
    fn test_input_errors() {
        assert_eq!(
            Metric::Rmse.compute(&[1.0], &[1.0, 2.0]),
            Err(MetricError::LengthMismatch {
                truth: 1,
                predicted: 2
            })
        );
        assert_eq!(Metric::Rmse.compute(&[], &[]), Err(MetricError::Empty));
    }

    #[test]
    fn test_parse_metric_names() {
        assert_eq!("rmse".parse::<Metric>().unwrap(), Metric::Rmse);
        assert_eq!("PEARSONR".parse::<Metric>().unwrap(), Metric::PearsonR);
        assert_eq!(" spearmanr ".parse::<Metric>().unwrap(), Metric::SpearmanR);
        assert!(matches!(
            "accuracy".parse::<Metric>(),
            Err(MetricError::UnknownMetric(_))
        ));
    }

    #[test]
    fn test_report_formatting() {
        let mut report = EvaluationReport::new();
        report.insert(Metric::Rmse, 0.1234);
        report.insert(Metric::PearsonR, 0.98765);
        report.insert(Metric::SpearmanR, 0.9765);

        assert_eq!(
            report.lines(),
            vec!["RMSE = 0.12", "PEARSONR = 0.9877", "SPEARMANR = 0.9765"]
        );
        assert_eq!(report.to_string(), "RMSE = 0.12\nPEARSONR = 0.9877\nSPEARMANR = 0.9765\n");
    }

    #[test]
    fn test_report_insert_replaces() {
        let mut report = EvaluationReport::new();
        report.insert(Metric::Rmse, 1.0);
        report.insert(Metric::Rmse, 2.0);
        assert_eq!(report.len(), 1);
        assert_eq!(report.get(Metric::Rmse), Some(2.0));
        assert_eq!(report.get(Metric::Mae), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Metric::DEFAULT_SET).unwrap();
        assert_eq!(json, r#"["rmse","pearsonr","spearmanr"]"#);
    }
}
