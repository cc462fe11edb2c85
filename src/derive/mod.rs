pub mod bp;
pub mod meq;
pub mod cgi;
pub mod summary;

use crate::config::Config;
use crate::datasets::LoadedData;
use crate::parser::Value;
use serde::Serialize;
use std::cmp::Ordering;

pub use bp::*;
pub use meq::*;
pub use cgi::*;
pub use summary::*;

/// One numeric series aligned with the view labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Chart-ready view: one label sequence plus one or more series in the same
/// index order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<NamedSeries>,
}

impl SeriesView {
    pub fn new(title: &str, labels: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            labels,
            series: Vec::new(),
        }
    }

    pub fn with_series(mut self, name: &str, values: Vec<f64>) -> Self {
        self.series.push(NamedSeries {
            name: name.to_string(),
            values,
        });
        self
    }
}

/// Everything one render pass publishes, recomputed from the loaded tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedResults {
    pub bp: BpSeries,
    pub meq: MeqSeries,
    pub cgi: CgiDistribution,
    pub summary: ResultsSummary,
}

pub fn derive_all(data: &LoadedData, config: &Config) -> DerivedResults {
    DerivedResults {
        bp: derive_bp_series(&data.bp, &data.bp_schema),
        meq: derive_meq_series(&data.meq, &data.meq_schema),
        cgi: derive_cgi_distribution(&data.cgi, &data.cgi_schema),
        summary: ResultsSummary::compute(data, config),
    }
}

/// Sort key for descending value sorts. Missing cells count as zero;
/// text and NaN have no key and sink to the end.
pub(crate) fn sort_key(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_nan() => None,
        Value::Number(n) => Some(*n),
        Value::Empty => Some(0.0),
        Value::Text(_) => None,
    }
}

pub(crate) fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

// Digits past the kept ones used to decide rounding. A double next to an
// exact tie differs from it well before this many places.
const ROUND_GUARD_DIGITS: usize = 40;

/// Round the exact binary value to `decimals` places, ties away from zero.
/// Matches how the dashboard's number formatting rounds, so 0.35 becomes 0.3
/// (its double sits just below the tie) while 0.25 becomes 0.3.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() || value.abs() >= 1e21 {
        return value;
    }

    let expanded = format!("{:.*}", decimals + ROUND_GUARD_DIGITS, value.abs());
    let (int_part, frac_part) = expanded.split_once('.').unwrap_or((expanded.as_str(), ""));
    let (kept, rest) = frac_part.split_at(decimals);

    let mut digits: Vec<u8> = int_part.bytes().chain(kept.bytes()).map(|b| b - b'0').collect();
    let mut int_len = int_part.len();

    if rest.as_bytes().first().is_some_and(|&d| d >= b'5') {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == 9 {
                *d = 0;
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
            int_len += 1;
        }
    }

    let mut text: String = digits[..int_len].iter().map(|d| char::from(b'0' + d)).collect();
    if decimals > 0 {
        text.push('.');
        text.extend(digits[int_len..].iter().map(|d| char::from(b'0' + d)));
    }

    let rounded = text.parse::<f64>().unwrap_or(value.abs());
    if value.is_sign_negative() { -rounded } else { rounded }
}
