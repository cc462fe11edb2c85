use super::{descending, sort_key, SeriesView};
use crate::config::schema::BpSchema;
use crate::parser::{Dataset, Record};
use log::{debug, warn};
use serde::Serialize;

/// Orthostatic BP drops per patient, sorted by pre-stent drop (largest first).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BpSeries {
    pub labels: Vec<String>,
    pub pre: Vec<f64>,
    pub post: Vec<f64>,
    pub delta: Vec<f64>,
}

impl BpSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Pre vs post drop per patient.
    pub fn grouped_comparison(&self) -> SeriesView {
        SeriesView::new("Orthostatic Systolic BP Drop (mmHg)", self.labels.clone())
            .with_series("Pre-Stent Drop", self.pre.clone())
            .with_series("Post-Stent Drop", self.post.clone())
    }

    /// Per-patient improvement, in the same order as the comparison.
    pub fn improvement_trend(&self) -> SeriesView {
        SeriesView::new("Individual Patient Improvement", self.labels.clone())
            .with_series("Systolic Improvement (mmHg)", self.delta.clone())
    }
}

pub fn derive_bp_series(data: &Dataset, schema: &BpSchema) -> BpSeries {
    let mut rows: Vec<&Record> = data
        .records
        .iter()
        .filter(|r| r.get(&schema.post).as_finite().is_some())
        .collect();

    let dropped = data.len() - rows.len();
    if dropped > 0 {
        debug!("Dropped {} BP record(s) without a finite post value", dropped);
    }

    rows.sort_by(|a, b| descending(sort_key(a.get(&schema.pre)), sort_key(b.get(&schema.pre))));

    let mut series = BpSeries::default();
    for row in rows {
        series.labels.push(format!("Pt {}", row.get(&schema.patient)));
        series.pre.push(row.get(&schema.pre).as_number().unwrap_or(f64::NAN));
        series.post.push(row.get(&schema.post).as_number().unwrap_or(f64::NAN));
        series.delta.push(row.get(&schema.delta).as_number().unwrap_or(f64::NAN));
    }
    series
}

/// A record whose delta column disagrees with pre − post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaMismatch {
    pub patient: String,
    pub delta: f64,
    pub expected: f64,
}

/// Check the delta column against pre − post. Mismatches are reported only;
/// the records stay in every series.
pub fn audit_deltas(data: &Dataset, schema: &BpSchema, tolerance: f64) -> Vec<DeltaMismatch> {
    let mut findings = Vec::new();

    for record in &data.records {
        let (Some(pre), Some(post), Some(delta)) = (
            record.get(&schema.pre).as_finite(),
            record.get(&schema.post).as_finite(),
            record.get(&schema.delta).as_finite(),
        ) else {
            continue;
        };

        let expected = pre - post;
        if (delta - expected).abs() > tolerance {
            let patient = record.get(&schema.patient).to_string();
            warn!(
                "Patient {}: delta {:.3} differs from pre - post {:.3}",
                patient, delta, expected
            );
            findings.push(DeltaMismatch { patient, delta, expected });
        }
    }

    findings
}
