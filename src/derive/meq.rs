use super::{descending, mean, round_to, sort_key, SeriesView};
use crate::config::schema::MeqSchema;
use crate::parser::{Dataset, Record};
use serde::Serialize;

/// Midodrine-equivalent doses, sorted by pre-intervention dose (largest first).
/// Nothing is filtered here; non-finite reductions stay in the list.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MeqSeries {
    pub labels: Vec<String>,
    pub pre: Vec<f64>,
    pub post: Vec<f64>,
    pub reduction: Vec<f64>,
}

impl MeqSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn grouped_comparison(&self) -> SeriesView {
        SeriesView::new("Medication Burden (Midodrine Equivalents)", self.labels.clone())
            .with_series("Pre-Intervention Dose", self.pre.clone())
            .with_series("Post-Intervention Dose", self.post.clone())
    }
}

pub fn derive_meq_series(data: &Dataset, schema: &MeqSchema) -> MeqSeries {
    let mut rows: Vec<&Record> = data.records.iter().collect();
    rows.sort_by(|a, b| descending(sort_key(a.get(&schema.pre)), sort_key(b.get(&schema.pre))));

    let mut series = MeqSeries::default();
    // Positional labels: patient numbers are not shown on this chart.
    for (idx, row) in rows.iter().enumerate() {
        series.labels.push(format!("Pt {}", idx + 1));
        series.pre.push(row.get(&schema.pre).as_number().unwrap_or(f64::NAN));
        series.post.push(row.get(&schema.post).as_number().unwrap_or(f64::NAN));
        series.reduction.push(row.get(&schema.reduction).as_number().unwrap_or(f64::NAN));
    }
    series
}

/// Cohort-level dose comparison: mean doses and the reduction of the means.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MeqPooledSummary {
    pub n_patients: usize,
    pub mean_pre: f64,
    pub mean_post: f64,
    pub pooled_reduction: f64,
}

impl MeqPooledSummary {
    /// Only records with both doses finite contribute.
    pub fn compute(data: &Dataset, schema: &MeqSchema, decimals: usize) -> Self {
        let (pre, post): (Vec<f64>, Vec<f64>) = data
            .records
            .iter()
            .filter_map(|r| {
                Some((r.get(&schema.pre).as_finite()?, r.get(&schema.post).as_finite()?))
            })
            .unzip();

        let mean_pre = mean(&pre);
        let mean_post = mean(&post);
        let pooled_reduction = if mean_pre > 0.0 {
            (mean_pre - mean_post) / mean_pre * 100.0
        } else {
            0.0
        };

        Self {
            n_patients: pre.len(),
            mean_pre: round_to(mean_pre, decimals),
            mean_post: round_to(mean_post, decimals),
            pooled_reduction: round_to(pooled_reduction, decimals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, MeqColumns};
    use crate::datasets::LoadedData;
    use crate::parser::parse_csv;
    use approx::assert_relative_eq;

    #[test]
    fn test_positional_labels_after_sort() {
        let data = parse_csv(
            "PAT_MRN_ID,Patient,MEQ_Pre,MEQ_Post,Percent_Reduction\n\
             A,10,50,0,100\n\
             B,11,0,33.3,-inf\n\
             C,12,300,0,100\n\
             D,13,50,25,50\n",
        )
        .unwrap();
        let schema = MeqSchema::resolve(&data.headers, &MeqColumns::default());
        let series = derive_meq_series(&data, &schema);

        assert_eq!(series.labels, vec!["Pt 1", "Pt 2", "Pt 3", "Pt 4"]);
        assert_eq!(series.pre, vec![300.0, 50.0, 50.0, 0.0]);
        // ties keep input order
        assert_eq!(series.post, vec![0.0, 0.0, 25.0, 33.3]);
        assert_eq!(series.reduction[3], f64::NEG_INFINITY);
    }

    #[test]
    fn test_embedded_series_keeps_every_record() {
        let data = LoadedData::embedded(&Config::default()).unwrap();
        let series = derive_meq_series(&data.meq, &data.meq_schema);

        assert_eq!(series.len(), 22);
        assert_eq!(series.pre[0], 300.0);
        assert!(series.pre.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(series.reduction.iter().filter(|v| !v.is_finite()).count(), 1);

        let view = series.grouped_comparison();
        assert_eq!(view.series[0].values.len(), 22);
        assert_eq!(view.series[1].name, "Post-Intervention Dose");
    }

    #[test]
    fn test_pooled_summary() {
        let data = LoadedData::embedded(&Config::default()).unwrap();
        let pooled = MeqPooledSummary::compute(&data.meq, &data.meq_schema, 1);

        assert_eq!(pooled.n_patients, 22);
        assert_relative_eq!(pooled.mean_pre, 122.6);
        assert_relative_eq!(pooled.mean_post, 39.8);
        assert_relative_eq!(pooled.pooled_reduction, 67.6);
    }

    #[test]
    fn test_pooled_summary_of_empty_dataset() {
        let pooled = MeqPooledSummary::compute(&Dataset::default(), &MeqSchema::resolve(&[], &MeqColumns::default()), 1);
        assert_eq!(pooled, MeqPooledSummary::default());
    }
}
