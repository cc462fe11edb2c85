use super::{audit_deltas, derive_cgi_distribution, mean, round_to, CgiDistribution, DeltaMismatch, MeqPooledSummary};
use crate::config::Config;
use crate::datasets::LoadedData;
use serde::Serialize;

/// Headline KPIs shown next to the charts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SummaryStats {
    pub avg_pre_drop: f64,
    pub avg_post_drop: f64,
    pub avg_meq_reduction: f64,
    /// Reductions that entered the average (finite ones only).
    pub meq_reductions_used: usize,
}

impl SummaryStats {
    pub fn compute(data: &LoadedData, decimals: usize) -> Self {
        // Missing BP cells count as a zero drop and still count as a patient;
        // infinite drops stay in the sum.
        let pre: Vec<f64> = data.bp.records.iter()
            .map(|r| r.get(&data.bp_schema.pre).or_zero())
            .collect();
        let post: Vec<f64> = data.bp.records.iter()
            .map(|r| r.get(&data.bp_schema.post).or_zero())
            .collect();

        // Division-by-zero reductions leave both the sum and the divisor.
        let reductions: Vec<f64> = data.meq.records.iter()
            .filter_map(|r| r.get(&data.meq_schema.reduction).as_finite())
            .collect();

        Self {
            avg_pre_drop: round_to(mean(&pre), decimals),
            avg_post_drop: round_to(mean(&post), decimals),
            avg_meq_reduction: round_to(mean(&reductions), decimals),
            meq_reductions_used: reductions.len(),
        }
    }
}

/// Everything the summary file and report carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsSummary {
    pub n_bp: usize,
    pub n_meq: usize,
    pub n_cgi: usize,
    pub stats: SummaryStats,
    pub meq_pooled: MeqPooledSummary,
    pub cgi: CgiDistribution,
    pub cgi_improved_share: f64,
    pub delta_mismatches: Vec<DeltaMismatch>,
}

impl ResultsSummary {
    pub fn compute(data: &LoadedData, config: &Config) -> Self {
        let decimals = config.display.decimals;
        let cgi = derive_cgi_distribution(&data.cgi, &data.cgi_schema);

        Self {
            n_bp: data.bp.len(),
            n_meq: data.meq.len(),
            n_cgi: data.cgi.len(),
            stats: SummaryStats::compute(data, decimals),
            meq_pooled: MeqPooledSummary::compute(&data.meq, &data.meq_schema, decimals),
            cgi_improved_share: round_to(cgi.improved_share(), decimals),
            cgi,
            delta_mismatches: audit_deltas(&data.bp, &data.bp_schema, config.audit.delta_tolerance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_embedded_summary_stats() {
        let data = LoadedData::embedded(&Config::default()).unwrap();
        let stats = SummaryStats::compute(&data, 1);

        assert_relative_eq!(stats.avg_pre_drop, 37.3);
        assert_relative_eq!(stats.avg_post_drop, 25.1);
        assert_relative_eq!(stats.avg_meq_reduction, 68.7);
        assert_eq!(stats.meq_reductions_used, 21);
    }

    #[test]
    fn test_missing_bp_values_count_as_zero() {
        let config = Config::default();
        let bp = "Patient ID,Patient,Mean Pre Orthostatic Systolic BP,Mean Post Orthostatic Systolic BP,Pre–Post Δ Orthostatic Systolic BP\n\
                  A,1,30,10,20\n\
                  B,2,,20,\n\
                  C,3,30,n/a,\n";
        let meq = "PAT_MRN_ID,Patient,MEQ_Pre,MEQ_Post,Percent_Reduction\nA,1,0,10,-inf\nB,2,10,5,50\n";
        let data = LoadedData::from_texts(bp, meq, "PAT_MRN_ID,Patient,CGI-I Score\n", &config).unwrap();
        let stats = SummaryStats::compute(&data, 1);

        assert_relative_eq!(stats.avg_pre_drop, 20.0);
        assert_relative_eq!(stats.avg_post_drop, 10.0);
        assert_relative_eq!(stats.avg_meq_reduction, 50.0);
        assert_eq!(stats.meq_reductions_used, 1);
    }

    #[test]
    fn test_infinite_bp_values_stay_in_average() {
        let config = Config::default();
        let bp = "Patient ID,Patient,Mean Pre Orthostatic Systolic BP,Mean Post Orthostatic Systolic BP,Pre–Post Δ Orthostatic Systolic BP\n\
                  A,1,inf,10,\n\
                  B,2,30,-inf,\n\
                  C,3,NaN,,\n";
        let data = LoadedData::from_texts(bp, "", "", &config).unwrap();
        let stats = SummaryStats::compute(&data, 1);

        assert_eq!(stats.avg_pre_drop, f64::INFINITY);
        assert_eq!(stats.avg_post_drop, f64::NEG_INFINITY);
    }

    #[test]
    fn test_empty_tables_give_zero_stats() {
        let config = Config::default();
        let data = LoadedData::from_texts("", "", "", &config).unwrap();
        assert_eq!(SummaryStats::compute(&data, 1), SummaryStats::default());
    }

    #[test]
    fn test_results_summary_counts() {
        let config = Config::default();
        let data = LoadedData::embedded(&config).unwrap();
        let summary = ResultsSummary::compute(&data, &config);

        assert_eq!((summary.n_bp, summary.n_meq, summary.n_cgi), (37, 22, 37));
        assert_relative_eq!(summary.cgi_improved_share, 81.1);
        assert!(summary.delta_mismatches.is_empty());
    }
}
