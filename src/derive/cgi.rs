use crate::config::schema::CgiSchema;
use crate::parser::Dataset;
use log::debug;
use serde::Serialize;

pub const CGI_MIN_SCORE: u8 = 1;
pub const CGI_MAX_SCORE: u8 = 7;
/// Highest score shown in the distribution chart.
pub const CGI_DISPLAY_MAX: u8 = 5;

const CGI_BUCKETS: [(&str, &str); CGI_DISPLAY_MAX as usize] = [
    ("Very Much Improved", "#4ade80"),
    ("Much Improved", "#86efac"),
    ("Minimally Improved", "#bbf7d0"),
    ("No Change", "#52525b"),
    ("Minimally Worse", "#ef4444"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CgiBucket {
    pub score: u8,
    pub label: String,
    pub color: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CgiDistribution {
    /// Displayed buckets, scores 1 through 5.
    pub buckets: Vec<CgiBucket>,
    /// Counts for every valid score, index 0 is score 1.
    pub counts: [usize; CGI_MAX_SCORE as usize],
    /// Records with a valid score (1–7).
    pub counted: usize,
    /// Records whose score is missing, fractional or outside 1–7.
    pub out_of_range: usize,
    pub total: usize,
}

impl CgiDistribution {
    pub fn count(&self, score: u8) -> usize {
        if (CGI_MIN_SCORE..=CGI_MAX_SCORE).contains(&score) {
            self.counts[(score - 1) as usize]
        } else {
            0
        }
    }

    /// Sum of the displayed buckets.
    pub fn displayed(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Percentage of scored patients rated at least minimally improved.
    pub fn improved_share(&self) -> f64 {
        if self.counted == 0 {
            return 0.0;
        }
        let improved: usize = (1..=3).map(|s| self.count(s)).sum();
        improved as f64 / self.counted as f64 * 100.0
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

fn integer_score(value: Option<f64>) -> Option<u8> {
    let v = value?;
    if v.fract() != 0.0 || v < CGI_MIN_SCORE as f64 || v > CGI_MAX_SCORE as f64 {
        return None;
    }
    Some(v as u8)
}

pub fn derive_cgi_distribution(data: &Dataset, schema: &CgiSchema) -> CgiDistribution {
    let mut dist = CgiDistribution {
        total: data.len(),
        ..Default::default()
    };

    for record in &data.records {
        match integer_score(record.get(&schema.score).as_finite()) {
            Some(score) => {
                dist.counts[(score - 1) as usize] += 1;
                dist.counted += 1;
            }
            None => dist.out_of_range += 1,
        }
    }

    if dist.out_of_range > 0 {
        debug!("{} CGI record(s) without a valid score", dist.out_of_range);
    }

    dist.buckets = CGI_BUCKETS
        .iter()
        .enumerate()
        .map(|(idx, (label, color))| CgiBucket {
            score: idx as u8 + 1,
            label: label.to_string(),
            color: color.to_string(),
            count: dist.counts[idx],
        })
        .collect();

    dist
}
