pub mod schema;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{DashError, DashResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourceConfig,
    pub columns: ColumnConfig,
    pub display: DisplayConfig,
    pub audit: AuditConfig,
}

/// Optional CSV files replacing the embedded tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub bp: Option<PathBuf>,
    pub meq: Option<PathBuf>,
    pub cgi: Option<PathBuf>,
}

/// Accepted header variants for one logical column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    /// Exact header names, compared trimmed and case-insensitively.
    pub aliases: Vec<String>,
    /// A header matches a group when it contains every substring of it.
    pub contains: Vec<Vec<String>>,
    /// Headers containing any of these never match a `contains` group.
    pub exclude: Vec<String>,
    pub fallback: String,
}

impl ColumnSpec {
    pub fn new(fallback: &str) -> Self {
        Self {
            aliases: vec![fallback.to_string()],
            fallback: fallback.to_string(),
            ..Default::default()
        }
    }

    pub fn containing(mut self, parts: &[&str]) -> Self {
        self.contains.push(parts.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn excluding(mut self, part: &str) -> Self {
        self.exclude.push(part.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BpColumns {
    pub patient: ColumnSpec,
    pub pre: ColumnSpec,
    pub post: ColumnSpec,
    pub delta: ColumnSpec,
}

impl Default for BpColumns {
    fn default() -> Self {
        Self {
            patient: ColumnSpec::new("Patient")
                .containing(&["Patient"])
                .excluding("ID"),
            pre: ColumnSpec::new("Mean Pre Orthostatic Systolic BP")
                .containing(&["Mean Pre"]),
            post: ColumnSpec::new("Mean Post Orthostatic Systolic BP")
                .containing(&["Mean Post"]),
            delta: ColumnSpec::new("Pre–Post Δ Orthostatic Systolic BP")
                .containing(&["Pre", "Post", "Orthostatic"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeqColumns {
    pub patient: ColumnSpec,
    pub pre: ColumnSpec,
    pub post: ColumnSpec,
    pub reduction: ColumnSpec,
}

impl Default for MeqColumns {
    fn default() -> Self {
        Self {
            patient: ColumnSpec::new("Patient")
                .containing(&["Patient"])
                .excluding("ID"),
            pre: ColumnSpec::new("MEQ_Pre").containing(&["MEQ", "Pre"]),
            post: ColumnSpec::new("MEQ_Post").containing(&["MEQ", "Post"]),
            reduction: ColumnSpec::new("Percent_Reduction").containing(&["Reduction"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CgiColumns {
    pub patient: ColumnSpec,
    pub score: ColumnSpec,
}

impl Default for CgiColumns {
    fn default() -> Self {
        Self {
            patient: ColumnSpec::new("Patient")
                .containing(&["Patient"])
                .excluding("ID"),
            score: ColumnSpec::new("CGI-I Score")
                .containing(&["CGI"])
                .containing(&["Score"]),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub bp: BpColumns,
    pub meq: MeqColumns,
    pub cgi: CgiColumns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub decimals: usize,
    /// Stat text shown while the results section is hidden.
    pub placeholder: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            decimals: 1,
            placeholder: "---".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Allowed gap in mmHg between the delta column and pre − post.
    pub delta_tolerance: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { delta_tolerance: 0.01 }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> DashResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DashResult<()> {
        if self.display.decimals > 6 {
            return Err(DashError::Config(
                "display.decimals must be between 0 and 6".to_string()
            ));
        }

        if !self.audit.delta_tolerance.is_finite() || self.audit.delta_tolerance < 0.0 {
            return Err(DashError::Config(
                "audit.delta_tolerance must be a non-negative number".to_string()
            ));
        }

        let specs = [
            ("bp.patient", &self.columns.bp.patient),
            ("bp.pre", &self.columns.bp.pre),
            ("bp.post", &self.columns.bp.post),
            ("bp.delta", &self.columns.bp.delta),
            ("meq.patient", &self.columns.meq.patient),
            ("meq.pre", &self.columns.meq.pre),
            ("meq.post", &self.columns.meq.post),
            ("meq.reduction", &self.columns.meq.reduction),
            ("cgi.patient", &self.columns.cgi.patient),
            ("cgi.score", &self.columns.cgi.score),
        ];

        for (name, spec) in specs {
            if spec.fallback.trim().is_empty() {
                return Err(DashError::Config(
                    format!("Column {} needs a non-empty fallback name", name)
                ));
            }
            if spec.contains.iter().any(|group| group.is_empty()) {
                return Err(DashError::Config(
                    format!("Column {} has an empty contains group", name)
                ));
            }
        }

        Ok(())
    }
}
