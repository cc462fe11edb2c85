use crate::derive::{DerivedResults, ResultsSummary};
use crate::error::{DashError, DashResult};
use crate::render::{ChartHandle, ChartPayload, RenderTarget, SlotId, StatSlot};
use chrono::Utc;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Renders each chart as `<slot>.json` in a directory.
pub struct FileTarget {
    dir: PathBuf,
    stats: BTreeMap<StatSlot, String>,
}

impl FileTarget {
    pub fn new<P: AsRef<Path>>(dir: P) -> DashResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            stats: BTreeMap::new(),
        })
    }

    pub fn chart_path(&self, slot: SlotId) -> PathBuf {
        self.dir.join(format!("{}.json", slot.name()))
    }

    #[cfg(test)]
    pub fn stat(&self, slot: StatSlot) -> Option<&str> {
        self.stats.get(&slot).map(String::as_str)
    }

    /// Write the current stat texts to `stats.json`.
    pub fn flush(&self) -> DashResult<()> {
        let texts: BTreeMap<&str, &str> = self.stats.iter()
            .map(|(slot, text)| (slot.name(), text.as_str()))
            .collect();
        let file = File::create(self.dir.join("stats.json"))?;
        serde_json::to_writer_pretty(file, &texts)?;
        Ok(())
    }
}

struct FileHandle {
    slot: SlotId,
    path: PathBuf,
}

impl ChartHandle for FileHandle {
    fn slot(&self) -> SlotId {
        self.slot
    }

    fn release(self: Box<Self>) -> DashResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl RenderTarget for FileTarget {
    fn has_slot(&self, _slot: SlotId) -> bool {
        self.dir.is_dir()
    }

    fn draw(&mut self, slot: SlotId, payload: &ChartPayload) -> DashResult<Box<dyn ChartHandle>> {
        let path = self.chart_path(slot);
        let file = File::create(&path)
            .map_err(|e| DashError::Render(format!("cannot create {:?}: {}", path, e)))?;
        serde_json::to_writer_pretty(file, payload)?;
        debug!("Wrote {} to {:?}", slot.name(), path);
        Ok(Box::new(FileHandle { slot, path }))
    }

    fn set_stat(&mut self, slot: StatSlot, text: &str) -> bool {
        self.stats.insert(slot, text.to_string());
        true
    }
}

pub fn save_summary<P: AsRef<Path>>(summary: &ResultsSummary, output_dir: P) -> DashResult<()> {
    let file = File::create(output_dir.as_ref().join("summary.json"))?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

/// Write the sorted BP and MEQ series as CSV.
pub fn save_series_csv<P: AsRef<Path>>(results: &DerivedResults, output_dir: P) -> DashResult<()> {
    let output_path = output_dir.as_ref();

    let mut writer = csv::Writer::from_path(output_path.join("bp_series.csv"))?;
    writer.write_record(["LABEL", "PRE_DROP", "POST_DROP", "DELTA"])?;
    let bp = &results.bp;
    for i in 0..bp.len() {
        writer.write_record(&[
            bp.labels[i].clone(),
            bp.pre[i].to_string(),
            bp.post[i].to_string(),
            bp.delta[i].to_string(),
        ])?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(output_path.join("meq_series.csv"))?;
    writer.write_record(["LABEL", "MEQ_PRE", "MEQ_POST", "PERCENT_REDUCTION"])?;
    let meq = &results.meq;
    for i in 0..meq.len() {
        writer.write_record(&[
            meq.labels[i].clone(),
            meq.pre[i].to_string(),
            meq.post[i].to_string(),
            meq.reduction[i].to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// Markdown report of the headline results.
pub fn generate_report<P: AsRef<Path>>(summary: &ResultsSummary, output_dir: P) -> DashResult<()> {
    let report_path = output_dir.as_ref().join("results_report.md");

    let cgi_rows: String = summary.cgi.buckets.iter()
        .map(|b| format!("| {} | {} | {} |\n", b.score, b.label, b.count))
        .collect();

    let mismatches = if summary.delta_mismatches.is_empty() {
        "None.".to_string()
    } else {
        summary.delta_mismatches.iter()
            .map(|m| format!("- Patient {}: delta {:.2} vs pre - post {:.2}", m.patient, m.delta, m.expected))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let report_content = format!(
        r#"# Standup Study Results

Generated: {}

## Hemodynamics
- **Patients**: {}
- **Average pre-stent orthostatic drop**: {} mmHg
- **Average post-stent orthostatic drop**: {} mmHg

## Medication Burden (Midodrine Equivalents)
- **Patients**: {}
- **Average per-patient reduction**: {}% (over {} finite values)
- **Mean dose**: {} mg pre, {} mg post
- **Pooled reduction**: {}%

## Clinical Global Impression (CGI-I)
- **Patients**: {}
- **At least minimally improved**: {}%

| Score | Rating | Patients |
|-------|--------|----------|
{}
## Delta Consistency
{}
"#,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        summary.n_bp,
        summary.stats.avg_pre_drop,
        summary.stats.avg_post_drop,
        summary.n_meq,
        summary.stats.avg_meq_reduction,
        summary.stats.meq_reductions_used,
        summary.meq_pooled.mean_pre,
        summary.meq_pooled.mean_post,
        summary.meq_pooled.pooled_reduction,
        summary.n_cgi,
        summary.cgi_improved_share,
        cgi_rows,
        mismatches,
    );

    std::fs::write(&report_path, report_content)?;
    info!("Report written to {:?}", report_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::datasets::LoadedData;
    use crate::derive::derive_all;
    use crate::render::Dashboard;

    #[test]
    fn test_file_target_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let data = LoadedData::embedded(&config).ok();
        let target = FileTarget::new(dir.path()).unwrap();
        let mut dash = Dashboard::new(config, data, target);

        dash.on_visibility_changed(true).unwrap();
        for slot in SlotId::ALL {
            assert!(dash.target().chart_path(slot).exists());
        }
        assert_eq!(dash.target().stat(StatSlot::MeqReduction), Some("68.7%"));

        let raw = std::fs::read_to_string(dash.target().chart_path(SlotId::CgiDistribution)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["kind"], "doughnut");
        assert_eq!(json["buckets"][1]["count"], 15);

        dash.on_visibility_changed(false).unwrap();
        for slot in SlotId::ALL {
            assert!(!dash.target().chart_path(slot).exists());
        }
        dash.target().flush().unwrap();
        let stats = std::fs::read_to_string(dir.path().join("stats.json")).unwrap();
        assert!(stats.contains("\"stat-pre-drop\": \"---\""));
    }

    #[test]
    fn test_summary_series_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let data = LoadedData::embedded(&config).unwrap();
        let results = derive_all(&data, &config);

        save_summary(&results.summary, dir.path()).unwrap();
        save_series_csv(&results, dir.path()).unwrap();
        generate_report(&results.summary, dir.path()).unwrap();

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["stats"]["meq_reductions_used"], 21);
        assert_eq!(summary["n_cgi"], 37);

        let mut reader = csv::Reader::from_path(dir.path().join("meq_series.csv")).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 22);
        assert_eq!(&rows[0][0], "Pt 1");
        assert!(rows.iter().any(|r| &r[3] == "-inf"));

        let report = std::fs::read_to_string(dir.path().join("results_report.md")).unwrap();
        assert!(report.contains("Average pre-stent orthostatic drop**: 37.3 mmHg"));
        assert!(report.contains("| 1 | Very Much Improved | 8 |"));
    }
}
