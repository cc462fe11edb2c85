use crate::config::schema::{BpSchema, CgiSchema, MeqSchema};
use crate::config::Config;
use crate::error::DashResult;
use crate::parser::{parse_csv, Dataset};
use log::{error, info, warn};
use std::path::Path;

pub const BP_CSV: &str = include_str!("bp.csv");
pub const MEQ_CSV: &str = include_str!("meq.csv");
pub const CGI_CSV: &str = include_str!("cgi.csv");

/// The three parsed study tables with their resolved column schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedData {
    pub bp: Dataset,
    pub bp_schema: BpSchema,
    pub meq: Dataset,
    pub meq_schema: MeqSchema,
    pub cgi: Dataset,
    pub cgi_schema: CgiSchema,
}

impl LoadedData {
    pub fn from_texts(bp: &str, meq: &str, cgi: &str, config: &Config) -> DashResult<Self> {
        let bp = parse_csv(bp)?;
        let meq = parse_csv(meq)?;
        let cgi = parse_csv(cgi)?;

        Ok(Self {
            bp_schema: BpSchema::resolve(&bp.headers, &config.columns.bp),
            meq_schema: MeqSchema::resolve(&meq.headers, &config.columns.meq),
            cgi_schema: CgiSchema::resolve(&cgi.headers, &config.columns.cgi),
            bp,
            meq,
            cgi,
        })
    }

    #[cfg(test)]
    pub fn embedded(config: &Config) -> DashResult<Self> {
        Self::from_texts(BP_CSV, MEQ_CSV, CGI_CSV, config)
    }
}

fn read_source(path: Option<&Path>, embedded: &'static str) -> DashResult<String> {
    match path {
        Some(p) => Ok(std::fs::read_to_string(p)?),
        None => Ok(embedded.to_string()),
    }
}

fn try_load(config: &Config) -> DashResult<LoadedData> {
    let bp = read_source(config.sources.bp.as_deref(), BP_CSV)?;
    let meq = read_source(config.sources.meq.as_deref(), MEQ_CSV)?;
    let cgi = read_source(config.sources.cgi.as_deref(), CGI_CSV)?;
    LoadedData::from_texts(&bp, &meq, &cgi, config)
}

/// Load all three tables. A failure is logged and reported as no data, so
/// downstream rendering shows placeholders instead of aborting.
pub fn load(config: &Config) -> Option<LoadedData> {
    match try_load(config) {
        Ok(data) => {
            info!(
                "Loaded {} BP, {} MEQ and {} CGI records",
                data.bp.len(),
                data.meq.len(),
                data.cgi.len()
            );
            for (name, table) in [("BP", &data.bp), ("MEQ", &data.meq), ("CGI", &data.cgi)] {
                if table.is_empty() {
                    warn!("{} table has no records", name);
                }
            }
            Some(data)
        }
        Err(e) => {
            error!("Error loading data: {}", e);
            None
        }
    }
}
