use crate::config::{BpColumns, CgiColumns, ColumnSpec, MeqColumns};
use log::debug;

/// Resolve one logical column against the dataset headers.
///
/// Exact aliases win over substring groups; the first header in column order
/// that matches is taken. Without any match the configured fallback name is
/// returned, which then simply reads as an empty column.
pub fn resolve_column(headers: &[String], spec: &ColumnSpec) -> String {
    let exact = headers.iter().find(|header| {
        let header = header.trim();
        spec.aliases.iter().any(|alias| alias.trim().eq_ignore_ascii_case(header))
    });
    if let Some(header) = exact {
        return header.clone();
    }

    let partial = headers.iter().find(|header| {
        let excluded = spec.exclude.iter().any(|part| header.contains(part.as_str()));
        !excluded
            && spec.contains.iter().any(|group| {
                group.iter().all(|part| header.contains(part.as_str()))
            })
    });

    match partial {
        Some(header) => header.clone(),
        None => {
            debug!("No header matched {:?}, using fallback", spec.fallback);
            spec.fallback.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BpSchema {
    pub patient: String,
    pub pre: String,
    pub post: String,
    pub delta: String,
}

impl BpSchema {
    pub fn resolve(headers: &[String], columns: &BpColumns) -> Self {
        Self {
            patient: resolve_column(headers, &columns.patient),
            pre: resolve_column(headers, &columns.pre),
            post: resolve_column(headers, &columns.post),
            delta: resolve_column(headers, &columns.delta),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeqSchema {
    pub patient: String,
    pub pre: String,
    pub post: String,
    pub reduction: String,
}

impl MeqSchema {
    pub fn resolve(headers: &[String], columns: &MeqColumns) -> Self {
        Self {
            patient: resolve_column(headers, &columns.patient),
            pre: resolve_column(headers, &columns.pre),
            post: resolve_column(headers, &columns.post),
            reduction: resolve_column(headers, &columns.reduction),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgiSchema {
    pub patient: String,
    pub score: String,
}

impl CgiSchema {
    pub fn resolve(headers: &[String], columns: &CgiColumns) -> Self {
        Self {
            patient: resolve_column(headers, &columns.patient),
            score: resolve_column(headers, &columns.score),
        }
    }
}
