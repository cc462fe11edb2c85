use crate::error::{DashError, DashResult};
use csv::{ReaderBuilder, Trim};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

/// A single type-inferred CSV cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Empty,
}

impl Value {
    /// Infer the cell type from raw text. Division-by-zero exports such as
    /// `-inf` become non-finite numbers rather than text.
    pub fn infer(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return Value::Empty;
        }
        if is_numeric_literal(s) {
            if let Ok(n) = s.parse::<f64>() {
                return Value::Number(n);
            }
        }
        match s.to_ascii_lowercase().as_str() {
            "inf" | "+inf" | "infinity" | "+infinity" => Value::Number(f64::INFINITY),
            "-inf" | "-infinity" => Value::Number(f64::NEG_INFINITY),
            "nan" => Value::Number(f64::NAN),
            _ => Value::Text(s.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Finite numeric value, if any.
    pub fn as_finite(&self) -> Option<f64> {
        self.as_number().filter(|n| n.is_finite())
    }

    /// Numeric value with missing, textual and NaN cells coerced to zero.
    /// Infinities are kept: they are data, not gaps.
    pub fn or_zero(&self) -> f64 {
        match self {
            Value::Number(n) if !n.is_nan() => *n,
            _ => 0.0,
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Empty => Ok(()),
        }
    }
}

// sign? digits [. digits] [exponent], or sign? . digits [exponent]
fn is_numeric_literal(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (mantissa, None),
    };
    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());

    let mantissa_ok = match frac_part {
        Some(f) => all_digits(int_part) && all_digits(f) && !(int_part.is_empty() && f.is_empty()),
        None => !int_part.is_empty() && all_digits(int_part),
    };
    let exponent_ok = match exponent {
        Some(e) => {
            let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
            !digits.is_empty() && all_digits(digits)
        },
        None => true,
    };

    mantissa_ok && exponent_ok
}

/// One data row, keyed by trimmed header name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: HashMap<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&Value::Empty)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }
}

/// Parsed CSV table: header names in column order plus records in row order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse delimited text with a header row into typed records.
pub fn parse_csv(text: &str) -> DashResult<Dataset> {
    if text.trim().is_empty() {
        return Ok(Dataset::default());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DashError::Data("header row has no column names".to_string()));
    }

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let raw = result?;
        if raw.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if raw.len() > headers.len() {
            debug!("Row {} has {} extra cell(s), ignoring them", row + 1, raw.len() - headers.len());
        }

        let mut record = Record::default();
        for (idx, header) in headers.iter().enumerate() {
            let value = raw.get(idx).map(Value::infer).unwrap_or(Value::Empty);
            record.insert(header.clone(), value);
        }
        records.push(record);
    }

    debug!("Parsed {} records over {} columns", records.len(), headers.len());
    Ok(Dataset { headers, records })
}
