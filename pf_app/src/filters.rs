use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterParseError {
    #[error("filter '{0}' has no comparison operator (expected >=, <=, > or <)")]
    MissingOperator(String),

    #[error("filter '{0}' has no column name")]
    EmptyColumn(String),

    #[error("filter '{expr}' has a non-numeric value '{value}'")]
    InvalidValue { expr: String, value: String },
}

/// One side of a numeric range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(value: f64) -> Self {
        Self { value, inclusive: true }
    }

    pub fn exclusive(value: f64) -> Self {
        Self { value, inclusive: false }
    }
}

/// Keep rows whose `column` holds a number within the bounds
#[derive(Debug, Clone, PartialEq)]
pub struct NumericFilter {
    pub column: String,
    pub min: Option<Bound>,
    pub max: Option<Bound>,
}

impl NumericFilter {
    pub fn new(column: impl Into<String>) -> Self {
        Self { column: column.into(), min: None, max: None }
    }

    pub fn with_min(mut self, bound: Bound) -> Self {
        self.min = Some(bound);
        self
    }

    pub fn with_max(mut self, bound: Bound) -> Self {
        self.max = Some(bound);
        self
    }

    pub fn accepts(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        let above_min = match self.min {
            Some(Bound { value: min, inclusive: true }) => value >= min,
            Some(Bound { value: min, inclusive: false }) => value > min,
            None => true,
        };
        let below_max = match self.max {
            Some(Bound { value: max, inclusive: true }) => value <= max,
            Some(Bound { value: max, inclusive: false }) => value < max,
            None => true,
        };
        above_min && below_max
    }

    /// Missing or non-numeric cells never pass
    pub fn accepts_cell(&self, cell: Option<&str>) -> bool {
        cell.and_then(|raw| raw.trim().parse::<f64>().ok()).is_some_and(|value| self.accepts(value))
    }
}

impl FromStr for NumericFilter {
    type Err = FilterParseError;

    /// Parse `column>=value`, `column<=value`, `column>value` or `column<value`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim();
        let op_start = expr.find(['<', '>']).ok_or_else(|| FilterParseError::MissingOperator(expr.to_string()))?;

        let column = expr[..op_start].trim();
        if column.is_empty() {
            return Err(FilterParseError::EmptyColumn(expr.to_string()));
        }

        let rest = &expr[op_start..];
        let (op, raw_value) = if rest.starts_with(">=") || rest.starts_with("<=") { rest.split_at(2) } else { rest.split_at(1) };
        let raw_value = raw_value.trim();
        let value: f64 = raw_value
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| FilterParseError::InvalidValue { expr: expr.to_string(), value: raw_value.to_string() })?;

        let filter = NumericFilter::new(column);
        Ok(match op {
            ">=" => filter.with_min(Bound::inclusive(value)),
            ">" => filter.with_min(Bound::exclusive(value)),
            "<=" => filter.with_max(Bound::inclusive(value)),
            _ => filter.with_max(Bound::exclusive(value)),
        })
    }
}

impl fmt::Display for NumericFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(2);
        if let Some(min) = self.min {
            parts.push(format!("{}{}{}", self.column, if min.inclusive { ">=" } else { ">" }, min.value));
        }
        if let Some(max) = self.max {
            parts.push(format!("{}{}{}", self.column, if max.inclusive { "<=" } else { "<" }, max.value));
        }
        if parts.is_empty() { write!(f, "{} (any)", self.column) } else { f.write_str(&parts.join(" and ")) }
    }
}
