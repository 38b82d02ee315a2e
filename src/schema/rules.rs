// src/schema/rules.rs

use regex::Regex;
use std::{borrow::Cow, collections::HashMap};
use tracing::{trace, warn};

use crate::error::Rejected;
use crate::fetch::Row;
use crate::process::date_parser::parse_source_timestamp;
use crate::process::utils::{parse_number, MAX_SAFE_INTEGER};

pub type Transform = fn(&str) -> String;

/// A validated cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Number(f64),
}

/// What a present (non-missing) cell must look like.
#[derive(Debug, Clone)]
pub enum Kind {
    Text,
    /// `[A-Za-z0-9]+`
    AlphaNum,
    Pattern(Regex),
    Number {
        min: f64,
        max: f64,
        integer: bool,
    },
    /// NHI local time, converted to unix seconds.
    Timestamp,
    OneOf(&'static [&'static str]),
}

impl Kind {
    pub fn number(min: f64, max: f64) -> Self {
        Kind::Number {
            min,
            max,
            integer: false,
        }
    }

    pub fn integer(min: f64, max: f64) -> Self {
        Kind::Number {
            min,
            max,
            integer: true,
        }
    }

    fn check(&self, field: &'static str, s: &str) -> Result<Value, Rejected> {
        match self {
            Kind::Text => Ok(Value::Text(s.to_string())),
            Kind::AlphaNum => {
                if s.chars().all(|c| c.is_ascii_alphanumeric()) {
                    Ok(Value::Text(s.to_string()))
                } else {
                    Err(Rejected::Invalid {
                        field,
                        reason: "must be alphanumeric",
                    })
                }
            }
            Kind::Pattern(re) => {
                if re.is_match(s) {
                    Ok(Value::Text(s.to_string()))
                } else {
                    Err(Rejected::Invalid {
                        field,
                        reason: "does not match pattern",
                    })
                }
            }
            Kind::Number { min, max, integer } => {
                let n = parse_number(s).ok_or(Rejected::Invalid {
                    field,
                    reason: "not a number",
                })?;
                if *integer && (n.fract() != 0.0 || n.abs() > MAX_SAFE_INTEGER) {
                    return Err(Rejected::Invalid {
                        field,
                        reason: "not a safe integer",
                    });
                }
                if n < *min || n > *max {
                    return Err(Rejected::OutOfRange { field });
                }
                Ok(if *integer {
                    Value::Integer(n as i64)
                } else {
                    Value::Number(n)
                })
            }
            Kind::Timestamp => parse_source_timestamp(s)
                .map(Value::Integer)
                .ok_or_else(|| Rejected::Timestamp {
                    value: s.to_string(),
                }),
            Kind::OneOf(allowed) => {
                if allowed.iter().any(|a| *a == s) {
                    Ok(Value::Text(s.to_string()))
                } else {
                    Err(Rejected::NotAllowed { field })
                }
            }
        }
    }
}

/// One output field: where it comes from and how a raw cell becomes a value.
///
/// Evaluation order per cell: trim → missing check (blank or one of the
/// `missing_if` sentinels) → default / required → `before` transform →
/// kind check → `after` transform (text only) → strip.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub column: &'static str,
    kind: Kind,
    required: bool,
    missing_if: &'static [&'static str],
    default: Option<Value>,
    before: Option<Transform>,
    after: Option<Transform>,
    strip: bool,
}

impl FieldRule {
    pub fn new(name: &'static str, column: &'static str, kind: Kind) -> Self {
        Self {
            name,
            column,
            kind,
            required: false,
            missing_if: &[],
            default: None,
            before: None,
            after: None,
            strip: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn missing_if(mut self, sentinels: &'static [&'static str]) -> Self {
        self.missing_if = sentinels;
        self
    }

    pub fn default_text(mut self, text: &str) -> Self {
        self.default = Some(Value::Text(text.to_string()));
        self
    }

    pub fn before(mut self, f: Transform) -> Self {
        self.before = Some(f);
        self
    }

    pub fn after(mut self, f: Transform) -> Self {
        self.after = Some(f);
        self
    }

    /// Validate, then drop from the output.
    pub fn strip(mut self) -> Self {
        self.strip = true;
        self
    }

    pub fn apply(&self, row: &Row) -> Result<Option<Value>, Rejected> {
        let present = row
            .get(self.column)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && !self.missing_if.iter().any(|m| m == s));

        let Some(raw) = present else {
            if self.strip {
                return Ok(None);
            }
            if let Some(default) = &self.default {
                return Ok(Some(default.clone()));
            }
            if self.required {
                return Err(Rejected::Missing { field: self.name });
            }
            return Ok(None);
        };

        let prepared = match self.before {
            Some(f) => Cow::Owned(f(raw)),
            None => Cow::Borrowed(raw),
        };
        let value = match (self.kind.check(self.name, &prepared)?, self.after) {
            (Value::Text(s), Some(f)) => Value::Text(f(&s)),
            (v, _) => v,
        };

        Ok(if self.strip { None } else { Some(value) })
    }
}

/// Values kept for one accepted row, keyed by field name.
#[derive(Debug, Default)]
pub struct Fields(HashMap<&'static str, Value>);

impl Fields {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn take_text(&mut self, field: &'static str) -> Result<String, Rejected> {
        match self.0.remove(field) {
            Some(Value::Text(s)) => Ok(s),
            Some(_) => Err(Rejected::Invalid {
                field,
                reason: "expected text",
            }),
            None => Err(Rejected::Missing { field }),
        }
    }

    pub fn take_integer(&mut self, field: &'static str) -> Result<i64, Rejected> {
        match self.0.remove(field) {
            Some(Value::Integer(n)) => Ok(n),
            Some(_) => Err(Rejected::Invalid {
                field,
                reason: "expected integer",
            }),
            None => Err(Rejected::Missing { field }),
        }
    }

    pub fn take_number(&mut self, field: &'static str) -> Result<f64, Rejected> {
        match self.0.remove(field) {
            Some(Value::Number(n)) => Ok(n),
            Some(Value::Integer(n)) => Ok(n as f64),
            Some(_) => Err(Rejected::Invalid {
                field,
                reason: "expected number",
            }),
            None => Err(Rejected::Missing { field }),
        }
    }
}

/// Outcome of running a schema over a batch.
#[derive(Debug)]
pub struct Validated<T> {
    pub records: Vec<T>,
    pub rejected: usize,
}

/// A named, ordered set of field rules. Unknown columns are ignored.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    rules: Vec<FieldRule>,
}

impl Schema {
    pub fn new(name: &'static str, rules: Vec<FieldRule>) -> Self {
        Self { name, rules }
    }

    /// All rules must pass; the first failure rejects the whole row.
    pub fn validate(&self, row: &Row) -> Result<Fields, Rejected> {
        let mut out = HashMap::with_capacity(self.rules.len());
        for rule in &self.rules {
            if let Some(v) = rule.apply(row)? {
                out.insert(rule.name, v);
            }
        }
        Ok(Fields(out))
    }

    /// Validate every row and build records with `build`. Rejected rows are
    /// skipped and counted; the count is logged once for the batch.
    pub fn validate_all<T, F>(&self, rows: &[Row], build: F) -> Validated<T>
    where
        F: Fn(Fields) -> Result<T, Rejected>,
    {
        let mut records = Vec::with_capacity(rows.len());
        let mut rejected = 0usize;
        for (idx, row) in rows.iter().enumerate() {
            match self.validate(row).and_then(&build) {
                Ok(rec) => records.push(rec),
                Err(reason) => {
                    rejected += 1;
                    trace!(schema = self.name, row = idx, %reason, "row rejected");
                }
            }
        }
        if rejected > 0 {
            warn!(
                schema = self.name,
                rejected,
                kept = records.len(),
                "dropped invalid rows"
            );
        }
        Validated { records, rejected }
    }
}
