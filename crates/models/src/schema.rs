//! Per-resource schema: declared fields, status allow-list, filter allow-list
//! and paging limits, plus the validation that turns raw JSON input into a
//! [`NewRecord`] or [`Patch`].
//!
//! Validation never touches storage. Errors are reported deterministically:
//! declared fields in schema order, then `status`, then undeclared keys in key
//! order.

use chrono::{DateTime, SecondsFormat, Utc};
use configs::{FieldKind, ResourceConfig, RESERVED_FIELDS};
use serde_json::{Map, Number, Value};

use crate::errors::{FieldError, ModelError, ValidationReason};
use crate::record::{NewRecord, Patch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct ResourceSchema {
    name: String,
    fields: Vec<FieldSpec>,
    statuses: Vec<String>,
    filters: Vec<String>,
    default_limit: u64,
    max_limit: u64,
}

impl ResourceSchema {
    pub fn from_config(cfg: &ResourceConfig) -> Result<Self, ModelError> {
        cfg.validate().map_err(|e| ModelError::Schema(e.to_string()))?;
        Ok(Self {
            name: cfg.name.trim().to_string(),
            fields: cfg
                .fields
                .iter()
                .map(|f| FieldSpec { name: f.name.clone(), kind: f.kind, required: f.required })
                .collect(),
            statuses: cfg.statuses.clone(),
            filters: cfg.filters.clone(),
            default_limit: cfg.default_limit,
            max_limit: cfg.max_limit,
        })
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn default_limit(&self) -> u64 { self.default_limit }
    pub fn max_limit(&self) -> u64 { self.max_limit }

    /// Status given to records created without one.
    pub fn initial_status(&self) -> &str {
        // from_config rejects an empty allow-list
        &self.statuses[0]
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn allows_filter(&self, key: &str) -> bool {
        self.filters.iter().any(|f| f == key)
    }

    /// Validate a full create payload.
    pub fn validate_create(&self, input: &Map<String, Value>) -> Result<NewRecord, FieldError> {
        let mut fields = Map::new();
        for spec in &self.fields {
            match input.get(&spec.name) {
                Some(v) if !is_blank(v) => {
                    fields.insert(spec.name.clone(), spec.coerce(v)?);
                }
                _ if spec.required => {
                    return Err(FieldError::new(&spec.name, ValidationReason::Required));
                }
                _ => {}
            }
        }

        let status = match input.get("status") {
            None | Some(Value::Null) => self.initial_status().to_string(),
            Some(v) => self.check_status(v)?,
        };

        self.reject_unknown(input)?;
        Ok(NewRecord { status, fields })
    }

    /// Validate a partial update; only keys present in `input` are checked.
    pub fn validate_patch(&self, input: &Map<String, Value>) -> Result<Patch, FieldError> {
        let mut patch = Patch::default();
        for spec in &self.fields {
            let Some(v) = input.get(&spec.name) else { continue };
            if is_blank(v) {
                if spec.required {
                    return Err(FieldError::new(&spec.name, ValidationReason::Required));
                }
                patch.unset.push(spec.name.clone());
            } else {
                patch.set.insert(spec.name.clone(), spec.coerce(v)?);
            }
        }

        if let Some(v) = input.get("status") {
            if is_blank(v) {
                return Err(FieldError::new("status", ValidationReason::Required));
            }
            patch.status = Some(self.check_status(v)?);
        }

        self.reject_unknown(input)?;
        Ok(patch)
    }

    fn check_status(&self, v: &Value) -> Result<String, FieldError> {
        let Value::String(s) = v else {
            return Err(FieldError::new("status", ValidationReason::InvalidType).expecting("string"));
        };
        if self.statuses.iter().any(|allowed| allowed == s) {
            Ok(s.clone())
        } else {
            Err(FieldError::new("status", ValidationReason::InvalidEnum).expecting(self.statuses.join(", ")))
        }
    }

    fn reject_unknown(&self, input: &Map<String, Value>) -> Result<(), FieldError> {
        let mut unknown: Vec<&String> = input
            .keys()
            .filter(|k| !RESERVED_FIELDS.contains(&k.as_str()) && self.field(k).is_none())
            .collect();
        unknown.sort();
        match unknown.first() {
            Some(k) => Err(FieldError::new(k.as_str(), ValidationReason::UnknownField)),
            None => Ok(()),
        }
    }
}

/// Null, or a string that is empty after trimming.
fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl FieldSpec {
    /// Check `v` against the declared kind, normalizing accepted string forms.
    fn coerce(&self, v: &Value) -> Result<Value, FieldError> {
        let invalid = || FieldError::new(&self.name, ValidationReason::InvalidType).expecting(self.kind.as_str());
        match (self.kind, v) {
            (FieldKind::String, Value::String(_)) => Ok(v.clone()),
            (FieldKind::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Value::from(i));
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Value::from(f as i64)),
                    _ => Err(invalid()),
                }
            }
            (FieldKind::Integer, Value::String(s)) => s.trim().parse::<i64>().map(Value::from).map_err(|_| invalid()),
            (FieldKind::Number, Value::Number(_)) => Ok(v.clone()),
            (FieldKind::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(invalid),
            (FieldKind::Boolean, Value::Bool(_)) => Ok(v.clone()),
            (FieldKind::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            (FieldKind::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
                .map(|t| Value::String(t.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::AutoSi, true)))
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}
