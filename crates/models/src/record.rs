//! Generic resource record and the mutations applied to it.
//!
//! A record carries the system-managed columns (`id`, `status`, timestamps)
//! plus a flat map of business fields whose shape is defined by the owning
//! [`ResourceSchema`](crate::schema::ResourceSchema). On the wire the business
//! fields are flattened next to the system columns.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub status: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new record; produced by `ResourceSchema::validate_create`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRecord {
    pub status: String,
    pub fields: Map<String, Value>,
}

/// Validated partial update; produced by `ResourceSchema::validate_patch`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    pub status: Option<String>,
    pub set: Map<String, Value>,
    pub unset: Vec<String>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.set.is_empty() && self.unset.is_empty()
    }
}

/// Current time truncated to the microsecond precision relational stores keep.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl Record {
    pub fn new(draft: NewRecord) -> Self {
        let now = now_micros();
        Self {
            id: Uuid::new_v4(),
            status: draft.status,
            fields: draft.fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a validated patch. Fields absent from the patch keep their value.
    pub fn apply(&mut self, patch: &Patch) {
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
        for (k, v) in &patch.set {
            self.fields.insert(k.clone(), v.clone());
        }
        for k in &patch.unset {
            self.fields.remove(k);
        }
        self.touch();
    }

    /// Refresh `updated_at`, guaranteeing it moves forward even when the clock
    /// has not advanced past the previous value.
    pub fn touch(&mut self) {
        let now = now_micros();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }

    /// Text form of a filterable value, matching what `jsonb ->> key` yields.
    pub fn filter_value(&self, key: &str) -> Option<String> {
        if key == "status" {
            return Some(self.status.clone());
        }
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Exact match on every filter.
    pub fn matches(&self, filters: &BTreeMap<String, String>) -> bool {
        filters
            .iter()
            .all(|(k, v)| self.filter_value(k).as_deref() == Some(v.as_str()))
    }
}

/// Listing order: `created_at` descending, ties broken by `id` ascending.
pub fn newest_first(a: &Record, b: &Record) -> Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Record {
        let fields = json!({"vin": "VF3ABCDEF12345678", "customer_id": 1, "description": "battery issue"});
        Record::new(NewRecord { status: "PENDING".into(), fields: fields.as_object().cloned().unwrap() })
    }

    #[test]
    fn serializes_fields_flat() {
        let r = sample();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["vin"], "VF3ABCDEF12345678");
        assert_eq!(v["status"], "PENDING");
        assert_eq!(v["id"], r.id.to_string());
        assert!(v.get("fields").is_none());

        let back: Record = serde_json::from_value(v).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn apply_merges_and_refreshes_updated_at() {
        let mut r = sample();
        let before = r.clone();
        let mut patch = Patch::default();
        patch.set.insert("description".into(), json!("x"));
        r.apply(&patch);

        assert_eq!(r.fields["description"], "x");
        assert_eq!(r.fields["vin"], before.fields["vin"]);
        assert_eq!(r.status, before.status);
        assert_eq!(r.created_at, before.created_at);
        assert!(r.updated_at > before.updated_at);
    }

    #[test]
    fn touch_is_strictly_monotonic() {
        let mut r = sample();
        r.updated_at = now_micros() + Duration::seconds(60);
        let prev = r.updated_at;
        r.touch();
        assert_eq!(r.updated_at, prev + Duration::microseconds(1));
    }

    #[test]
    fn unset_removes_field() {
        let mut r = sample();
        r.apply(&Patch { unset: vec!["description".into()], ..Default::default() });
        assert!(!r.fields.contains_key("description"));
    }

    #[test]
    fn filters_compare_text_forms() {
        let r = sample();
        let mut f = BTreeMap::new();
        f.insert("customer_id".to_string(), "1".to_string());
        f.insert("status".to_string(), "PENDING".to_string());
        assert!(r.matches(&f));
        f.insert("vin".to_string(), "OTHER".to_string());
        assert!(!r.matches(&f));
        assert!(r.matches(&BTreeMap::new()));
    }

    #[test]
    fn ordering_is_newest_first_then_id() {
        let mut a = sample();
        let mut b = sample();
        b.created_at = a.created_at + Duration::seconds(1);
        assert_eq!(newest_first(&a, &b), Ordering::Greater);
        b.created_at = a.created_at;
        a.id = Uuid::nil();
        assert_eq!(newest_first(&a, &b), Ordering::Less);
    }
}
