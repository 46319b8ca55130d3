//! # Calculation History
//!
//! Write-once records of calculations a user chose to keep. Records are
//! stored oldest first with strictly increasing `created_at`; listing
//! returns them newest first.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::{CalculationItem, CuttingInput};
//! use calc_core::history::{CalculationRecord, History};
//!
//! let item = CalculationItem::Cutting(CuttingInput::turning("OD", "C45", 40.0, 0.2));
//! let record = CalculationRecord::from_item(&item, serde_json::json!({"spindle_speed_rpm": 1432.4})).unwrap();
//!
//! let mut history = History::default();
//! let id = history.add(record).unwrap();
//! assert_eq!(history.len(), 1);
//! history.delete(&id).unwrap();
//! assert!(history.is_empty());
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::calculations::CalculationItem;
use crate::errors::{CalcError, CalcResult};

/// One saved calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub id: Uuid,
    /// Calculator tag, e.g. "Cutting"
    pub calc_type: String,
    pub label: String,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub machine: Option<String>,
    pub parameters: BTreeMap<String, Value>,
    pub results: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl CalculationRecord {
    /// Build a record from a calculation and its JSON result.
    pub fn from_item(item: &CalculationItem, results: Value) -> CalcResult<Self> {
        let results = match results {
            Value::Object(map) => map.into_iter().collect(),
            other => BTreeMap::from([("value".to_string(), other)]),
        };
        Ok(CalculationRecord {
            id: Uuid::new_v4(),
            calc_type: item.calc_type().to_string(),
            label: item.label().to_string(),
            material: item.material_label().map(str::to_string),
            tool: item.tool_label(),
            machine: item.machine_code().map(str::to_string),
            parameters: item.parameters()?,
            results,
            created_at: Utc::now(),
        })
    }

    /// Rebuild the calculation input this record was made from.
    pub fn to_item(&self) -> CalcResult<CalculationItem> {
        let mut map: serde_json::Map<String, Value> =
            self.parameters.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        map.insert("type".to_string(), Value::String(self.calc_type.clone()));
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub last_activity: Option<DateTime<Utc>>,
    pub last_7_days: usize,
}

/// Saved calculations, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    records: Vec<CalculationRecord>,
}

impl History {
    /// Append a record and return its id.
    ///
    /// A `created_at` not after the newest record is moved to one
    /// microsecond past it so ordering stays strict.
    pub fn add(&mut self, mut record: CalculationRecord) -> CalcResult<Uuid> {
        if self.get(&record.id).is_some() {
            return Err(CalcError::duplicate("record", record.id.to_string()));
        }
        if let Some(last) = self.records.last() {
            if record.created_at <= last.created_at {
                record.created_at = last.created_at + Duration::microseconds(1);
            }
        }
        let id = record.id;
        tracing::debug!(%id, calc_type = %record.calc_type, "history record added");
        self.records.push(record);
        Ok(id)
    }

    /// Remove exactly one record.
    pub fn delete(&mut self, id: &Uuid) -> CalcResult<CalculationRecord> {
        let index = self
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| CalcError::not_found("record", id.to_string()))?;
        tracing::debug!(%id, "history record deleted");
        Ok(self.records.remove(index))
    }

    pub fn get(&self, id: &Uuid) -> Option<&CalculationRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// All records, newest first.
    pub fn list(&self) -> Vec<&CalculationRecord> {
        self.records.iter().rev().collect()
    }

    /// The `n` newest records.
    pub fn recent(&self, n: usize) -> Vec<&CalculationRecord> {
        self.records.iter().rev().take(n).collect()
    }

    /// Records of one calculator type (case-insensitive), newest first.
    pub fn filter_type(&self, calc_type: &str) -> Vec<&CalculationRecord> {
        self.records
            .iter()
            .rev()
            .filter(|r| r.calc_type.eq_ignore_ascii_case(calc_type))
            .collect()
    }

    /// Records referring to a machine code.
    pub fn for_machine(&self, code: &str) -> Vec<&CalculationRecord> {
        self.records
            .iter()
            .rev()
            .filter(|r| r.machine.as_deref().is_some_and(|m| m.eq_ignore_ascii_case(code)))
            .collect()
    }

    /// Remove everything; returns the number of records removed.
    pub fn clear(&mut self) -> usize {
        let n = self.records.len();
        self.records.clear();
        tracing::debug!(removed = n, "history cleared");
        n
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &CalculationRecord> {
        self.records.iter()
    }

    /// Counters for the dashboard as of `now`.
    pub fn summary(&self, now: DateTime<Utc>) -> HistorySummary {
        let week_ago = now - Duration::days(7);
        let mut by_type = BTreeMap::new();
        for record in &self.records {
            *by_type.entry(record.calc_type.clone()).or_insert(0) += 1;
        }
        HistorySummary {
            total: self.records.len(),
            by_type,
            last_activity: self.records.last().map(|r| r.created_at),
            last_7_days: self.records.iter().filter(|r| r.created_at > week_ago).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{CuttingInput, ToleranceInput};
    use crate::calculations::tolerance::ItGrade;

    fn cutting_record(label: &str) -> CalculationRecord {
        let item = CalculationItem::Cutting(CuttingInput::turning(label, "C45", 40.0, 0.2));
        CalculationRecord::from_item(&item, serde_json::json!({"spindle_speed_rpm": 1000.0})).unwrap()
    }

    fn tolerance_record() -> CalculationRecord {
        let item = CalculationItem::Tolerance(ToleranceInput {
            label: "Bore".to_string(),
            nominal_size_mm: 20.0,
            grade: ItGrade::IT7,
        });
        CalculationRecord::from_item(&item, serde_json::json!({"tolerance_um": 21.0})).unwrap()
    }

    #[test]
    fn test_record_from_item() {
        let record = cutting_record("OD");
        assert_eq!(record.calc_type, "Cutting");
        assert_eq!(record.material.as_deref(), Some("C45"));
        assert_eq!(record.tool.as_deref(), Some("Carbide"));
        assert!(!record.parameters.contains_key("type"));
        assert_eq!(record.results["spindle_speed_rpm"], serde_json::json!(1000.0));
    }

    #[test]
    fn test_record_rebuilds_item() {
        let record = cutting_record("OD");
        let item = record.to_item().unwrap();
        assert_eq!(item.calc_type(), "Cutting");
        assert_eq!(item.label(), "OD");
    }

    #[test]
    fn test_scalar_result_wrapped() {
        let item = CalculationItem::Cutting(CuttingInput::turning("x", "C45", 40.0, 0.2));
        let record = CalculationRecord::from_item(&item, serde_json::json!(42.0)).unwrap();
        assert_eq!(record.results["value"], serde_json::json!(42.0));
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let mut history = History::default();
        let stamp = Utc::now();
        for i in 0..5 {
            let mut record = cutting_record(&format!("R{}", i));
            record.created_at = stamp;
            history.add(record).unwrap();
        }
        let stamps: Vec<_> = history.iter().map(|r| r.created_at).collect();
        for pair in stamps.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_delete_removes_exactly_one_and_keeps_timestamps() {
        let mut history = History::default();
        let ids: Vec<Uuid> = (0..4).map(|i| history.add(cutting_record(&format!("R{}", i))).unwrap()).collect();
        let before: Vec<(Uuid, DateTime<Utc>)> = history.iter().map(|r| (r.id, r.created_at)).collect();

        let removed = history.delete(&ids[1]).unwrap();
        assert_eq!(removed.id, ids[1]);
        assert_eq!(history.len(), 3);

        let after: Vec<(Uuid, DateTime<Utc>)> = history.iter().map(|r| (r.id, r.created_at)).collect();
        let expected: Vec<(Uuid, DateTime<Utc>)> = before.into_iter().filter(|(id, _)| id != &ids[1]).collect();
        assert_eq!(after, expected);

        assert!(history.delete(&ids[1]).is_err());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut history = History::default();
        let record = cutting_record("A");
        history.add(record.clone()).unwrap();
        assert!(history.add(record).is_err());
    }

    #[test]
    fn test_list_and_filter_newest_first() {
        let mut history = History::default();
        history.add(cutting_record("first")).unwrap();
        history.add(tolerance_record()).unwrap();
        history.add(cutting_record("third")).unwrap();

        let labels: Vec<_> = history.list().iter().map(|r| r.label.clone()).collect();
        assert_eq!(labels, vec!["third", "Bore", "first"]);

        let cutting: Vec<_> = history.filter_type("cutting").iter().map(|r| r.label.clone()).collect();
        assert_eq!(cutting, vec!["third", "first"]);
        assert_eq!(history.recent(1)[0].label, "third");
    }

    #[test]
    fn test_summary() {
        let mut history = History::default();
        let mut old = cutting_record("old");
        old.created_at = Utc::now() - Duration::days(30);
        history.add(old).unwrap();
        history.add(cutting_record("new")).unwrap();
        history.add(tolerance_record()).unwrap();

        let summary = history.summary(Utc::now());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_type["Cutting"], 2);
        assert_eq!(summary.by_type["Tolerance"], 1);
        assert_eq!(summary.last_7_days, 2);
        assert!(summary.last_activity.is_some());
    }

    #[test]
    fn test_clear() {
        let mut history = History::default();
        history.add(cutting_record("a")).unwrap();
        history.add(cutting_record("b")).unwrap();
        assert_eq!(history.clear(), 2);
        assert!(history.is_empty());
    }
}
