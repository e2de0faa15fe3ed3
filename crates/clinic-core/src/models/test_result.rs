//! Lab test result models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A lab test result, keyed by `patient_id → result_id` in the record store.
///
/// `value` is free text: lab systems report numbers, "positive",
/// "pending", and everything in between. Trend extraction only considers
/// entries whose value parses as a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestResult {
    pub test_name: String,
    pub test_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_normal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab: Option<String>,
    pub created_on: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Input for recording a new test result.
#[derive(Debug, Clone, Default)]
pub struct NewTestResult {
    /// Caller-supplied ID; generated when absent
    pub id: Option<String>,
    pub test_name: String,
    pub test_date: String,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub is_normal: Option<bool>,
    pub notes: Option<String>,
    pub ordered_by: Option<String>,
    pub lab: Option<String>,
}

/// Partial update for a test result.
#[derive(Debug, Clone, Default)]
pub struct TestResultUpdate {
    pub test_name: Option<String>,
    pub test_date: Option<String>,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub is_normal: Option<bool>,
    pub notes: Option<String>,
    pub ordered_by: Option<String>,
    pub lab: Option<String>,
}

/// One point in a numeric trend series, produced from results whose value
/// parsed as a number and whose date parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub result_id: String,
    pub date: NaiveDateTime,
    pub value: f64,
    pub unit: String,
    pub reference_range: String,
}
