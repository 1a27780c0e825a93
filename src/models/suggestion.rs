use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A scored, explained candidate date returned to the human scheduler.
/// Constructed fresh per engine call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingSuggestion {
    pub date: NaiveDate,
    pub score: i32,
    pub reason: String,
    pub waste_conflict: bool,
}
