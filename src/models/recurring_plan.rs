use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Client stance on aligning visits with the area's waste-pickup day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WastePreference {
    Avoid,
    Prefer,
    Ignore,
}

impl WastePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            WastePreference::Avoid => "AVOID",
            WastePreference::Prefer => "PREFER",
            WastePreference::Ignore => "IGNORE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AVOID" => Some(WastePreference::Avoid),
            "PREFER" => Some(WastePreference::Prefer),
            "IGNORE" => Some(WastePreference::Ignore),
            _ => None,
        }
    }
}

/// A client's standing service agreement. `seasonal_adjustments` is sparse,
/// keyed by calendar month 0-11; an absent month means no adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPlan {
    pub client_id: String,
    pub base_interval_days: i64,
    pub waste_preference: WastePreference,
    pub last_visit_date: NaiveDate,
    #[serde(default)]
    pub seasonal_adjustments: HashMap<u32, i64>,
}

impl RecurringPlan {
    pub fn new(client_id: String, base_interval_days: i64, last_visit_date: NaiveDate) -> Self {
        Self {
            client_id,
            base_interval_days,
            waste_preference: WastePreference::Ignore,
            last_visit_date,
            seasonal_adjustments: HashMap::new(),
        }
    }

    pub fn with_waste_preference(mut self, preference: WastePreference) -> Self {
        self.waste_preference = preference;
        self
    }

    pub fn with_seasonal_adjustment(mut self, month: u32, days: i64) -> Self {
        self.seasonal_adjustments.insert(month, days);
        self
    }

    /// Adjustment in days for a 0-based calendar month, 0 when unset.
    pub fn adjustment_for_month(&self, month: u32) -> i64 {
        self.seasonal_adjustments.get(&month).copied().unwrap_or(0)
    }
}
