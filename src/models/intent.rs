use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::time_format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Schedule,
    Query,
    Unknown,
}

fn default_duration_minutes() -> i64 {
    60
}

/// Structured booking intent extracted from a free-text request.
///
/// Fields the model could not determine come back null; the booking form
/// pre-fills what is present and lets the human complete the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingIntent {
    pub intent: IntentKind,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, with = "time_format::hm_option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: i64,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}
