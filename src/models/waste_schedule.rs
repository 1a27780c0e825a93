use serde::{Deserialize, Serialize};

/// One weekly pickup rule. `day_of_week` is 0-6 with 0 = Sunday, the first
/// working day of the business week. An area may carry several rules; a date
/// is a pickup day when any rule for the area matches its weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteScheduleRule {
    pub area: String,
    pub day_of_week: u8,
}

impl WasteScheduleRule {
    pub fn new(area: impl Into<String>, day_of_week: u8) -> Self {
        Self {
            area: area.into(),
            day_of_week,
        }
    }
}
