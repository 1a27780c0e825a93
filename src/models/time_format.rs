//! Wire formats for time-of-day values.
//!
//! Times cross the API as zero-padded 24-hour `HH:mm` strings. The format is
//! fixed-width, so lexicographic order on the wire equals chronological
//! order; both the store and the overlap check depend on that.

use chrono::NaiveTime;

pub const TIME_FORMAT: &str = "%H:%M";

pub fn parse_hm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}

pub fn format_hm(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Serde adapter for required `HH:mm` fields.
pub mod hm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_hm(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_hm(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid HH:mm time: {raw}")))
    }
}

/// Serde adapter for optional `HH:mm` fields.
pub mod hm_option {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(value) => serializer.serialize_some(&super::format_hm(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            Some(value) if !value.is_empty() => super::parse_hm(&value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid HH:mm time: {value}"))),
            _ => Ok(None),
        }
    }
}
