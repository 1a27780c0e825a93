use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::time_format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentType {
    #[serde(rename = "One-off")]
    OneOff,
    Recurring,
}

impl AppointmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentType::OneOff => "One-off",
            AppointmentType::Recurring => "Recurring",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "One-off" => Some(AppointmentType::OneOff),
            "Recurring" => Some(AppointmentType::Recurring),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

/// A booked visit. The engine reads only `id`, `client_id`, `date` and the
/// time range; the remaining fields ride along for the store and the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    pub date: NaiveDate,
    #[serde(with = "time_format::hm")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format::hm")]
    pub end_time: NaiveTime,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub instructions: Option<String>,
    pub price: f64,
    pub is_waste_pickup_day: bool,
    pub garden_photo_url: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Draft view of this appointment, for overlap checks while editing.
    pub fn as_draft(&self) -> AppointmentDraft {
        AppointmentDraft {
            id: Some(self.id.clone()),
            client_id: Some(self.client_id.clone()),
            date: Some(self.date),
            start_time: Some(self.start_time),
            end_time: Some(self.end_time),
        }
    }
}

/// A partially-filled appointment, as it exists while a human is still
/// typing in the booking form. Missing fields are tolerated everywhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    pub id: Option<String>,
    pub client_id: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default, with = "time_format::hm_option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "time_format::hm_option")]
    pub end_time: Option<NaiveTime>,
}

/// Input for creating a new appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentCreateInput {
    pub client_id: String,
    pub date: NaiveDate,
    #[serde(with = "time_format::hm")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format::hm")]
    pub end_time: NaiveTime,
    #[serde(rename = "type")]
    pub appointment_type: Option<AppointmentType>,
    pub instructions: Option<String>,
    pub price: Option<f64>,
    pub garden_photo_url: Option<String>,
}

/// Input for updating an appointment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdateInput {
    pub date: Option<NaiveDate>,
    #[serde(default, with = "time_format::hm_option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "time_format::hm_option")]
    pub end_time: Option<NaiveTime>,
    #[serde(rename = "type")]
    pub appointment_type: Option<AppointmentType>,
    pub instructions: Option<Option<String>>,
    pub price: Option<f64>,
    pub garden_photo_url: Option<Option<String>>,
    pub status: Option<AppointmentStatus>,
}
