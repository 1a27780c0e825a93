use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::appointment::{Appointment, AppointmentDraft};

// Israeli phone shapes: 05X mobile or 0[23489] landline, optional hyphen.
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^05\d-?\d{7}$|^0[23489]-?\d{7}$").expect("phone pattern must compile")
});

pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_PATTERN.is_match(&compact)
}

pub fn is_time_range_valid(start: NaiveTime, end: NaiveTime) -> bool {
    start < end
}

/// Whether a draft's time range collides with an existing visit on the same
/// date. A draft still missing its date or times cannot collide yet, so it
/// reports no overlap; the form blocks submission on other grounds.
pub fn check_overlap(new_appt: &AppointmentDraft, existing_appts: &[Appointment]) -> bool {
    let (Some(date), Some(new_start), Some(new_end)) =
        (new_appt.date, new_appt.start_time, new_appt.end_time)
    else {
        return false;
    };

    existing_appts.iter().any(|existing| {
        // Skip self if editing
        if new_appt.id.as_deref() == Some(existing.id.as_str()) {
            return false;
        }

        if existing.date != date {
            return false;
        }

        // (StartA < EndB) and (EndA > StartB)
        new_start < existing.end_time && new_end > existing.start_time
    })
}
