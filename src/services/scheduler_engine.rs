use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use tracing::debug;

use crate::models::appointment::Appointment;
use crate::models::recurring_plan::{RecurringPlan, WastePreference};
use crate::models::suggestion::SchedulingSuggestion;
use crate::models::waste_schedule::WasteScheduleRule;

/// The business runs Sunday through Thursday; Saturday is the rest day and
/// Friday visits are possible but discouraged.
const BUSINESS_TZ: chrono_tz::Tz = chrono_tz::Asia::Jerusalem;

/// Candidates are searched in a symmetric window around the target date.
const SEARCH_WINDOW_DAYS: i64 = 7;
const MAX_SUGGESTIONS: usize = 3;

/// A day with this many visits is full, regardless of time gaps. Precise
/// time-range overlap is the booking form's concern, not the engine's.
const DAILY_CAPACITY: usize = 4;

const BASE_SCORE: i32 = 100;

/// Today's calendar date where the business operates.
pub fn business_today() -> NaiveDate {
    Utc::now().with_timezone(&BUSINESS_TZ).date_naive()
}

/// Whether any pickup rule for `area` matches the weekday of `date`.
/// Rule weekdays are 0-6 with 0 = Sunday.
pub fn is_waste_pickup_day(date: NaiveDate, area: &str, rules: &[WasteScheduleRule]) -> bool {
    let day_of_week = date.weekday().num_days_from_sunday() as u8;
    rules
        .iter()
        .any(|rule| rule.area == area && rule.day_of_week == day_of_week)
}

/// The ideal next-visit date: last visit plus the plan interval, adjusted by
/// the seasonal offset for the month the last visit fell in. The result may
/// lie in the past; the generator filters past candidates, not this.
pub fn calculate_target_date(plan: &RecurringPlan) -> NaiveDate {
    let month = plan.last_visit_date.month0();
    let adjustment = plan.adjustment_for_month(month);
    let actual_interval = plan.base_interval_days + adjustment;

    plan.last_visit_date + Duration::days(actual_interval)
}

fn score_candidate_date(
    candidate: NaiveDate,
    target: NaiveDate,
    plan: &RecurringPlan,
    area: &str,
    waste_rules: &[WasteScheduleRule],
    existing_appointments: &[Appointment],
) -> Option<SchedulingSuggestion> {
    let daily_load = existing_appointments
        .iter()
        .filter(|appointment| appointment.date == candidate)
        .count();
    if daily_load >= DAILY_CAPACITY {
        return None;
    }

    let mut score = BASE_SCORE;
    let mut reasons: Vec<&str> = Vec::new();

    // Lose 5 points per day away from target
    let dist = candidate.signed_duration_since(target).num_days().abs();
    score -= (dist * 5) as i32;
    if dist == 0 {
        reasons.push("Perfect interval match.");
    } else if dist < 3 {
        reasons.push("Close to target date.");
    }

    let is_waste_day = is_waste_pickup_day(candidate, area, waste_rules);

    match plan.waste_preference {
        WastePreference::Avoid => {
            if is_waste_day {
                score -= 50;
                reasons.push("Warning: Waste pickup day.");
            } else {
                score += 10;
                reasons.push("Avoids waste pickup.");
            }
        }
        WastePreference::Prefer => {
            if is_waste_day {
                score += 30;
                reasons.push("Is waste pickup day (preferred).");
            } else {
                score -= 20;
            }
        }
        WastePreference::Ignore => {}
    }

    match candidate.weekday() {
        Weekday::Sat => score -= 80,
        Weekday::Fri => score -= 20,
        _ => {}
    }

    Some(SchedulingSuggestion {
        date: candidate,
        score,
        reason: reasons.join(" "),
        waste_conflict: is_waste_day && plan.waste_preference == WastePreference::Avoid,
    })
}

/// Ranked visit-date suggestions near the plan's target date, at most
/// three. Evaluates "today" in the business time zone.
pub fn generate_suggestions(
    plan: &RecurringPlan,
    client_area: &str,
    waste_rules: &[WasteScheduleRule],
    appointments: &[Appointment],
) -> Vec<SchedulingSuggestion> {
    generate_suggestions_from(plan, client_area, waste_rules, appointments, business_today())
}

/// Same as [`generate_suggestions`] with an explicit "today", so callers and
/// tests can pin the past-date cutoff.
pub fn generate_suggestions_from(
    plan: &RecurringPlan,
    client_area: &str,
    waste_rules: &[WasteScheduleRule],
    appointments: &[Appointment],
    today: NaiveDate,
) -> Vec<SchedulingSuggestion> {
    let target = calculate_target_date(plan);
    let mut suggestions = Vec::new();

    for offset in -SEARCH_WINDOW_DAYS..=SEARCH_WINDOW_DAYS {
        let candidate = target + Duration::days(offset);

        // Never offer past dates, however well they would score.
        if candidate < today {
            continue;
        }

        if let Some(suggestion) = score_candidate_date(
            candidate,
            target,
            plan,
            client_area,
            waste_rules,
            appointments,
        ) {
            suggestions.push(suggestion);
        }
    }

    // Ties break toward the date nearest the target, for determinism.
    suggestions.sort_by(|a, b| {
        b.score.cmp(&a.score).then_with(|| {
            let dist_a = a.date.signed_duration_since(target).num_days().abs();
            let dist_b = b.date.signed_duration_since(target).num_days().abs();
            dist_a.cmp(&dist_b)
        })
    });
    suggestions.truncate(MAX_SUGGESTIONS);

    debug!(
        target: "app::engine",
        client_id = %plan.client_id,
        target_date = %target,
        count = suggestions.len(),
        "suggestions generated"
    );

    suggestions
}
