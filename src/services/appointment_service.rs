use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use serde_json::json;
use tracing::{debug, info};

use crate::db::repositories::appointment_repository::{AppointmentRepository, AppointmentRow};
use crate::db::repositories::client_repository::ClientRepository;
use crate::db::repositories::recurring_plan_repository::{
    RecurringPlanRepository, RecurringPlanRow,
};
use crate::db::repositories::waste_schedule_repository::WasteScheduleRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::appointment::{
    Appointment, AppointmentCreateInput, AppointmentStatus, AppointmentType,
    AppointmentUpdateInput,
};
use crate::models::client::Client;
use crate::models::time_format;
use crate::services::scheduler_engine;
use crate::services::validation;

/// Booking workflow behind the manual entry form and suggestion
/// confirmation. Enforces the precise time-range overlap check; the engine's
/// coarse daily-capacity cutoff lives in the scorer and is not applied here.
#[derive(Clone)]
pub struct AppointmentService {
    db: DbPool,
}

impl AppointmentService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_appointment(&self, input: AppointmentCreateInput) -> AppResult<Appointment> {
        ensure_time_range(input.start_time, input.end_time)?;

        self.db.with_connection(|conn| {
            let client = load_client(conn, &input.client_id)?;

            let now = Utc::now();
            let record = Appointment {
                id: uuid::Uuid::new_v4().to_string(),
                client_id: input.client_id.clone(),
                date: input.date,
                start_time: input.start_time,
                end_time: input.end_time,
                appointment_type: input.appointment_type.unwrap_or(AppointmentType::OneOff),
                instructions: input.instructions.clone(),
                price: input.price.unwrap_or(0.0),
                is_waste_pickup_day: false,
                garden_photo_url: input.garden_photo_url.clone(),
                status: AppointmentStatus::Scheduled,
                created_at: now,
                updated_at: now,
            };

            let record = finalize_record(conn, record, &client)?;

            AppointmentRepository::insert(conn, &AppointmentRow::from_record(&record))?;
            info!(appointment_id = %record.id, client_id = %record.client_id, "appointment created");
            Ok(record)
        })
    }

    pub fn update_appointment(
        &self,
        id: &str,
        update: AppointmentUpdateInput,
    ) -> AppResult<Appointment> {
        self.db.with_connection(|conn| {
            let mut record = find_appointment(conn, id)?;
            apply_update(&mut record, update);

            ensure_time_range(record.start_time, record.end_time)?;

            let client = load_client(conn, &record.client_id)?;
            record.updated_at = Utc::now();
            let record = finalize_record(conn, record, &client)?;

            AppointmentRepository::update(conn, &AppointmentRow::from_record(&record))?;
            info!(appointment_id = %record.id, "appointment updated");
            Ok(record)
        })
    }

    pub fn delete_appointment(&self, id: &str) -> AppResult<()> {
        self.db
            .with_connection(|conn| AppointmentRepository::delete(conn, id))?;
        info!(appointment_id = %id, "appointment deleted");
        Ok(())
    }

    pub fn get_appointment(&self, id: &str) -> AppResult<Appointment> {
        self.db.with_connection(|conn| find_appointment(conn, id))
    }

    pub fn list_appointments(&self) -> AppResult<Vec<Appointment>> {
        let appointments = self.db.with_connection(|conn| {
            AppointmentRepository::list_all(conn)?
                .into_iter()
                .map(|row| row.into_record())
                .collect::<AppResult<Vec<_>>>()
        })?;
        debug!(count = appointments.len(), "appointments listed");
        Ok(appointments)
    }

    pub fn list_for_date(&self, date: NaiveDate) -> AppResult<Vec<Appointment>> {
        self.db.with_connection(|conn| {
            AppointmentRepository::list_by_date(conn, date)?
                .into_iter()
                .map(|row| row.into_record())
                .collect::<AppResult<Vec<_>>>()
        })
    }

    /// Marks a visit completed on `date` — the day the crew actually showed
    /// up, which may differ from the booked date — and rolls the client's
    /// plan anchor forward to it, so the next target projects from the real
    /// visit. The anchor never moves backward: completing a backdated visit
    /// leaves a later anchor untouched.
    pub fn complete_visit(&self, id: &str, date: NaiveDate) -> AppResult<Appointment> {
        self.db.with_connection(|conn| {
            let mut record = find_appointment(conn, id)?;
            if record.status == AppointmentStatus::Cancelled {
                return Err(AppError::validation(
                    "cancelled appointments cannot be completed",
                ));
            }

            record.status = AppointmentStatus::Completed;
            record.updated_at = Utc::now();
            AppointmentRepository::update(conn, &AppointmentRow::from_record(&record))?;

            if let Some(row) = RecurringPlanRepository::find_by_client(conn, &record.client_id)? {
                let mut plan = row.into_record()?;
                if date > plan.last_visit_date {
                    plan.last_visit_date = date;
                    RecurringPlanRepository::upsert(conn, &RecurringPlanRow::from_record(&plan)?)?;
                    debug!(client_id = %record.client_id, anchor = %date, "plan anchor advanced");
                } else {
                    debug!(
                        client_id = %record.client_id,
                        anchor = %plan.last_visit_date,
                        completed_on = %date,
                        "plan anchor unchanged for backdated visit"
                    );
                }
            }

            info!(appointment_id = %record.id, completed_on = %date, "visit completed");
            Ok(record)
        })
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }
}

fn ensure_time_range(start: NaiveTime, end: NaiveTime) -> AppResult<()> {
    if validation::is_time_range_valid(start, end) {
        Ok(())
    } else {
        Err(AppError::validation_with_details(
            "end time must be after start time",
            json!({
                "startTime": time_format::format_hm(start),
                "endTime": time_format::format_hm(end),
            }),
        ))
    }
}

fn find_appointment(conn: &Connection, id: &str) -> AppResult<Appointment> {
    AppointmentRepository::find_by_id(conn, id)?
        .ok_or_else(AppError::not_found)?
        .into_record()
}

fn load_client(conn: &Connection, client_id: &str) -> AppResult<Client> {
    ClientRepository::find_by_id(conn, client_id)?
        .ok_or_else(|| AppError::validation(format!("unknown client {client_id}")))?
        .into_record()
}

/// Runs the overlap check against the day's bookings and stamps the
/// waste-pickup flag from the client's area rules.
fn finalize_record(
    conn: &Connection,
    mut record: Appointment,
    client: &Client,
) -> AppResult<Appointment> {
    let same_day = AppointmentRepository::list_by_date(conn, record.date)?
        .into_iter()
        .map(|row| row.into_record())
        .collect::<AppResult<Vec<_>>>()?;

    if validation::check_overlap(&record.as_draft(), &same_day) {
        return Err(AppError::conflict(format!(
            "appointment overlaps an existing visit on {}",
            record.date
        )));
    }

    let rules = WasteScheduleRepository::list_for_area(conn, &client.area)?;
    record.is_waste_pickup_day =
        scheduler_engine::is_waste_pickup_day(record.date, &client.area, &rules);

    Ok(record)
}

fn apply_update(record: &mut Appointment, update: AppointmentUpdateInput) {
    if let Some(date) = update.date {
        record.date = date;
    }
    if let Some(start_time) = update.start_time {
        record.start_time = start_time;
    }
    if let Some(end_time) = update.end_time {
        record.end_time = end_time;
    }
    if let Some(appointment_type) = update.appointment_type {
        record.appointment_type = appointment_type;
    }
    if let Some(instructions) = update.instructions {
        record.instructions = instructions;
    }
    if let Some(price) = update.price {
        record.price = price;
    }
    if let Some(garden_photo_url) = update.garden_photo_url {
        record.garden_photo_url = garden_photo_url;
    }
    if let Some(status) = update.status {
        record.status = status;
    }
}
