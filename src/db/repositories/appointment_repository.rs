use std::convert::TryFrom;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::appointment::{Appointment, AppointmentStatus, AppointmentType};
use crate::models::time_format;

const BASE_SELECT: &str = r#"
    SELECT
        id,
        client_id,
        date,
        start_time,
        end_time,
        appointment_type,
        instructions,
        price,
        is_waste_pickup_day,
        garden_photo_url,
        status,
        created_at,
        updated_at
    FROM appointments
"#;

#[derive(Debug, Clone)]
pub struct AppointmentRow {
    pub id: String,
    pub client_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub appointment_type: String,
    pub instructions: Option<String>,
    pub price: f64,
    pub is_waste_pickup_day: bool,
    pub garden_photo_url: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl AppointmentRow {
    pub fn from_record(record: &Appointment) -> Self {
        Self {
            id: record.id.clone(),
            client_id: record.client_id.clone(),
            date: record.date.format("%Y-%m-%d").to_string(),
            start_time: time_format::format_hm(record.start_time),
            end_time: time_format::format_hm(record.end_time),
            appointment_type: record.appointment_type.as_str().to_string(),
            instructions: record.instructions.clone(),
            price: record.price,
            is_waste_pickup_day: record.is_waste_pickup_day,
            garden_photo_url: record.garden_photo_url.clone(),
            status: record.status.as_str().to_string(),
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }

    pub fn into_record(self) -> AppResult<Appointment> {
        Ok(Appointment {
            date: parse_date(&self.date)?,
            start_time: parse_time(&self.start_time)?,
            end_time: parse_time(&self.end_time)?,
            appointment_type: AppointmentType::parse(&self.appointment_type).ok_or_else(|| {
                AppError::database(format!("invalid appointment type {}", self.appointment_type))
            })?,
            status: AppointmentStatus::parse(&self.status).ok_or_else(|| {
                AppError::database(format!("invalid appointment status {}", self.status))
            })?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
            client_id: self.client_id,
            instructions: self.instructions,
            price: self.price,
            is_waste_pickup_day: self.is_waste_pickup_day,
            garden_photo_url: self.garden_photo_url,
        })
    }
}

impl TryFrom<&Row<'_>> for AppointmentRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(AppointmentRow {
            id: row.get("id")?,
            client_id: row.get("client_id")?,
            date: row.get("date")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            appointment_type: row.get("appointment_type")?,
            instructions: row.get("instructions")?,
            price: row.get("price")?,
            is_waste_pickup_day: row.get::<_, i64>("is_waste_pickup_day")? != 0,
            garden_photo_url: row.get("garden_photo_url")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct AppointmentRepository;

impl AppointmentRepository {
    pub fn insert(conn: &Connection, row: &AppointmentRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO appointments (
                    id,
                    client_id,
                    date,
                    start_time,
                    end_time,
                    appointment_type,
                    instructions,
                    price,
                    is_waste_pickup_day,
                    garden_photo_url,
                    status,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :client_id,
                    :date,
                    :start_time,
                    :end_time,
                    :appointment_type,
                    :instructions,
                    :price,
                    :is_waste_pickup_day,
                    :garden_photo_url,
                    :status,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":client_id": &row.client_id,
                ":date": &row.date,
                ":start_time": &row.start_time,
                ":end_time": &row.end_time,
                ":appointment_type": &row.appointment_type,
                ":instructions": &row.instructions,
                ":price": &row.price,
                ":is_waste_pickup_day": row.is_waste_pickup_day as i64,
                ":garden_photo_url": &row.garden_photo_url,
                ":status": &row.status,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn update(conn: &Connection, row: &AppointmentRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE appointments SET
                    client_id = :client_id,
                    date = :date,
                    start_time = :start_time,
                    end_time = :end_time,
                    appointment_type = :appointment_type,
                    instructions = :instructions,
                    price = :price,
                    is_waste_pickup_day = :is_waste_pickup_day,
                    garden_photo_url = :garden_photo_url,
                    status = :status,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":client_id": &row.client_id,
                ":date": &row.date,
                ":start_time": &row.start_time,
                ":end_time": &row.end_time,
                ":appointment_type": &row.appointment_type,
                ":instructions": &row.instructions,
                ":price": &row.price,
                ":is_waste_pickup_day": row.is_waste_pickup_day as i64,
                ":garden_photo_url": &row.garden_photo_url,
                ":status": &row.status,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM appointments WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<AppointmentRow>> {
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", BASE_SELECT))?;
        let row = stmt
            .query_row([id], |row| AppointmentRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<AppointmentRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY date ASC, start_time ASC",
            BASE_SELECT
        ))?;
        let rows = stmt
            .query_map([], |row| AppointmentRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_by_date(conn: &Connection, date: NaiveDate) -> AppResult<Vec<AppointmentRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE date = ?1 ORDER BY start_time ASC",
            BASE_SELECT
        ))?;
        let rows = stmt
            .query_map([date.format("%Y-%m-%d").to_string()], |row| {
                AppointmentRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_by_client(conn: &Connection, client_id: &str) -> AppResult<Vec<AppointmentRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE client_id = ?1 ORDER BY date ASC, start_time ASC",
            BASE_SELECT
        ))?;
        let rows = stmt
            .query_map([client_id], |row| AppointmentRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

}

fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|err| AppError::database(format!("invalid date {raw}: {err}")))
}

fn parse_time(raw: &str) -> AppResult<chrono::NaiveTime> {
    time_format::parse_hm(raw).ok_or_else(|| AppError::database(format!("invalid time {raw}")))
}

fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| AppError::database(format!("invalid timestamp {raw}: {err}")))
}
