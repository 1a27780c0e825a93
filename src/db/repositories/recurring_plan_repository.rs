use std::collections::HashMap;
use std::convert::TryFrom;

use chrono::{NaiveDate, Utc};
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::recurring_plan::{RecurringPlan, WastePreference};

const BASE_SELECT: &str = r#"
    SELECT
        client_id,
        base_interval_days,
        waste_preference,
        last_visit_date,
        seasonal_adjustments
    FROM recurring_plans
"#;

#[derive(Debug, Clone)]
pub struct RecurringPlanRow {
    pub client_id: String,
    pub base_interval_days: i64,
    pub waste_preference: String,
    pub last_visit_date: String,
    pub seasonal_adjustments: String,
}

impl RecurringPlanRow {
    pub fn from_record(record: &RecurringPlan) -> AppResult<Self> {
        Ok(Self {
            client_id: record.client_id.clone(),
            base_interval_days: record.base_interval_days,
            waste_preference: record.waste_preference.as_str().to_string(),
            last_visit_date: record.last_visit_date.format("%Y-%m-%d").to_string(),
            seasonal_adjustments: serde_json::to_string(&record.seasonal_adjustments)?,
        })
    }

    pub fn into_record(self) -> AppResult<RecurringPlan> {
        let seasonal_adjustments: HashMap<u32, i64> = if self.seasonal_adjustments.is_empty() {
            HashMap::new()
        } else {
            serde_json::from_str(&self.seasonal_adjustments)?
        };

        Ok(RecurringPlan {
            base_interval_days: self.base_interval_days,
            waste_preference: WastePreference::parse(&self.waste_preference).ok_or_else(|| {
                AppError::database(format!("invalid waste preference {}", self.waste_preference))
            })?,
            last_visit_date: NaiveDate::parse_from_str(&self.last_visit_date, "%Y-%m-%d")
                .map_err(|err| {
                    AppError::database(format!("invalid date {}: {err}", self.last_visit_date))
                })?,
            seasonal_adjustments,
            client_id: self.client_id,
        })
    }
}

impl TryFrom<&Row<'_>> for RecurringPlanRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(RecurringPlanRow {
            client_id: row.get("client_id")?,
            base_interval_days: row.get("base_interval_days")?,
            waste_preference: row.get("waste_preference")?,
            last_visit_date: row.get("last_visit_date")?,
            seasonal_adjustments: row.get("seasonal_adjustments")?,
        })
    }
}

pub struct RecurringPlanRepository;

impl RecurringPlanRepository {
    /// Inserts or replaces the plan for a client. A client holds at most one
    /// standing plan.
    pub fn upsert(conn: &Connection, row: &RecurringPlanRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO recurring_plans (
                    client_id,
                    base_interval_days,
                    waste_preference,
                    last_visit_date,
                    seasonal_adjustments,
                    updated_at
                ) VALUES (
                    :client_id,
                    :base_interval_days,
                    :waste_preference,
                    :last_visit_date,
                    :seasonal_adjustments,
                    :updated_at
                )
                ON CONFLICT(client_id) DO UPDATE SET
                    base_interval_days = excluded.base_interval_days,
                    waste_preference = excluded.waste_preference,
                    last_visit_date = excluded.last_visit_date,
                    seasonal_adjustments = excluded.seasonal_adjustments,
                    updated_at = excluded.updated_at
            "#,
            named_params! {
                ":client_id": &row.client_id,
                ":base_interval_days": row.base_interval_days,
                ":waste_preference": &row.waste_preference,
                ":last_visit_date": &row.last_visit_date,
                ":seasonal_adjustments": &row.seasonal_adjustments,
                ":updated_at": Utc::now().to_rfc3339(),
            },
        )?;

        Ok(())
    }

    pub fn find_by_client(conn: &Connection, client_id: &str) -> AppResult<Option<RecurringPlanRow>> {
        let mut stmt = conn.prepare(&format!("{} WHERE client_id = ?1", BASE_SELECT))?;
        let row = stmt
            .query_row([client_id], |row| RecurringPlanRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<RecurringPlanRow>> {
        let mut stmt = conn.prepare(&format!("{} ORDER BY client_id ASC", BASE_SELECT))?;
        let rows = stmt
            .query_map([], |row| RecurringPlanRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete_for_client(conn: &Connection, client_id: &str) -> AppResult<()> {
        let affected = conn.execute(
            "DELETE FROM recurring_plans WHERE client_id = ?1",
            [client_id],
        )?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }
}
