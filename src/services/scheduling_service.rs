use chrono::NaiveDate;
use tracing::debug;

use crate::db::repositories::appointment_repository::AppointmentRepository;
use crate::db::repositories::client_repository::ClientRepository;
use crate::db::repositories::recurring_plan_repository::RecurringPlanRepository;
use crate::db::repositories::waste_schedule_repository::WasteScheduleRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::suggestion::SchedulingSuggestion;
use crate::services::scheduler_engine;

/// Loads the snapshot the pure engine needs and runs it for one client.
#[derive(Clone)]
pub struct SchedulingService {
    db: DbPool,
}

impl SchedulingService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn suggest_for_client(&self, client_id: &str) -> AppResult<Vec<SchedulingSuggestion>> {
        self.suggest_for_client_on(client_id, scheduler_engine::business_today())
    }

    pub fn suggest_for_client_on(
        &self,
        client_id: &str,
        today: NaiveDate,
    ) -> AppResult<Vec<SchedulingSuggestion>> {
        self.db.with_connection(|conn| {
            let client = ClientRepository::find_by_id(conn, client_id)?
                .ok_or_else(AppError::not_found)?
                .into_record()?;

            let plan = RecurringPlanRepository::find_by_client(conn, client_id)?
                .ok_or_else(|| {
                    AppError::validation(format!("client {client_id} has no recurring plan"))
                })?
                .into_record()?;

            let rules = WasteScheduleRepository::list_for_area(conn, &client.area)?;

            let appointments = AppointmentRepository::list_all(conn)?
                .into_iter()
                .map(|row| row.into_record())
                .collect::<AppResult<Vec<_>>>()?;

            let suggestions = scheduler_engine::generate_suggestions_from(
                &plan,
                &client.area,
                &rules,
                &appointments,
                today,
            );

            debug!(
                target: "app::engine",
                client_id,
                count = suggestions.len(),
                "suggestions computed for client"
            );

            Ok(suggestions)
        })
    }
}
