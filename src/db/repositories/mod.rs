pub mod appointment_repository;
pub mod client_repository;
pub mod recurring_plan_repository;
pub mod waste_schedule_repository;
