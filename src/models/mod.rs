pub mod appointment;
pub mod client;
pub mod intent;
pub mod recurring_plan;
pub mod suggestion;
pub mod time_format;
pub mod waste_schedule;
