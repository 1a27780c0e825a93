use chrono::NaiveDate;
use greencal::db::repositories::client_repository::{ClientRepository, ClientRow};
use greencal::db::repositories::recurring_plan_repository::{
    RecurringPlanRepository, RecurringPlanRow,
};
use greencal::db::repositories::waste_schedule_repository::WasteScheduleRepository;
use greencal::db::DbPool;
use greencal::error::AppError;
use greencal::models::appointment::AppointmentCreateInput;
use greencal::models::client::Client;
use greencal::models::recurring_plan::{RecurringPlan, WastePreference};
use greencal::services::appointment_service::AppointmentService;
use greencal::services::scheduling_service::SchedulingService;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn time(value: &str) -> chrono::NaiveTime {
    chrono::NaiveTime::parse_from_str(value, "%H:%M").expect("valid time")
}

fn seed_client(pool: &DbPool, name: &str, area: &str) -> Client {
    let client = Client::new(
        name.to_string(),
        "052-1234567".to_string(),
        "HaZayit 12".to_string(),
        area.to_string(),
    );
    pool.with_connection(|conn| ClientRepository::insert(conn, &ClientRow::from_record(&client)))
        .expect("insert client");
    client
}

fn seed_plan(pool: &DbPool, plan: &RecurringPlan) {
    pool.with_connection(|conn| {
        RecurringPlanRepository::upsert(conn, &RecurringPlanRow::from_record(plan).expect("plan row"))
    })
    .expect("upsert plan");
}

#[test]
fn suggestions_avoid_pickup_days_and_stay_sorted() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("scheduling.sqlite")).expect("db pool");

    let client = seed_client(&pool, "Dana Levi", "מרכז");
    // Tuesday pickup in the client's area
    pool.with_connection(|conn| WasteScheduleRepository::replace_for_area(conn, "מרכז", &[2]))
        .expect("seed waste rules");

    // 28-day plan anchored on Thursday 2025-05-01: target Thursday 2025-05-29
    let plan = RecurringPlan::new(client.id.clone(), 28, date(2025, 5, 1))
        .with_waste_preference(WastePreference::Avoid);
    seed_plan(&pool, &plan);

    let scheduling = SchedulingService::new(pool.clone());
    let suggestions = scheduling
        .suggest_for_client_on(&client.id, date(2025, 5, 1))
        .expect("suggestions");

    assert_eq!(suggestions.len(), 3);
    assert!(suggestions.windows(2).all(|w| w[0].score >= w[1].score));

    // The clear target day wins with the avoidance bonus
    assert_eq!(suggestions[0].date, date(2025, 5, 29));
    assert_eq!(suggestions[0].score, 110);
    assert!(suggestions[0].reason.contains("Perfect interval match."));
    assert!(suggestions[0].reason.contains("Avoids waste pickup."));

    // The penalized Tuesday never outranks clear weekdays
    assert!(suggestions.iter().all(|s| !s.waste_conflict));
    assert!(suggestions.iter().all(|s| s.date != date(2025, 5, 27)));
}

#[test]
fn fully_booked_target_day_is_never_offered() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("scheduling.sqlite")).expect("db pool");

    let client = seed_client(&pool, "Dana Levi", "מרכז");
    let other = seed_client(&pool, "Noam Peretz", "מרכז");

    let plan = RecurringPlan::new(client.id.clone(), 28, date(2025, 5, 1));
    seed_plan(&pool, &plan);

    // Four visits fill Thursday 2025-05-29 to capacity
    let appointments = AppointmentService::new(pool.clone());
    for slot in 0..4 {
        appointments
            .create_appointment(AppointmentCreateInput {
                client_id: other.id.clone(),
                date: date(2025, 5, 29),
                start_time: time(&format!("{:02}:00", 8 + 2 * slot)),
                end_time: time(&format!("{:02}:00", 9 + 2 * slot)),
                appointment_type: None,
                instructions: None,
                price: Some(200.0),
                garden_photo_url: None,
            })
            .expect("seed appointment");
    }

    let scheduling = SchedulingService::new(pool.clone());
    let suggestions = scheduling
        .suggest_for_client_on(&client.id, date(2025, 5, 1))
        .expect("suggestions");

    assert!(!suggestions.is_empty());
    assert!(suggestions.iter().all(|s| s.date != date(2025, 5, 29)));
}

#[test]
fn suggestions_require_a_recurring_plan() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("scheduling.sqlite")).expect("db pool");

    let client = seed_client(&pool, "Dana Levi", "מרכז");

    let scheduling = SchedulingService::new(pool.clone());
    let error = scheduling
        .suggest_for_client_on(&client.id, date(2025, 5, 1))
        .expect_err("no plan seeded");

    assert!(matches!(error, AppError::Validation { .. }));
}

#[test]
fn waste_rules_are_kept_per_area() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("scheduling.sqlite")).expect("db pool");

    pool.with_connection(|conn| {
        WasteScheduleRepository::replace_for_area(conn, "מרכז", &[2])?;
        WasteScheduleRepository::replace_for_area(conn, "צפון", &[0, 3])?;
        WasteScheduleRepository::insert(
            conn,
            &greencal::models::waste_schedule::WasteScheduleRule::new("מרכז", 5),
        )
    })
    .expect("seed rules");

    let all = pool
        .with_connection(|conn| WasteScheduleRepository::list_all(conn))
        .expect("list all");
    assert_eq!(all.len(), 4);

    let center = pool
        .with_connection(|conn| WasteScheduleRepository::list_for_area(conn, "מרכז"))
        .expect("list area");
    assert_eq!(center.len(), 2);
    assert!(center.iter().all(|rule| rule.area == "מרכז"));

    // Saving the configuration again replaces, not appends
    pool.with_connection(|conn| WasteScheduleRepository::replace_for_area(conn, "מרכז", &[4]))
        .expect("replace rules");
    let center = pool
        .with_connection(|conn| WasteScheduleRepository::list_for_area(conn, "מרכז"))
        .expect("list area");
    assert_eq!(center.len(), 1);
    assert_eq!(center[0].day_of_week, 4);
}

#[test]
fn logging_initializes_once() {
    let dir = tempdir().expect("temp dir");
    let log_dir = dir.path().join("logs");

    greencal::utils::logger::init_logging(&log_dir).expect("first init");
    // The guard makes re-initialization a no-op rather than a panic
    greencal::utils::logger::init_logging(&log_dir).expect("second init");

    assert!(log_dir.exists());
}

#[test]
fn unknown_client_is_not_found() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("scheduling.sqlite")).expect("db pool");

    let scheduling = SchedulingService::new(pool);
    let error = scheduling
        .suggest_for_client_on("missing-client", date(2025, 5, 1))
        .expect_err("client does not exist");

    assert!(matches!(error, AppError::NotFound));
}
