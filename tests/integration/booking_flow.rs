use chrono::NaiveDate;
use greencal::db::repositories::client_repository::{ClientRepository, ClientRow};
use greencal::db::repositories::recurring_plan_repository::{
    RecurringPlanRepository, RecurringPlanRow,
};
use greencal::db::repositories::waste_schedule_repository::WasteScheduleRepository;
use greencal::db::DbPool;
use greencal::error::AppError;
use greencal::models::appointment::{
    AppointmentCreateInput, AppointmentStatus, AppointmentUpdateInput,
};
use greencal::models::client::Client;
use greencal::models::recurring_plan::RecurringPlan;
use greencal::services::appointment_service::AppointmentService;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn time(value: &str) -> chrono::NaiveTime {
    chrono::NaiveTime::parse_from_str(value, "%H:%M").expect("valid time")
}

fn setup() -> (AppointmentService, DbPool, Client, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("booking.sqlite")).expect("db pool");

    let client = Client::new(
        "Dana Levi".to_string(),
        "052-1234567".to_string(),
        "HaZayit 12".to_string(),
        "מרכז".to_string(),
    )
    .with_notes(Some("gate code 4821".to_string()));
    pool.with_connection(|conn| {
        ClientRepository::insert(conn, &ClientRow::from_record(&client))?;
        // Tuesday pickup in the client's area
        WasteScheduleRepository::replace_for_area(conn, "מרכז", &[2])
    })
    .expect("seed client and rules");

    (AppointmentService::new(pool.clone()), pool, client, dir)
}

fn read_plan(pool: &DbPool, client_id: &str) -> RecurringPlan {
    pool.with_connection(|conn| RecurringPlanRepository::find_by_client(conn, client_id))
        .expect("read plan")
        .expect("plan exists")
        .into_record()
        .expect("plan record")
}

fn create_input(client_id: &str, day: NaiveDate, start: &str, end: &str) -> AppointmentCreateInput {
    AppointmentCreateInput {
        client_id: client_id.to_string(),
        date: day,
        start_time: time(start),
        end_time: time(end),
        appointment_type: None,
        instructions: Some("front hedge first".to_string()),
        price: Some(250.0),
        garden_photo_url: None,
    }
}

#[test]
fn created_appointment_is_stamped_with_pickup_day() {
    let (service, _pool, client, _dir) = setup();

    // Tuesday 2025-06-03
    let created = service
        .create_appointment(create_input(&client.id, date(2025, 6, 3), "09:00", "11:00"))
        .expect("create appointment");

    assert!(created.is_waste_pickup_day);
    assert_eq!(created.status, AppointmentStatus::Scheduled);

    // Wednesday is clear
    let clear = service
        .create_appointment(create_input(&client.id, date(2025, 6, 4), "09:00", "11:00"))
        .expect("create appointment");
    assert!(!clear.is_waste_pickup_day);
}

#[test]
fn overlapping_booking_is_rejected() {
    let (service, _pool, client, _dir) = setup();
    let day = date(2025, 6, 4);

    service
        .create_appointment(create_input(&client.id, day, "09:00", "11:00"))
        .expect("first booking");

    let error = service
        .create_appointment(create_input(&client.id, day, "10:00", "12:00"))
        .expect_err("overlap must be rejected");
    assert!(matches!(error, AppError::Conflict { .. }));

    // A back-to-back slot is fine: ranges are half-open
    service
        .create_appointment(create_input(&client.id, day, "11:00", "12:00"))
        .expect("adjacent booking");

    let day_bookings = service.list_for_date(day).expect("day listing");
    assert_eq!(day_bookings.len(), 2);
}

#[test]
fn editing_an_appointment_skips_its_own_slot() {
    let (service, _pool, client, _dir) = setup();
    let day = date(2025, 6, 4);

    let booked = service
        .create_appointment(create_input(&client.id, day, "09:00", "11:00"))
        .expect("booking");

    // Shrinking the same visit cannot conflict with itself
    let updated = service
        .update_appointment(
            &booked.id,
            AppointmentUpdateInput {
                start_time: Some(time("09:30")),
                ..Default::default()
            },
        )
        .expect("update booking");
    assert_eq!(updated.start_time, time("09:30"));

    // Moving it onto another visit still conflicts
    service
        .create_appointment(create_input(&client.id, day, "12:00", "13:00"))
        .expect("second booking");
    let error = service
        .update_appointment(
            &booked.id,
            AppointmentUpdateInput {
                start_time: Some(time("12:30")),
                end_time: Some(time("13:30")),
                ..Default::default()
            },
        )
        .expect_err("moved onto second booking");
    assert!(matches!(error, AppError::Conflict { .. }));
}

#[test]
fn rejects_backwards_time_ranges() {
    let (service, _pool, client, _dir) = setup();

    let error = service
        .create_appointment(create_input(&client.id, date(2025, 6, 4), "11:00", "09:00"))
        .expect_err("backwards range");
    assert!(matches!(error, AppError::Validation { .. }));
}

#[test]
fn completing_a_visit_advances_the_plan_anchor() {
    let (service, pool, client, _dir) = setup();

    let plan = RecurringPlan::new(client.id.clone(), 28, date(2025, 5, 1));
    pool.with_connection(|conn| {
        RecurringPlanRepository::upsert(conn, &RecurringPlanRow::from_record(&plan).expect("row"))
    })
    .expect("seed plan");

    // Booked for Wednesday, but the crew actually came a day later
    let booked = service
        .create_appointment(create_input(&client.id, date(2025, 6, 4), "09:00", "11:00"))
        .expect("booking");

    let completed = service
        .complete_visit(&booked.id, date(2025, 6, 5))
        .expect("complete");
    assert_eq!(completed.status, AppointmentStatus::Completed);

    let stored = read_plan(&pool, &client.id);
    assert_eq!(stored.last_visit_date, date(2025, 6, 5));
}

#[test]
fn backdated_completion_never_regresses_the_plan_anchor() {
    let (service, pool, client, _dir) = setup();

    let plan = RecurringPlan::new(client.id.clone(), 28, date(2025, 6, 1));
    pool.with_connection(|conn| {
        RecurringPlanRepository::upsert(conn, &RecurringPlanRow::from_record(&plan).expect("row"))
    })
    .expect("seed plan");

    // A visit logged after the fact, from before the current anchor
    let stale = service
        .create_appointment(create_input(&client.id, date(2025, 5, 20), "09:00", "11:00"))
        .expect("booking");

    let completed = service
        .complete_visit(&stale.id, date(2025, 5, 20))
        .expect("complete");
    assert_eq!(completed.status, AppointmentStatus::Completed);

    // The later anchor stands, so the next target does not project backward
    let stored = read_plan(&pool, &client.id);
    assert_eq!(stored.last_visit_date, date(2025, 6, 1));
}

#[test]
fn cancelled_visits_cannot_be_completed() {
    let (service, _pool, client, _dir) = setup();

    let booked = service
        .create_appointment(create_input(&client.id, date(2025, 6, 4), "09:00", "11:00"))
        .expect("booking");
    service
        .update_appointment(
            &booked.id,
            AppointmentUpdateInput {
                status: Some(AppointmentStatus::Cancelled),
                ..Default::default()
            },
        )
        .expect("cancel booking");

    let error = service
        .complete_visit(&booked.id, date(2025, 6, 4))
        .expect_err("cancelled visit");
    assert!(matches!(error, AppError::Validation { .. }));
}

#[test]
fn deleted_appointments_stay_gone() {
    let (service, _pool, client, _dir) = setup();

    let booked = service
        .create_appointment(create_input(&client.id, date(2025, 6, 4), "09:00", "11:00"))
        .expect("booking");

    service.delete_appointment(&booked.id).expect("delete");

    let error = service
        .get_appointment(&booked.id)
        .expect_err("already deleted");
    assert!(matches!(error, AppError::NotFound));

    let remaining = service.list_appointments().expect("list");
    assert!(remaining.is_empty());
}

#[test]
fn plans_can_be_detached_without_deleting_the_client() {
    let (_service, pool, client, _dir) = setup();

    let plan = RecurringPlan::new(client.id.clone(), 28, date(2025, 5, 1));
    pool.with_connection(|conn| {
        RecurringPlanRepository::upsert(conn, &RecurringPlanRow::from_record(&plan).expect("row"))
    })
    .expect("seed plan");

    pool.with_connection(|conn| RecurringPlanRepository::delete_for_client(conn, &client.id))
        .expect("detach plan");

    let remaining = pool
        .with_connection(|conn| RecurringPlanRepository::find_by_client(conn, &client.id))
        .expect("read plan");
    assert!(remaining.is_none());

    let error = pool
        .with_connection(|conn| RecurringPlanRepository::delete_for_client(conn, &client.id))
        .expect_err("already detached");
    assert!(matches!(error, AppError::NotFound));
}

#[test]
fn deleting_a_client_cascades_to_plan_and_appointments() {
    let (service, pool, client, _dir) = setup();

    let plan = RecurringPlan::new(client.id.clone(), 28, date(2025, 5, 1));
    pool.with_connection(|conn| {
        RecurringPlanRepository::upsert(conn, &RecurringPlanRow::from_record(&plan).expect("row"))
    })
    .expect("seed plan");

    service
        .create_appointment(create_input(&client.id, date(2025, 6, 4), "09:00", "11:00"))
        .expect("booking");

    // Record edits round-trip before the delete
    let mut stored = pool
        .with_connection(|conn| ClientRepository::find_by_id(conn, &client.id))
        .expect("read client")
        .expect("client exists")
        .into_record()
        .expect("client record");
    stored.update(greencal::models::client::ClientUpdateInput {
        phone: Some("054-7654321".to_string()),
        notes: Some(None),
        ..Default::default()
    });
    pool.with_connection(|conn| ClientRepository::update(conn, &ClientRow::from_record(&stored)))
        .expect("update client");

    let listed = pool
        .with_connection(|conn| ClientRepository::list_all(conn))
        .expect("list clients");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].phone, "054-7654321");
    assert!(listed[0].notes.is_none());

    pool.with_connection(|conn| ClientRepository::delete(conn, &client.id))
        .expect("delete client");

    let plans = pool
        .with_connection(|conn| RecurringPlanRepository::list_all(conn))
        .expect("list plans");
    assert!(plans.is_empty());

    let orphaned = pool
        .with_connection(|conn| {
            greencal::db::repositories::appointment_repository::AppointmentRepository::list_by_client(
                conn, &client.id,
            )
        })
        .expect("list appointments");
    assert!(orphaned.is_empty());
}

#[test]
fn booking_for_unknown_client_fails_validation() {
    let (service, _pool, _client, _dir) = setup();

    let error = service
        .create_appointment(create_input("nobody", date(2025, 6, 4), "09:00", "11:00"))
        .expect_err("unknown client");
    assert!(matches!(error, AppError::Validation { .. }));
}
