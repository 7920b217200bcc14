//! Direct-SQL fixtures for seeding scheduling state.

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use server_core::common::{ClassId, SlotId, StudentId, TeacherId};

pub async fn create_test_teacher(pool: &PgPool, name: &str) -> Result<TeacherId> {
    let id = TeacherId::new();
    sqlx::query("INSERT INTO teachers (id, display_name) VALUES ($1, $2)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(id)
}

/// Teacher with explicit policy knobs.
pub async fn create_test_teacher_with_policy(
    pool: &PgPool,
    name: &str,
    lead_hours: i32,
    horizon_days: i32,
    cancellation_hours: i32,
) -> Result<TeacherId> {
    let id = TeacherId::new();
    sqlx::query(
        "INSERT INTO teachers (
            id, display_name, booking_lead_time_hours,
            booking_horizon_days, cancellation_policy_hours
         ) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(name)
    .bind(lead_hours)
    .bind(horizon_days)
    .bind(cancellation_hours)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn create_test_student(pool: &PgPool, name: &str, credits: i32) -> Result<StudentId> {
    let id = StudentId::new();
    sqlx::query(
        "INSERT INTO students (id, display_name, class_credit_balance) VALUES ($1, $2, $3)",
    )
    .bind(id)
    .bind(name)
    .bind(credits)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn set_student_contract(
    pool: &PgPool,
    student_id: StudentId,
    start: NaiveDate,
    months: i32,
) -> Result<()> {
    sqlx::query("UPDATE students SET contract_start = $2, contract_months = $3 WHERE id = $1")
        .bind(student_id)
        .bind(start)
        .bind(months)
        .execute(pool)
        .await?;
    Ok(())
}

/// Weekly slot on `day_of_week` 10:00-11:00, effective from today.
pub async fn create_test_slot(
    pool: &PgPool,
    teacher_id: TeacherId,
    day_of_week: i32,
    kind: &str,
) -> Result<SlotId> {
    let id = SlotId::new();
    sqlx::query(
        "INSERT INTO availability_slots (
            id, teacher_id, day_of_week, starts_at, ends_at, kind, recurrence, effective_from
         ) VALUES ($1, $2, $3, '10:00', '11:00', $4::slot_kind, 'weekly', CURRENT_DATE)",
    )
    .bind(id)
    .bind(teacher_id)
    .bind(day_of_week)
    .bind(kind)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Next occurrence of a weekly 10:00 UTC slot on `day_of_week` that is at
/// least `min_hours_ahead` in the future. Bookings must land on an actual
/// slot occurrence, so tests derive their timestamps from this.
pub fn upcoming_occurrence(day_of_week: i32, min_hours_ahead: i64) -> DateTime<Utc> {
    let earliest = Utc::now() + Duration::hours(min_hours_ahead);
    let mut date = earliest.date_naive();
    loop {
        if date.weekday().num_days_from_sunday() as i32 == day_of_week {
            let at = date.and_hms_opt(10, 0, 0).unwrap().and_utc();
            if at >= earliest {
                return at;
            }
        }
        date += Duration::days(1);
    }
}

/// A pre-existing scheduled class (bypasses the booking workflow).
pub async fn create_scheduled_class(
    pool: &PgPool,
    student_id: StudentId,
    teacher_id: TeacherId,
    scheduled_at: DateTime<Utc>,
) -> Result<ClassId> {
    let id = ClassId::new();
    sqlx::query(
        "INSERT INTO classes (id, student_id, teacher_id, scheduled_at)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(student_id)
    .bind(teacher_id)
    .bind(scheduled_at)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn add_template_entry(
    pool: &PgPool,
    student_id: StudentId,
    position: i32,
    day_of_week: i32,
    hour: i32,
    teacher_id: TeacherId,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO class_templates (
            id, student_id, position, day_of_week, hour, teacher_id, language
         ) VALUES ($1, $2, $3, $4, $5, $6, 'es')",
    )
    .bind(Uuid::now_v7())
    .bind(student_id)
    .bind(position)
    .bind(day_of_week)
    .bind(hour)
    .bind(teacher_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn class_status(pool: &PgPool, class_id: ClassId) -> Result<String> {
    let status: String = sqlx::query_scalar("SELECT status::text FROM classes WHERE id = $1")
        .bind(class_id)
        .fetch_one(pool)
        .await?;
    Ok(status)
}

pub async fn credit_balance(pool: &PgPool, student_id: StudentId) -> Result<i32> {
    let balance: i32 =
        sqlx::query_scalar("SELECT class_credit_balance FROM students WHERE id = $1")
            .bind(student_id)
            .fetch_one(pool)
            .await?;
    Ok(balance)
}

pub async fn vacation_balance(pool: &PgPool, teacher_id: TeacherId) -> Result<i32> {
    let balance: i32 =
        sqlx::query_scalar("SELECT vacation_days_remaining FROM teachers WHERE id = $1")
            .bind(teacher_id)
            .fetch_one(pool)
            .await?;
    Ok(balance)
}

pub async fn exception_count(pool: &PgPool, slot_id: SlotId) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM availability_exceptions WHERE slot_id = $1")
            .bind(slot_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
