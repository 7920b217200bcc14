//! Integration tests for the booking / cancellation / reschedule workflows.

mod common;

use chrono::{Duration, Utc};
use test_context::test_context;
use uuid::Uuid;

use crate::common::{
    create_test_slot, create_test_student, create_test_teacher, create_test_teacher_with_policy,
    credit_balance, exception_count, upcoming_occurrence, TestHarness,
};
use server_core::domains::classes::{CancelActor, ClassStatus, ClassType, StudentClass};
use server_core::domains::credits::Credit;
use server_core::domains::scheduling::{
    book_class, cancel_class, reschedule_class, BookClassParams, CancelClassParams,
    RescheduleClassParams, SchedulingError,
};

// A cancellation window wide enough that any upcoming occurrence (at most
// ~8 days out) still counts as "late".
const WIDE_CANCEL_WINDOW_HOURS: i32 = 216;

// =============================================================================
// Booking
// =============================================================================

/// Booking a makeup slot with one credit: class lands scheduled as a makeup
/// class, the balance drops to zero and the slot occurrence is blocked.
#[test_context(TestHarness)]
#[tokio::test]
async fn book_class_happy_path(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Alvarez").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Novak", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "makeup").await.unwrap();
    let scheduled_at = upcoming_occurrence(1, 25);

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    assert_eq!(class.status, ClassStatus::Scheduled);
    assert_eq!(class.class_type, ClassType::Makeup);
    assert_eq!(class.availability_slot_id, Some(slot));
    assert_eq!(credit_balance(&ctx.db_pool, student).await.unwrap(), 0);
    assert_eq!(exception_count(&ctx.db_pool, slot).await.unwrap(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn book_class_without_credits_fails(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Broke").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Broke", 0).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();

    let result = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(upcoming_occurrence(1, 25))
            .build(),
        &ctx.deps,
    )
    .await;

    assert!(matches!(result, Err(SchedulingError::InsufficientCredits)));
}

/// Lead-time violations beat every other check, credits included.
#[test_context(TestHarness)]
#[tokio::test]
async fn book_class_inside_lead_time_fails(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Lead").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Lead", 5).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();

    let result = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(Utc::now() + Duration::hours(12))
            .build(),
        &ctx.deps,
    )
    .await;

    assert!(matches!(
        result,
        Err(SchedulingError::LeadTimeViolation(24))
    ));
    assert_eq!(credit_balance(&ctx.db_pool, student).await.unwrap(), 5);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn book_class_beyond_horizon_fails(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Horizon").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Horizon", 5).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();

    let result = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(Utc::now() + Duration::days(45))
            .build(),
        &ctx.deps,
    )
    .await;

    assert!(matches!(result, Err(SchedulingError::HorizonViolation(30))));
}

/// A Monday slot cannot be booked on a Tuesday timestamp: the requested
/// date must be an occurrence of the slot's recurrence.
#[test_context(TestHarness)]
#[tokio::test]
async fn book_class_off_pattern_date_fails(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Pattern").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Pattern", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();

    let result = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(upcoming_occurrence(1, 25) + Duration::days(1))
            .build(),
        &ctx.deps,
    )
    .await;

    assert!(matches!(result, Err(SchedulingError::Validation(_))));
    assert_eq!(credit_balance(&ctx.db_pool, student).await.unwrap(), 1);
}

/// Two bookings for the same teacher and timestamp: exactly one wins.
#[test_context(TestHarness)]
#[tokio::test]
async fn double_booking_same_timestamp_fails(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Race").await.unwrap();
    let student_a = create_test_student(&ctx.db_pool, "S. First", 1).await.unwrap();
    let student_b = create_test_student(&ctx.db_pool, "S. Second", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();
    let scheduled_at = upcoming_occurrence(1, 25);

    book_class(
        BookClassParams::builder()
            .student_id(student_a)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let second = book_class(
        BookClassParams::builder()
            .student_id(student_b)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await;

    assert!(matches!(second, Err(SchedulingError::SlotAlreadyBooked(_))));
    assert_eq!(credit_balance(&ctx.db_pool, student_b).await.unwrap(), 1);
}

// =============================================================================
// Cancellation
// =============================================================================

/// Early student cancellation frees the slot without refund; the freed
/// occurrence is bookable again.
#[test_context(TestHarness)]
#[tokio::test]
async fn student_early_cancel_frees_slot_without_refund(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Cancel").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Cancel", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();
    let scheduled_at = upcoming_occurrence(1, 25);

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let canceled = cancel_class(
        CancelClassParams::builder()
            .class_id(class.id)
            .actor(CancelActor::Student)
            .canceled_by(student.into_uuid())
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    assert_eq!(canceled.status, ClassStatus::CanceledStudent);
    assert_eq!(exception_count(&ctx.db_pool, slot).await.unwrap(), 0);
    // No refund on cancellation, early or late
    assert_eq!(credit_balance(&ctx.db_pool, student).await.unwrap(), 0);

    // The occurrence is open again for another booking
    let other = create_test_student(&ctx.db_pool, "S. Next", 1).await.unwrap();
    let rebooked = book_class(
        BookClassParams::builder()
            .student_id(other)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(rebooked.status, ClassStatus::Scheduled);
}

/// Late student cancellation forfeits the occurrence: the exception stays.
#[test_context(TestHarness)]
#[tokio::test]
async fn student_late_cancel_keeps_slot_blocked(ctx: &TestHarness) {
    let teacher = create_test_teacher_with_policy(
        &ctx.db_pool,
        "T. Strict",
        24,
        30,
        WIDE_CANCEL_WINDOW_HOURS,
    )
    .await
    .unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Late", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(upcoming_occurrence(1, 25))
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let canceled = cancel_class(
        CancelClassParams::builder()
            .class_id(class.id)
            .actor(CancelActor::Student)
            .canceled_by(student.into_uuid())
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    assert_eq!(canceled.status, ClassStatus::CanceledStudent);
    assert_eq!(exception_count(&ctx.db_pool, slot).await.unwrap(), 1);
}

/// A forfeited occurrence (late cancellation) is not open for rebooking.
#[test_context(TestHarness)]
#[tokio::test]
async fn forfeited_occurrence_cannot_be_rebooked(ctx: &TestHarness) {
    let teacher = create_test_teacher_with_policy(
        &ctx.db_pool,
        "T. Forfeit",
        24,
        30,
        WIDE_CANCEL_WINDOW_HOURS,
    )
    .await
    .unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Forfeit", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();
    let scheduled_at = upcoming_occurrence(1, 25);

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    cancel_class(
        CancelClassParams::builder()
            .class_id(class.id)
            .actor(CancelActor::Student)
            .canceled_by(student.into_uuid())
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(exception_count(&ctx.db_pool, slot).await.unwrap(), 1);

    let other = create_test_student(&ctx.db_pool, "S. Opportunist", 1).await.unwrap();
    let rebook = book_class(
        BookClassParams::builder()
            .student_id(other)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await;

    assert!(matches!(rebook, Err(SchedulingError::SlotAlreadyBooked(_))));
    assert_eq!(credit_balance(&ctx.db_pool, other).await.unwrap(), 1);
}

/// Teacher cancellation with makeup grants exactly one 45-day credit.
#[test_context(TestHarness)]
#[tokio::test]
async fn teacher_cancel_with_makeup_grants_credit(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Makeup").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Makeup", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(upcoming_occurrence(1, 25))
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let canceled = cancel_class(
        CancelClassParams::builder()
            .class_id(class.id)
            .actor(CancelActor::Teacher)
            .canceled_by(teacher.into_uuid())
            .allow_makeup(true)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    assert_eq!(canceled.status, ClassStatus::CanceledTeacherMakeup);
    assert_eq!(exception_count(&ctx.db_pool, slot).await.unwrap(), 0);

    let (count, max_days): (i64, f64) = sqlx::query_as(
        "SELECT COUNT(*),
                COALESCE(MAX(EXTRACT(EPOCH FROM (expires_at - now()))::double precision / 86400.0), 0)
         FROM credits
         WHERE student_id = $1 AND credit_type = 'teacher_cancellation'",
    )
    .bind(student)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
    assert!((44.0..=45.0).contains(&max_days), "expiry {max_days} days out");

    // The ledger and class history reads see the same state
    let ledger = Credit::find_for_student(student, &ctx.db_pool).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert!(ledger[0].consumed_at.is_none());

    let history = StudentClass::find_for_student(student, &ctx.db_pool).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ClassStatus::CanceledTeacherMakeup);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn teacher_cancel_without_makeup_grants_nothing(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. NoMakeup").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. NoMakeup", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(upcoming_occurrence(1, 25))
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let canceled = cancel_class(
        CancelClassParams::builder()
            .class_id(class.id)
            .actor(CancelActor::Teacher)
            .canceled_by(teacher.into_uuid())
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    assert_eq!(canceled.status, ClassStatus::CanceledTeacher);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credits WHERE student_id = $1")
        .bind(student)
        .fetch_one(&ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn cancelling_a_cancelled_class_fails(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Twice").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Twice", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(upcoming_occurrence(1, 25))
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let params = CancelClassParams::builder()
        .class_id(class.id)
        .actor(CancelActor::Admin)
        .canceled_by(Uuid::new_v4())
        .build();
    cancel_class(params.clone(), &ctx.deps).await.unwrap();

    let second = cancel_class(params, &ctx.deps).await;
    assert!(matches!(
        second,
        Err(SchedulingError::InvalidStatusTransition { .. })
    ));
}

// =============================================================================
// Rescheduling
// =============================================================================

/// Rescheduling releases the original booking's slot occurrence.
#[test_context(TestHarness)]
#[tokio::test]
async fn reschedule_frees_original_occurrence(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Release").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Release", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();
    let scheduled_at = upcoming_occurrence(1, 25);

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(exception_count(&ctx.db_pool, slot).await.unwrap(), 1);

    let moved = reschedule_class(
        RescheduleClassParams::builder()
            .class_id(class.id)
            .rescheduled_by(CancelActor::Student)
            .new_scheduled_at(scheduled_at + Duration::days(1))
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    assert_eq!(moved.rescheduled_from, Some(class.id));
    // The old occurrence no longer carries an exception
    assert_eq!(exception_count(&ctx.db_pool, slot).await.unwrap(), 0);
}

/// Two regular reschedules exhaust the monthly quota; the third fails.
#[test_context(TestHarness)]
#[tokio::test]
async fn third_reschedule_in_a_month_hits_quota(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Quota").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Quota", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();
    let scheduled_at = upcoming_occurrence(1, 25);

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let second = reschedule_class(
        RescheduleClassParams::builder()
            .class_id(class.id)
            .rescheduled_by(CancelActor::Student)
            .new_scheduled_at(scheduled_at + Duration::days(1))
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(second.rescheduled_from, Some(class.id));

    let third = reschedule_class(
        RescheduleClassParams::builder()
            .class_id(second.id)
            .rescheduled_by(CancelActor::Student)
            .new_scheduled_at(scheduled_at + Duration::days(2))
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let blocked = reschedule_class(
        RescheduleClassParams::builder()
            .class_id(third.id)
            .rescheduled_by(CancelActor::Student)
            .new_scheduled_at(scheduled_at + Duration::days(3))
            .build(),
        &ctx.deps,
    )
    .await;

    assert!(matches!(
        blocked,
        Err(SchedulingError::MonthlyQuotaExceeded(2))
    ));
}

/// Rescheduling a teacher-makeup class consumes the credit, skips the quota
/// and produces a class that cannot move again.
#[test_context(TestHarness)]
#[tokio::test]
async fn makeup_reschedule_consumes_credit(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Consume").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Consume", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();
    let scheduled_at = upcoming_occurrence(1, 25);

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let canceled = cancel_class(
        CancelClassParams::builder()
            .class_id(class.id)
            .actor(CancelActor::Teacher)
            .canceled_by(teacher.into_uuid())
            .allow_makeup(true)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let makeup = reschedule_class(
        RescheduleClassParams::builder()
            .class_id(canceled.id)
            .rescheduled_by(CancelActor::Student)
            .new_scheduled_at(scheduled_at + Duration::days(1))
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    assert!(!makeup.reschedulable);
    assert!(makeup.credit_id.is_some());

    let consumed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM credits WHERE student_id = $1 AND consumed_at IS NOT NULL",
    )
    .bind(student)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert_eq!(consumed, 1);

    // Single use: the credit-funded class cannot be rescheduled again
    let again = reschedule_class(
        RescheduleClassParams::builder()
            .class_id(makeup.id)
            .rescheduled_by(CancelActor::Student)
            .new_scheduled_at(scheduled_at + Duration::days(2))
            .build(),
        &ctx.deps,
    )
    .await;
    assert!(matches!(again, Err(SchedulingError::NotReschedulable)));
}

/// A makeup source without a live credit is a hard failure.
#[test_context(TestHarness)]
#[tokio::test]
async fn makeup_reschedule_without_credit_fails(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Expired").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Expired", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();
    let scheduled_at = upcoming_occurrence(1, 25);

    let class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    let canceled = cancel_class(
        CancelClassParams::builder()
            .class_id(class.id)
            .actor(CancelActor::Teacher)
            .canceled_by(teacher.into_uuid())
            .allow_makeup(true)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    // Expire the granted credit
    sqlx::query("UPDATE credits SET expires_at = now() - interval '1 day' WHERE student_id = $1")
        .bind(student)
        .execute(&ctx.db_pool)
        .await
        .unwrap();

    let result = reschedule_class(
        RescheduleClassParams::builder()
            .class_id(canceled.id)
            .rescheduled_by(CancelActor::Student)
            .new_scheduled_at(scheduled_at + Duration::days(1))
            .build(),
        &ctx.deps,
    )
    .await;

    assert!(matches!(result, Err(SchedulingError::MakeupCreditRequired)));
}

/// Teacher-driven reschedules neither need credits nor touch the quota.
#[test_context(TestHarness)]
#[tokio::test]
async fn teacher_reschedule_skips_quota(ctx: &TestHarness) {
    let teacher = create_test_teacher(&ctx.db_pool, "T. Free").await.unwrap();
    let student = create_test_student(&ctx.db_pool, "S. Free", 1).await.unwrap();
    let slot = create_test_slot(&ctx.db_pool, teacher, 1, "regular").await.unwrap();
    let scheduled_at = upcoming_occurrence(1, 25);

    let mut class = book_class(
        BookClassParams::builder()
            .student_id(student)
            .teacher_id(teacher)
            .slot_id(slot)
            .scheduled_at(scheduled_at)
            .build(),
        &ctx.deps,
    )
    .await
    .unwrap();

    for days in [1, 2, 3] {
        class = reschedule_class(
            RescheduleClassParams::builder()
                .class_id(class.id)
                .rescheduled_by(CancelActor::Teacher)
                .new_scheduled_at(scheduled_at + Duration::days(days))
                .build(),
            &ctx.deps,
        )
        .await
        .unwrap();
    }

    let counters: serde_json::Value =
        sqlx::query_scalar("SELECT monthly_reschedules FROM students WHERE id = $1")
            .bind(student)
            .fetch_one(&ctx.db_pool)
            .await
            .unwrap();
    assert_eq!(counters, serde_json::json!({}));
}
