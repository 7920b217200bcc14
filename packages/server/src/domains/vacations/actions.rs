//! Vacation workflows.
//!
//! Creating a vacation atomically flips every scheduled class for the teacher
//! inside [start, end] to `teacher_vacation`, inserts the record and debits
//! the day balance. Deleting it (with the same 40-day notice, measured
//! against the vacation's own start) restores exactly the classes it flipped
//! and refunds the balance.

use chrono::{NaiveDate, Utc};
use futures::future::BoxFuture;
use typed_builder::TypedBuilder;

use crate::common::{TeacherId, VacationId};
use crate::domains::classes::StudentClass;
use crate::domains::scheduling::{effects, policy, SchedulingError};
use crate::domains::teachers::Teacher;
use crate::kernel::{run_serializable, ServerDeps, TeacherVacationNotice};

use super::models::Vacation;

#[derive(Debug, Clone, TypedBuilder)]
pub struct CreateVacationParams {
    pub teacher_id: TeacherId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[builder(default)]
    pub reason: Option<String>,
}

pub async fn create_teacher_vacation(
    params: CreateVacationParams,
    deps: &ServerDeps,
) -> Result<Vacation, SchedulingError> {
    let today = Utc::now().date_naive();
    let days = policy::check_vacation_window(today, params.start_date, params.end_date)?;

    let (vacation, displaced) =
        run_serializable(&deps.db_pool, "create_teacher_vacation", |conn| {
            let params = params.clone();
            Box::pin(async move {
                let teacher = Teacher::find_by_id(params.teacher_id, &mut *conn)
                    .await?
                    .ok_or(SchedulingError::NotFound { entity: "teacher" })?;

                if days > teacher.vacation_days_remaining as i64 {
                    return Err(SchedulingError::VacationBalanceExceeded(
                        teacher.vacation_days_remaining,
                    ));
                }

                let vacation_id = VacationId::new();
                let window_start = params.start_date.and_time(chrono::NaiveTime::MIN).and_utc();
                let window_end = (params.end_date + chrono::Duration::days(1))
                    .and_time(chrono::NaiveTime::MIN)
                    .and_utc();

                let displaced = StudentClass::apply_vacation(
                    params.teacher_id,
                    vacation_id,
                    window_start,
                    window_end,
                    &mut *conn,
                )
                .await?;

                let vacation = Vacation::insert(
                    vacation_id,
                    params.teacher_id,
                    params.start_date,
                    params.end_date,
                    params.reason.as_deref(),
                    &mut *conn,
                )
                .await?;

                Teacher::adjust_vacation_balance(params.teacher_id, -(days as i32), &mut *conn)
                    .await?;

                Ok((vacation, displaced))
            }) as BoxFuture<'_, Result<(Vacation, Vec<StudentClass>), SchedulingError>>
        })
        .await?;

    tracing::info!(
        vacation_id = %vacation.id,
        teacher_id = %vacation.teacher_id,
        displaced = displaced.len(),
        days,
        "teacher vacation created"
    );

    let notice = TeacherVacationNotice {
        vacation_id: vacation.id,
        teacher_id: vacation.teacher_id,
        start_date: vacation.start_date,
        end_date: vacation.end_date,
        affected_student_ids: displaced.iter().map(|c| c.student_id).collect(),
    };
    effects::notify_vacation(deps, &notice, true).await;

    Ok(vacation)
}

pub async fn delete_teacher_vacation(
    vacation_id: VacationId,
    deps: &ServerDeps,
) -> Result<(), SchedulingError> {
    let today = Utc::now().date_naive();

    let (vacation, restored) =
        run_serializable(&deps.db_pool, "delete_teacher_vacation", |conn| {
            Box::pin(async move {
                let vacation = Vacation::find_by_id(vacation_id, &mut *conn)
                    .await?
                    .ok_or(SchedulingError::NotFound { entity: "vacation" })?;

                policy::check_vacation_delete_lead(today, vacation.start_date)?;

                let restored = StudentClass::restore_vacation(vacation_id, &mut *conn).await?;

                let days = (vacation.end_date - vacation.start_date).num_days() + 1;
                Teacher::adjust_vacation_balance(vacation.teacher_id, days as i32, &mut *conn)
                    .await?;

                Vacation::delete(vacation_id, &mut *conn).await?;

                Ok((vacation, restored))
            }) as BoxFuture<'_, Result<(Vacation, Vec<StudentClass>), SchedulingError>>
        })
        .await?;

    tracing::info!(
        vacation_id = %vacation.id,
        teacher_id = %vacation.teacher_id,
        restored = restored.len(),
        "teacher vacation deleted"
    );

    let notice = TeacherVacationNotice {
        vacation_id: vacation.id,
        teacher_id: vacation.teacher_id,
        start_date: vacation.start_date,
        end_date: vacation.end_date,
        affected_student_ids: restored.iter().map(|c| c.student_id).collect(),
    };
    effects::notify_vacation(deps, &notice, false).await;

    Ok(())
}
