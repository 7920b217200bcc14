//! Template engine: expands a student's weekly recurring-class template into
//! concrete class instances across the contract period, and applies template
//! edits to already-generated future classes.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::common::StudentId;
use crate::domains::classes::{ClassType, NewClass, StudentClass};
use crate::domains::scheduling::SchedulingError;
use crate::domains::students::Student;
use crate::kernel::{run_serializable, ServerDeps};

use super::models::{TemplateEntry, TemplateEntryInput};

/// Classes are inserted in chunks; generation is deliberately NOT one atomic
/// transaction (idempotency is the caller's responsibility).
const INSERT_CHUNK_SIZE: usize = 100;

// =============================================================================
// Pure expansion
// =============================================================================

/// A concrete occurrence produced by expansion: which entry, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub entry_index: usize,
    pub scheduled_at: DateTime<Utc>,
}

/// Expand template entries across every calendar day from `contract_start`
/// (inclusive) to `contract_start + contract_months` (exclusive). One
/// occurrence per entry per matching weekday, at the entry's hour in UTC.
pub fn expand_entries(
    entries: &[TemplateEntry],
    contract_start: NaiveDate,
    contract_months: u32,
) -> Vec<Occurrence> {
    let contract_end = contract_start
        .checked_add_months(Months::new(contract_months))
        .unwrap_or(contract_start);

    let mut occurrences = Vec::new();
    let mut date = contract_start;
    while date < contract_end {
        let weekday = date.weekday().num_days_from_sunday() as i32;
        for (entry_index, entry) in entries.iter().enumerate() {
            if entry.day_of_week != weekday {
                continue;
            }
            let Some(time) = date.and_hms_opt(entry.hour as u32, 0, 0) else {
                continue;
            };
            occurrences.push(Occurrence {
                entry_index,
                scheduled_at: time.and_utc(),
            });
        }
        date += Duration::days(1);
    }
    occurrences
}

// =============================================================================
// Operations
// =============================================================================

/// Generate concrete scheduled classes from the student's template.
///
/// Requires contract start, contract length and a non-empty template. Refuses
/// to run when future scheduled classes already exist: a live schedule must be
/// edited through `update_schedule_and_prune`, not regenerated.
pub async fn generate_classes_from_template(
    student_id: StudentId,
    deps: &ServerDeps,
) -> Result<Vec<StudentClass>, SchedulingError> {
    let pool = &deps.db_pool;

    let student = Student::find_by_id(student_id, pool)
        .await?
        .ok_or(SchedulingError::NotFound { entity: "student" })?;

    let contract_start = student.contract_start.ok_or_else(|| {
        SchedulingError::Validation("student has no contract start date".into())
    })?;
    let contract_months = student.contract_months.filter(|m| *m > 0).ok_or_else(|| {
        SchedulingError::Validation("student has no contract length".into())
    })?;

    let entries = TemplateEntry::find_for_student(student_id, pool).await?;
    if entries.is_empty() {
        return Err(SchedulingError::Validation(
            "student has no class template".into(),
        ));
    }

    if StudentClass::has_future_scheduled_for_student(student_id, Utc::now(), pool).await? {
        return Err(SchedulingError::TemplateRegenerationBlocked);
    }

    let occurrences = expand_entries(&entries, contract_start, contract_months as u32);
    tracing::info!(
        %student_id,
        entries = entries.len(),
        occurrences = occurrences.len(),
        "expanding class template"
    );

    let mut created = Vec::with_capacity(occurrences.len());
    for chunk in occurrences.chunks(INSERT_CHUNK_SIZE) {
        let mut tx = pool.begin().await.map_err(SchedulingError::Database)?;
        for occurrence in chunk {
            let entry = &entries[occurrence.entry_index];
            let new = NewClass::builder()
                .student_id(student_id)
                .teacher_id(Some(entry.teacher_id))
                .scheduled_at(occurrence.scheduled_at)
                .class_type(ClassType::Regular)
                .build();
            let class = StudentClass::insert(&new, &mut *tx)
                .await
                .map_err(SchedulingError::Internal)?;
            created.push(class);
        }
        tx.commit().await.map_err(SchedulingError::Database)?;
    }

    Ok(created)
}

/// Apply a template edit: delete future classes whose (day, hour, teacher)
/// entry was removed, reassign the teacher on entries whose teacher changed,
/// replace the stored template and recompute the student's teacher roster.
pub async fn update_schedule_and_prune(
    student_id: StudentId,
    new_entries: Vec<TemplateEntryInput>,
    deps: &ServerDeps,
) -> Result<Vec<TemplateEntry>, SchedulingError> {
    for entry in &new_entries {
        if !(0..=6).contains(&entry.day_of_week) || !(0..=23).contains(&entry.hour) {
            return Err(SchedulingError::Validation(format!(
                "invalid template entry day={} hour={}",
                entry.day_of_week, entry.hour
            )));
        }
    }

    let saved = run_serializable(&deps.db_pool, "update_schedule_and_prune", |conn| {
        let new_entries = new_entries.clone();
        Box::pin(async move {
            let student = Student::find_by_id(student_id, &mut *conn)
                .await?
                .ok_or(SchedulingError::NotFound { entity: "student" })?;

            let old_entries = TemplateEntry::find_for_student(student_id, &mut *conn).await?;
            let now = Utc::now();

            // Removed slots: delete their future scheduled classes. An entry
            // counts as removed only when no new entry occupies its (day,
            // hour); a teacher swap is handled by the reassign pass below.
            for old in &old_entries {
                let still_present = new_entries.iter().any(|n| old.same_time_slot(n));
                if still_present {
                    continue;
                }
                let deleted = StudentClass::delete_future_matching_entry(
                    student_id,
                    old.teacher_id,
                    old.day_of_week,
                    old.hour,
                    now,
                    &mut *conn,
                )
                .await?;
                tracing::debug!(
                    %student_id,
                    day = old.day_of_week,
                    hour = old.hour,
                    deleted,
                    "pruned classes for removed template entry"
                );
            }

            // Same (day, hour), different teacher: reassign in place
            for new in &new_entries {
                let teacher_changed = old_entries
                    .iter()
                    .any(|o| o.same_time_slot(new) && o.teacher_id != new.teacher_id);
                if !teacher_changed {
                    continue;
                }
                StudentClass::reassign_future_matching_entry(
                    student_id,
                    new.day_of_week,
                    new.hour,
                    new.teacher_id,
                    now,
                    &mut *conn,
                )
                .await?;
            }

            let saved =
                TemplateEntry::replace_for_student(student_id, &new_entries, &mut *conn).await?;

            // Roster index: the distinct teachers the new schedule references
            let mut roster: Vec<Uuid> = new_entries
                .iter()
                .map(|e| e.teacher_id.into_uuid())
                .collect();
            roster.sort();
            roster.dedup();
            Student::set_teacher_roster(student.id, &roster, &mut *conn).await?;

            Ok(saved)
        }) as BoxFuture<'_, Result<Vec<TemplateEntry>, SchedulingError>>
    })
    .await?;

    Ok(saved)
}
