use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;

use crate::common::{StudentId, TeacherId, TemplateEntryId};

/// One entry of a student's recurring weekly class plan: a (day, hour,
/// teacher, language) tuple. The ordered entry list per student is the
/// ClassTemplate that drives expansion.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TemplateEntry {
    pub id: TemplateEntryId,
    pub student_id: StudentId,
    pub position: i32,
    pub day_of_week: i32,
    pub hour: i32,
    pub teacher_id: TeacherId,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

/// Incoming template entry from a schedule edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntryInput {
    pub day_of_week: i32,
    pub hour: i32,
    pub teacher_id: TeacherId,
    pub language: String,
}

impl TemplateEntry {
    /// Same calendar placement (day, hour), regardless of teacher. An entry
    /// whose teacher changed still occupies its slot; only an entry with no
    /// counterpart at its (day, hour) has been removed.
    pub fn same_time_slot(&self, input: &TemplateEntryInput) -> bool {
        self.day_of_week == input.day_of_week && self.hour == input.hour
    }

    pub async fn find_for_student<'e>(
        student_id: StudentId,
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM class_templates WHERE student_id = $1 ORDER BY position",
        )
        .bind(student_id)
        .fetch_all(executor)
        .await
        .map_err(Into::into)
    }

    /// Replace the student's template with `entries` (order preserved).
    pub async fn replace_for_student(
        student_id: StudentId,
        entries: &[TemplateEntryInput],
        conn: &mut sqlx::PgConnection,
    ) -> Result<Vec<Self>> {
        sqlx::query("DELETE FROM class_templates WHERE student_id = $1")
            .bind(student_id)
            .execute(&mut *conn)
            .await?;

        let mut saved = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let row = sqlx::query_as::<_, Self>(
                r#"
                INSERT INTO class_templates (
                    id, student_id, position, day_of_week, hour, teacher_id, language
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(TemplateEntryId::new())
            .bind(student_id)
            .bind(position as i32)
            .bind(entry.day_of_week)
            .bind(entry.hour)
            .bind(entry.teacher_id)
            .bind(&entry.language)
            .fetch_one(&mut *conn)
            .await?;
            saved.push(row);
        }
        Ok(saved)
    }
}
