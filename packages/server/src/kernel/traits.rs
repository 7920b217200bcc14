// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. Workflow code
// decides WHEN to notify; these traits only know HOW to deliver.
//
// Naming convention: Base* for trait names (e.g., BaseNotificationService)
//
// Contract: implementations may fail, but callers in domains/*/effects.rs
// never propagate those failures into workflow results. Delivery is
// best-effort by design.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::common::{ClassId, StudentId, TeacherId, VacationId};

// =============================================================================
// Notification payloads
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ClassCanceledNotice {
    pub class_id: ClassId,
    pub student_id: StudentId,
    pub teacher_id: Option<TeacherId>,
    pub scheduled_at: DateTime<Utc>,
    pub canceled_by: String,
    pub makeup_granted: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassRescheduledNotice {
    pub original_class_id: ClassId,
    pub new_class_id: ClassId,
    pub student_id: StudentId,
    pub teacher_id: Option<TeacherId>,
    pub old_scheduled_at: DateTime<Utc>,
    pub new_scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherVacationNotice {
    pub vacation_id: VacationId,
    pub teacher_id: TeacherId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub affected_student_ids: Vec<StudentId>,
}

// =============================================================================
// Email Notification Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseNotificationService: Send + Sync {
    /// Notify both parties that a class was canceled
    async fn send_class_canceled_email(&self, notice: &ClassCanceledNotice) -> Result<()>;

    /// Notify both parties that a class was rescheduled
    async fn send_class_rescheduled_email(&self, notice: &ClassRescheduledNotice) -> Result<()>;

    /// Notify affected students that a teacher vacation was created
    async fn send_teacher_vacation_email(&self, notice: &TeacherVacationNotice) -> Result<()>;

    /// Notify affected students that a teacher vacation was withdrawn
    async fn send_teacher_vacation_canceled_email(
        &self,
        notice: &TeacherVacationNotice,
    ) -> Result<()>;
}

// =============================================================================
// In-App Announcement Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseAnnouncementService: Send + Sync {
    /// Create an in-app announcement for a single recipient
    async fn create_announcement(
        &self,
        recipient: uuid::Uuid,
        title: &str,
        body: &str,
    ) -> Result<()>;
}

// =============================================================================
// Achievement Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseAchievementService: Send + Sync {
    /// Re-evaluate a student's achievements after a completed class
    async fn class_completed(&self, student_id: StudentId, class_id: ClassId) -> Result<()>;
}
