//! Side-effect service implementations.
//!
//! `HttpSideEffectService` posts JSON payloads to the external
//! notification/announcement/achievement services. `LogOnlySideEffectService`
//! is used in development and tests where no downstream services exist.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::common::{ClassId, StudentId};
use crate::kernel::traits::{
    BaseAchievementService, BaseAnnouncementService, BaseNotificationService, ClassCanceledNotice,
    ClassRescheduledNotice, TeacherVacationNotice,
};

// =============================================================================
// HTTP implementation
// =============================================================================

/// Posts side-effect payloads to the downstream services over HTTP.
pub struct HttpSideEffectService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSideEffectService {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    async fn post_json(&self, path: &str, payload: &serde_json::Value) -> Result<()> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        if !response.status().is_success() {
            anyhow::bail!("POST {} returned {}", url, response.status());
        }
        Ok(())
    }
}

#[async_trait]
impl BaseNotificationService for HttpSideEffectService {
    async fn send_class_canceled_email(&self, notice: &ClassCanceledNotice) -> Result<()> {
        self.post_json("/emails/class-canceled", &serde_json::to_value(notice)?)
            .await
    }

    async fn send_class_rescheduled_email(&self, notice: &ClassRescheduledNotice) -> Result<()> {
        self.post_json("/emails/class-rescheduled", &serde_json::to_value(notice)?)
            .await
    }

    async fn send_teacher_vacation_email(&self, notice: &TeacherVacationNotice) -> Result<()> {
        self.post_json("/emails/teacher-vacation", &serde_json::to_value(notice)?)
            .await
    }

    async fn send_teacher_vacation_canceled_email(
        &self,
        notice: &TeacherVacationNotice,
    ) -> Result<()> {
        self.post_json(
            "/emails/teacher-vacation-canceled",
            &serde_json::to_value(notice)?,
        )
        .await
    }
}

#[async_trait]
impl BaseAnnouncementService for HttpSideEffectService {
    async fn create_announcement(
        &self,
        recipient: uuid::Uuid,
        title: &str,
        body: &str,
    ) -> Result<()> {
        self.post_json(
            "/announcements",
            &json!({ "recipient": recipient, "title": title, "body": body }),
        )
        .await
    }
}

#[async_trait]
impl BaseAchievementService for HttpSideEffectService {
    async fn class_completed(&self, student_id: StudentId, class_id: ClassId) -> Result<()> {
        self.post_json(
            "/achievements/class-completed",
            &json!({ "student_id": student_id, "class_id": class_id }),
        )
        .await
    }
}

// =============================================================================
// Log-only implementation
// =============================================================================

/// Logs every side effect instead of delivering it. Default in dev/tests.
pub struct LogOnlySideEffectService;

#[async_trait]
impl BaseNotificationService for LogOnlySideEffectService {
    async fn send_class_canceled_email(&self, notice: &ClassCanceledNotice) -> Result<()> {
        tracing::info!(
            class_id = %notice.class_id,
            student_id = %notice.student_id,
            canceled_by = %notice.canceled_by,
            "(log-only) class canceled email"
        );
        Ok(())
    }

    async fn send_class_rescheduled_email(&self, notice: &ClassRescheduledNotice) -> Result<()> {
        tracing::info!(
            original_class_id = %notice.original_class_id,
            new_class_id = %notice.new_class_id,
            new_scheduled_at = %notice.new_scheduled_at,
            "(log-only) class rescheduled email"
        );
        Ok(())
    }

    async fn send_teacher_vacation_email(&self, notice: &TeacherVacationNotice) -> Result<()> {
        tracing::info!(
            vacation_id = %notice.vacation_id,
            teacher_id = %notice.teacher_id,
            affected = notice.affected_student_ids.len(),
            "(log-only) teacher vacation email"
        );
        Ok(())
    }

    async fn send_teacher_vacation_canceled_email(
        &self,
        notice: &TeacherVacationNotice,
    ) -> Result<()> {
        tracing::info!(
            vacation_id = %notice.vacation_id,
            teacher_id = %notice.teacher_id,
            "(log-only) teacher vacation canceled email"
        );
        Ok(())
    }
}

#[async_trait]
impl BaseAnnouncementService for LogOnlySideEffectService {
    async fn create_announcement(
        &self,
        recipient: uuid::Uuid,
        title: &str,
        _body: &str,
    ) -> Result<()> {
        tracing::info!(%recipient, title, "(log-only) announcement");
        Ok(())
    }
}

#[async_trait]
impl BaseAchievementService for LogOnlySideEffectService {
    async fn class_completed(&self, student_id: StudentId, class_id: ClassId) -> Result<()> {
        tracing::info!(%student_id, %class_id, "(log-only) achievement re-evaluation");
        Ok(())
    }
}
