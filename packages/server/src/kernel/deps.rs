//! Server dependencies (using traits for testability)
//!
//! Central dependency container constructed once in `main` and passed
//! explicitly to every workflow. All external collaborators sit behind
//! trait objects so tests can substitute log-only or recording fakes.

use sqlx::PgPool;
use std::sync::Arc;

use crate::kernel::services::{HttpSideEffectService, LogOnlySideEffectService};
use crate::kernel::traits::{
    BaseAchievementService, BaseAnnouncementService, BaseNotificationService,
};

/// Server dependencies accessible to workflows and effects
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub notifications: Arc<dyn BaseNotificationService>,
    pub announcements: Arc<dyn BaseAnnouncementService>,
    pub achievements: Arc<dyn BaseAchievementService>,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        notifications: Arc<dyn BaseNotificationService>,
        announcements: Arc<dyn BaseAnnouncementService>,
        achievements: Arc<dyn BaseAchievementService>,
    ) -> Self {
        Self {
            db_pool,
            notifications,
            announcements,
            achievements,
        }
    }

    /// Deps with HTTP-backed side-effect services rooted at `base_url`.
    pub fn with_http_services(db_pool: PgPool, base_url: String) -> Self {
        let service = Arc::new(HttpSideEffectService::new(base_url));
        Self {
            db_pool,
            notifications: service.clone(),
            announcements: service.clone(),
            achievements: service,
        }
    }

    /// Deps with log-only side-effect sinks (development and tests).
    pub fn log_only(db_pool: PgPool) -> Self {
        let service = Arc::new(LogOnlySideEffectService);
        Self {
            db_pool,
            notifications: service.clone(),
            announcements: service.clone(),
            achievements: service,
        }
    }
}
