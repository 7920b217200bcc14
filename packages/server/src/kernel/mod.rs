// Infrastructure: dependency container, side-effect service traits and
// implementations, transaction helpers.

pub mod deps;
pub mod services;
pub mod traits;
pub mod tx;

pub use deps::ServerDeps;
pub use services::{HttpSideEffectService, LogOnlySideEffectService};
pub use traits::{
    BaseAchievementService, BaseAnnouncementService, BaseNotificationService, ClassCanceledNotice,
    ClassRescheduledNotice, TeacherVacationNotice,
};
pub use tx::run_serializable;
