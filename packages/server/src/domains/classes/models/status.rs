//! Class status state machine.
//!
//! `scheduled` is the only live state. Cancellations, reschedules and
//! vacations are terminal for the record they touch; a reschedule creates a
//! fresh record instead of resurrecting the old one. `canceled_teacher_makeup`
//! and `no_show` stay usable as *sources* for a reschedule while the linked
//! credit is alive, but the record itself never leaves its terminal state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "class_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    Scheduled,
    Completed,
    NoShow,
    CanceledStudent,
    CanceledTeacher,
    CanceledTeacherMakeup,
    CanceledAdmin,
    Rescheduled,
    TeacherVacation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "class_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    Regular,
    Makeup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "cancel_actor", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CancelActor {
    Student,
    Teacher,
    Admin,
}

impl ClassStatus {
    /// True once the record can never return to `scheduled` on its own.
    /// `teacher_vacation` is only reversed by deleting the vacation.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ClassStatus::Scheduled)
    }

    /// True for cancelled states (any actor).
    pub fn is_canceled(self) -> bool {
        matches!(
            self,
            ClassStatus::CanceledStudent
                | ClassStatus::CanceledTeacher
                | ClassStatus::CanceledTeacherMakeup
                | ClassStatus::CanceledAdmin
        )
    }

    /// Statuses a reschedule may use as its source.
    pub fn is_reschedulable_source(self) -> bool {
        matches!(
            self,
            ClassStatus::Scheduled | ClassStatus::NoShow | ClassStatus::CanceledTeacherMakeup
        )
    }

    /// Valid direct transitions out of this status.
    pub fn can_transition_to(self, next: ClassStatus) -> bool {
        match self {
            ClassStatus::Scheduled => matches!(
                next,
                ClassStatus::Completed
                    | ClassStatus::NoShow
                    | ClassStatus::CanceledStudent
                    | ClassStatus::CanceledTeacher
                    | ClassStatus::CanceledTeacherMakeup
                    | ClassStatus::CanceledAdmin
                    | ClassStatus::Rescheduled
                    | ClassStatus::TeacherVacation
            ),
            // Reschedule closes out a no_show / teacher-makeup source record
            ClassStatus::NoShow | ClassStatus::CanceledTeacherMakeup => {
                matches!(next, ClassStatus::Rescheduled)
            }
            // Restoration path owned by DeleteTeacherVacation
            ClassStatus::TeacherVacation => matches!(next, ClassStatus::Scheduled),
            _ => false,
        }
    }
}
