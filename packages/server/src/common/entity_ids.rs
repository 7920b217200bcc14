//! Typed ID definitions for all scheduling entities.
//!
//! Each domain entity gets its own incompatible ID type so the compiler
//! catches mixed-up arguments (a real hazard in an engine whose workflows
//! juggle five or six IDs per call).

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Student entities.
pub struct Student;

/// Marker type for Teacher entities.
pub struct Teacher;

/// Marker type for StudentClass entities (booked class instances).
pub struct StudentClass;

/// Marker type for AvailabilitySlot entities (open time windows).
pub struct AvailabilitySlot;

/// Marker type for AvailabilityException entities (suppressed occurrences).
pub struct AvailabilityException;

/// Marker type for Credit entities (makeup/bonus class credits).
pub struct Credit;

/// Marker type for Vacation entities.
pub struct Vacation;

/// Marker type for ClassTemplate entries.
pub struct TemplateEntry;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for Student entities.
pub type StudentId = Id<Student>;

/// Typed ID for Teacher entities.
pub type TeacherId = Id<Teacher>;

/// Typed ID for StudentClass entities.
pub type ClassId = Id<StudentClass>;

/// Typed ID for AvailabilitySlot entities.
pub type SlotId = Id<AvailabilitySlot>;

/// Typed ID for AvailabilityException entities.
pub type ExceptionId = Id<AvailabilityException>;

/// Typed ID for Credit entities.
pub type CreditId = Id<Credit>;

/// Typed ID for Vacation entities.
pub type VacationId = Id<Vacation>;

/// Typed ID for ClassTemplate entries.
pub type TemplateEntryId = Id<TemplateEntry>;
