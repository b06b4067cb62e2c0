//! Transcript data items.
//!
//! Immutable value types created once at load time and exposed to the
//! clause evaluator through [`Clausable`](crate::clause::Clausable) field
//! dispatch.

mod area;
mod course;

pub use area::{AreaKind, AreaPointer, AreaStatus};
pub use course::{CourseInstance, Grade};
