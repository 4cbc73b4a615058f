pub mod course_key;
pub mod error;
pub mod event;
pub mod timestamp;

pub use course_key::CourseKey;
pub use error::DomainError;
pub use event::{EnrollmentEvent, EnrollmentKey, EventKind, ValidationInfo};
pub use timestamp::EventTimestamp;
